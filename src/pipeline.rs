//! Ingestion loop
//!
//! This module provides the public entry point for running the detector over a
//! device stream. Reads block; the loop ends on end-of-stream or the first read
//! error, and every chunk is fully processed before the next read.

use crate::alert::AlertSink;
use crate::config::MonitorConfig;
use crate::demux::{StreamDemuxer, GROUP_SIZE};
use crate::error::TamperError;
use crate::types::{AxisStats, MonitorSummary, StopReason, TamperEvent};
use serde::Serialize;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Size of the read buffer handed to the device
pub const STREAM_BUFFER_SIZE: usize = 4098;

/// Open the gyro character device for reading
pub fn open_device(path: &Path) -> Result<File, TamperError> {
    File::open(path).map_err(|source| {
        error!(path = %path.display(), "Open error: {source}");
        TamperError::StreamOpen {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// A tamper event stamped with the monitor session
#[derive(Debug, Clone, Serialize)]
pub struct SessionEvent<'a> {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub event: &'a TamperEvent,
}

/// Stateful monitor: owns the detectors and the alert sink for the process lifetime.
pub struct TamperMonitor<S: AlertSink> {
    demuxer: StreamDemuxer,
    sink: S,
    session_id: Uuid,
    chunks_read: u64,
    chunks_skipped: u64,
    tamper_events: u64,
}

impl<S: AlertSink> TamperMonitor<S> {
    /// Create a monitor from the configuration and an alert sink
    pub fn new(config: &MonitorConfig, sink: S) -> Self {
        Self {
            demuxer: StreamDemuxer::new(config.params, config.alert.clone()),
            sink,
            session_id: Uuid::new_v4(),
            chunks_read: 0,
            chunks_skipped: 0,
            tamper_events: 0,
        }
    }

    /// Process one chunk exactly as read from the device
    pub fn process_chunk(&mut self, chunk: &[u8]) -> Vec<TamperEvent> {
        self.chunks_read += 1;
        if chunk.len() != GROUP_SIZE {
            self.chunks_skipped += 1;
        }

        let events = self.demuxer.feed(chunk, &self.sink);
        self.tamper_events += events.len() as u64;
        events
    }

    /// Read from `source` until it ends or fails, calling `on_event` for each
    /// tamper event in stream order.
    pub fn run<R, F>(&mut self, mut source: R, mut on_event: F) -> MonitorSummary
    where
        R: Read,
        F: FnMut(&SessionEvent<'_>),
    {
        let mut buffer = vec![0u8; STREAM_BUFFER_SIZE];
        info!(session = %self.session_id, "Starting ingestion");

        let stop_reason = loop {
            let bytes_read = match source.read(&mut buffer) {
                Ok(0) => {
                    info!("End of sample stream");
                    break StopReason::EndOfStream;
                }
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!("Read error: {e}");
                    break StopReason::ReadError(e.to_string());
                }
            };

            for event in self.process_chunk(&buffer[..bytes_read]) {
                on_event(&SessionEvent {
                    session_id: self.session_id,
                    event: &event,
                });
            }
        };

        let summary = self.summary(stop_reason);
        for axis in &summary.axes {
            debug!(axis = %axis.axis, tamper = axis.tamper_count, "Axis stats");
        }
        summary
    }

    /// Snapshot of the counters and per-axis state
    pub fn summary(&self, stop_reason: StopReason) -> MonitorSummary {
        MonitorSummary {
            session_id: self.session_id,
            chunks_read: self.chunks_read,
            chunks_skipped: self.chunks_skipped,
            samples_decoded: self.demuxer.samples_decoded(),
            tamper_events: self.tamper_events,
            axes: self.stats(),
            stop_reason,
        }
    }

    pub fn stats(&self) -> Vec<AxisStats> {
        self.demuxer.stats()
    }

    pub fn demuxer(&self) -> &StreamDemuxer {
        &self.demuxer
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }
}
