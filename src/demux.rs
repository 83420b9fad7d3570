//! Byte stream demultiplexing
//!
//! The gyro FIFO delivers interleaved little-endian s16 samples, two bytes per
//! axis in the order Gx, Gy, Gz:
//!
//! ```text
//! bytes: 0x74 0x56 | 0xD4 0xFC | 0xF5 0x01
//!   Gx = 0x5674 =>  22132
//!   Gy = 0xFCD4 =>   -812
//!   Gz = 0x01F5 =>    501
//! ```
//!
//! Only reads that return exactly one whole group are decoded; anything else
//! is dropped without touching the axis cycle.

use crate::alert::AlertSink;
use crate::cycle::AxisCycle;
use crate::detector::AxisDetector;
use crate::types::{AlertConfig, Axis, AxisStats, DetectorParams, TamperEvent};
use tracing::debug;

/// Bytes per sample
pub const SAMPLE_SIZE: usize = 2;

/// Bytes per X/Y/Z sample group
pub const GROUP_SIZE: usize = SAMPLE_SIZE * 3;

/// Merge a little-endian byte pair into a signed sample
pub fn decode_sample(low: u8, high: u8) -> i16 {
    ((u16::from(high) << 8) | u16::from(low)) as i16
}

/// Routes decoded samples to the three axis detectors
#[derive(Debug, Clone)]
pub struct StreamDemuxer {
    detectors: [AxisDetector; 3],
    cycle: AxisCycle,
    /// Undecoded bytes carried into the next accepted chunk
    carry: Vec<u8>,
    samples_decoded: u64,
}

impl StreamDemuxer {
    /// Create one detector per axis, all sharing `params` and `alert`
    pub fn new(params: DetectorParams, alert: AlertConfig) -> Self {
        Self {
            detectors: Axis::ALL.map(|axis| AxisDetector::new(axis, params, alert.clone())),
            cycle: AxisCycle::new(),
            carry: Vec::with_capacity(GROUP_SIZE),
            samples_decoded: 0,
        }
    }

    /// Decode one chunk as read from the device.
    ///
    /// Returns the tamper events fired while processing it, in stream order.
    pub fn feed(&mut self, chunk: &[u8], sink: &dyn AlertSink) -> Vec<TamperEvent> {
        let mut events = Vec::new();

        if chunk.len() != GROUP_SIZE {
            debug!(bytes = chunk.len(), expected = GROUP_SIZE, "Skipping chunk");
            return events;
        }

        let mut pending = std::mem::take(&mut self.carry);
        pending.extend_from_slice(chunk);

        let mut pairs = pending.chunks_exact(SAMPLE_SIZE);
        for pair in &mut pairs {
            let sample = decode_sample(pair[0], pair[1]);
            let axis = self.cycle.current();
            if let Some(event) = self.detectors[axis.index()].update(sample, sink) {
                events.push(event);
            }
            self.cycle.advance();
            self.samples_decoded += 1;
        }

        self.carry = pairs.remainder().to_vec();
        events
    }

    pub fn detector(&self, axis: Axis) -> &AxisDetector {
        &self.detectors[axis.index()]
    }

    pub fn detectors(&self) -> &[AxisDetector; 3] {
        &self.detectors
    }

    pub fn cycle(&self) -> AxisCycle {
        self.cycle
    }

    /// Bytes waiting to be prefixed to the next chunk
    pub fn pending(&self) -> usize {
        self.carry.len()
    }

    pub fn samples_decoded(&self) -> u64 {
        self.samples_decoded
    }

    pub fn stats(&self) -> Vec<AxisStats> {
        self.detectors.iter().map(AxisDetector::stats).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{RecordingAlertSink, SilentAlertSink};
    use crate::types::RunDirection;
    use pretty_assertions::assert_eq;

    const DOC_GROUP: [u8; 6] = [0x74, 0x56, 0xD4, 0xFC, 0xF5, 0x01];

    fn group(x: i16, y: i16, z: i16) -> Vec<u8> {
        [x, y, z].iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    /// Every sample establishes a zero-width band immediately
    fn eager_demuxer(max_window: u32) -> StreamDemuxer {
        StreamDemuxer::new(
            DetectorParams::new(1, max_window, 0),
            AlertConfig::new("/tmp/tone.wav", true),
        )
    }

    #[test]
    fn test_decode_sample() {
        assert_eq!(decode_sample(0x74, 0x56), 22132);
        assert_eq!(decode_sample(0xD4, 0xFC), -812);
        assert_eq!(decode_sample(0xF5, 0x01), 501);
        assert_eq!(decode_sample(0xFF, 0xFF), -1);
        assert_eq!(decode_sample(0x00, 0x80), i16::MIN);
    }

    #[test]
    fn test_documented_group_routes_by_axis() {
        let mut demux = eager_demuxer(10);
        let events = demux.feed(&DOC_GROUP, &SilentAlertSink);

        assert!(events.is_empty());
        assert_eq!(demux.detector(Axis::X).total(), 22132);
        assert_eq!(demux.detector(Axis::Y).total(), -812);
        assert_eq!(demux.detector(Axis::Z).total(), 501);
        assert_eq!(demux.cycle().current(), Axis::X);
        assert_eq!(demux.pending(), 0);
        assert_eq!(demux.samples_decoded(), 3);
    }

    #[test]
    fn test_wrong_length_chunks_are_dropped() {
        let mut demux = eager_demuxer(10);

        for len in [0, 1, 2, 5, 7, 12] {
            let chunk = vec![0x11; len];
            assert!(demux.feed(&chunk, &SilentAlertSink).is_empty());
        }

        for det in demux.detectors() {
            assert_eq!(det.sample_count(), 0);
        }
        assert_eq!(demux.cycle().current(), Axis::X);
        assert_eq!(demux.pending(), 0);
        assert_eq!(demux.samples_decoded(), 0);
    }

    #[test]
    fn test_groups_accumulate_per_axis() {
        let mut demux = StreamDemuxer::new(DetectorParams::new(3, 2, 2), AlertConfig::default());

        for (x, y, z) in [(10, 0, -5), (12, 0, -5), (11, 0, -5)] {
            demux.feed(&group(x, y, z), &SilentAlertSink);
        }

        let x = demux.detector(Axis::X);
        assert_eq!(x.sample_count(), 3);
        assert_eq!(x.baseline().map(|b| (b.min, b.max)), Some((9, 13)));
        assert_eq!(demux.detector(Axis::Z).total(), -15);
    }

    #[test]
    fn test_tamper_on_one_axis_keeps_cycle() {
        let sink = RecordingAlertSink::new();
        let mut demux = eager_demuxer(2);

        demux.feed(&group(0, 0, 0), &sink);
        assert!(demux.feed(&group(0, 50, 0), &sink).is_empty());
        let events = demux.feed(&group(0, 60, 0), &sink);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].axis, Axis::Y);
        assert_eq!(events[0].direction, RunDirection::Positive);
        assert_eq!(sink.count(), 1);

        assert_eq!(demux.cycle().current(), Axis::X);
        assert_eq!(demux.detector(Axis::Y).sample_count(), 0);
        assert_eq!(demux.detector(Axis::X).sample_count(), 3);

        // Next group still lands X, Y, Z
        demux.feed(&group(0, 7, 0), &sink);
        assert_eq!(demux.detector(Axis::Y).total(), 7);
    }

    #[test]
    fn test_events_in_stream_order() {
        let mut demux = eager_demuxer(1);
        demux.feed(&group(0, 0, 0), &SilentAlertSink);

        let events = demux.feed(&group(-9, 0, 9), &SilentAlertSink);
        let axes: Vec<Axis> = events.iter().map(|e| e.axis).collect();
        assert_eq!(axes, vec![Axis::X, Axis::Z]);
        assert_eq!(events[0].direction, RunDirection::Negative);
        assert_eq!(events[1].direction, RunDirection::Positive);
    }

    #[test]
    fn test_stats_cover_all_axes() {
        let demux = eager_demuxer(3);
        let axes: Vec<Axis> = demux.stats().iter().map(|s| s.axis).collect();
        assert_eq!(axes, Axis::ALL.to_vec());
    }
}
