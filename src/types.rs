//! Core types shared by the detection pipeline
//!
//! This module defines the axis identifiers, detector parameters, baselines and
//! the values emitted when a detector fires.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One of the three orthogonal rate-sensor channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes in stream order
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Position of the axis within a sample group
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Axis at the given group position (wraps modulo 3)
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters shared by every axis detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorParams {
    /// Samples averaged before a baseline is established
    pub max_samples: u64,
    /// Consecutive out-of-band samples that constitute tampering
    pub max_window: u32,
    /// Half-width of the baseline band (sample units)
    pub threshold: i32,
}

impl DetectorParams {
    pub fn new(max_samples: u64, max_window: u32, threshold: i32) -> Self {
        Self {
            max_samples,
            max_window,
            threshold,
        }
    }
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            max_samples: 20,
            max_window: 10,
            threshold: 1,
        }
    }
}

/// Alert tone configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Path to the tone played on tamper
    pub tone_path: String,
    /// Play the tone at all
    pub enabled: bool,
}

/// Default alert tone shipped on the target image
pub const DEFAULT_TONE_PATH: &str = "/usr/share/sounds/j2emu/9_ATSMTone.wav";

impl AlertConfig {
    pub fn new(tone_path: impl Into<String>, enabled: bool) -> Self {
        Self {
            tone_path: tone_path.into(),
            enabled,
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TONE_PATH, false)
    }
}

/// Accepted band around the rolling average
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    pub min: i32,
    pub max: i32,
}

impl Baseline {
    /// Band of `threshold` either side of `average`
    pub fn around(average: i32, threshold: i32) -> Self {
        Self {
            min: average.saturating_sub(threshold),
            max: average.saturating_add(threshold),
        }
    }

    /// Classify a sample against the band
    pub fn classify(&self, sample: i16) -> Option<RunDirection> {
        let sample = i32::from(sample);
        if sample > self.max {
            Some(RunDirection::Positive)
        } else if sample < self.min {
            Some(RunDirection::Negative)
        } else {
            None
        }
    }
}

/// Side of the baseline a run of readings fell on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunDirection {
    Positive,
    Negative,
}

/// A detected run of out-of-band samples on one axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TamperEvent {
    pub axis: Axis,
    /// Lifetime tamper count of the axis, including this event
    pub ordinal: u64,
    pub direction: RunDirection,
    /// Baseline that was crossed
    pub baseline: Baseline,
    /// Sample that completed the run
    pub sample: i16,
    pub detected_at: DateTime<Utc>,
}

/// Snapshot of one detector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisStats {
    pub axis: Axis,
    pub tamper_count: u64,
    /// Samples accumulated in the current baseline epoch
    pub epoch_samples: u64,
    pub baseline: Option<Baseline>,
}

/// Why the ingestion loop stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum StopReason {
    EndOfStream,
    ReadError(String),
}

/// Totals reported when the ingestion loop stops
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSummary {
    pub session_id: Uuid,
    pub chunks_read: u64,
    pub chunks_skipped: u64,
    pub samples_decoded: u64,
    pub tamper_events: u64,
    pub axes: Vec<AxisStats>,
    pub stop_reason: StopReason,
}
