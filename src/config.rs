//! Monitor configuration
//!
//! Everything the monitor needs is carried in [`MonitorConfig`] and handed to
//! the components that need it; there is no process-wide state.

use crate::device::{BUFFER_LENGTH, BUFFER_WATERMARK, DEFAULT_SYSFS_ROOT};
use crate::threshold::threshold;
use crate::types::{AlertConfig, DetectorParams};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default gyro character device
pub const DEFAULT_DEVICE_PATH: &str = "/dev/iio:device1";

/// Default sensitivity (percent of full range)
pub const DEFAULT_SENSITIVITY: i32 = 1;

/// Default number of samples averaged into a baseline
pub const DEFAULT_AVG_SAMPLES: u64 = 20;

/// Default number of consecutive out-of-band samples before tamper
pub const DEFAULT_MAX_WINDOW: u32 = 10;

/// Full monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Gyro character device to stream from
    pub device_path: PathBuf,
    /// Directory holding the gyro attribute files
    pub sysfs_root: PathBuf,
    /// Requested sensitivity (percent); out-of-range values fall back to threshold 1
    pub sensitivity: i32,
    pub params: DetectorParams,
    pub alert: AlertConfig,
    /// Spawn the alert player without waiting for it
    pub detach_alert: bool,
    /// Emit events and the summary as NDJSON
    pub json_output: bool,
    pub verbose: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVITY, DEFAULT_AVG_SAMPLES, DEFAULT_MAX_WINDOW)
    }
}

impl MonitorConfig {
    /// Build a configuration with derived detector parameters and default paths
    pub fn new(sensitivity: i32, avg_samples: u64, max_window: u32) -> Self {
        Self {
            device_path: PathBuf::from(DEFAULT_DEVICE_PATH),
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_ROOT),
            sensitivity,
            params: DetectorParams::new(avg_samples, max_window, threshold(sensitivity)),
            alert: AlertConfig::default(),
            detach_alert: false,
            json_output: false,
            verbose: false,
        }
    }

    pub fn with_device_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.device_path = path.into();
        self
    }

    pub fn with_sysfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sysfs_root = root.into();
        self
    }

    pub fn with_alert(mut self, alert: AlertConfig) -> Self {
        self.alert = alert;
        self
    }

    /// Log the effective configuration
    pub fn log_defaults(&self) {
        tracing::info!(
            watermark = BUFFER_WATERMARK,
            length = BUFFER_LENGTH,
            "FIFO defaults"
        );
        tracing::info!(
            play_tone = self.alert.enabled,
            tone_path = %self.alert.tone_path,
            detached = self.detach_alert,
            "Alert tone"
        );
        tracing::info!(
            device = %self.device_path.display(),
            sensitivity = self.sensitivity,
            threshold = self.params.threshold,
            avg_samples = self.params.max_samples,
            max_window = self.params.max_window,
            "Detector parameters"
        );
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
