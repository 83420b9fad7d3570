//! gyro-tamper - Tamper detection for 3-axis gyroscope FIFOs
//!
//! The gyro streams interleaved little-endian s16 samples. Each axis keeps an
//! adaptive baseline; a sustained run of readings outside it is reported as
//! tampering and announced with an alert tone:
//! device stream → demultiplexing → per-axis detection → alert.
//!
//! ## Modules
//!
//! - **Detection**: [`threshold`], [`detector`], [`cycle`], [`demux`]
//! - **Collaborators**: [`device`] (FIFO bring-up), [`alert`] (tone playback)
//! - **Runtime**: [`config`], [`pipeline`]

pub mod alert;
pub mod config;
pub mod cycle;
pub mod demux;
pub mod detector;
pub mod device;
pub mod error;
pub mod pipeline;
pub mod threshold;
pub mod types;

pub use alert::{AlertSink, CommandAlertSink, RecordingAlertSink, SilentAlertSink};
pub use config::MonitorConfig;
pub use cycle::AxisCycle;
pub use demux::StreamDemuxer;
pub use detector::AxisDetector;
pub use device::{bring_up, DeviceConfig, SysfsDevice};
pub use error::{DeviceError, TamperError};
pub use pipeline::{open_device, TamperMonitor};
pub use threshold::threshold;
pub use types::{Axis, MonitorSummary, TamperEvent};

/// Version embedded in the startup banner and summaries
pub const TAMPER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commit the binary was built from, when provided at build time
pub const GIT_COMMIT: Option<&str> = option_env!("TAMPER_GIT_COMMIT");

/// Build date, when provided at build time
pub const BUILD_DATE: Option<&str> = option_env!("TAMPER_BUILD_DATE");
