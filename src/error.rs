//! Error types for gyro-tamper

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing sensor attribute files
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Unable to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unable to write {value:?} to {path}: {source}")]
    Write {
        path: PathBuf,
        value: String,
        #[source]
        source: io::Error,
    },

    #[error("Attribute {0} is empty")]
    EmptyAttribute(PathBuf),
}

impl DeviceError {
    /// Whether the failure happened while changing the configuration rather
    /// than reading its state
    pub fn is_write(&self) -> bool {
        matches!(self, DeviceError::Write { .. })
    }
}

/// Errors raised while opening the sample stream
#[derive(Debug, Error)]
pub enum TamperError {
    #[error("Unable to open sample stream {path}: {source}")]
    StreamOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
