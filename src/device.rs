//! Gyro FIFO bring-up
//!
//! The sensor driver exposes its controls as attribute files. Before streaming,
//! the FIFO must be running with all three axes enabled. If it is already
//! running, the configuration is left alone.

use crate::error::DeviceError;
use crate::types::Axis;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Directory holding the gyro attribute files on the target image
pub const DEFAULT_SYSFS_ROOT: &str = "/var/volatile/udev/";

/// FIFO length written during bring-up
pub const BUFFER_LENGTH: u32 = 72;

/// FIFO watermark written during bring-up (must stay below the length)
pub const BUFFER_WATERMARK: u32 = 12;

const FIFO_ENABLE: &str = "gyro_fifo_enable";
const FIFO_LENGTH: &str = "gyro_fifo_length";
const FIFO_WATERMARK: &str = "gyro_fifo_watermark";

fn axis_attribute(axis: Axis) -> &'static str {
    match axis {
        Axis::X => "gyro_x_enable",
        Axis::Y => "gyro_y_enable",
        Axis::Z => "gyro_z_enable",
    }
}

/// Sensor/FIFO configuration operations
pub trait DeviceConfig {
    fn query_fifo_enabled(&self) -> Result<bool, DeviceError>;
    fn disable_fifo(&self) -> Result<(), DeviceError>;
    fn enable_fifo(&self) -> Result<(), DeviceError>;
    fn enable_axis(&self, axis: Axis) -> Result<(), DeviceError>;
    /// Must be called before [`DeviceConfig::set_buffer_watermark`]
    fn set_buffer_length(&self, length: u32) -> Result<(), DeviceError>;
    fn set_buffer_watermark(&self, watermark: u32) -> Result<(), DeviceError>;
}

/// Bring the FIFO up if it is not already running.
///
/// Returns `true` when the configuration sequence was performed, `false` when
/// the FIFO was already enabled. The first failing step aborts the sequence.
pub fn bring_up(device: &dyn DeviceConfig) -> Result<bool, DeviceError> {
    if device.query_fifo_enabled()? {
        return Ok(false);
    }
    configure_fifo(device)?;
    Ok(true)
}

/// Run the full configuration sequence unconditionally
fn configure_fifo(device: &dyn DeviceConfig) -> Result<(), DeviceError> {
    device.disable_fifo()?;
    for axis in Axis::ALL {
        device.enable_axis(axis)?;
    }
    // Length first: the driver rejects a watermark >= the current length
    device.set_buffer_length(BUFFER_LENGTH)?;
    device.set_buffer_watermark(BUFFER_WATERMARK)?;
    device.enable_fifo()
}

/// [`DeviceConfig`] backed by attribute files in a directory
#[derive(Debug, Clone)]
pub struct SysfsDevice {
    root: PathBuf,
}

impl Default for SysfsDevice {
    fn default() -> Self {
        Self::new(DEFAULT_SYSFS_ROOT)
    }
}

impl SysfsDevice {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn write_attribute(&self, name: &str, value: &str) -> Result<(), DeviceError> {
        let path = self.root.join(name);
        fs::write(&path, value).map_err(|source| {
            error!(path = %path.display(), "Unable to write attribute: {source}");
            DeviceError::Write {
                path,
                value: value.to_string(),
                source,
            }
        })
    }
}

impl DeviceConfig for SysfsDevice {
    fn query_fifo_enabled(&self) -> Result<bool, DeviceError> {
        let path = self.root.join(FIFO_ENABLE);
        let data = fs::read(&path).map_err(|source| {
            error!(path = %path.display(), "Unable to query FIFO: {source}");
            DeviceError::Read {
                path: path.clone(),
                source,
            }
        })?;

        let enabled = match data.first() {
            Some(b) => *b == b'1',
            None => return Err(DeviceError::EmptyAttribute(path)),
        };
        info!(enabled, "FIFO state");
        Ok(enabled)
    }

    fn disable_fifo(&self) -> Result<(), DeviceError> {
        self.write_attribute(FIFO_ENABLE, "0")?;
        info!("Disabling FIFO");
        Ok(())
    }

    fn enable_fifo(&self) -> Result<(), DeviceError> {
        self.write_attribute(FIFO_ENABLE, "1")?;
        info!("Enabling FIFO");
        Ok(())
    }

    fn enable_axis(&self, axis: Axis) -> Result<(), DeviceError> {
        self.write_attribute(axis_attribute(axis), "1")?;
        info!(%axis, "Enabled gyro axis");
        Ok(())
    }

    fn set_buffer_length(&self, length: u32) -> Result<(), DeviceError> {
        self.write_attribute(FIFO_LENGTH, &length.to_string())?;
        info!(length, "Set FIFO length");
        Ok(())
    }

    fn set_buffer_watermark(&self, watermark: u32) -> Result<(), DeviceError> {
        self.write_attribute(FIFO_WATERMARK, &watermark.to_string())?;
        info!(watermark, "Set FIFO watermark");
        Ok(())
    }
}
