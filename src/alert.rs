//! Alert playback
//!
//! Tamper events are announced by playing a tone through an external player.
//! The [`AlertSink`] trait is the seam between the detectors and the player.

use crate::types::AlertConfig;
use std::cell::RefCell;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Player used for tones on the target image
pub const DEFAULT_PLAYER: &str = "aplay";

/// Receiver for tamper alerts
pub trait AlertSink {
    /// Play the configured alert. Disabled alerts are a no-op.
    fn play(&self, alert: &AlertConfig);
}

/// Runs an external audio player for each alert.
///
/// In blocking mode the call returns when the player exits. Detached mode
/// spawns the player and returns immediately; alerts raised while a detached
/// player is still running are dropped so a burst never stacks players.
#[derive(Debug, Clone)]
pub struct CommandAlertSink {
    program: String,
    detached: bool,
    playing: Arc<AtomicBool>,
}

impl Default for CommandAlertSink {
    fn default() -> Self {
        Self::new(DEFAULT_PLAYER)
    }
}

impl CommandAlertSink {
    /// Create a blocking sink running `program <tone_path>`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            detached: false,
            playing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Spawn the player without waiting for it
    pub fn detached(mut self) -> Self {
        self.detached = true;
        self
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Whether a detached player is still running
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    fn command(&self, alert: &AlertConfig) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(&alert.tone_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }
}

impl AlertSink for CommandAlertSink {
    fn play(&self, alert: &AlertConfig) {
        if !alert.enabled {
            return;
        }

        let mut cmd = self.command(alert);

        if self.detached {
            if self.playing.swap(true, Ordering::AcqRel) {
                debug!(tone = %alert.tone_path, "Alert player still running, skipping");
                return;
            }
            match cmd.spawn() {
                Ok(mut child) => {
                    debug!(pid = child.id(), tone = %alert.tone_path, "Spawned alert player");
                    let playing = Arc::clone(&self.playing);
                    // Reap the player off the ingestion path
                    std::thread::spawn(move || {
                        let _ = child.wait();
                        playing.store(false, Ordering::Release);
                    });
                }
                Err(e) => {
                    self.playing.store(false, Ordering::Release);
                    warn!(player = %self.program, "Unable to play tone: {e}");
                }
            }
            return;
        }

        match cmd.status() {
            Ok(status) if status.success() => debug!(tone = %alert.tone_path, "Played alert tone"),
            Ok(status) => warn!(player = %self.program, "Alert player exited with {status}"),
            Err(e) => warn!(player = %self.program, "Unable to play tone: {e}"),
        }
    }
}

/// Sink that discards every alert
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentAlertSink;

impl AlertSink for SilentAlertSink {
    fn play(&self, _alert: &AlertConfig) {}
}

/// Sink that records enabled alerts instead of playing them
#[derive(Debug, Default)]
pub struct RecordingAlertSink {
    played: RefCell<Vec<AlertConfig>>,
}

impl RecordingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alerts played so far, oldest first
    pub fn played(&self) -> Vec<AlertConfig> {
        self.played.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.played.borrow().len()
    }
}

impl AlertSink for RecordingAlertSink {
    fn play(&self, alert: &AlertConfig) {
        if alert.enabled {
            self.played.borrow_mut().push(alert.clone());
        }
    }
}
