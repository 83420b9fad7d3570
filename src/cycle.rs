//! Round-robin axis cursor

use crate::types::Axis;

/// Tracks which axis the next decoded sample belongs to.
///
/// The sensor FIFO interleaves samples X, Y, Z, X, ... and the stream is
/// assumed to start at X.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisCycle {
    position: usize,
}

impl AxisCycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Axis {
        Axis::from_index(self.position)
    }

    pub fn advance(&mut self) {
        self.position = (self.position + 1) % Axis::ALL.len();
    }
}
