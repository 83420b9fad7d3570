//! Sensitivity to threshold conversion
//!
//! The sensitivity is a percentage of the full sample range. Only 1-10% is
//! accepted; anything else collapses to the tightest possible band.

/// Full unsigned range of a 16-bit sample
pub const SAMPLE_MAX_MAGNITUDE: i32 = 0xFFFF;

/// Lowest accepted sensitivity (percent)
pub const MIN_SENSITIVITY: i32 = 1;

/// Highest accepted sensitivity (percent)
pub const MAX_SENSITIVITY: i32 = 10;

/// Threshold used when the sensitivity is out of range
pub const FALLBACK_THRESHOLD: i32 = 1;

/// Convert a sensitivity percentage into an absolute threshold in sample units.
///
/// `floor(percent / 100 * 65535)` for percentages in `1..=10`, otherwise `1`.
pub fn threshold(sensitivity_percent: i32) -> i32 {
    if (MIN_SENSITIVITY..=MAX_SENSITIVITY).contains(&sensitivity_percent) {
        // Integer arithmetic is exact here and floors like the float form
        sensitivity_percent * SAMPLE_MAX_MAGNITUDE / 100
    } else {
        FALLBACK_THRESHOLD
    }
}
