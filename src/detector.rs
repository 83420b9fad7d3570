//! Per-axis adaptive baseline and hysteresis trigger
//!
//! Each axis accumulates samples until `max_samples` have been seen, freezes a
//! band of `threshold` around their average, then counts consecutive readings
//! that fall outside the band. A run of `max_window` readings on the same side
//! is a tamper event: the alert is played and the axis starts a new baseline
//! epoch from scratch.

use crate::alert::AlertSink;
use crate::types::{
    AlertConfig, Axis, AxisStats, Baseline, DetectorParams, RunDirection, TamperEvent,
};
use chrono::Utc;
use tracing::{debug, info};

/// Detection state for a single axis
#[derive(Debug, Clone)]
pub struct AxisDetector {
    axis: Axis,
    /// Sum of samples in the current epoch
    total: i64,
    sample_count: u64,
    baseline: Option<Baseline>,
    positive_run: u32,
    negative_run: u32,
    tamper_count: u64,
    params: DetectorParams,
    alert: AlertConfig,
}

impl AxisDetector {
    /// Create a detector with no baseline
    pub fn new(axis: Axis, params: DetectorParams, alert: AlertConfig) -> Self {
        Self {
            axis,
            total: 0,
            sample_count: 0,
            baseline: None,
            positive_run: 0,
            negative_run: 0,
            tamper_count: 0,
            params,
            alert,
        }
    }

    /// Feed one sample. Returns the tamper event if this sample completed a run.
    pub fn update(&mut self, sample: i16, sink: &dyn AlertSink) -> Option<TamperEvent> {
        self.accumulate(sample);
        self.establish_baseline();
        self.check_trigger(sample, sink)
    }

    fn accumulate(&mut self, sample: i16) {
        self.total = self.total.saturating_add(i64::from(sample));
        self.sample_count = self.sample_count.saturating_add(1);
    }

    fn has_enough_samples(&self) -> bool {
        self.sample_count >= self.params.max_samples
    }

    fn establish_baseline(&mut self) {
        if self.baseline.is_some() || !self.has_enough_samples() || self.sample_count == 0 {
            return;
        }

        // i64 division truncates toward zero; the average of i16 samples fits in i32
        let average = (self.total / self.sample_count as i64) as i32;
        let baseline = Baseline::around(average, self.params.threshold);
        self.baseline = Some(baseline);

        debug!(
            axis = %self.axis,
            average,
            threshold = self.params.threshold,
            min = baseline.min,
            max = baseline.max,
            "Baseline established"
        );
    }

    fn check_trigger(&mut self, sample: i16, sink: &dyn AlertSink) -> Option<TamperEvent> {
        if !self.has_enough_samples() {
            return None;
        }
        let baseline = self.baseline?;

        match baseline.classify(sample) {
            Some(RunDirection::Positive) => {
                self.positive_run += 1;
                self.negative_run = 0;
                debug!(
                    axis = %self.axis,
                    run = self.positive_run,
                    sample,
                    max = baseline.max,
                    count = self.sample_count,
                    "Sample above baseline"
                );
            }
            Some(RunDirection::Negative) => {
                self.positive_run = 0;
                self.negative_run += 1;
                debug!(
                    axis = %self.axis,
                    run = self.negative_run,
                    sample,
                    min = baseline.min,
                    count = self.sample_count,
                    "Sample below baseline"
                );
            }
            None => {
                self.positive_run = 0;
                self.negative_run = 0;
            }
        }

        let direction = if self.positive_run >= self.params.max_window {
            RunDirection::Positive
        } else if self.negative_run >= self.params.max_window {
            RunDirection::Negative
        } else {
            return None;
        };

        self.tamper_count += 1;
        info!(axis = %self.axis, tamper = self.tamper_count, ?direction, "Tamper detected");
        sink.play(&self.alert);
        self.reset();

        Some(TamperEvent {
            axis: self.axis,
            ordinal: self.tamper_count,
            direction,
            baseline,
            sample,
            detected_at: Utc::now(),
        })
    }

    /// Drop the baseline and start a new epoch
    fn reset(&mut self) {
        self.baseline = None;
        self.positive_run = 0;
        self.negative_run = 0;
        self.sample_count = 0;
        self.total = 0;
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    pub fn baseline(&self) -> Option<Baseline> {
        self.baseline
    }

    pub fn positive_run(&self) -> u32 {
        self.positive_run
    }

    pub fn negative_run(&self) -> u32 {
        self.negative_run
    }

    pub fn tamper_count(&self) -> u64 {
        self.tamper_count
    }

    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    pub fn alert(&self) -> &AlertConfig {
        &self.alert
    }

    pub fn stats(&self) -> AxisStats {
        AxisStats {
            axis: self.axis,
            tamper_count: self.tamper_count,
            epoch_samples: self.sample_count,
            baseline: self.baseline,
        }
    }
}
