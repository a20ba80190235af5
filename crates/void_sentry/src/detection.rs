//! Detection meter
//!
//! A bounded suspicion accumulator fed by perception. Reaching the threshold
//! escalates once; the latch re-arms only after the meter drains back to 0.

use crate::config::{DetectionConfig, MIN_DETECTION_THRESHOLD};
use serde::{Deserialize, Serialize};

/// Meter state after an update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionReading {
    /// Current meter value
    pub meter: f32,
    /// True only on the update that first reached the threshold
    pub escalated: bool,
}

/// Bounded suspicion meter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionMeter {
    value: f32,
    threshold: f32,
    gain: f32,
    lose: f32,
    /// Set once the threshold has been reached, cleared at 0
    latched: bool,
}

impl DetectionMeter {
    /// Create a new meter
    ///
    /// Non-finite tunables fall back to the defaults; the threshold is kept
    /// above zero and the rates are never negative.
    pub fn new(threshold: f32, gain: f32, lose: f32) -> Self {
        let defaults = DetectionConfig::default();
        Self {
            value: 0.0,
            threshold: finite_at_least(threshold, defaults.threshold, MIN_DETECTION_THRESHOLD),
            gain: finite_at_least(gain, defaults.gain, 0.0),
            lose: finite_at_least(lose, defaults.lose, 0.0),
            latched: false,
        }
    }

    /// Integrate one tick of visibility
    pub fn update(&mut self, visible: bool, delta_time: f32) -> DetectionReading {
        if visible {
            self.value = (self.value + self.gain * delta_time).min(self.threshold).max(0.0);
        } else {
            self.value = (self.value - self.lose * delta_time).max(0.0);
        }

        if self.value <= 0.0 {
            self.latched = false;
        }

        let escalated = !self.latched && self.value >= self.threshold;
        if escalated {
            self.latched = true;
        }

        DetectionReading {
            meter: self.value,
            escalated,
        }
    }

    /// Drop the meter to 0 and re-arm escalation
    pub fn reset(&mut self) {
        self.value = 0.0;
        self.latched = false;
    }

    /// Current meter value
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Escalation threshold
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Meter as a fraction of the threshold
    pub fn fraction(&self) -> f32 {
        self.value / self.threshold
    }

    /// Whether escalation already fired for the current rise
    pub fn is_latched(&self) -> bool {
        self.latched
    }
}

fn finite_at_least(value: f32, fallback: f32, min: f32) -> f32 {
    if value.is_finite() {
        value.max(min)
    } else {
        fallback
    }
}

impl From<&DetectionConfig> for DetectionMeter {
    fn from(config: &DetectionConfig) -> Self {
        Self::new(config.threshold, config.gain, config.lose)
    }
}
