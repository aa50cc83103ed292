//! # Amplitude Gate
//!
//! Decides whether a captured buffer carries audible signal. The level is
//! the mean absolute sample value, compared in the buffer's native units.

use crate::error::{TunerError, TunerResult};

/// Mean absolute sample value, 0 for an empty slice.
pub fn mean_abs(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|s| s.abs() as f64).sum();
    (sum / samples.len() as f64) as f32
}

/// Noise gate with a configured threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmplitudeGate {
    threshold: f32,
}

impl AmplitudeGate {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// True when the mean level reaches the threshold. A level exactly at
    /// the threshold counts as audible.
    pub fn is_audible(&self, samples: &[f32]) -> bool {
        mean_abs(samples) >= self.threshold
    }

    /// Like [`is_audible`](Self::is_audible), reporting the measured level on
    /// rejection.
    pub fn check(&self, samples: &[f32]) -> TunerResult<f32> {
        let mean = mean_abs(samples);
        if mean >= self.threshold {
            Ok(mean)
        } else {
            Err(TunerError::SignalTooQuiet {
                mean,
                threshold: self.threshold,
            })
        }
    }
}
