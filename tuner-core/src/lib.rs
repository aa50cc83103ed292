// tuner-core/src/lib.rs

//! The core logic for the string tuner.
//! This crate is responsible for audio capture, spectral analysis, note
//! quantization and the tuning decision. It is completely headless
//! and contains no GUI code.

pub mod audio;
pub mod config;
pub mod error;
pub mod fft;
pub mod gate;
pub mod notes;
pub mod pitch;
pub mod session;
pub mod tuning;
pub mod worker;

use std::time::Duration;

pub use config::TunerConfig;
pub use error::{TunerError, TunerResult};
pub use notes::{Note, PitchClass};
pub use session::{Reading, SessionState, TuningSession, TuningSnapshot};
pub use tuning::Instruction;

/// One captured mono buffer.
///
/// Samples are in the capture format's native scale: whole 16-bit values
/// for an `I16` deployment, [-1, 1] for `F32`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    /// Widens 16-bit samples without rescaling them.
    pub fn from_i16(samples: &[i16], sample_rate: u32) -> Self {
        Self::new(samples.iter().map(|&s| s as f32).collect(), sample_rate)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Time span covered by the buffer. Zero for a zero sample rate.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }
}

/// One-sided spectrum of a buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectralResult {
    /// Bin positions in Hz, ascending.
    pub frequencies: Vec<f32>,
    /// Magnitude of each bin.
    pub magnitudes: Vec<f32>,
    /// Set only for audible buffers with a positive peak.
    pub dominant_frequency: Option<f32>,
}

/// Everything one cycle hands to the display.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub spectrum: SpectralResult,
    pub snapshot: TuningSnapshot,
    /// Why the cycle kept the previous reading, if it did.
    pub failure: Option<TunerError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_follows_sample_rate() {
        let buffer = AudioBuffer::new(vec![0.0; 22_050], 44_100);
        assert_eq!(buffer.duration(), Duration::from_millis(500));
    }

    #[test]
    fn zero_rate_buffer_has_no_duration() {
        let buffer = AudioBuffer::new(vec![0.0; 16], 0);
        assert_eq!(buffer.duration(), Duration::ZERO);
        assert_eq!(AudioBuffer::new(Vec::new(), 0).duration(), Duration::ZERO);
    }
}
