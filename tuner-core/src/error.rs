//! # Error Types
//!
//! Failure taxonomy for one tuning cycle. None of these are fatal to a
//! session: the session keeps its last good reading and marks it stale.

use thiserror::Error;

/// Errors raised by the tuning pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TunerError {
    /// Mean absolute amplitude is below the configured gate.
    #[error("Signal too quiet: mean amplitude {mean:.2} below threshold {threshold:.2}")]
    SignalTooQuiet { mean: f32, threshold: f32 },

    /// The spectrum has no usable peak.
    #[error("Dominant frequency undefined: spectrum has no usable peak")]
    DominantFrequencyUndefined,

    /// The frequency is absent or does not map to a pitch class and octave.
    #[error("Note unrecognized for frequency {frequency:?}")]
    NoteUnrecognized { frequency: Option<f32> },

    /// A note name failed the reverse lookup.
    #[error("Invalid note: {name:?}")]
    InvalidNote { name: String },

    /// Configuration rejected by validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for tuner operations
pub type TunerResult<T> = Result<T, TunerError>;
