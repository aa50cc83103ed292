//! # Configuration Module
//!
//! Every tunable constant of the tuner lives in [`TunerConfig`]. The
//! defaults reproduce a 16-bit, 44.1 kHz, one-second-per-cycle deployment.
//! A configuration can be loaded from a JSON file so nothing needs to be
//! recompiled to retune the gate or the margin for another microphone.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{TunerError, TunerResult};

/// Environment variable naming a JSON configuration file.
pub const CONFIG_ENV_VAR: &str = "STRING_TUNER_CONFIG";

/// File looked up in the working directory when the variable is unset.
pub const DEFAULT_CONFIG_FILE: &str = "tuner_config.json";

/// Sample format delivered by the capture device.
///
/// Samples keep their native scale: `I16` values range over
/// `[-32768, 32767]`, `F32` values over `[-1.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleFormat {
    I16,
    F32,
}

/// Strategy used to find the dominant frequency of an audible buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionMethod {
    /// Frequency of the largest magnitude bin.
    SpectralPeak,
    /// YIN period estimate in the time domain.
    Yin,
}

/// Window applied to the buffer before the FFT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowFunction {
    Rectangular,
    Hann,
}

/// Configuration surface of the tuner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Frames read from the device per callback/read.
    pub chunk_size: usize,
    /// Duration of one captured buffer.
    pub capture_duration_ms: u64,
    /// Interval of the display tick.
    pub tick_interval_ms: u64,
    pub sample_format: SampleFormat,
    /// Minimum mean absolute sample value, in native sample units.
    ///
    /// Around 300 suits a 16-bit deployment; an `F32` deployment needs a
    /// value on the [-1, 1] scale such as 0.01.
    pub amplitude_threshold: f32,
    /// Absolute tolerance in Hz around the target frequency.
    pub tuning_margin_hz: f32,
    pub detection: DetectionMethod,
    /// Interpolate the spectral peak between bins.
    pub refine_peak: bool,
    pub window: WindowFunction,
    pub remove_dc_offset: bool,
    /// Upper bound of the plotted spectrum.
    pub display_max_frequency_hz: f32,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            chunk_size: 1024,
            capture_duration_ms: 1000,
            tick_interval_ms: 1000,
            sample_format: SampleFormat::I16,
            amplitude_threshold: 300.0,
            tuning_margin_hz: 0.5,
            detection: DetectionMethod::SpectralPeak,
            refine_peak: false,
            window: WindowFunction::Rectangular,
            remove_dc_offset: false,
            display_max_frequency_hz: 2000.0,
        }
    }
}

impl TunerConfig {
    /// Number of samples in one captured buffer (`rate × duration`).
    pub fn buffer_len(&self) -> usize {
        (self.sample_rate as u64 * self.capture_duration_ms / 1000) as usize
    }

    pub fn capture_duration(&self) -> Duration {
        Duration::from_millis(self.capture_duration_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Checks that the configuration describes a usable pipeline.
    pub fn validate(&self) -> TunerResult<()> {
        if self.sample_rate == 0 {
            return Err(TunerError::InvalidConfig("sample_rate must be positive".into()));
        }
        if self.chunk_size == 0 {
            return Err(TunerError::InvalidConfig("chunk_size must be positive".into()));
        }
        if self.capture_duration_ms == 0 || self.tick_interval_ms == 0 {
            return Err(TunerError::InvalidConfig(
                "capture duration and tick interval must be positive".into(),
            ));
        }
        if self.buffer_len() < 2 {
            return Err(TunerError::InvalidConfig(format!(
                "buffer of {} samples is too short for analysis",
                self.buffer_len()
            )));
        }
        if !self.amplitude_threshold.is_finite() || self.amplitude_threshold < 0.0 {
            return Err(TunerError::InvalidConfig(format!(
                "amplitude_threshold must be a non-negative number, got {}",
                self.amplitude_threshold
            )));
        }
        if !self.tuning_margin_hz.is_finite() || self.tuning_margin_hz < 0.0 {
            return Err(TunerError::InvalidConfig(format!(
                "tuning_margin_hz must be a non-negative number, got {}",
                self.tuning_margin_hz
            )));
        }
        Ok(())
    }

    /// Loads and validates a configuration from a JSON file.
    ///
    /// Missing fields fall back to their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .with_context(|| format!("opening config file {}", path.display()))?;
        let mut data = String::new();
        file.read_to_string(&mut data)?;
        let config: TunerConfig = serde_json::from_str(&data)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file named by [`CONFIG_ENV_VAR`], else [`DEFAULT_CONFIG_FILE`]
    /// if it exists, else returns the defaults.
    pub fn load_or_default() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            log::info!("Loading configuration from ${CONFIG_ENV_VAR} = {path}");
            return Self::load(path);
        }
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            log::info!("Loading configuration from {DEFAULT_CONFIG_FILE}");
            return Self::load(DEFAULT_CONFIG_FILE);
        }
        log::info!("No configuration file found, using defaults");
        Ok(Self::default())
    }
}
