//! # Fast Fourier Transform (FFT) Module
//!
//! One-sided magnitude spectrum of a captured buffer and its dominant bin.
//!
//! ## Features
//! - RustFFT plan built once per buffer length
//! - Optional Hann windowing and DC offset removal
//! - Bin k sits at k * R / N for k in [0, N/2)

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::config::{TunerConfig, WindowFunction};
use crate::error::{TunerError, TunerResult};
use crate::SpectralResult;

/// Removes the DC offset from a signal by making its average value zero.
fn remove_dc_offset(signal: &mut [f32]) {
    let len = signal.len();
    if len == 0 { return; }
    let avg = signal.iter().sum::<f32>() / len as f32;
    if avg.abs() > 1e-6 {
        for sample in signal.iter_mut() {
            *sample -= avg;
        }
    }
}

/// Applies a Hann window to the input buffer to reduce spectral leakage.
fn apply_hann_window(buffer: &mut [f32]) {
    let n = buffer.len();
    if n < 2 { return; }
    let n_minus_1 = (n - 1) as f32;
    for (i, sample) in buffer.iter_mut().enumerate() {
        let multiplier = 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n_minus_1).cos());
        *sample *= multiplier;
    }
}

/// Computes spectra for buffers of one fixed length and sample rate.
pub struct SpectralAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    len: usize,
    sample_rate: u32,
    window: WindowFunction,
    remove_dc: bool,
}

impl std::fmt::Debug for SpectralAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralAnalyzer")
            .field("len", &self.len)
            .field("sample_rate", &self.sample_rate)
            .field("window", &self.window)
            .field("remove_dc", &self.remove_dc)
            .finish()
    }
}

impl SpectralAnalyzer {
    /// Plans a forward FFT of `len` points.
    ///
    /// # Panics
    /// If `len < 2` or `sample_rate == 0`.
    pub fn new(len: usize, sample_rate: u32, window: WindowFunction, remove_dc: bool) -> Self {
        assert!(len >= 2, "spectral analysis needs at least 2 samples, got {len}");
        assert!(sample_rate > 0, "sample rate must be positive");
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(len);
        Self {
            fft,
            len,
            sample_rate,
            window,
            remove_dc,
        }
    }

    pub fn from_config(config: &TunerConfig) -> Self {
        Self::new(
            config.buffer_len(),
            config.sample_rate,
            config.window,
            config.remove_dc_offset,
        )
    }

    /// Number of samples expected per buffer.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frequency spacing between two bins.
    pub fn bin_width(&self) -> f32 {
        self.sample_rate as f32 / self.len as f32
    }

    /// Performs a forward FFT on a signal and returns the full complex spectrum.
    ///
    /// # Panics
    /// If the signal length differs from the planned length.
    pub fn perform_fft(&self, signal: &[f32]) -> Vec<Complex<f32>> {
        assert_eq!(
            signal.len(),
            self.len,
            "input frame has {} samples, analyzer expects {}",
            signal.len(),
            self.len
        );

        let mut processed_signal = signal.to_vec();
        if self.remove_dc {
            remove_dc_offset(&mut processed_signal);
        }
        if self.window == WindowFunction::Hann {
            apply_hann_window(&mut processed_signal);
        }

        let mut buffer: Vec<Complex<f32>> = processed_signal
            .into_iter()
            .map(|sample| Complex { re: sample, im: 0.0 })
            .collect();

        self.fft.process(&mut buffer);
        buffer
    }

    /// One-sided spectrum of `signal`. The dominant frequency is left unset;
    /// callers fill it once the buffer passed the gate.
    pub fn analyze(&self, signal: &[f32]) -> SpectralResult {
        let spectrum = self.perform_fft(signal);
        SpectralResult {
            frequencies: bin_frequencies(self.len, self.sample_rate),
            magnitudes: spectrum_to_magnitudes(&spectrum),
            dominant_frequency: None,
        }
    }
}

/// Magnitudes of the non-negative frequency half of a spectrum.
pub fn spectrum_to_magnitudes(spectrum: &[Complex<f32>]) -> Vec<f32> {
    spectrum
        .iter()
        .take(spectrum.len() / 2)
        .map(|c| c.norm()) // .norm() is sqrt(re^2 + im^2)
        .collect()
}

/// Positions `k * R / N` of the first `N / 2` bins.
pub fn bin_frequencies(len: usize, sample_rate: u32) -> Vec<f32> {
    let step = sample_rate as f64 / len as f64;
    (0..len / 2).map(|k| (k as f64 * step) as f32).collect()
}

/// Index of the largest magnitude. Ties resolve to the lowest bin.
pub fn peak_bin(magnitudes: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &magnitude) in magnitudes.iter().enumerate() {
        if !magnitude.is_finite() {
            continue;
        }
        match best {
            Some((_, max)) if magnitude <= max => {}
            _ => best = Some((i, magnitude)),
        }
    }
    best.map(|(i, _)| i)
}

/// Frequency of the strongest bin.
///
/// # Errors
/// `DominantFrequencyUndefined` if no bin has a positive finite magnitude.
pub fn dominant_frequency(frequencies: &[f32], magnitudes: &[f32]) -> TunerResult<f32> {
    let bin = peak_bin(magnitudes).ok_or(TunerError::DominantFrequencyUndefined)?;
    if magnitudes[bin] <= 0.0 {
        return Err(TunerError::DominantFrequencyUndefined);
    }
    frequencies
        .get(bin)
        .copied()
        .ok_or(TunerError::DominantFrequencyUndefined)
}
