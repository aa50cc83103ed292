//! # Pitch Detection Module
//!
//! Turns an analysed buffer into a note.
//!
//! ## Features
//! - Quantization of a dominant frequency to the nearest note
//! - YIN period estimation as an alternative to the spectral peak
//! - Parabolic interpolation for sub-bin / sub-sample accuracy

use crate::error::{TunerError, TunerResult};
use crate::notes::{self, Note};

/// Samples handed to the YIN estimator. Longer buffers are truncated; the
/// difference function is quadratic in this length.
pub const YIN_WINDOW: usize = 4096;

/// Maps an optional dominant frequency to the nearest note.
///
/// # Errors
/// `NoteUnrecognized` if the frequency is absent or cannot be placed on
/// the note table.
pub fn quantize(dominant_frequency: Option<f32>) -> TunerResult<Note> {
    let frequency =
        dominant_frequency.ok_or(TunerError::NoteUnrecognized { frequency: None })?;
    notes::note_of(frequency)
}

/// A YIN pitch estimator.
///
/// - Octave error prevention through a relative dip threshold
/// - Noise rejection using clarity checking
/// - Parabolic interpolation for sub-sample accuracy
///
/// Level gating is left to the caller.
///
/// # Returns
/// * `Some(frequency)` - Detected frequency in Hz
/// * `None` - No clear period in the signal
pub fn detect_pitch_yin(signal: &[f32], sample_rate: u32) -> Option<f32> {
    let frame_size = signal.len().min(YIN_WINDOW);
    let half = frame_size / 2;
    if half < 3 {
        return None;
    }
    let mut yin_buffer = vec![0.0f32; half];

    // --- Difference function ---
    for tau in 1..half {
        let mut diff = 0.0;
        for i in 0..half {
            let delta = signal[i] - signal[i + tau];
            diff += delta * delta;
        }
        yin_buffer[tau] = diff;
    }

    // --- Cumulative mean normalized difference ---
    let mut running_sum = 0.0;
    yin_buffer[0] = 1.0;
    for tau in 1..half {
        running_sum += yin_buffer[tau];
        if running_sum != 0.0 {
            yin_buffer[tau] *= tau as f32 / running_sum;
        } else {
            yin_buffer[tau] = 1.0;
        }
    }

    // --- First significant dip, followed down to its minimum ---
    let min_val = yin_buffer
        .iter()
        .skip(1)
        .cloned()
        .fold(f32::INFINITY, f32::min);
    let threshold = min_val + 0.05;

    let mut period = 0;
    for tau in 2..half {
        if yin_buffer[tau] < threshold && yin_buffer[tau] < yin_buffer[tau - 1] {
            period = tau;
            while period + 1 < half && yin_buffer[period + 1] < yin_buffer[period] {
                period += 1;
            }
            break;
        }
    }

    // A clear tone has a very low value at its period.
    const CLARITY_THRESHOLD: f32 = 0.1;
    if period == 0 || yin_buffer[period] > CLARITY_THRESHOLD {
        return None;
    }
    if period + 1 >= half {
        return None;
    }

    let y1 = yin_buffer[period - 1];
    let y2 = yin_buffer[period];
    let y3 = yin_buffer[period + 1];

    let period_float = if (y1 - 2.0 * y2 + y3) != 0.0 {
        let peak_shift = (y1 - y3) / (2.0 * (y1 - 2.0 * y2 + y3));
        period as f32 + peak_shift
    } else {
        period as f32
    };

    let frequency = sample_rate as f32 / period_float;
    if frequency.is_finite() && frequency > 0.0 {
        Some(frequency)
    } else {
        None
    }
}

/// Refines a frequency estimate using a magnitude spectrum.
///
/// Searches two bins either side of `rough_freq` for the local peak and fits
/// a parabola through the log magnitudes of its neighbours.
///
/// # Returns
/// The refined frequency, or `rough_freq` when no refinement is possible.
pub fn refine_from_spectrum(spectrum_magnitudes: &[f32], rough_freq: f32, bin_width: f32) -> f32 {
    if rough_freq <= 0.0 || bin_width <= 0.0 || spectrum_magnitudes.len() < 3 {
        return rough_freq;
    }
    let target_bin = rough_freq / bin_width;
    let search_radius = 2.0;
    let start_bin = (target_bin - search_radius).max(0.0) as usize;
    let end_bin = (target_bin + search_radius).min((spectrum_magnitudes.len() - 1) as f32) as usize;
    if start_bin >= end_bin { return rough_freq; }

    let peak_bin = spectrum_magnitudes[start_bin..=end_bin]
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(offset, _)| start_bin + offset);

    let Some(peak_bin) = peak_bin else {
        return rough_freq;
    };
    if peak_bin == 0 || peak_bin >= spectrum_magnitudes.len() - 1 { return rough_freq; }

    let y1 = spectrum_magnitudes[peak_bin - 1].ln();
    let y2 = spectrum_magnitudes[peak_bin].ln();
    let y3 = spectrum_magnitudes[peak_bin + 1].ln();

    if !y1.is_finite() || !y2.is_finite() || !y3.is_finite() { return rough_freq; }

    let denominator = 2.0 * y2 - y1 - y3;
    if denominator.abs() < 1e-6 { return rough_freq; }

    let peak_shift = (y3 - y1) / (2.0 * denominator);
    let final_freq = (peak_bin as f32 + peak_shift) * bin_width;

    if final_freq.is_finite() && final_freq > 0.0 {
        final_freq
    } else {
        rough_freq
    }
}
