//! # Tuning Session
//!
//! Stateful orchestrator of the pipeline. Each call to
//! [`TuningSession::process`] runs one buffer through
//! gate → spectrum → quantizer → note table → classifier.
//!
//! A successful cycle replaces the snapshot. Any failure keeps the previous
//! reading and only raises the staleness flag, so the display can keep
//! showing the last good value while the string rings out.

use std::fmt;

use crate::config::{DetectionMethod, TunerConfig};
use crate::error::{TunerError, TunerResult};
use crate::fft::{self, SpectralAnalyzer};
use crate::gate::AmplitudeGate;
use crate::notes::{self, Note};
use crate::pitch;
use crate::tuning::{self, Instruction};
use crate::worker::BufferSource;
use crate::{AudioBuffer, CycleReport, SpectralResult};

/// Where the session stands after the latest cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No successful detection yet.
    Empty,
    /// Last detection kept, latest cycle inconclusive.
    Stale,
    /// Latest cycle succeeded.
    Tracking,
}

/// Result of one successful detection.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub note: Note,
    /// Equal-tempered frequency of `note`.
    pub target_frequency: f32,
    pub measured_frequency: f32,
    pub instruction: Instruction,
    /// Deviation from the target, for display.
    pub cents: f32,
}

impl Reading {
    /// Note with its target, e.g. "A4 (440.00 Hz)".
    pub fn note_label(&self) -> String {
        format!("{} ({:.2} Hz)", self.note, self.target_frequency)
    }

    /// Measured minus target, in Hz.
    pub fn deviation_hz(&self) -> f32 {
        self.measured_frequency - self.target_frequency
    }
}

/// What the display shows: the last reading and whether it is current.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TuningSnapshot {
    pub reading: Option<Reading>,
    pub stale: bool,
}

impl TuningSnapshot {
    pub fn state(&self) -> SessionState {
        match (&self.reading, self.stale) {
            (None, _) => SessionState::Empty,
            (Some(_), true) => SessionState::Stale,
            (Some(_), false) => SessionState::Tracking,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.reading.is_none()
    }
}

impl fmt::Display for TuningSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.reading, self.stale) {
            (None, _) => write!(f, "Volume below threshold, no data yet"),
            (Some(r), false) => write!(
                f,
                "Dominant frequency: {:.2} Hz | Note: {} | Instruction: {}",
                r.measured_frequency,
                r.note_label(),
                r.instruction
            ),
            (Some(r), true) => write!(
                f,
                "Last frequency: {:.2} Hz | Last note: {} | Last instruction: {}",
                r.measured_frequency,
                r.note_label(),
                r.instruction
            ),
        }
    }
}

/// Owns the pipeline components and the snapshot.
///
/// Single writer: only [`process`](Self::process) mutates the snapshot.
/// Readers get clones through [`CycleReport`] or [`snapshot`](Self::snapshot).
#[derive(Debug)]
pub struct TuningSession {
    config: TunerConfig,
    gate: AmplitudeGate,
    analyzer: SpectralAnalyzer,
    snapshot: TuningSnapshot,
    cycles: u64,
}

impl TuningSession {
    /// Validates `config` and plans the FFT for its buffer length.
    pub fn new(config: TunerConfig) -> TunerResult<Self> {
        config.validate()?;
        Ok(Self {
            gate: AmplitudeGate::new(config.amplitude_threshold),
            analyzer: SpectralAnalyzer::from_config(&config),
            snapshot: TuningSnapshot::default(),
            cycles: 0,
            config,
        })
    }

    pub fn config(&self) -> &TunerConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &TuningSnapshot {
        &self.snapshot
    }

    pub fn state(&self) -> SessionState {
        self.snapshot.state()
    }

    /// Cycles processed so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Runs one buffer through the pipeline.
    ///
    /// The spectrum is always computed so the display stays live, even when
    /// the buffer is too quiet to yield a note.
    ///
    /// # Arguments
    /// * `buffer` - One capture of `rate × duration` samples
    ///
    /// # Returns
    /// * `CycleReport` - The spectrum, the snapshot after this cycle and the
    ///   failure that kept the previous reading, if any
    ///
    /// # Panics
    /// If the buffer does not match the configured rate and length.
    pub fn process(&mut self, buffer: &AudioBuffer) -> CycleReport {
        assert_eq!(
            buffer.sample_rate,
            self.analyzer.sample_rate(),
            "buffer sample rate does not match the session"
        );
        assert_eq!(
            buffer.len(),
            self.analyzer.len(),
            "buffer has {} samples, analyzer expects {}",
            buffer.len(),
            self.analyzer.len()
        );
        self.cycles += 1;

        let mut spectrum = self.analyzer.analyze(&buffer.samples);
        let failure = match self.evaluate(&buffer.samples, &mut spectrum) {
            Ok(reading) => {
                self.snapshot = TuningSnapshot {
                    reading: Some(reading),
                    stale: false,
                };
                None
            }
            Err(e) => {
                self.snapshot.stale = true;
                Some(e)
            }
        };

        match &failure {
            None => log::debug!("cycle {}: {}", self.cycles, self.snapshot),
            Some(e) => log::debug!("cycle {}: {} ({})", self.cycles, self.snapshot, e),
        }

        CycleReport {
            spectrum,
            snapshot: self.snapshot.clone(),
            failure,
        }
    }

    /// One scheduler tick: pulls a buffer from `source` and processes it.
    /// `None` when the source has nothing more to give.
    pub fn run_cycle<S: BufferSource + ?Sized>(&mut self, source: &mut S) -> Option<CycleReport> {
        let buffer = source.next_buffer()?;
        Some(self.process(&buffer))
    }

    fn evaluate(&self, samples: &[f32], spectrum: &mut SpectralResult) -> TunerResult<Reading> {
        self.gate.check(samples)?;

        let measured = self.dominant_frequency(samples, spectrum)?;
        spectrum.dominant_frequency = Some(measured);

        let note = pitch::quantize(Some(measured))?;
        let target = notes::frequency_of(note.pitch_class.name(), note.octave)?;
        let instruction = tuning::classify(measured, target, self.config.tuning_margin_hz);

        Ok(Reading {
            note,
            target_frequency: target,
            measured_frequency: measured,
            instruction,
            cents: tuning::cents_deviation(measured, target),
        })
    }

    fn dominant_frequency(&self, samples: &[f32], spectrum: &SpectralResult) -> TunerResult<f32> {
        match self.config.detection {
            DetectionMethod::SpectralPeak => {
                let peak = fft::dominant_frequency(&spectrum.frequencies, &spectrum.magnitudes)?;
                if self.config.refine_peak {
                    Ok(pitch::refine_from_spectrum(
                        &spectrum.magnitudes,
                        peak,
                        self.analyzer.bin_width(),
                    ))
                } else {
                    Ok(peak)
                }
            }
            DetectionMethod::Yin => pitch::detect_pitch_yin(samples, self.config.sample_rate)
                .ok_or(TunerError::DominantFrequencyUndefined),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::PitchClass;

    fn config() -> TunerConfig {
        TunerConfig {
            sample_rate: 8000,
            capture_duration_ms: 1000,
            ..TunerConfig::default()
        }
    }

    fn tone(freq: f32, amplitude: f32, config: &TunerConfig) -> AudioBuffer {
        let rate = config.sample_rate;
        let samples = (0..config.buffer_len())
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / rate as f32).sin())
            .collect();
        AudioBuffer::new(samples, rate)
    }

    #[test]
    fn starts_empty() {
        let session = TuningSession::new(config()).unwrap();
        assert_eq!(session.state(), SessionState::Empty);
        assert!(session.snapshot().is_empty());
        assert_eq!(session.snapshot().to_string(), "Volume below threshold, no data yet");
    }

    #[test]
    fn rejects_invalid_config() {
        let bad = TunerConfig {
            amplitude_threshold: f32::NAN,
            ..config()
        };
        assert!(TuningSession::new(bad).is_err());
    }

    #[test]
    fn tracks_a_tone() {
        let config = config();
        let mut session = TuningSession::new(config.clone()).unwrap();
        let report = session.process(&tone(440.0, 10_000.0, &config));
        assert!(report.failure.is_none());
        assert_eq!(report.spectrum.dominant_frequency, Some(440.0));
        assert_eq!(session.state(), SessionState::Tracking);

        let reading = report.snapshot.reading.unwrap();
        assert_eq!(reading.note.pitch_class, PitchClass::A);
        assert_eq!(reading.instruction, Instruction::InTune);
        assert_eq!(reading.note_label(), "A4 (440.00 Hz)");
    }

    #[test]
    fn quiet_cycle_before_any_reading_stays_empty() {
        let config = config();
        let mut session = TuningSession::new(config.clone()).unwrap();
        let report = session.process(&tone(440.0, 10.0, &config));
        assert!(matches!(report.failure, Some(TunerError::SignalTooQuiet { .. })));
        assert_eq!(report.spectrum.dominant_frequency, None);
        assert_eq!(report.spectrum.magnitudes.len(), config.buffer_len() / 2);
        assert_eq!(session.state(), SessionState::Empty);
        assert!(report.snapshot.stale);
    }

    #[test]
    fn failure_after_tracking_goes_stale() {
        let config = config();
        let mut session = TuningSession::new(config.clone()).unwrap();
        session.process(&tone(330.0, 10_000.0, &config));
        let tracked = session.snapshot().reading.clone();

        session.process(&tone(330.0, 1.0, &config));
        assert_eq!(session.state(), SessionState::Stale);
        assert_eq!(session.snapshot().reading, tracked);
        assert!(session.snapshot().to_string().starts_with("Last frequency"));
    }

    #[test]
    fn yin_detection() {
        let config = TunerConfig {
            detection: DetectionMethod::Yin,
            ..config()
        };
        let mut session = TuningSession::new(config.clone()).unwrap();
        let report = session.process(&tone(196.0, 10_000.0, &config));
        let reading = report.snapshot.reading.expect("YIN should find G3");
        assert_eq!(reading.note.label(), "G3");
    }

    #[test]
    #[should_panic(expected = "sample rate")]
    fn mismatched_rate_panics() {
        let mut session = TuningSession::new(config()).unwrap();
        session.process(&AudioBuffer::new(vec![0.0; 8000], 44_100));
    }

    #[test]
    #[should_panic(expected = "analyzer expects")]
    fn mismatched_length_panics() {
        let mut session = TuningSession::new(config()).unwrap();
        session.process(&AudioBuffer::new(vec![0.0; 100], 8000));
    }
}
