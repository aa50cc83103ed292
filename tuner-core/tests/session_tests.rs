//! End-to-end checks of the tuning cycle on synthetic buffers.

use approx::assert_abs_diff_eq;
use tuner_core::config::{DetectionMethod, SampleFormat, WindowFunction};
use tuner_core::notes::{self, PitchClass};
use tuner_core::tuning::{self, Instruction};
use tuner_core::{AudioBuffer, SessionState, TunerConfig, TunerError, TuningSession};

/// 4 kHz, one-second buffers: 1 Hz bins, cheap FFTs.
fn test_config() -> TunerConfig {
    TunerConfig {
        sample_rate: 4000,
        capture_duration_ms: 1000,
        ..TunerConfig::default()
    }
}

fn sine(freq: f32, amplitude: f32, config: &TunerConfig) -> AudioBuffer {
    let rate = config.sample_rate as f32;
    let samples = (0..config.buffer_len())
        .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / rate).sin())
        .collect();
    AudioBuffer::new(samples, config.sample_rate)
}

fn constant(value: f32, config: &TunerConfig) -> AudioBuffer {
    AudioBuffer::new(vec![value; config.buffer_len()], config.sample_rate)
}

#[test]
fn quiet_buffers_never_surface_a_frequency() {
    let config = test_config();
    let mut session = TuningSession::new(config.clone()).unwrap();
    for amplitude in [0.0, 10.0, 100.0, 400.0] {
        // A sine's mean |x| is 2A/pi, so 400 stays under the 300 gate.
        let report = session.process(&sine(440.0, amplitude, &config));
        assert_eq!(report.spectrum.dominant_frequency, None);
        assert!(matches!(report.failure, Some(TunerError::SignalTooQuiet { .. })));
        assert!(report.snapshot.reading.is_none());
    }
    assert_eq!(session.state(), SessionState::Empty);
}

#[test]
fn spectrum_is_published_even_when_quiet() {
    let config = test_config();
    let mut session = TuningSession::new(config.clone()).unwrap();
    let report = session.process(&sine(440.0, 100.0, &config));
    assert_eq!(report.spectrum.frequencies.len(), 2000);
    let peak = tuner_core::fft::peak_bin(&report.spectrum.magnitudes).unwrap();
    assert_eq!(report.spectrum.frequencies[peak], 440.0);
}

#[test]
fn a440_is_in_tune() {
    let config = test_config();
    let mut session = TuningSession::new(config.clone()).unwrap();
    let report = session.process(&sine(440.0, 8000.0, &config));

    let reading = report.snapshot.reading.expect("A4 should be detected");
    assert_eq!(reading.note.pitch_class, PitchClass::A);
    assert_eq!(reading.note.octave, 4);
    assert_abs_diff_eq!(reading.target_frequency, 440.0, epsilon = 1e-3);
    assert_eq!(reading.measured_frequency, 440.0);
    assert_eq!(reading.instruction, Instruction::InTune);
    assert!(!report.snapshot.stale);
}

#[test]
fn sharp_a_is_loosened() {
    let config = test_config();
    let mut session = TuningSession::new(config.clone()).unwrap();
    let report = session.process(&sine(445.0, 8000.0, &config));

    let reading = report.snapshot.reading.unwrap();
    assert_eq!(reading.note.label(), "A4");
    assert_abs_diff_eq!(reading.deviation_hz(), 5.0, epsilon = 1e-3);
    assert_eq!(reading.instruction, Instruction::Loosen);
    assert!(reading.cents > 0.0);
}

#[test]
fn flat_low_e_is_tightened() {
    let config = TunerConfig {
        tuning_margin_hz: 1.0,
        ..test_config()
    };
    let mut session = TuningSession::new(config.clone()).unwrap();
    let report = session.process(&sine(81.0, 8000.0, &config));

    let reading = report.snapshot.reading.unwrap();
    assert_eq!(reading.note.label(), "E2");
    assert_eq!(reading.instruction, Instruction::Tighten);
}

#[test]
fn zero_hz_peak_keeps_previous_snapshot() {
    let config = test_config();
    let mut session = TuningSession::new(config.clone()).unwrap();
    session.process(&sine(330.0, 8000.0, &config));
    let before = session.snapshot().reading.clone();
    assert!(before.is_some());

    // A loud DC offset passes the gate but peaks at 0 Hz.
    let report = session.process(&constant(1000.0, &config));
    assert_eq!(report.spectrum.dominant_frequency, Some(0.0));
    assert_eq!(
        report.failure,
        Some(TunerError::NoteUnrecognized { frequency: Some(0.0) })
    );
    assert_eq!(report.snapshot.reading, before);
    assert!(report.snapshot.stale);
    assert_eq!(session.state(), SessionState::Stale);
}

#[test]
fn negative_frequency_is_unrecognized() {
    assert!(matches!(
        notes::note_of(-82.41),
        Err(TunerError::NoteUnrecognized { .. })
    ));
}

#[test]
fn repeated_quiet_cycles_are_idempotent() {
    let config = test_config();
    let mut session = TuningSession::new(config.clone()).unwrap();
    let tracked = session.process(&sine(196.0, 8000.0, &config)).snapshot;
    assert_eq!(tracked.state(), SessionState::Tracking);

    let quiet = sine(196.0, 5.0, &config);
    for _ in 0..5 {
        let report = session.process(&quiet);
        assert_eq!(report.snapshot.reading, tracked.reading);
        assert!(report.snapshot.stale);
    }
    assert_eq!(session.cycles(), 6);
}

#[test]
fn recovers_from_stale_to_tracking() {
    let config = test_config();
    let mut session = TuningSession::new(config.clone()).unwrap();
    session.process(&sine(110.0, 8000.0, &config));
    session.process(&constant(0.0, &config));
    assert_eq!(session.state(), SessionState::Stale);

    let report = session.process(&sine(147.0, 8000.0, &config));
    assert_eq!(session.state(), SessionState::Tracking);
    assert_eq!(report.snapshot.reading.unwrap().note.label(), "D3");
}

#[test]
fn margin_boundary_through_note_table() {
    let target = notes::frequency_of("A", 4).unwrap();
    let margin = 0.5;
    assert_eq!(tuning::classify(target + margin, target, margin), Instruction::InTune);
    assert_eq!(tuning::classify(target + margin + 0.01, target, margin), Instruction::Loosen);
    assert_eq!(tuning::classify(target - margin - 0.01, target, margin), Instruction::Tighten);
}

#[test]
fn float_deployment_with_refinement() {
    let config = TunerConfig {
        sample_format: SampleFormat::F32,
        amplitude_threshold: 0.01,
        refine_peak: true,
        window: WindowFunction::Hann,
        tuning_margin_hz: 2.0,
        ..test_config()
    };
    let mut session = TuningSession::new(config.clone()).unwrap();
    let report = session.process(&sine(246.6, 0.5, &config));

    let reading = report.snapshot.reading.unwrap();
    assert_eq!(reading.note.label(), "B3");
    assert_abs_diff_eq!(reading.measured_frequency, 246.6, epsilon = 0.2);
    assert_eq!(reading.instruction, Instruction::InTune);
}

#[test]
fn yin_agrees_with_spectral_peak() {
    let spectral = test_config();
    let yin = TunerConfig {
        detection: DetectionMethod::Yin,
        ..test_config()
    };
    let buffer = sine(330.0, 8000.0, &spectral);

    let a = TuningSession::new(spectral).unwrap().process(&buffer);
    let b = TuningSession::new(yin).unwrap().process(&buffer);
    let (a, b) = (a.snapshot.reading.unwrap(), b.snapshot.reading.unwrap());
    assert_eq!(a.note, b.note);
    assert_abs_diff_eq!(a.measured_frequency, b.measured_frequency, epsilon = 2.0);
}

#[test]
fn i16_buffers_keep_native_scale() {
    let config = test_config();
    let samples: Vec<i16> = (0..config.buffer_len())
        .map(|i| {
            (10_000.0 * (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 4000.0).sin()) as i16
        })
        .collect();
    let buffer = AudioBuffer::from_i16(&samples, config.sample_rate);
    assert_eq!(buffer.duration(), std::time::Duration::from_secs(1));

    let mut session = TuningSession::new(config).unwrap();
    let reading = session.process(&buffer).snapshot.reading.unwrap();
    assert_eq!(reading.note.label(), "A3");
}
