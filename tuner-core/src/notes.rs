//! # Note Table
//!
//! Bidirectional mapping between note names and equal-tempered frequencies.
//! Semitones are counted from C0, so a note is fully described by its
//! semitone offset `h = 12 * octave + pitch_class`.
//!
//! ## Reference
//! - A4 = 440 Hz
//! - C0 = A4 * 2^(-4.75) (about 16.35 Hz)

use std::fmt;

use once_cell::sync::Lazy;

use crate::error::{TunerError, TunerResult};

/// Concert pitch reference.
pub const A4_FREQUENCY: f32 = 440.0;

/// Canonical note names, indexed by pitch class.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Frequency of C0, the origin of the semitone offsets.
pub static C0_FREQUENCY: Lazy<f32> = Lazy::new(|| A4_FREQUENCY * 2.0_f32.powf(-4.75));

/// One of the twelve pitch classes of the chromatic scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Position in [`NOTE_NAMES`], 0 for C through 11 for B.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        NOTE_NAMES[self.index()]
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Looks up one of the twelve canonical names ("C", "C#", ... "B").
    pub fn from_name(name: &str) -> Option<Self> {
        NOTE_NAMES
            .iter()
            .position(|candidate| *candidate == name)
            .and_then(Self::from_index)
    }
}

/// A quantized musical note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note {
    pub pitch_class: PitchClass,
    pub octave: i32,
    /// Semitone offset from C0.
    pub semitone: i32,
}

impl Note {
    /// Builds the note `h` semitones above C0 (below it when negative).
    ///
    /// Uses floor division, so `h = -1` is B in octave -1 rather than a
    /// negative index.
    pub fn from_semitone(semitone: i32) -> Option<Self> {
        let index = semitone.rem_euclid(12);
        let octave = semitone.div_euclid(12);
        if !(0..12).contains(&index) {
            return None;
        }
        let pitch_class = PitchClass::from_index(index as usize)?;
        Some(Self {
            pitch_class,
            octave,
            semitone,
        })
    }

    /// Name and octave, e.g. "A4" or "C#-1".
    pub fn label(&self) -> String {
        format!("{}{}", self.pitch_class.name(), self.octave)
    }

    /// MIDI note number (C0 = 12, A4 = 69).
    pub fn midi_number(&self) -> i32 {
        self.semitone + 12
    }

    /// Equal-tempered frequency of this note.
    pub fn frequency(&self) -> f32 {
        semitone_frequency(self.semitone)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch_class.name(), self.octave)
    }
}

fn semitone_frequency(semitone: i32) -> f32 {
    *C0_FREQUENCY * 2.0_f32.powf(semitone as f32 / 12.0)
}

/// Returns the reference frequency of `name` in `octave`.
///
/// # Arguments
/// * `name` - One of the canonical names, e.g. "A" or "C#"
/// * `octave` - Octave number, 4 for the octave of A440
///
/// # Returns
/// * `Ok(frequency)` - Equal-tempered frequency in Hz
///
/// # Errors
/// `InvalidNote` if `name` is not one of [`NOTE_NAMES`].
pub fn frequency_of(name: &str, octave: i32) -> TunerResult<f32> {
    let pitch_class = PitchClass::from_name(name).ok_or_else(|| TunerError::InvalidNote {
        name: name.to_string(),
    })?;
    Ok(semitone_frequency(12 * octave + pitch_class.index() as i32))
}

/// Maps a frequency to the nearest equal-tempered note.
///
/// # Arguments
/// * `frequency` - Measured frequency in Hz
///
/// # Returns
/// * `Ok(note)` - Nearest note; halfway values round away from zero
///
/// # Errors
/// `NoteUnrecognized` if the frequency is not a positive finite number.
pub fn note_of(frequency: f32) -> TunerResult<Note> {
    let unrecognized = TunerError::NoteUnrecognized {
        frequency: Some(frequency),
    };
    if !frequency.is_finite() || frequency <= 0.0 {
        return Err(unrecognized);
    }
    let semitone = (12.0 * (frequency / *C0_FREQUENCY).log2()).round();
    if !semitone.is_finite() {
        return Err(unrecognized);
    }
    Note::from_semitone(semitone as i32).ok_or(unrecognized)
}

/// Splits a label such as "A4", "C#3" or "B-1" into name and octave.
pub fn parse_note_label(label: &str) -> TunerResult<(&str, i32)> {
    let invalid = || TunerError::InvalidNote {
        name: label.to_string(),
    };
    let split = label
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == '-' || c.is_ascii_digit())
        .map(|(i, _)| i)
        .ok_or_else(invalid)?;
    let (name, octave) = label.split_at(split);
    let octave = octave.parse::<i32>().map_err(|_| invalid())?;
    Ok((name, octave))
}

/// Reference frequency of a label such as "E2".
pub fn frequency_of_label(label: &str) -> TunerResult<f32> {
    let (name, octave) = parse_note_label(label)?;
    frequency_of(name, octave)
}
