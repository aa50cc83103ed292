//! # Tuning Decision Module
//!
//! Compares a measured frequency with the target note and tells the player
//! which way to turn the peg. The tolerance is an absolute margin in Hz, so
//! the same margin is looser (in cents) for low strings than for high ones.

use std::fmt;

/// What the player should do with the string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// Within the margin of the target.
    InTune,
    /// Flat: raise the tension.
    Tighten,
    /// Sharp: slacken the string.
    Loosen,
}

impl Instruction {
    pub fn is_in_tune(self) -> bool {
        self == Instruction::InTune
    }

    /// Text shown to the player.
    pub fn describe(self) -> &'static str {
        match self {
            Instruction::InTune => "In tune",
            Instruction::Tighten => "Tighten the string",
            Instruction::Loosen => "Loosen the string",
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Three-way classification of `measured` against `target`.
///
/// A difference of exactly `margin` in either direction is still in tune.
///
/// # Arguments
/// * `measured` - Detected frequency in Hz
/// * `target` - Frequency of the nearest note in Hz
/// * `margin` - Absolute tolerance in Hz
///
/// # Returns
/// * `Instruction::Tighten` - Flat by more than the margin
/// * `Instruction::Loosen` - Sharp by more than the margin
/// * `Instruction::InTune` - Otherwise
pub fn classify(measured: f32, target: f32, margin: f32) -> Instruction {
    let difference = measured - target;
    if difference.abs() <= margin {
        Instruction::InTune
    } else if difference > margin {
        Instruction::Loosen
    } else {
        Instruction::Tighten
    }
}

/// Calculates the deviation from a target frequency in cents.
///
/// Positive values are sharp, negative values flat. Display only; the
/// tuning decision uses [`classify`].
pub fn cents_deviation(freq: f32, target_freq: f32) -> f32 {
    1200.0 * (freq / target_freq).log2()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn exact_match_is_in_tune() {
        assert_eq!(classify(440.0, 440.0, 0.5), Instruction::InTune);
        assert_eq!(classify(440.0, 440.0, 0.0), Instruction::InTune);
    }

    #[test]
    fn margin_boundary_is_in_tune() {
        let (target, margin) = (440.0, 0.5);
        assert_eq!(classify(target + margin, target, margin), Instruction::InTune);
        assert_eq!(classify(target - margin, target, margin), Instruction::InTune);
        assert_eq!(classify(target + margin + 0.01, target, margin), Instruction::Loosen);
        assert_eq!(classify(target - margin - 0.01, target, margin), Instruction::Tighten);
    }

    #[test]
    fn sharp_string_is_loosened() {
        assert_eq!(classify(445.0, 440.0, 0.5), Instruction::Loosen);
    }

    #[test]
    fn flat_string_is_tightened() {
        assert_eq!(classify(80.0, 82.41, 1.0), Instruction::Tighten);
    }

    #[test]
    fn cents_of_an_octave_and_semitone() {
        assert_abs_diff_eq!(cents_deviation(880.0, 440.0), 1200.0, epsilon = 1e-3);
        assert_abs_diff_eq!(
            cents_deviation(440.0 * 2.0_f32.powf(1.0 / 12.0), 440.0),
            100.0,
            epsilon = 1e-2
        );
        assert!(cents_deviation(439.0, 440.0) < 0.0);
    }

    #[test]
    fn instruction_text() {
        assert_eq!(Instruction::InTune.to_string(), "In tune");
        assert!(Instruction::InTune.is_in_tune());
        assert!(!Instruction::Loosen.is_in_tune());
    }
}
