//! Note and rest durations from `Dur:` values
//!
//! A `Dur` value is a base length followed by comma-separated modifiers,
//! e.g. `4th,Dotted,Slur` or `8th,Triplet=First`. Lengths are exact
//! fractions of a whole note.

use num_rational::Rational32;
use serde::{Deserialize, Serialize};

pub type Rational = Rational32;

/// Parsed `Dur:` value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duration {
    /// Logarithmic base length (0=whole, 1=half, 2=quarter, ... 6=64th)
    pub log: u8,

    /// Augmentation dots (0-2)
    pub dots: u8,

    /// Part of a triplet group
    pub triplet: bool,

    /// Grace notes take no time
    pub grace: bool,

    /// Slurred into the next note
    pub slur: bool,
}

impl Duration {
    pub fn new(log: u8, dots: u8) -> Self {
        Self {
            log,
            dots,
            triplet: false,
            grace: false,
            slur: false,
        }
    }

    /// Parse a `Dur:` field value
    pub fn parse(value: &str) -> Result<Self, String> {
        let mut parts = value.split(',').map(str::trim);
        let base = parts.next().unwrap_or_default();
        let log = match base {
            "Whole" => 0,
            "Half" => 1,
            "4th" => 2,
            "8th" => 3,
            "16th" => 4,
            "32nd" => 5,
            "64th" => 6,
            other => return Err(format!("unknown duration `{}`", other)),
        };

        let mut duration = Self::new(log, 0);
        for modifier in parts {
            match modifier {
                "Dotted" => duration.dots = 1,
                "DblDotted" => duration.dots = 2,
                "Grace" => duration.grace = true,
                "Slur" => duration.slur = true,
                m if m == "Triplet" || m.starts_with("Triplet=") => duration.triplet = true,
                // Staccato, Accent, Tenuto and friends do not change timing
                _ => {}
            }
        }
        Ok(duration)
    }

    /// Length as a fraction of a whole note
    pub fn whole_notes(&self) -> Rational {
        if self.grace {
            return Rational::from_integer(0);
        }
        let mut length = Rational::new(1, 1 << self.log);
        if self.dots > 0 {
            // dotted = base * (2 - 1/2^dots)
            length *= Rational::new((1 << (self.dots + 1)) - 1, 1 << self.dots);
        }
        if self.triplet {
            length *= Rational::new(2, 3);
        }
        length
    }

    /// Length in beats of a `denominator`-note meter
    pub fn beats(&self, denominator: u8) -> Rational {
        self.whole_notes() * Rational::from_integer(i32::from(denominator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_lengths() {
        assert_eq!(Duration::parse("Whole").unwrap().whole_notes(), Rational::new(1, 1));
        assert_eq!(Duration::parse("4th").unwrap().whole_notes(), Rational::new(1, 4));
        assert_eq!(Duration::parse("64th").unwrap().whole_notes(), Rational::new(1, 64));
    }

    #[test]
    fn test_modifiers_scale_length() {
        assert_eq!(Duration::parse("4th,Dotted").unwrap().whole_notes(), Rational::new(3, 8));
        assert_eq!(Duration::parse("4th,DblDotted").unwrap().whole_notes(), Rational::new(7, 16));
        assert_eq!(
            Duration::parse("8th,Triplet=First").unwrap().whole_notes(),
            Rational::new(1, 12)
        );
        assert_eq!(Duration::parse("16th,Grace").unwrap().whole_notes(), Rational::new(0, 1));
    }

    #[test]
    fn test_slur_and_unknown_modifiers() {
        let duration = Duration::parse("Half,Slur,Staccato").unwrap();
        assert!(duration.slur);
        assert_eq!(duration.beats(4), Rational::new(2, 1));
    }

    #[test]
    fn test_unknown_base_is_error() {
        assert!(Duration::parse("5th").is_err());
        assert!(Duration::parse("").is_err());
    }
}
