//! Dice types, specifications, and rolling.
//!
//! A [`DiceSpec`] is parsed from `<count>d<sides>` notation (count defaults
//! to 1). Anything else, including modifiers like `2d6+3`, is rejected with
//! [`MechError::InvalidDiceNotation`]; table modifiers are applied separately.

pub mod modified;
pub mod roll;

pub use modified::{Contribution, ModifiedRoll, RollMode};
pub use roll::{DieResult, RollResult};

use std::str::FromStr;

use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::error::{MechError, MechResult};

/// A polyhedral die type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Die {
    /// Four-sided die.
    D4,
    /// Six-sided die.
    D6,
    /// Eight-sided die.
    D8,
    /// Ten-sided die.
    D10,
    /// Twelve-sided die.
    D12,
    /// Twenty-sided die.
    D20,
    /// Percentile die (1-100).
    D100,
    /// A die with any other number of sides (at least 1).
    Custom(u32),
}

impl Die {
    /// Returns the number of sides on this die.
    pub fn sides(self) -> u32 {
        match self {
            Self::D4 => 4,
            Self::D6 => 6,
            Self::D8 => 8,
            Self::D10 => 10,
            Self::D12 => 12,
            Self::D20 => 20,
            Self::D100 => 100,
            Self::Custom(n) => n,
        }
    }

    /// The die with `sides` faces, or `None` for zero.
    pub fn from_sides(sides: u32) -> Option<Self> {
        match sides {
            0 => None,
            4 => Some(Self::D4),
            6 => Some(Self::D6),
            8 => Some(Self::D8),
            10 => Some(Self::D10),
            12 => Some(Self::D12),
            20 => Some(Self::D20),
            100 => Some(Self::D100),
            n => Some(Self::Custom(n)),
        }
    }

    /// Roll this die once.
    pub fn roll(self, rng: &mut StdRng) -> u32 {
        rng.random_range(1..=self.sides())
    }
}

impl std::fmt::Display for Die {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

/// A parsed dice specification: `count` dice of one type, summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiceSpec {
    /// Number of dice (at least 1).
    pub count: u32,
    /// Die type.
    pub die: Die,
}

impl DiceSpec {
    /// Create a spec, rejecting a zero count or zero sides.
    pub fn new(count: u32, sides: u32) -> MechResult<Self> {
        let die = Die::from_sides(sides)
            .ok_or_else(|| MechError::InvalidDiceNotation(format!("{count}d{sides}")))?;
        if count == 0 || count.checked_mul(sides).is_none_or(|m| m > i32::MAX as u32) {
            return Err(MechError::InvalidDiceNotation(format!("{count}d{sides}")));
        }
        Ok(Self { count, die })
    }

    /// Parse `<count>d<sides>` notation such as `d20`, `2d6`, or `1D100`.
    pub fn parse(notation: &str) -> MechResult<Self> {
        let invalid = || MechError::InvalidDiceNotation(notation.to_string());
        let lower = notation.trim().to_lowercase();

        let (count_str, sides_str) = lower.split_once('d').ok_or_else(invalid)?;

        let count = if count_str.is_empty() {
            1
        } else {
            parse_digits(count_str).ok_or_else(invalid)?
        };
        let sides = parse_digits(sides_str).ok_or_else(invalid)?;

        Self::new(count, sides).map_err(|_| invalid())
    }

    /// Smallest possible total.
    pub fn min(&self) -> i32 {
        self.count as i32
    }

    /// Largest possible total.
    pub fn max(&self) -> i32 {
        (self.count * self.die.sides()) as i32
    }

    /// Roll every die and return the sum.
    pub fn roll(&self, rng: &mut StdRng) -> i32 {
        self.roll_detailed(rng).total()
    }

    /// Roll every die and keep the individual results.
    pub fn roll_detailed(&self, rng: &mut StdRng) -> RollResult {
        let dice = (0..self.count)
            .map(|_| DieResult {
                die: self.die,
                value: self.die.roll(rng),
            })
            .collect();
        RollResult { dice }
    }
}

/// Parse a non-empty run of ASCII digits.
fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl FromStr for DiceSpec {
    type Err = MechError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for DiceSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 1 {
            write!(f, "{}", self.die)
        } else {
            write!(f, "{}{}", self.count, self.die)
        }
    }
}
