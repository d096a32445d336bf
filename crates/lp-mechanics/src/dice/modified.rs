//! Rolls with named modifiers, advantage, and disadvantage.

use std::fmt;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::{DiceSpec, RollResult};

/// One named term added to a roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    /// Where the value comes from, e.g. "Cultural".
    pub source: String,
    /// Signed amount.
    pub value: i32,
}

impl Contribution {
    /// Create a contribution.
    pub fn new(source: impl Into<String>, value: i32) -> Self {
        Self {
            source: source.into(),
            value,
        }
    }
}

impl fmt::Display for Contribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value >= 0 {
            write!(f, "{} +{}", self.source, self.value)
        } else {
            write!(f, "{} {}", self.source, self.value)
        }
    }
}

/// How many times to roll and which result to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollMode {
    /// Roll once.
    #[default]
    Normal,
    /// Roll twice, keep the higher final result.
    Advantage,
    /// Roll twice, keep the lower final result.
    Disadvantage,
}

/// A full roll-with-modifiers record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifiedRoll {
    /// The dice that were rolled.
    pub dice: DiceSpec,
    /// Per-die breakdown of the kept roll.
    pub base: RollResult,
    /// Every modifier that was applied, including zero-valued ones.
    pub contributions: Vec<Contribution>,
    /// Sum of all contributions.
    pub total_modifier: i32,
    /// `base + total_modifier`, floored at 1.
    pub final_result: i32,
    /// Human-readable breakdown listing each non-zero contributor.
    pub breakdown: String,
    /// Which roll mode produced this record.
    pub mode: RollMode,
    /// Final result of the discarded roll under advantage/disadvantage.
    pub discarded: Option<i32>,
}

impl ModifiedRoll {
    /// Roll once and apply the contributions.
    pub fn roll(dice: DiceSpec, contributions: &[Contribution], rng: &mut StdRng) -> Self {
        let base = dice.roll_detailed(rng);
        Self::from_base(dice, base, contributions)
    }

    /// Roll according to `mode`. Advantage and disadvantage roll the full
    /// record twice and keep the higher or lower `final_result`.
    pub fn roll_with_mode(
        dice: DiceSpec,
        contributions: &[Contribution],
        mode: RollMode,
        rng: &mut StdRng,
    ) -> Self {
        if mode == RollMode::Normal {
            return Self::roll(dice, contributions, rng);
        }

        let first = Self::roll(dice, contributions, rng);
        let second = Self::roll(dice, contributions, rng);
        let keep_first = match mode {
            RollMode::Advantage => first.final_result >= second.final_result,
            _ => first.final_result <= second.final_result,
        };
        let (mut kept, other) = if keep_first {
            (first, second)
        } else {
            (second, first)
        };
        kept.mode = mode;
        kept.discarded = Some(other.final_result);
        kept
    }

    /// Build a record from an already rolled base.
    pub fn from_base(dice: DiceSpec, base: RollResult, contributions: &[Contribution]) -> Self {
        let total_modifier = contributions
            .iter()
            .fold(0i32, |acc, c| acc.saturating_add(c.value));
        let final_result = base.total().saturating_add(total_modifier).max(1);

        let mut breakdown = format!("{dice} ({})", base.total());
        for c in contributions.iter().filter(|c| c.value != 0) {
            if c.value > 0 {
                breakdown.push_str(&format!(" + {} {}", c.source, c.value));
            } else {
                breakdown.push_str(&format!(" - {} {}", c.source, c.value.unsigned_abs()));
            }
        }
        breakdown.push_str(&format!(" = {final_result}"));

        Self {
            dice,
            base,
            contributions: contributions.to_vec(),
            total_modifier,
            final_result,
            breakdown,
            mode: RollMode::Normal,
            discarded: None,
        }
    }
}

impl fmt::Display for ModifiedRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.breakdown)
    }
}
