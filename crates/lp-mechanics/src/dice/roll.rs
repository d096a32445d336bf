//! Dice roll results and aggregation.

use serde::{Deserialize, Serialize};

use super::Die;

/// The result of rolling a single die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DieResult {
    /// The type of die that was rolled.
    pub die: Die,
    /// The value rolled (1 to die.sides()).
    pub value: u32,
}

/// The per-die breakdown of one roll of a [`DiceSpec`](super::DiceSpec).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    /// Individual die results.
    pub dice: Vec<DieResult>,
}

impl RollResult {
    /// Sum of all die values.
    pub fn total(&self) -> i32 {
        self.dice.iter().map(|d| d.value as i32).sum()
    }

    /// The individual values in roll order.
    pub fn values(&self) -> Vec<u32> {
        self.dice.iter().map(|d| d.value).collect()
    }

    /// The highest single die value, or 0 if empty.
    pub fn highest(&self) -> u32 {
        self.dice.iter().map(|d| d.value).max().unwrap_or(0)
    }

    /// The lowest single die value, or 0 if empty.
    pub fn lowest(&self) -> u32 {
        self.dice.iter().map(|d| d.value).min().unwrap_or(0)
    }

    /// Number of dice in the result.
    pub fn count(&self) -> usize {
        self.dice.len()
    }
}

impl std::fmt::Display for RollResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let values: Vec<String> = self.dice.iter().map(|d| d.value.to_string()).collect();
        write!(f, "[{}] = {}", values.join(", "), self.total())
    }
}
