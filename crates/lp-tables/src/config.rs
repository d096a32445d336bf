//! Configuration for a table engine.

use lp_mechanics::{ModifierBounds, SupplementalRule, default_supplemental_rules};
use serde::Deserialize;

use crate::error::TableResult;

/// Configuration for a [`TableEngine`](crate::TableEngine).
///
/// Every field has a default, so a config file only needs the fields it
/// changes:
///
/// ```json
/// { "max_depth": 6, "seed": 7, "modifier_bounds": { "min": -10, "max": 10 } }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of tables on the processing stack at once (at least 1).
    pub max_depth: usize,
    /// RNG seed for reproducible rolls; OS-seeded when absent.
    pub seed: Option<u64>,
    /// Clamp net modifiers into this range and warn when clamping happens.
    pub modifier_bounds: Option<ModifierBounds>,
    /// Per-category supplemental modifier rules.
    pub supplemental_rules: Vec<SupplementalRule>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            seed: None,
            modifier_bounds: None,
            supplemental_rules: default_supplemental_rules(),
        }
    }
}

impl EngineConfig {
    /// Parse a config from JSON.
    pub fn from_json(json: &str) -> TableResult<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        config.max_depth = config.max_depth.max(1);
        Ok(config)
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the maximum depth (clamped to at least 1).
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.max(1);
        self
    }

    /// Enable the modifier bounding pass.
    pub fn with_bounds(mut self, bounds: ModifierBounds) -> Self {
        self.modifier_bounds = Some(bounds);
        self
    }

    /// Replace the supplemental rules.
    pub fn with_rules(mut self, rules: Vec<SupplementalRule>) -> Self {
        self.supplemental_rules = rules;
        self
    }
}
