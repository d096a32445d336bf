//! Net modifier aggregation for table rolls.
//!
//! The net modifier is the arithmetic sum of the table's primary modifier,
//! any supplemental modifier declared for the table's category, and the
//! caller's ad hoc modifiers. Bounding is a separate, optional pass.

use std::collections::BTreeMap;

use lp_core::{ModifierKey, Subject, Table, TableCategory};
use serde::{Deserialize, Serialize};

use crate::dice::Contribution;
use crate::error::{MechError, MechResult};

/// Declares that tables of `category` also add `modifier` to their rolls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplementalRule {
    /// Table category the rule applies to.
    pub category: TableCategory,
    /// Modifier key added on top of the table's primary key.
    pub modifier: ModifierKey,
}

impl SupplementalRule {
    /// Create a rule.
    pub fn new(category: TableCategory, modifier: ModifierKey) -> Self {
        Self { category, modifier }
    }
}

/// The built-in rule set: youth tables are also influenced by social status.
pub fn default_supplemental_rules() -> Vec<SupplementalRule> {
    vec![SupplementalRule::new(
        TableCategory::Youth,
        ModifierKey::SocialStatus,
    )]
}

/// Every term of a net modifier, in aggregation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierBreakdown {
    /// Primary, supplemental, then ad hoc terms.
    pub contributions: Vec<Contribution>,
    /// Sum of all contributions.
    pub total: i32,
}

impl ModifierBreakdown {
    /// Clamp the total into `bounds`.
    pub fn bounded(&self, bounds: ModifierBounds) -> BoundedModifier {
        let value = self.total.clamp(bounds.min, bounds.max);
        BoundedModifier {
            value,
            clamped: value != self.total,
        }
    }
}

/// Inclusive range a net modifier may be clamped into.
///
/// Deserialization goes through [`ModifierBounds::new`], so an inverted
/// range in a config file is rejected when it is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBounds")]
pub struct ModifierBounds {
    /// Lowest allowed value.
    pub min: i32,
    /// Highest allowed value.
    pub max: i32,
}

impl ModifierBounds {
    /// Create bounds, rejecting `min > max`.
    pub fn new(min: i32, max: i32) -> MechResult<Self> {
        if min > max {
            return Err(MechError::InvalidBounds { min, max });
        }
        Ok(Self { min, max })
    }
}

#[derive(Deserialize)]
struct RawBounds {
    min: i32,
    max: i32,
}

impl TryFrom<RawBounds> for ModifierBounds {
    type Error = MechError;

    fn try_from(raw: RawBounds) -> MechResult<Self> {
        Self::new(raw.min, raw.max)
    }
}

impl Default for ModifierBounds {
    fn default() -> Self {
        Self { min: -20, max: 20 }
    }
}

/// Result of the bounding pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedModifier {
    /// The clamped value.
    pub value: i32,
    /// True when clamping changed the value.
    pub clamped: bool,
}

/// Collect every modifier term that applies to a roll on `table`.
pub fn aggregate(
    table: &Table,
    subject: &Subject,
    extra: &BTreeMap<String, i32>,
    rules: &[SupplementalRule],
) -> ModifierBreakdown {
    let mut contributions = Vec::new();
    let mut counted: Vec<&ModifierKey> = Vec::new();

    if let Some(primary) = &table.modifier {
        contributions.push(Contribution::new(primary.label(), subject.modifier(primary)));
        counted.push(primary);
    }

    for rule in rules.iter().filter(|r| r.category == table.category) {
        if counted.contains(&&rule.modifier) {
            continue;
        }
        contributions.push(Contribution::new(
            rule.modifier.label(),
            subject.modifier(&rule.modifier),
        ));
        counted.push(&rule.modifier);
    }

    for (name, value) in extra {
        contributions.push(Contribution::new(name.clone(), *value));
    }

    let total = contributions
        .iter()
        .fold(0i32, |acc, c| acc.saturating_add(c.value));
    ModifierBreakdown {
        contributions,
        total,
    }
}

/// The net modifier for a roll on `table`.
pub fn net_modifier(
    table: &Table,
    subject: &Subject,
    extra: &BTreeMap<String, i32>,
    rules: &[SupplementalRule],
) -> i32 {
    aggregate(table, subject, extra, rules).total
}
