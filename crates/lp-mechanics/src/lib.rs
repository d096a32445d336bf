//! Dice rolling and modifier aggregation for Lifepath tables.
//!
//! Parses `<count>d<sides>` dice specifications, rolls them with per-die
//! breakdowns, builds roll-with-modifiers records (including advantage and
//! disadvantage), and sums the modifiers that apply to a table roll.

pub mod dice;
pub mod error;
pub mod modifiers;

pub use dice::{Contribution, DiceSpec, Die, DieResult, ModifiedRoll, RollMode, RollResult};
pub use error::{MechError, MechResult};
pub use modifiers::{
    BoundedModifier, ModifierBounds, ModifierBreakdown, SupplementalRule, aggregate,
    default_supplemental_rules, net_modifier,
};
