use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::modifier::ModifierKey;
use crate::subject::Subject;

/// A predicate over the subject's current state.
///
/// Conditions gate table availability, guard structured goto references,
/// and drive the informational cross-reference annotations on a table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// A named field equals a value (case-insensitive).
    FieldEquals {
        /// Field name, see [`Subject::field_value`].
        field: String,
        /// Expected value.
        value: String,
    },
    /// A named field is unset or differs from a value (case-insensitive).
    FieldNotEquals {
        /// Field name, see [`Subject::field_value`].
        field: String,
        /// Value the field must not have.
        value: String,
    },
    /// The subject has learned a skill.
    HasSkill {
        /// Skill name.
        skill: String,
    },
    /// The subject has held an occupation.
    HasOccupation {
        /// Occupation name.
        occupation: String,
    },
    /// A modifier is at or above a threshold.
    ModifierAtLeast {
        /// Modifier key.
        key: ModifierKey,
        /// Inclusive threshold.
        value: i32,
    },
    /// Logical NOT.
    Not {
        /// The negated condition.
        condition: Box<Condition>,
    },
    /// Logical AND.
    And {
        /// All of these must hold.
        conditions: Vec<Condition>,
    },
    /// Logical OR.
    Or {
        /// At least one of these must hold.
        conditions: Vec<Condition>,
    },
    /// Always true.
    #[default]
    Always,
}

impl Condition {
    /// Shorthand for [`Condition::FieldEquals`].
    pub fn field_equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::FieldEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Parse a simple comparison such as `race = Elf` or `culture != Barbarian`.
    ///
    /// `==` is accepted as a synonym for `=`. The literal `always` parses to
    /// [`Condition::Always`].
    pub fn parse(s: &str) -> CoreResult<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("always") {
            return Ok(Self::Always);
        }

        let (field, value, negated) = if let Some((f, v)) = trimmed.split_once("!=") {
            (f, v, true)
        } else if let Some((f, v)) = trimmed.split_once("==") {
            (f, v, false)
        } else if let Some((f, v)) = trimmed.split_once('=') {
            (f, v, false)
        } else {
            return Err(CoreError::InvalidCondition(s.to_string()));
        };

        let field = field.trim();
        let value = value.trim().trim_matches('"');
        if field.is_empty() || value.is_empty() {
            return Err(CoreError::InvalidCondition(s.to_string()));
        }

        Ok(if negated {
            Self::FieldNotEquals {
                field: field.to_string(),
                value: value.to_string(),
            }
        } else {
            Self::field_equals(field, value)
        })
    }

    /// Evaluate the condition against the subject.
    pub fn evaluate(&self, subject: &Subject) -> bool {
        match self {
            Condition::FieldEquals { field, value } => subject
                .field_value(field)
                .is_some_and(|v| v.eq_ignore_ascii_case(value)),
            Condition::FieldNotEquals { field, value } => !subject
                .field_value(field)
                .is_some_and(|v| v.eq_ignore_ascii_case(value)),
            Condition::HasSkill { skill } => subject.has_skill(skill),
            Condition::HasOccupation { occupation } => subject.has_occupation(occupation),
            Condition::ModifierAtLeast { key, value } => subject.modifier(key) >= *value,
            Condition::Not { condition } => !condition.evaluate(subject),
            Condition::And { conditions } => conditions.iter().all(|c| c.evaluate(subject)),
            Condition::Or { conditions } => conditions.iter().any(|c| c.evaluate(subject)),
            Condition::Always => true,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldEquals { field, value } => write!(f, "{field} = {value}"),
            Self::FieldNotEquals { field, value } => write!(f, "{field} != {value}"),
            Self::HasSkill { skill } => write!(f, "has skill {skill}"),
            Self::HasOccupation { occupation } => write!(f, "was {occupation}"),
            Self::ModifierAtLeast { key, value } => write!(f, "{key} >= {value}"),
            Self::Not { condition } => write!(f, "not ({condition})"),
            Self::And { conditions } => {
                let parts: Vec<String> = conditions.iter().map(|c| c.to_string()).collect();
                write!(f, "({})", parts.join(" and "))
            }
            Self::Or { conditions } => {
                let parts: Vec<String> = conditions.iter().map(|c| c.to_string()).collect();
                write!(f, "({})", parts.join(" or "))
            }
            Self::Always => write!(f, "always"),
        }
    }
}
