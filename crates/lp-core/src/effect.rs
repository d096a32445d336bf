use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::subject::Size;

/// A typed instruction to mutate one part of the subject.
///
/// One variant per kind, so a malformed payload is rejected when the table
/// file is deserialized rather than when the effect is applied. Applying an
/// effect yields an [`EffectRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    /// Add a signed value to an attribute or a built-in modifier key.
    Modifier {
        /// Attribute name (`strength`, `dex`, ...) or modifier key (`cuMod`, ...).
        target: String,
        /// Amount to add.
        value: i32,
    },
    /// Write a compound value into a subject sub-record.
    Trait(TraitEffect),
    /// Set the subject's race.
    Race(RaceTrait),
    /// Append a skill.
    Skill(SkillGrant),
    /// Append an item.
    Item(ItemGrant),
    /// Append a relationship.
    Relationship(RelationshipGrant),
    /// Append an occupation.
    Occupation(OccupationGrant),
    /// Append a life event.
    Event(EventGrant),
}

impl Effect {
    /// Shorthand for a modifier effect.
    pub fn modifier(target: impl Into<String>, value: i32) -> Self {
        Self::Modifier {
            target: target.into(),
            value,
        }
    }

    /// Shorthand for a skill grant at rank 1.
    pub fn skill(name: impl Into<String>) -> Self {
        Self::Skill(SkillGrant {
            name: name.into(),
            rank: None,
            source: None,
        })
    }

    /// Shorthand for a life event with only a title.
    pub fn event(title: impl Into<String>) -> Self {
        Self::Event(EventGrant {
            title: title.into(),
            description: None,
            age: None,
        })
    }

    /// The kind tag of this effect.
    pub fn kind(&self) -> EffectKind {
        match self {
            Self::Modifier { .. } => EffectKind::Modifier,
            Self::Trait(_) => EffectKind::Trait,
            Self::Race(_) => EffectKind::Race,
            Self::Skill(_) => EffectKind::Skill,
            Self::Item(_) => EffectKind::Item,
            Self::Relationship(_) => EffectKind::Relationship,
            Self::Occupation(_) => EffectKind::Occupation,
            Self::Event(_) => EffectKind::Event,
        }
    }

    /// Name of the subject field this effect writes to.
    pub fn target(&self) -> &str {
        match self {
            Self::Modifier { target, .. } => target,
            Self::Trait(t) => t.target(),
            Self::Race(_) => "race",
            Self::Skill(_) => "skills",
            Self::Item(_) => "items",
            Self::Relationship(_) => "relationships",
            Self::Occupation(_) => "occupations",
            Self::Event(_) => "events",
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Modifier { target, value } => {
                if *value >= 0 {
                    write!(f, "{target} +{value}")
                } else {
                    write!(f, "{target} {value}")
                }
            }
            Self::Trait(t) => write!(f, "{t}"),
            Self::Race(r) => write!(f, "Race: {}", r.name.as_deref().unwrap_or("Human")),
            Self::Skill(s) => write!(f, "Skill: {} (rank {})", s.name, s.rank.unwrap_or(1)),
            Self::Item(i) => match i.quantity {
                Some(q) if q > 1 => write!(f, "Item: {} x{q}", i.name),
                _ => write!(f, "Item: {}", i.name),
            },
            Self::Relationship(r) => write!(f, "Relationship: {} ({})", r.name, r.kind),
            Self::Occupation(o) => write!(f, "Occupation: {}", o.name),
            Self::Event(e) => write!(f, "Event: {}", e.title),
        }
    }
}

/// Which kind of effect a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Attribute or modifier adjustment.
    Modifier,
    /// Sub-record write.
    Trait,
    /// Race sub-record write.
    Race,
    /// Skill append.
    Skill,
    /// Item append.
    Item,
    /// Relationship append.
    Relationship,
    /// Occupation append.
    Occupation,
    /// Life event append.
    Event,
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Modifier => write!(f, "modifier"),
            Self::Trait => write!(f, "trait"),
            Self::Race => write!(f, "race"),
            Self::Skill => write!(f, "skill"),
            Self::Item => write!(f, "item"),
            Self::Relationship => write!(f, "relationship"),
            Self::Occupation => write!(f, "occupation"),
            Self::Event => write!(f, "event"),
        }
    }
}

/// The normalized audit record produced for every applied effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectRecord {
    /// Effect kind.
    pub kind: EffectKind,
    /// Subject field written.
    pub target: String,
    /// The payload as it was applied.
    pub value: serde_json::Value,
    /// Human-readable summary.
    pub description: String,
    /// False when the effect was skipped (e.g. unknown target).
    pub applied: bool,
}

// ---------------------------------------------------------------------------
// Trait payloads
// ---------------------------------------------------------------------------

/// A compound write into one of the subject's sub-records.
///
/// Every payload field is optional; omitted fields keep the sub-record's
/// current value, or its default if the sub-record was never set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum TraitEffect {
    /// Race sub-record.
    Race(RaceTrait),
    /// Culture sub-record; also sets `cuMod` when `modifier` is given.
    Culture(CultureTrait),
    /// Social status sub-record; also sets `solMod`/`tiMod` when given.
    SocialStatus(StatusTrait),
    /// Birth circumstances; also sets `biMod`/`legitMod` when given.
    Birth(BirthTrait),
    /// Appends to the personality trait collection.
    Personality(PersonalityGrant),
}

impl TraitEffect {
    /// Name of the sub-record this trait writes.
    pub fn target(&self) -> &str {
        match self {
            Self::Race(_) => "race",
            Self::Culture(_) => "culture",
            Self::SocialStatus(_) => "social_status",
            Self::Birth(_) => "birth",
            Self::Personality(_) => "personality",
        }
    }
}

impl fmt::Display for TraitEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Race(r) => write!(f, "Race: {}", r.name.as_deref().unwrap_or("Human")),
            Self::Culture(c) => write!(f, "Culture: {}", c.name.as_deref().unwrap_or("Civilized")),
            Self::SocialStatus(s) => match &s.title {
                Some(title) => write!(
                    f,
                    "Social status: {} ({title})",
                    s.level.as_deref().unwrap_or("Comfortable")
                ),
                None => write!(
                    f,
                    "Social status: {}",
                    s.level.as_deref().unwrap_or("Comfortable")
                ),
            },
            Self::Birth(b) => match b.legitimate {
                Some(false) => write!(f, "Birth: illegitimate"),
                _ => write!(f, "Birth: {}", b.place.as_deref().unwrap_or("legitimate")),
            },
            Self::Personality(p) => write!(f, "Personality: {}", p.name),
        }
    }
}

/// Race payload. Also usable as a top-level [`Effect::Race`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceTrait {
    /// Race name.
    pub name: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Racial abilities; replaces the current list when given.
    pub abilities: Option<Vec<String>>,
    /// Known languages; replaces the current list when given.
    pub languages: Option<Vec<String>>,
    /// Size category.
    pub size: Option<Size>,
    /// Base speed in feet.
    pub speed: Option<u32>,
    /// Attribute scores set outright (e.g. `{"dexterity": 12}`).
    pub base_attributes: BTreeMap<String, i32>,
}

/// Culture payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CultureTrait {
    /// Culture name.
    pub name: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Native language.
    pub language: Option<String>,
    /// New value for `cuMod`.
    pub modifier: Option<i32>,
}

/// Social status payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusTrait {
    /// Status level.
    pub level: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Family wealth.
    pub wealth: Option<String>,
    /// Noble title.
    pub title: Option<String>,
    /// New value for `solMod`.
    pub modifier: Option<i32>,
    /// New value for `tiMod`.
    pub title_modifier: Option<i32>,
}

/// Birth circumstances payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BirthTrait {
    /// Born to married parents.
    pub legitimate: Option<bool>,
    /// Position among siblings.
    pub birth_order: Option<u32>,
    /// Number of siblings.
    pub siblings: Option<u32>,
    /// Place of birth.
    pub place: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// New value for `biMod`.
    pub modifier: Option<i32>,
    /// New value for `legitMod`.
    pub legitimacy_modifier: Option<i32>,
}

// ---------------------------------------------------------------------------
// Collection payloads
// ---------------------------------------------------------------------------

/// Personality trait payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalityGrant {
    /// Trait name.
    pub name: String,
    /// "light", "dark", or "neutral".
    #[serde(default)]
    pub alignment: Option<String>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Skill payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillGrant {
    /// Skill name.
    pub name: String,
    /// Rank, defaulting to 1.
    #[serde(default)]
    pub rank: Option<u32>,
    /// What granted it.
    #[serde(default)]
    pub source: Option<String>,
}

/// Item payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemGrant {
    /// Item name.
    pub name: String,
    /// Quantity, defaulting to 1.
    #[serde(default)]
    pub quantity: Option<u32>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Value in coin.
    #[serde(default)]
    pub value: Option<i32>,
}

/// Relationship payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipGrant {
    /// Who the relationship is with.
    pub name: String,
    /// Kind of relationship.
    pub kind: String,
    /// Their attitude toward the subject.
    #[serde(default)]
    pub attitude: Option<String>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Occupation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupationGrant {
    /// Occupation name.
    pub name: String,
    /// Years served.
    #[serde(default)]
    pub years: Option<u32>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Life event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventGrant {
    /// Event title.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Age when it happened.
    #[serde(default)]
    pub age: Option<u32>,
}
