use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::modifier::{ModifierKey, ModifierSet};

/// Unique identifier for a generated subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(pub Uuid);

impl SubjectId {
    /// Generate a new random subject ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// One of the six ability scores in the attribute block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    /// Physical power.
    Strength,
    /// Agility and reflexes.
    Dexterity,
    /// Health and stamina.
    Constitution,
    /// Reasoning and memory.
    Intelligence,
    /// Perception and insight.
    Wisdom,
    /// Force of personality.
    Charisma,
}

impl Attribute {
    /// All attributes in sheet order.
    pub fn all() -> &'static [Attribute] {
        &[
            Self::Strength,
            Self::Dexterity,
            Self::Constitution,
            Self::Intelligence,
            Self::Wisdom,
            Self::Charisma,
        ]
    }

    /// Parse an attribute from its full or three-letter name.
    pub fn parse(s: &str) -> CoreResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "strength" | "str" => Ok(Self::Strength),
            "dexterity" | "dex" => Ok(Self::Dexterity),
            "constitution" | "con" => Ok(Self::Constitution),
            "intelligence" | "int" => Ok(Self::Intelligence),
            "wisdom" | "wis" => Ok(Self::Wisdom),
            "charisma" | "cha" => Ok(Self::Charisma),
            _ => Err(CoreError::UnknownAttribute(s.to_string())),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strength => write!(f, "strength"),
            Self::Dexterity => write!(f, "dexterity"),
            Self::Constitution => write!(f, "constitution"),
            Self::Intelligence => write!(f, "intelligence"),
            Self::Wisdom => write!(f, "wisdom"),
            Self::Charisma => write!(f, "charisma"),
        }
    }
}

/// The subject's attribute block. New subjects start at 10 across the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attributes {
    /// Strength score.
    pub strength: i32,
    /// Dexterity score.
    pub dexterity: i32,
    /// Constitution score.
    pub constitution: i32,
    /// Intelligence score.
    pub intelligence: i32,
    /// Wisdom score.
    pub wisdom: i32,
    /// Charisma score.
    pub charisma: i32,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            charisma: 10,
        }
    }
}

impl Attributes {
    /// Read one attribute.
    pub fn get(&self, attr: Attribute) -> i32 {
        match attr {
            Attribute::Strength => self.strength,
            Attribute::Dexterity => self.dexterity,
            Attribute::Constitution => self.constitution,
            Attribute::Intelligence => self.intelligence,
            Attribute::Wisdom => self.wisdom,
            Attribute::Charisma => self.charisma,
        }
    }

    /// Mutable access to one attribute.
    pub fn get_mut(&mut self, attr: Attribute) -> &mut i32 {
        match attr {
            Attribute::Strength => &mut self.strength,
            Attribute::Dexterity => &mut self.dexterity,
            Attribute::Constitution => &mut self.constitution,
            Attribute::Intelligence => &mut self.intelligence,
            Attribute::Wisdom => &mut self.wisdom,
            Attribute::Charisma => &mut self.charisma,
        }
    }

    /// Add `delta` to an attribute and return the new score.
    pub fn adjust(&mut self, attr: Attribute, delta: i32) -> i32 {
        let slot = self.get_mut(attr);
        *slot = slot.saturating_add(delta);
        *slot
    }
}

// ---------------------------------------------------------------------------
// Sub-records
// ---------------------------------------------------------------------------

/// Body size category of a race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Size {
    /// Halflings, gnomes.
    Small,
    /// Humans, elves, dwarves.
    #[default]
    Medium,
    /// Ogres, half-giants.
    Large,
}

/// The subject's race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Race {
    /// Race name, e.g. "Elf".
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Racial abilities, e.g. "Infravision".
    pub abilities: Vec<String>,
    /// Languages known from birth.
    pub languages: Vec<String>,
    /// Body size category.
    pub size: Size,
    /// Base walking speed in feet.
    pub speed: u32,
}

impl Default for Race {
    fn default() -> Self {
        Self {
            name: "Human".to_string(),
            description: None,
            abilities: Vec::new(),
            languages: vec!["Common".to_string()],
            size: Size::Medium,
            speed: 30,
        }
    }
}

/// The culture the subject was raised in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Culture {
    /// Culture name, e.g. "Civilized".
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Native language, if the culture has one.
    pub language: Option<String>,
}

impl Default for Culture {
    fn default() -> Self {
        Self {
            name: "Civilized".to_string(),
            description: None,
            language: None,
        }
    }
}

/// The subject's family standing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialStatus {
    /// Status level, e.g. "Comfortable".
    pub level: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Family wealth description.
    pub wealth: Option<String>,
    /// Noble title, if any.
    pub title: Option<String>,
}

impl Default for SocialStatus {
    fn default() -> Self {
        Self {
            level: "Comfortable".to_string(),
            description: None,
            wealth: None,
            title: None,
        }
    }
}

/// Circumstances of the subject's birth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthCircumstances {
    /// Whether the subject was born to married parents.
    pub legitimate: bool,
    /// Position among siblings (1 = first born).
    pub birth_order: Option<u32>,
    /// Number of siblings.
    pub siblings: Option<u32>,
    /// Where the subject was born.
    pub place: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
}

impl Default for BirthCircumstances {
    fn default() -> Self {
        Self {
            legitimate: true,
            birth_order: None,
            siblings: None,
            place: None,
            description: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

/// A skill learned during the subject's life.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    /// Display name.
    pub name: String,
    /// Skill rank, starting at 1.
    pub rank: u32,
    /// What granted the skill (an occupation, an event, ...).
    pub source: Option<String>,
}

/// An occupation the subject has held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupation {
    /// Display name.
    pub name: String,
    /// Years spent in the occupation.
    pub years: Option<u32>,
    /// Free-form description.
    pub description: Option<String>,
}

/// A person connected to the subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Who the relationship is with.
    pub name: String,
    /// Kind of relationship, e.g. "rival", "mentor".
    pub kind: String,
    /// How they feel about the subject.
    pub attitude: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
}

/// A possession the subject acquired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Display name.
    pub name: String,
    /// How many are held.
    pub quantity: u32,
    /// Free-form description.
    pub description: Option<String>,
    /// Value in coin, if known.
    pub value: Option<i32>,
}

/// A personality trait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalityTrait {
    /// Display name.
    pub name: String,
    /// "light", "dark", or "neutral".
    pub alignment: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
}

/// An event in the subject's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeEvent {
    /// Short title.
    pub title: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Age at which it happened.
    pub age: Option<u32>,
}

// ---------------------------------------------------------------------------
// Subject
// ---------------------------------------------------------------------------

/// The character record built up across table resolutions.
///
/// The engine never keeps a subject between calls; every resolution borrows
/// it from the caller and returns a snapshot in its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// Unique identifier.
    #[serde(default)]
    pub id: SubjectId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Gender, if decided.
    pub gender: Option<String>,
    /// When the subject was created.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Ability scores.
    #[serde(default)]
    pub attributes: Attributes,
    /// Current named modifiers.
    #[serde(default)]
    pub modifiers: ModifierSet,
    /// Race, once rolled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub race: Option<Race>,
    /// Culture, once rolled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub culture: Option<Culture>,
    /// Social status, once rolled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_status: Option<SocialStatus>,
    /// Birth circumstances, once rolled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth: Option<BirthCircumstances>,
    /// Skills learned.
    #[serde(default)]
    pub skills: Vec<Skill>,
    /// Occupations held.
    #[serde(default)]
    pub occupations: Vec<Occupation>,
    /// People connected to the subject.
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    /// Possessions.
    #[serde(default)]
    pub items: Vec<Item>,
    /// Personality traits.
    #[serde(default)]
    pub personality: Vec<PersonalityTrait>,
    /// Life events in the order they happened.
    #[serde(default)]
    pub events: Vec<LifeEvent>,
}

impl Subject {
    /// Create an empty subject with default attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SubjectId::new(),
            name: name.into(),
            gender: None,
            created_at: Utc::now(),
            attributes: Attributes::default(),
            modifiers: ModifierSet::new(),
            race: None,
            culture: None,
            social_status: None,
            birth: None,
            skills: Vec::new(),
            occupations: Vec::new(),
            relationships: Vec::new(),
            items: Vec::new(),
            personality: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Builder-style modifier setter.
    pub fn with_modifier(mut self, key: impl Into<ModifierKey>, value: i32) -> Self {
        self.modifiers.set(key.into(), value);
        self
    }

    /// Current value of a modifier key (0 if unset).
    pub fn modifier(&self, key: &ModifierKey) -> i32 {
        self.modifiers.get(key)
    }

    /// Look up a named scalar field for condition evaluation.
    ///
    /// Returns `None` when the field is unknown or not yet set.
    pub fn field_value(&self, field: &str) -> Option<String> {
        match field.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "name" => Some(self.name.clone()),
            "gender" => self.gender.clone(),
            "race" => self.race.as_ref().map(|r| r.name.clone()),
            "size" => self
                .race
                .as_ref()
                .map(|r| format!("{:?}", r.size).to_lowercase()),
            "culture" => self.culture.as_ref().map(|c| c.name.clone()),
            "social_status" | "status" => self.social_status.as_ref().map(|s| s.level.clone()),
            "title" => self.social_status.as_ref().and_then(|s| s.title.clone()),
            "legitimate" => self.birth.as_ref().map(|b| b.legitimate.to_string()),
            "birth_place" => self.birth.as_ref().and_then(|b| b.place.clone()),
            other => Attribute::parse(other)
                .ok()
                .map(|a| self.attributes.get(a).to_string()),
        }
    }

    /// Returns true if the subject has a skill with this name (case-insensitive).
    pub fn has_skill(&self, name: &str) -> bool {
        self.skills.iter().any(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Returns true if the subject has held this occupation (case-insensitive).
    pub fn has_occupation(&self, name: &str) -> bool {
        self.occupations
            .iter()
            .any(|o| o.name.eq_ignore_ascii_case(name))
    }
}
