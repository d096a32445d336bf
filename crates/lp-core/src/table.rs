use std::fmt;

use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::effect::Effect;
use crate::modifier::ModifierKey;

fn default_dice() -> String {
    "d20".to_string()
}

/// The family a table belongs to.
///
/// Categories only drive supplemental modifier rules and availability
/// filtering; the engine never branches on them otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TableCategory {
    /// Race selection.
    Race,
    /// Cultural background.
    Culture,
    /// Family social standing.
    SocialStatus,
    /// Birth circumstances and legitimacy.
    Birth,
    /// Parents, siblings, and relatives.
    Family,
    /// Childhood and adolescence events.
    Youth,
    /// Adult life events.
    Adulthood,
    /// Occupations and training.
    Occupation,
    /// Personality traits.
    Personality,
    /// Miscellaneous tables reached only by goto.
    #[default]
    General,
    /// A user-defined category, by normalized name.
    Custom(String),
}

impl TableCategory {
    /// Parse a category name; unknown names become [`TableCategory::Custom`].
    ///
    /// Names are matched case-insensitively, with `-` and spaces read as
    /// `_`. Custom names are stored in that normalized form.
    pub fn parse(s: &str) -> Self {
        let name = s.trim().to_lowercase().replace(['-', ' '], "_");
        match name.as_str() {
            "race" => Self::Race,
            "culture" => Self::Culture,
            "social_status" | "status" => Self::SocialStatus,
            "birth" => Self::Birth,
            "family" => Self::Family,
            "youth" | "childhood" => Self::Youth,
            "adulthood" | "adult" => Self::Adulthood,
            "occupation" => Self::Occupation,
            "personality" => Self::Personality,
            "general" | "" => Self::General,
            _ => Self::Custom(name),
        }
    }

    /// Canonical name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Race => "race",
            Self::Culture => "culture",
            Self::SocialStatus => "social_status",
            Self::Birth => "birth",
            Self::Family => "family",
            Self::Youth => "youth",
            Self::Adulthood => "adulthood",
            Self::Occupation => "occupation",
            Self::Personality => "personality",
            Self::General => "general",
            Self::Custom(s) => s,
        }
    }
}

impl From<String> for TableCategory {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<TableCategory> for String {
    fn from(c: TableCategory) -> Self {
        c.as_str().to_string()
    }
}

impl fmt::Display for TableCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structured cross-table reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLink {
    /// Identifier of the table to resolve next.
    pub target: String,
    /// Label shown to the user, e.g. "Elven Events".
    #[serde(default)]
    pub description: Option<String>,
    /// The link is only followed when this holds.
    #[serde(default)]
    pub condition: Option<Condition>,
}

impl TableLink {
    /// Create an unconditional link.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            description: None,
            condition: None,
        }
    }
}

/// A goto reference as written in a table file: either legacy free text
/// ("627 Elven Events") or a structured link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GotoRef {
    /// Legacy free-text reference.
    Text(String),
    /// Structured reference.
    Link(TableLink),
}

impl fmt::Display for GotoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Link(link) => match &link.description {
                Some(d) => write!(f, "{} {d}", link.target),
                None => write!(f, "{}", link.target),
            },
        }
    }
}

/// A named branch the user picks after an entry is selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Identifier, unique within the entry.
    pub id: String,
    /// Label shown to the user.
    pub label: String,
    /// Effects applied when this branch is chosen.
    #[serde(default)]
    pub effects: Vec<Effect>,
}

/// One range-keyed row of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Identifier, unique within the table.
    pub id: String,
    /// Inclusive lower bound.
    pub min: i32,
    /// Inclusive upper bound.
    pub max: i32,
    /// Short outcome label.
    pub result: String,
    /// Longer narrative text.
    #[serde(default)]
    pub description: Option<String>,
    /// Effects applied in declaration order.
    #[serde(default)]
    pub effects: Vec<Effect>,
    /// Table to resolve next.
    #[serde(default)]
    pub goto: Option<GotoRef>,
    /// Branches the user must pick from.
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Nested subtable (by id) to roll on.
    #[serde(default)]
    pub subtable: Option<String>,
}

impl Entry {
    /// Create an entry with no effects.
    pub fn new(id: impl Into<String>, min: i32, max: i32, result: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            min,
            max,
            result: result.into(),
            description: None,
            effects: Vec::new(),
            goto: None,
            choices: Vec::new(),
            subtable: None,
        }
    }

    /// Append an effect.
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Set the goto reference.
    pub fn with_goto(mut self, goto: GotoRef) -> Self {
        self.goto = Some(goto);
        self
    }

    /// Append a choice.
    pub fn with_choice(mut self, choice: Choice) -> Self {
        self.choices.push(choice);
        self
    }

    /// Reference a nested subtable.
    pub fn with_subtable(mut self, id: impl Into<String>) -> Self {
        self.subtable = Some(id.into());
        self
    }

    /// Returns true if `value` falls inside `[min, max]`.
    pub fn contains(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Look up a choice by id.
    pub fn choice(&self, id: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == id)
    }
}

/// A table nested inside another, reached through [`Entry::subtable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtable {
    /// Identifier, unique within the parent table.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Dice specification, e.g. "d6".
    #[serde(default = "default_dice")]
    pub dice: String,
    /// Rows of the subtable.
    pub entries: Vec<Entry>,
}

/// An informational annotation recorded when its condition holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReference {
    /// Condition string such as "race = Elf".
    pub condition: String,
    /// Related table, for the user's reference.
    #[serde(default)]
    pub table: Option<String>,
    /// Free-form note.
    #[serde(default)]
    pub note: Option<String>,
}

/// A named, range-keyed decision table.
///
/// Read-only configuration: deserialized or built once, handed to the
/// registry for validation, and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Unique identifier, e.g. "101".
    pub id: String,
    /// Display name.
    pub name: String,
    /// Table family.
    #[serde(default)]
    pub category: TableCategory,
    /// Dice specification, e.g. "d100".
    #[serde(default = "default_dice")]
    pub dice: String,
    /// Primary modifier key added to every roll.
    #[serde(default)]
    pub modifier: Option<ModifierKey>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Rows, ordered by range.
    pub entries: Vec<Entry>,
    /// Nested subtables.
    #[serde(default)]
    pub subtables: Vec<Subtable>,
    /// All must hold for the table to be offered.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Informational annotations.
    #[serde(default)]
    pub cross_references: Vec<CrossReference>,
    /// Natural rolls that trigger a single reroll.
    #[serde(default)]
    pub reroll_on: Vec<i32>,
}

impl Table {
    /// Create an empty general-category table.
    pub fn new(id: impl Into<String>, name: impl Into<String>, dice: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: TableCategory::General,
            dice: dice.into(),
            modifier: None,
            description: None,
            entries: Vec::new(),
            subtables: Vec::new(),
            conditions: Vec::new(),
            cross_references: Vec::new(),
            reroll_on: Vec::new(),
        }
    }

    /// Set the category.
    pub fn with_category(mut self, category: TableCategory) -> Self {
        self.category = category;
        self
    }

    /// Set the primary modifier key.
    pub fn with_modifier(mut self, key: impl Into<ModifierKey>) -> Self {
        self.modifier = Some(key.into());
        self
    }

    /// Append an entry.
    pub fn with_entry(mut self, entry: Entry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Append a subtable.
    pub fn with_subtable(mut self, subtable: Subtable) -> Self {
        self.subtables.push(subtable);
        self
    }

    /// Append an availability condition.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Append a cross-reference annotation.
    pub fn with_cross_reference(mut self, xref: CrossReference) -> Self {
        self.cross_references.push(xref);
        self
    }

    /// Set the natural rolls that trigger a reroll.
    pub fn with_reroll_on(mut self, values: Vec<i32>) -> Self {
        self.reroll_on = values;
        self
    }

    /// Look up an entry by id.
    pub fn entry(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Look up a subtable by id.
    pub fn subtable(&self, id: &str) -> Option<&Subtable> {
        self.subtables.iter().find(|s| s.id == id)
    }

    /// Lowest entry minimum and highest entry maximum, or `None` if empty.
    pub fn bounds(&self) -> Option<(i32, i32)> {
        let min = self.entries.iter().map(|e| e.min).min()?;
        let max = self.entries.iter().map(|e| e.max).max()?;
        Some((min, max))
    }

    /// Returns true if every availability condition holds for the subject.
    pub fn is_available_for(&self, subject: &crate::subject::Subject) -> bool {
        self.conditions.iter().all(|c| c.evaluate(subject))
    }

    /// Build a standalone table from one of this table's subtables.
    ///
    /// The result is identified as `<table id>/<subtable id>` and inherits the
    /// parent's category but not its modifier key.
    pub fn subtable_as_table(&self, id: &str) -> Option<Table> {
        let sub = self.subtable(id)?;
        Some(Table {
            id: format!("{}/{}", self.id, sub.id),
            name: sub.name.clone(),
            category: self.category.clone(),
            dice: sub.dice.clone(),
            modifier: None,
            description: None,
            entries: sub.entries.clone(),
            subtables: Vec::new(),
            conditions: Vec::new(),
            cross_references: Vec::new(),
            reroll_on: Vec::new(),
        })
    }
}
