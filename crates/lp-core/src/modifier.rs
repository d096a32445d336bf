use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A named adjustment in a subject's modifier set.
///
/// The five built-in keys use the short names found in table files
/// (`cuMod`, `solMod`, `tiMod`, `biMod`, `legitMod`). Anything else is kept
/// verbatim as an ad hoc key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModifierKey {
    /// Cultural background modifier.
    Cultural,
    /// Social status modifier.
    SocialStatus,
    /// Noble title modifier.
    Title,
    /// Birth circumstances modifier.
    Birth,
    /// Legitimacy of birth modifier.
    Legitimacy,
    /// An open-ended ad hoc key.
    Custom(String),
}

impl ModifierKey {
    /// The built-in keys, in their canonical order.
    pub fn builtin() -> &'static [ModifierKey] {
        &[
            Self::Cultural,
            Self::SocialStatus,
            Self::Title,
            Self::Birth,
            Self::Legitimacy,
        ]
    }

    /// Parse a key from its short or long name. Unrecognized names become
    /// [`ModifierKey::Custom`].
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "cumod" | "cultural" | "culture" => Self::Cultural,
            "solmod" | "social_status" | "social" | "status" => Self::SocialStatus,
            "timod" | "title" => Self::Title,
            "bimod" | "birth" => Self::Birth,
            "legitmod" | "legitimacy" => Self::Legitimacy,
            _ => Self::Custom(s.trim().to_string()),
        }
    }

    /// The short name used in table files.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Cultural => "cuMod",
            Self::SocialStatus => "solMod",
            Self::Title => "tiMod",
            Self::Birth => "biMod",
            Self::Legitimacy => "legitMod",
            Self::Custom(s) => s,
        }
    }

    /// A human-readable label for breakdown strings.
    pub fn label(&self) -> &str {
        match self {
            Self::Cultural => "Cultural",
            Self::SocialStatus => "Social Status",
            Self::Title => "Title",
            Self::Birth => "Birth",
            Self::Legitimacy => "Legitimacy",
            Self::Custom(s) => s,
        }
    }
}

impl From<String> for ModifierKey {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<&str> for ModifierKey {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<ModifierKey> for String {
    fn from(key: ModifierKey) -> Self {
        key.as_str().to_string()
    }
}

impl fmt::Display for ModifierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The subject's current signed adjustments, keyed by [`ModifierKey`].
///
/// Missing keys read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModifierSet {
    values: BTreeMap<ModifierKey, i32>,
}

impl ModifierSet {
    /// Create an empty modifier set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value for a key, or 0 if it was never set.
    pub fn get(&self, key: &ModifierKey) -> i32 {
        self.values.get(key).copied().unwrap_or(0)
    }

    /// Overwrite the value for a key.
    pub fn set(&mut self, key: ModifierKey, value: i32) {
        self.values.insert(key, value);
    }

    /// Add `delta` to a key's current value and return the new value.
    pub fn adjust(&mut self, key: ModifierKey, delta: i32) -> i32 {
        let slot = self.values.entry(key).or_insert(0);
        *slot = slot.saturating_add(delta);
        *slot
    }

    /// Builder-style setter.
    pub fn with(mut self, key: impl Into<ModifierKey>, value: i32) -> Self {
        self.set(key.into(), value);
        self
    }

    /// Returns true if the key has an explicit entry.
    pub fn contains(&self, key: &ModifierKey) -> bool {
        self.values.contains_key(key)
    }

    /// Iterate over all explicit entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&ModifierKey, i32)> {
        self.values.iter().map(|(k, v)| (k, *v))
    }

    /// Number of explicit entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no key has been set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
