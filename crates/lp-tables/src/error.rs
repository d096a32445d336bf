//! Error types for table registration and resolution.

use lp_mechanics::MechError;
use serde::Serialize;

/// Convenience result type for registry and engine operations.
pub type TableResult<T> = Result<T, TableError>;

/// Errors returned (not recorded) by the registry and engine.
///
/// These indicate bad table data or a bug in the caller; expected domain
/// failures are reported through [`ResolveError`] instead.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// A table failed structural validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A dice specification could not be parsed.
    #[error(transparent)]
    Mech(#[from] MechError),

    /// A table id is not registered.
    #[error("table not found: {0}")]
    NotFound(String),

    /// A table or config file is not valid JSON for the expected shape.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A structural problem found when a table is registered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The table id is empty.
    #[error("table id must not be empty")]
    EmptyId,

    /// The table name is empty.
    #[error("table '{0}' has an empty name")]
    EmptyName(String),

    /// The table has no entries.
    #[error("table '{0}' has no entries")]
    NoEntries(String),

    /// The dice specification does not parse.
    #[error("table '{table}' has invalid dice \"{dice}\"")]
    InvalidDice {
        /// Table id.
        table: String,
        /// The offending specification.
        dice: String,
    },

    /// An entry id is empty.
    #[error("table '{0}' has an entry with an empty id")]
    EmptyEntryId(String),

    /// Two entries share an id.
    #[error("table '{table}' has duplicate entry id '{entry}'")]
    DuplicateEntry {
        /// Table id.
        table: String,
        /// Duplicated entry id.
        entry: String,
    },

    /// An entry's `min` is above its `max`.
    #[error("table '{table}' entry '{entry}' has min {min} > max {max}")]
    InvertedRange {
        /// Table id.
        table: String,
        /// Entry id.
        entry: String,
        /// Lower bound.
        min: i32,
        /// Upper bound.
        max: i32,
    },

    /// Two entries cover the same value.
    #[error("table '{table}' entries '{first}' and '{second}' overlap")]
    OverlappingRanges {
        /// Table id.
        table: String,
        /// Entry with the lower minimum.
        first: String,
        /// Entry with the higher minimum.
        second: String,
    },

    /// Some value between two consecutive entries is not covered.
    #[error("table '{table}' has a gap between entries '{first}' and '{second}'")]
    RangeGap {
        /// Table id.
        table: String,
        /// Entry before the gap.
        first: String,
        /// Entry after the gap.
        second: String,
    },

    /// Two choices in one entry share an id.
    #[error("table '{table}' entry '{entry}' has duplicate choice '{choice}'")]
    DuplicateChoice {
        /// Table id.
        table: String,
        /// Entry id.
        entry: String,
        /// Duplicated choice id.
        choice: String,
    },

    /// Two subtables share an id.
    #[error("table '{table}' has duplicate subtable '{subtable}'")]
    DuplicateSubtable {
        /// Table id.
        table: String,
        /// Duplicated subtable id.
        subtable: String,
    },

    /// An entry names a subtable the table does not declare.
    #[error("table '{table}' entry '{entry}' references unknown subtable '{subtable}'")]
    UnknownSubtable {
        /// Table id.
        table: String,
        /// Entry id.
        entry: String,
        /// Missing subtable id.
        subtable: String,
    },
}

/// A domain failure recorded in [`ProcessingResult::errors`](crate::ProcessingResult).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ResolveError {
    /// The table id is not registered.
    #[error("Table not found: {id}")]
    TableNotFound {
        /// Requested id.
        id: String,
    },

    /// The table has no entries to select from.
    #[error("Table has no entries: {id}")]
    NoEntries {
        /// Table id.
        id: String,
    },

    /// No entry could be selected for the roll.
    #[error("No matching entry for roll {roll} in table {table}")]
    NoMatchingEntry {
        /// Table id.
        table: String,
        /// Modified roll.
        roll: i32,
    },

    /// A goto chain returned to a table already being resolved.
    #[error("Circular reference detected: {path}")]
    CircularReference {
        /// The chain of table ids, ending with the repeated one.
        path: String,
    },

    /// The goto chain is deeper than the configured maximum.
    #[error("Maximum recursion depth {max} exceeded at table {table}")]
    RecursionLimit {
        /// Table that would have exceeded the limit.
        table: String,
        /// Configured maximum depth.
        max: usize,
    },

    /// The choice id is not offered by the selected entry.
    #[error("Invalid choice selected: {id}")]
    InvalidChoice {
        /// Requested choice id.
        id: String,
    },

    /// The entry id does not exist in the table.
    #[error("Entry not found: {id}")]
    EntryNotFound {
        /// Requested entry id.
        id: String,
    },
}
