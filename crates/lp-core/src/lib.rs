//! Core types for Lifepath: the subject under construction, table
//! definitions, and the effects that table entries apply.
//!
//! This crate is pure data. Rolling dice lives in `lp-mechanics` and table
//! resolution in `lp-tables`; everything here can be built programmatically
//! or deserialized from JSON table files.

/// Conditions evaluated against a subject.
pub mod condition;
/// Declarative effects and the normalized records produced by applying them.
pub mod effect;
/// Error types used throughout the crate.
pub mod error;
/// Named modifier keys and the subject's modifier set.
pub mod modifier;
/// The subject record built up across table resolutions.
pub mod subject;
/// Table, entry, and reference definitions.
pub mod table;

/// Re-export condition types.
pub use condition::Condition;
/// Re-export effect types.
pub use effect::{Effect, EffectKind, EffectRecord};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export modifier types.
pub use modifier::{ModifierKey, ModifierSet};
/// Re-export subject types.
pub use subject::{Attribute, Attributes, Subject, SubjectId};
/// Re-export table types.
pub use table::{Choice, CrossReference, Entry, GotoRef, Subtable, Table, TableCategory, TableLink};
