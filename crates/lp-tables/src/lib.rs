//! Table registry and resolution engine for Lifepath character generation.
//!
//! A [`TableRegistry`] holds validated, read-only [`Table`](lp_core::Table)
//! definitions. A [`TableEngine`] borrows the registry and resolves tables
//! against a caller-owned [`Subject`](lp_core::Subject): it aggregates
//! modifiers, rolls (or takes a manual selection), matches an entry by range,
//! applies the entry's effects, and follows cross-table references under a
//! cycle and depth guard. Every call returns a [`ProcessingResult`].

pub mod apply;
pub mod config;
pub mod engine;
pub mod error;
pub mod goto;
pub mod registry;
pub mod result;
pub mod validate;

pub use apply::{Applied, apply_effect, apply_effects};
pub use config::EngineConfig;
pub use engine::{TableEngine, TableRef};
pub use error::{ResolveError, TableError, TableResult, ValidationError};
pub use registry::TableRegistry;
pub use result::{ProcessingResult, ResolveOptions};
pub use validate::validate_table;
