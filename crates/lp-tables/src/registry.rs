//! The table registry.
//!
//! Tables are validated when they are registered and never change after
//! that, so a populated registry can be shared by any number of engines.

use std::collections::HashMap;

use lp_core::{Subject, Table, TableCategory};
use tracing::debug;

use crate::error::{TableError, TableResult, ValidationError};
use crate::goto;
use crate::validate::validate_table;

/// Validated tables keyed by id.
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    tables: HashMap<String, Table>,
}

impl TableRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store a table, replacing any table with the same id.
    ///
    /// Free-text gotos with a recognizable table id are rewritten as
    /// structured links on the way in.
    pub fn register(&mut self, mut table: Table) -> Result<(), ValidationError> {
        validate_table(&table)?;

        for entry in table
            .entries
            .iter_mut()
            .chain(table.subtables.iter_mut().flat_map(|s| s.entries.iter_mut()))
        {
            entry.goto = entry.goto.take().map(goto::normalize);
        }

        if self.tables.contains_key(&table.id) {
            debug!(table = %table.id, "replacing registered table");
        }
        self.tables.insert(table.id.clone(), table);
        Ok(())
    }

    /// Register every table, stopping at the first invalid one.
    pub fn register_all(
        &mut self,
        tables: impl IntoIterator<Item = Table>,
    ) -> Result<usize, ValidationError> {
        let mut count = 0;
        for table in tables {
            self.register(table)?;
            count += 1;
        }
        Ok(count)
    }

    /// Parse a JSON table file (one table or an array) and register its
    /// tables. Returns how many were registered.
    pub fn load_json(&mut self, json: &str) -> TableResult<usize> {
        let tables: Vec<Table> = if json.trim_start().starts_with('[') {
            serde_json::from_str(json)?
        } else {
            vec![serde_json::from_str(json)?]
        };
        let count = self.register_all(tables)?;
        debug!(count, "loaded tables");
        Ok(count)
    }

    /// Look up a table.
    pub fn get(&self, id: &str) -> Option<&Table> {
        self.tables.get(id)
    }

    /// Look up a table, failing if it is not registered.
    pub fn lookup(&self, id: &str) -> TableResult<&Table> {
        self.get(id)
            .ok_or_else(|| TableError::NotFound(id.to_string()))
    }

    /// Returns true if `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.tables.contains_key(id)
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registered tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// All tables, in no particular order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// Tables whose conditions all hold for `subject`, optionally limited to
    /// one category, sorted by id.
    pub fn available(&self, subject: &Subject, category: Option<&TableCategory>) -> Vec<&Table> {
        let mut out: Vec<&Table> = self
            .tables
            .values()
            .filter(|t| category.is_none_or(|c| &t.category == c))
            .filter(|t| t.is_available_for(subject))
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }
}
