//! Resolution options and results.

use std::collections::BTreeMap;

use lp_core::{EffectRecord, Entry, Subject};
use serde::Serialize;

use crate::error::ResolveError;

/// Caller-supplied options for one resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Use this value as the natural roll instead of rolling dice.
    pub manual_selection: Option<i32>,
    /// Do not follow gotos or subtables.
    pub skip_goto: bool,
    /// Named ad hoc modifiers added to the net modifier.
    pub additional_modifiers: BTreeMap<String, i32>,
    /// Net modifier of the parent resolution. Recorded, never re-added.
    pub inherited_modifier: Option<i32>,
}

impl ResolveOptions {
    /// Options for a plain dice roll.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `value` as the natural roll.
    pub fn manual(mut self, value: i32) -> Self {
        self.manual_selection = Some(value);
        self
    }

    /// Suppress chaining.
    pub fn skip_goto(mut self) -> Self {
        self.skip_goto = true;
        self
    }

    /// Add a named ad hoc modifier.
    pub fn with_modifier(mut self, name: impl Into<String>, value: i32) -> Self {
        self.additional_modifiers.insert(name.into(), value);
        self
    }

    pub(crate) fn inherited(net: i32) -> Self {
        Self {
            inherited_modifier: Some(net),
            ..Self::default()
        }
    }
}

/// Everything one resolution did.
///
/// Expected failures (unknown table, cycle, bad choice id, ...) come back as
/// a result with `success == false` and a populated `errors` list. Nested
/// results from followed gotos and subtables are in `chain`; a failure
/// anywhere in the chain also marks this result as failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingResult {
    /// Id of the resolved table.
    pub table_id: String,
    /// Name of the resolved table, if it was found.
    pub table_name: Option<String>,
    /// The dice roll, or the manual selection value.
    pub natural_roll: Option<i32>,
    /// Net modifier added to the natural roll.
    pub net_modifier: i32,
    /// Net modifier handed down by the parent resolution.
    pub inherited_modifier: Option<i32>,
    /// `natural_roll + net_modifier`; absent when no roll took place.
    pub roll_result: Option<i32>,
    /// The selected entry.
    pub entry: Option<Entry>,
    /// Id of the chosen branch, for results of a choice.
    pub choice: Option<String>,
    /// One record per applied effect.
    pub effects: Vec<EffectRecord>,
    /// Subject state after this step.
    pub subject: Subject,
    /// Results of followed subtables and gotos, in order.
    pub chain: Vec<ProcessingResult>,
    /// True when this step and every chained step succeeded.
    pub success: bool,
    /// Domain errors.
    pub errors: Vec<ResolveError>,
    /// Non-fatal problems such as unparsable gotos.
    pub warnings: Vec<String>,
    /// Condition strings of the cross-reference annotations that held.
    pub applied_cross_references: Vec<String>,
    /// The first roll triggered a reroll.
    pub rerolled: bool,
    /// The value was supplied by the caller rather than rolled.
    pub manual_selection: bool,
    /// The selected entry offers choices.
    pub requires_choice: bool,
    /// The selected entry carries a goto, followed or not.
    pub requires_goto: bool,
}

impl ProcessingResult {
    pub(crate) fn new(table_id: impl Into<String>, subject: &Subject) -> Self {
        Self {
            table_id: table_id.into(),
            table_name: None,
            natural_roll: None,
            net_modifier: 0,
            inherited_modifier: None,
            roll_result: None,
            entry: None,
            choice: None,
            effects: Vec::new(),
            subject: subject.clone(),
            chain: Vec::new(),
            success: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            applied_cross_references: Vec::new(),
            rerolled: false,
            manual_selection: false,
            requires_choice: false,
            requires_goto: false,
        }
    }

    pub(crate) fn fail(mut self, error: ResolveError) -> Self {
        self.success = false;
        self.errors.push(error);
        self
    }

    /// Append a nested result, taking on its failure.
    pub(crate) fn push_chain(&mut self, nested: ProcessingResult) {
        if !nested.success {
            self.success = false;
            self.errors.extend(nested.errors.iter().cloned());
        }
        self.chain.push(nested);
    }

    /// Effect records of this step and every chained step, depth first.
    pub fn all_effects(&self) -> Vec<&EffectRecord> {
        let mut out: Vec<&EffectRecord> = self.effects.iter().collect();
        for nested in &self.chain {
            out.extend(nested.all_effects());
        }
        out
    }

    /// Ids of every table visited, depth first.
    pub fn visited_tables(&self) -> Vec<&str> {
        let mut out = vec![self.table_id.as_str()];
        for nested in &self.chain {
            out.extend(nested.visited_tables());
        }
        out
    }

    /// Short text of the selected entry, or an empty string.
    pub fn result_text(&self) -> &str {
        self.entry.as_ref().map_or("", |e| e.result.as_str())
    }
}
