//! Structural validation of table definitions.
//!
//! Runs at registration time so that malformed tables never reach the
//! resolution engine. Entry ranges must be well-formed and, once sorted by
//! lower bound, must neither overlap nor leave gaps.

use std::collections::HashSet;

use lp_core::{Entry, Table};
use lp_mechanics::DiceSpec;

use crate::error::ValidationError;

/// Validate a table and all of its subtables.
pub fn validate_table(table: &Table) -> Result<(), ValidationError> {
    if table.id.trim().is_empty() {
        return Err(ValidationError::EmptyId);
    }
    if table.name.trim().is_empty() {
        return Err(ValidationError::EmptyName(table.id.clone()));
    }

    let subtable_ids: HashSet<&str> = table.subtables.iter().map(|s| s.id.as_str()).collect();
    check_entries(&table.id, &table.dice, &table.entries, &subtable_ids)?;

    let mut seen = HashSet::new();
    for sub in &table.subtables {
        let qualified = format!("{}/{}", table.id, sub.id);
        if sub.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if !seen.insert(sub.id.as_str()) {
            return Err(ValidationError::DuplicateSubtable {
                table: table.id.clone(),
                subtable: sub.id.clone(),
            });
        }
        if sub.name.trim().is_empty() {
            return Err(ValidationError::EmptyName(qualified));
        }
        check_entries(&qualified, &sub.dice, &sub.entries, &HashSet::new())?;
    }

    Ok(())
}

/// Check the dice and entry list of one table or subtable.
fn check_entries(
    table: &str,
    dice: &str,
    entries: &[Entry],
    subtables: &HashSet<&str>,
) -> Result<(), ValidationError> {
    if entries.is_empty() {
        return Err(ValidationError::NoEntries(table.to_string()));
    }
    if DiceSpec::parse(dice).is_err() {
        return Err(ValidationError::InvalidDice {
            table: table.to_string(),
            dice: dice.to_string(),
        });
    }

    let mut ids = HashSet::new();
    for entry in entries {
        check_entry(table, entry, subtables)?;
        if !ids.insert(entry.id.as_str()) {
            return Err(ValidationError::DuplicateEntry {
                table: table.to_string(),
                entry: entry.id.clone(),
            });
        }
    }

    let mut sorted: Vec<&Entry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.min);
    for pair in sorted.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a.max >= b.min {
            return Err(ValidationError::OverlappingRanges {
                table: table.to_string(),
                first: a.id.clone(),
                second: b.id.clone(),
            });
        }
        if i64::from(a.max) + 1 < i64::from(b.min) {
            return Err(ValidationError::RangeGap {
                table: table.to_string(),
                first: a.id.clone(),
                second: b.id.clone(),
            });
        }
    }

    Ok(())
}

fn check_entry(table: &str, entry: &Entry, subtables: &HashSet<&str>) -> Result<(), ValidationError> {
    if entry.id.trim().is_empty() {
        return Err(ValidationError::EmptyEntryId(table.to_string()));
    }
    if entry.min > entry.max {
        return Err(ValidationError::InvertedRange {
            table: table.to_string(),
            entry: entry.id.clone(),
            min: entry.min,
            max: entry.max,
        });
    }

    let mut choice_ids = HashSet::new();
    for choice in &entry.choices {
        if !choice_ids.insert(choice.id.as_str()) {
            return Err(ValidationError::DuplicateChoice {
                table: table.to_string(),
                entry: entry.id.clone(),
                choice: choice.id.clone(),
            });
        }
    }

    if let Some(sub) = &entry.subtable
        && !subtables.contains(sub.as_str())
    {
        return Err(ValidationError::UnknownSubtable {
            table: table.to_string(),
            entry: entry.id.clone(),
            subtable: sub.clone(),
        });
    }

    Ok(())
}
