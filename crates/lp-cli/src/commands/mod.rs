pub mod check;
pub mod list;
pub mod resolve;
pub mod roll;

use std::fs;
use std::path::Path;

use lp_core::Subject;
use lp_tables::TableRegistry;
use tracing::debug;

/// Read a file, naming it in the error.
fn read_file(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))
}

/// Load and validate a JSON table file.
fn load_registry(path: &Path) -> Result<TableRegistry, String> {
    let text = read_file(path)?;
    let mut registry = TableRegistry::new();
    registry
        .load_json(&text)
        .map_err(|e| format!("{}: {e}", path.display()))?;
    debug!(path = %path.display(), tables = registry.len(), "loaded table file");
    Ok(registry)
}

/// Load a subject from JSON, or start a fresh one.
fn load_subject(path: Option<&Path>) -> Result<Subject, String> {
    match path {
        Some(path) => {
            let text = read_file(path)?;
            serde_json::from_str(&text).map_err(|e| format!("{}: {e}", path.display()))
        }
        None => Ok(Subject::new("Unnamed")),
    }
}

/// Parse a `name=value` modifier argument.
pub fn parse_modifier(s: &str) -> Result<(String, i32), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing modifier name in '{s}'"));
    }
    let value = value
        .trim()
        .parse::<i32>()
        .map_err(|_| format!("modifier value must be an integer in '{s}'"))?;
    Ok((name.to_string(), value))
}
