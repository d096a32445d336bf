//! Cross-table reference parsing.
//!
//! Tables may carry legacy free-text references such as `"627 Elven Events"`
//! alongside structured [`TableLink`]s. Everything that looks at the shape of
//! a reference string lives here; the engine only ever sees a `TableLink`.

use lp_core::{GotoRef, TableLink};

/// Resolve a goto reference to a structured link.
///
/// Returns `None` when free text contains no numeric table id.
pub fn link_for(goto: &GotoRef) -> Option<TableLink> {
    match goto {
        GotoRef::Link(link) => Some(link.clone()),
        GotoRef::Text(text) => parse_text(text),
    }
}

/// Rewrite a parsable free-text reference as a structured one.
///
/// Unparsable text is returned unchanged so the engine can warn about it.
pub fn normalize(goto: GotoRef) -> GotoRef {
    match &goto {
        GotoRef::Text(text) => match parse_text(text) {
            Some(link) => GotoRef::Link(link),
            None => goto,
        },
        GotoRef::Link(_) => goto,
    }
}

/// Take the first run of digits as the target id and whatever follows it as
/// the description.
fn parse_text(text: &str) -> Option<TableLink> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let (target, tail) = rest.split_at(end);

    let description = tail
        .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '-' | ','))
        .trim();
    let mut link = TableLink::new(target);
    if !description.is_empty() {
        link.description = Some(description.to_string());
    }
    Some(link)
}
