//! Range matching with open-ended ceiling and floor.

use lp_core::Entry;

/// How an entry was selected for a roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Match<'a> {
    /// The roll lies inside the entry's range.
    Exact(&'a Entry),
    /// The roll is above every range; the highest entry is used.
    Ceiling(&'a Entry),
    /// The roll is below every range; the lowest entry is used.
    Floor(&'a Entry),
}

impl<'a> Match<'a> {
    pub(crate) fn entry(self) -> &'a Entry {
        match self {
            Self::Exact(e) | Self::Ceiling(e) | Self::Floor(e) => e,
        }
    }
}

/// Select the entry for `value`, or `None` if no entry can be identified.
pub(crate) fn match_entry(entries: &[Entry], value: i32) -> Option<Match<'_>> {
    if let Some(e) = entries.iter().find(|e| e.contains(value)) {
        return Some(Match::Exact(e));
    }

    let highest = entries.iter().max_by_key(|e| e.max)?;
    if value > highest.max {
        return Some(Match::Ceiling(highest));
    }
    let lowest = entries.iter().min_by_key(|e| e.min)?;
    if value < lowest.min {
        return Some(Match::Floor(lowest));
    }
    None
}
