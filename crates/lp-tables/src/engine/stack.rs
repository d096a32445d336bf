//! Cycle and depth guard for chained resolutions.

use std::ops::{Deref, DerefMut};

use crate::error::ResolveError;

/// Ids of the tables currently being resolved, outermost first.
///
/// A stack lives for one top-level call. Entering a table returns a
/// [`StackFrame`] that pops the id again when dropped, so the stack is
/// unwound on every exit path.
#[derive(Debug)]
pub(crate) struct ProcessingStack {
    frames: Vec<String>,
    max_depth: usize,
}

impl ProcessingStack {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self {
            frames: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    /// True when entering another table would exceed the depth limit.
    pub(crate) fn is_full(&self) -> bool {
        self.frames.len() >= self.max_depth
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.frames.iter().any(|f| f == id)
    }

    /// Ids on the stack, outermost first.
    pub(crate) fn frames(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(String::as_str)
    }

    /// Push `id`, failing if it is already on the stack or the stack is full.
    pub(crate) fn enter(&mut self, id: &str) -> Result<StackFrame<'_>, ResolveError> {
        if self.contains(id) {
            let mut path = self.frames.join(" -> ");
            path.push_str(" -> ");
            path.push_str(id);
            return Err(ResolveError::CircularReference { path });
        }
        if self.is_full() {
            return Err(ResolveError::RecursionLimit {
                table: id.to_string(),
                max: self.max_depth,
            });
        }
        self.frames.push(id.to_string());
        Ok(StackFrame { stack: self })
    }
}

/// A table's place on the [`ProcessingStack`], released on drop.
pub(crate) struct StackFrame<'a> {
    stack: &'a mut ProcessingStack,
}

impl Deref for StackFrame<'_> {
    type Target = ProcessingStack;

    fn deref(&self) -> &ProcessingStack {
        self.stack
    }
}

impl DerefMut for StackFrame<'_> {
    fn deref_mut(&mut self) -> &mut ProcessingStack {
        self.stack
    }
}

impl Drop for StackFrame<'_> {
    fn drop(&mut self) {
        self.stack.frames.pop();
    }
}
