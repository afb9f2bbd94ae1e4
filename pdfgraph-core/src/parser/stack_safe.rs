//! Stack-safe resolution utilities
//!
//! A [`StackSafeContext`] is created by every top-level resolution request and
//! threaded through the call chain. It bounds nesting depth and records the
//! object numbers currently being resolved, so a reference that leads back into
//! its own resolution path fails instead of recursing.

use super::{ParseError, ParseResult, DEFAULT_MAX_RECURSION_DEPTH};
use std::collections::HashSet;
use std::ops::{Deref, DerefMut};

/// Per-request resolution context
#[derive(Debug)]
pub struct StackSafeContext {
    /// Current recursion depth
    pub depth: usize,
    /// Maximum allowed depth
    pub max_depth: usize,
    /// Object numbers being resolved on the current path
    pub in_flight: HashSet<i64>,
}

impl Default for StackSafeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl StackSafeContext {
    /// Create a new stack-safe context
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_RECURSION_DEPTH)
    }

    /// Create a new context with a custom depth limit
    pub fn with_limit(max_depth: usize) -> Self {
        Self {
            depth: 0,
            max_depth,
            in_flight: HashSet::new(),
        }
    }

    /// Enter a new recursion level
    pub fn enter(&mut self) -> ParseResult<()> {
        if self.depth >= self.max_depth {
            return Err(ParseError::RecursionLimitExceeded {
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    /// Exit a recursion level
    pub fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Mark `object` as being resolved; fails if it already is
    pub fn begin_object(&mut self, object: i64) -> ParseResult<()> {
        if !self.in_flight.insert(object) {
            tracing::debug!("Object {} is already being resolved", object);
            return Err(ParseError::CircularReference { object });
        }
        Ok(())
    }

    /// Mark `object` as no longer being resolved
    pub fn end_object(&mut self, object: i64) {
        self.in_flight.remove(&object);
    }

    pub fn is_in_flight(&self, object: i64) -> bool {
        self.in_flight.contains(&object)
    }
}

/// RAII guard for recursion depth tracking
pub struct RecursionGuard<'a> {
    context: &'a mut StackSafeContext,
}

impl<'a> RecursionGuard<'a> {
    /// Create a new recursion guard
    pub fn new(context: &'a mut StackSafeContext) -> ParseResult<Self> {
        context.enter()?;
        Ok(Self { context })
    }
}

impl Drop for RecursionGuard<'_> {
    fn drop(&mut self) {
        self.context.exit();
    }
}

impl Deref for RecursionGuard<'_> {
    type Target = StackSafeContext;

    fn deref(&self) -> &StackSafeContext {
        self.context
    }
}

impl DerefMut for RecursionGuard<'_> {
    fn deref_mut(&mut self) -> &mut StackSafeContext {
        self.context
    }
}

/// RAII guard keeping one object number in flight.
///
/// The number is released when the guard drops, on success and on error alike.
pub struct ReferenceGuard<'a> {
    context: &'a mut StackSafeContext,
    object: i64,
}

impl<'a> ReferenceGuard<'a> {
    /// Create a new reference guard
    pub fn new(context: &'a mut StackSafeContext, object: i64) -> ParseResult<Self> {
        context.begin_object(object)?;
        Ok(Self { context, object })
    }
}

impl Drop for ReferenceGuard<'_> {
    fn drop(&mut self) {
        self.context.end_object(self.object);
    }
}

impl Deref for ReferenceGuard<'_> {
    type Target = StackSafeContext;

    fn deref(&self) -> &StackSafeContext {
        self.context
    }
}

impl DerefMut for ReferenceGuard<'_> {
    fn deref_mut(&mut self) -> &mut StackSafeContext {
        self.context
    }
}
