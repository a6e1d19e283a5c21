//! The per-request handler sequence and its cursor.
//!
//! A [`Chain`] is assembled once per request: the middlewares of every matching
//! group, then exactly one terminal handler. The cursor only moves forward, one
//! handler per [`Chain::advance`], and never past the end.

use crate::handler::HandlerFunc;
use std::fmt;
use std::sync::Arc;

#[derive(Default)]
pub struct Chain {
    handlers: Vec<HandlerFunc>,
    // index of the next handler to run
    next: usize,
}

impl Chain {
    pub(crate) fn new(handlers: Vec<HandlerFunc>) -> Self {
        Self { handlers, next: 0 }
    }

    /// Appends the terminal handler, only before the chain starts running.
    pub(crate) fn push(&mut self, handler: HandlerFunc) {
        debug_assert_eq!(self.next, 0, "handler pushed into a running chain");
        self.handlers.push(handler);
    }

    /// Moves the cursor one step and returns the handler now under it.
    ///
    /// Returns `None`, leaving the cursor at the end, once every handler has run.
    pub(crate) fn advance(&mut self) -> Option<HandlerFunc> {
        let handler = self.handlers.get(self.next).map(Arc::clone)?;
        self.next += 1;
        Some(handler)
    }

    /// Moves the cursor to the end so that no further handler runs.
    pub(crate) fn exhaust(&mut self) {
        self.next = self.handlers.len();
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Position of the handler currently running, `None` before the first advance.
    pub fn position(&self) -> Option<usize> {
        self.next.checked_sub(1)
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.handlers.len()
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain").field("len", &self.handlers.len()).field("next", &self.next).finish()
    }
}
