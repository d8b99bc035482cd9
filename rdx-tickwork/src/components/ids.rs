//! Per-kind action id allocation.

use crate::common::ActionId;
use std::collections::HashSet;

/// Hands out action ids from a wrapping counter, skipping ids still in use.
///
/// Ids grow monotonically and wrap to zero after the last one in the space.
/// An id is only reused once the action that held it has left the engine.
#[derive(Debug)]
pub(crate) struct IdAllocator {
    next: u32,
    max: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::with_max(u32::MAX)
    }
}

impl IdAllocator {
    /// An allocator over the ids `0..=max`.
    pub(crate) fn with_max(max: u32) -> Self {
        Self { next: 0, max }
    }

    /// Returns the first free id at or after the counter, or `None` when every
    /// id in the space is occupied.
    pub(crate) fn allocate(&mut self, live: &HashSet<ActionId>) -> Option<ActionId> {
        let start = self.next;
        loop {
            let candidate = ActionId(self.next);
            self.next = if self.next == self.max { 0 } else { self.next + 1 };
            if !live.contains(&candidate) {
                return Some(candidate);
            }
            if self.next == start {
                return None;
            }
        }
    }
}
