//! Contains common, primitive types used across the scheduler.
//!
//! This module defines the identifiers for actions and engine instances. Using
//! distinct types instead of bare integers keeps a delayed id from being mixed
//! up with a repeating id, or a handle from one engine with another.

use slotmap::new_key_type;
use std::fmt;

new_key_type! {
    /// Uniquely identifies a live `Scheduler` instance on the current thread.
    ///
    /// Engine keys are generational: once an engine is dropped its key is never
    /// handed out again, so handles that outlive their engine cannot be routed
    /// to a newer one that happens to reuse the slot.
    pub struct EngineId;
}

/// Identifies an action among the currently-live actions of the same kind.
///
/// Ids are unique per kind only. A delayed and a repeating action may carry
/// the same numeric id; handles tell them apart through [`ActionKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(pub u32);

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Discriminates the two kinds of timed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Fires once after a delay, then is removed.
    Delayed,
    /// Fires on an interval, a bounded number of times or forever.
    Repeating,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Delayed => f.write_str("delayed"),
            ActionKind::Repeating => f.write_str("repeating"),
        }
    }
}
