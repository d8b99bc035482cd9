//! Defines the event types broadcast by the scheduler.
//!
//! Events are informational. The scheduler never waits on subscribers, and an
//! event sent while nobody is subscribed is simply dropped.

use crate::common::{ActionId, ActionKind};

/// Lifecycle events of scheduled actions.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerEvent {
    /// Fired when a new action is registered.
    ActionScheduled {
        id: ActionId,
        kind: ActionKind,
        /// Seconds until the first fire.
        due_in: f64,
    },
    /// Fired each time an action's callback is invoked.
    ActionFired {
        id: ActionId,
        kind: ActionKind,
        /// The engine's accumulated elapsed time at the tick that fired it.
        elapsed: f64,
    },
    /// Fired when a cancellation request is accepted.
    ActionCancelled { id: ActionId, kind: ActionKind },
    /// Fired when an action leaves the engine after its last fire.
    ActionCompleted { id: ActionId, kind: ActionKind },
}
