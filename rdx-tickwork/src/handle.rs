//! The opaque token returned for every registered action.

use crate::common::{ActionId, ActionKind, EngineId};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::rc::Rc;

/// Identifies one registration on one `Scheduler`.
///
/// A handle is a plain lookup key: it owns nothing and stays valid to hold,
/// copy and compare after its action is gone. Cancelling through a stale handle
/// is a no-op that returns `false`.
///
/// Handles compare equal when their id and kind match. They remember the engine
/// that issued them, and cancellation is always routed back to that engine.
/// Like the scheduler itself, handles are bound to the thread they were made on.
#[derive(Debug, Clone, Copy)]
pub struct ActionHandle {
    id: ActionId,
    kind: ActionKind,
    owner: EngineId,
    _thread_bound: PhantomData<Rc<()>>,
}

impl ActionHandle {
    pub(crate) fn new(id: ActionId, kind: ActionKind, owner: EngineId) -> Self {
        Self {
            id,
            kind,
            owner,
            _thread_bound: PhantomData,
        }
    }

    pub fn id(&self) -> ActionId {
        self.id
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub(crate) fn owner(&self) -> EngineId {
        self.owner
    }

    /// Asks the engine that issued this handle to cancel the action.
    ///
    /// Returns `true` if the action was live and is now marked for removal,
    /// `false` if it already fired, was already cancelled, or its engine has
    /// been dropped.
    pub fn cancel(self) -> bool {
        crate::engine::route_cancel(self)
    }
}

impl PartialEq for ActionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.kind == other.kind
    }
}

impl Eq for ActionHandle {}

impl Hash for ActionHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.kind.hash(state);
    }
}
