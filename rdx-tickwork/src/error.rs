use crate::common::ActionKind;
use thiserror::Error;

/// Errors returned when registering an action.
///
/// Cancelling an unknown or stale handle is not an error; `cancel` reports it
/// as `false`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("repeat count must be positive, got {count}")]
    InvalidCount { count: i64 },

    #[error("no free {kind} action id left")]
    IdSpaceExhausted { kind: ActionKind },
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
