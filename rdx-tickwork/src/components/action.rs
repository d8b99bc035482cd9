//! Records for the two kinds of timed action.

use crate::common::ActionId;
use crate::error::{Result, ScheduleError};

/// The work of a delayed action. Consumed by its single fire.
pub type DelayedCallback = Box<dyn FnOnce()>;

/// The work of a repeating action. Invoked once per fire.
pub type RepeatingCallback = Box<dyn FnMut()>;

/// How many fires a repeating action has left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repetitions {
    /// Fires until cancelled.
    Unbounded,
    /// Fires this many more times, then retires.
    Remaining(u64),
}

impl Repetitions {
    /// Validates a caller-supplied repeat count.
    pub fn bounded(count: i64) -> Result<Self> {
        if count <= 0 {
            return Err(ScheduleError::InvalidCount { count });
        }
        Ok(Repetitions::Remaining(count as u64))
    }

    fn consume(&mut self) {
        if let Repetitions::Remaining(n) = self {
            *n = n.saturating_sub(1);
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Repetitions::Remaining(0))
    }
}

/// A callback that fires once when its countdown runs out.
pub(crate) struct DelayedAction {
    pub id: ActionId,
    pub countdown: f64,
    callback: DelayedCallback,
}

impl DelayedAction {
    pub(crate) fn new(id: ActionId, delay: f64, callback: DelayedCallback) -> Self {
        Self {
            id,
            countdown: delay,
            callback,
        }
    }

    /// Subtracts `delta` from the countdown. Returns `true` once the action is due.
    pub(crate) fn advance(&mut self, delta: f64) -> bool {
        self.countdown -= delta;
        self.countdown <= 0.0
    }

    /// Gives up the callback for its one and only invocation.
    pub(crate) fn into_callback(self) -> DelayedCallback {
        self.callback
    }
}

/// A callback that fires every `interval` seconds.
pub(crate) struct RepeatingAction {
    pub id: ActionId,
    pub interval: f64,
    pub countdown: f64,
    pub repetitions: Repetitions,
    callback: RepeatingCallback,
}

impl RepeatingAction {
    /// The first fire is one full `interval` away.
    pub(crate) fn new(
        id: ActionId,
        interval: f64,
        repetitions: Repetitions,
        callback: RepeatingCallback,
    ) -> Self {
        Self {
            id,
            interval,
            countdown: interval,
            repetitions,
            callback,
        }
    }

    /// Subtracts `delta` from the countdown. Returns `true` if the action is due.
    pub(crate) fn advance(&mut self, delta: f64) -> bool {
        self.countdown -= delta;
        self.is_due()
    }

    pub(crate) fn is_due(&self) -> bool {
        self.countdown <= 0.0
    }

    pub(crate) fn callback_mut(&mut self) -> &mut RepeatingCallback {
        &mut self.callback
    }

    /// Books one fire: the countdown moves forward by one interval, keeping
    /// any overshoot, and a bounded count drops by one.
    pub(crate) fn reschedule(&mut self) {
        self.countdown += self.interval;
        self.repetitions.consume();
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.repetitions.is_exhausted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_rejects_non_positive_counts() {
        assert_eq!(
            Repetitions::bounded(0),
            Err(ScheduleError::InvalidCount { count: 0 })
        );
        assert_eq!(
            Repetitions::bounded(-3),
            Err(ScheduleError::InvalidCount { count: -3 })
        );
        assert_eq!(Repetitions::bounded(2), Ok(Repetitions::Remaining(2)));
    }

    #[test]
    fn delayed_action_is_due_at_zero() {
        let mut action = DelayedAction::new(ActionId(0), 2.0, Box::new(|| {}));
        assert!(!action.advance(1.0));
        assert!(action.advance(1.0));
    }

    #[test]
    fn reschedule_keeps_overshoot() {
        let mut action =
            RepeatingAction::new(ActionId(0), 2.0, Repetitions::Unbounded, Box::new(|| {}));
        assert!(action.advance(2.5));
        action.reschedule();
        assert_eq!(action.countdown, 1.5);
        assert!(!action.is_exhausted());
    }

    #[test]
    fn bounded_repeat_exhausts() {
        let mut action = RepeatingAction::new(
            ActionId(0),
            1.0,
            Repetitions::Remaining(2),
            Box::new(|| {}),
        );
        action.reschedule();
        assert!(!action.is_exhausted());
        action.reschedule();
        assert!(action.is_exhausted());
    }
}
