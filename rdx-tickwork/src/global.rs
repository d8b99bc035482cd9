//! A default scheduler for callers that do not want to pass one around.
//!
//! The default scheduler is thread-local and created on first use, driven by its
//! own [`ManualClock`]. The host advances it once per frame with [`tick`]:
//!
//! ```rust
//! use tickwork::global;
//!
//! global::delay(0.5, || println!("half a second later")).unwrap();
//! // In the host's per-frame update:
//! global::tick(0.5);
//! ```
//!
//! Tests swap in an isolated instance with [`install`] or start over with [`reset`].

use crate::config::SchedulerConfig;
use crate::engine::Scheduler;
use crate::error::Result;
use crate::handle::ActionHandle;
use crate::time::ManualClock;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::warn;

struct Slot {
    clock: Rc<RefCell<ManualClock>>,
    scheduler: Scheduler,
}

impl Slot {
    fn new(config: SchedulerConfig) -> Self {
        let mut clock = ManualClock::new();
        let scheduler = Scheduler::new(config, &mut clock);
        Self {
            clock: Rc::new(RefCell::new(clock)),
            scheduler,
        }
    }
}

thread_local! {
    static DEFAULT: RefCell<Option<Slot>> = const { RefCell::new(None) };
}

fn with_slot<R>(f: impl FnOnce(&Slot) -> R) -> R {
    DEFAULT.with(|slot| {
        let mut slot = slot.borrow_mut();
        f(slot.get_or_insert_with(|| Slot::new(SchedulerConfig::default())))
    })
}

/// Returns the default scheduler, creating it on first use.
pub fn scheduler() -> Scheduler {
    with_slot(|slot| slot.scheduler.clone())
}

/// Replaces the default scheduler with a fresh one built from `config`.
pub fn install(config: SchedulerConfig) -> Scheduler {
    let fresh = Slot::new(config);
    let scheduler = fresh.scheduler.clone();
    let previous = DEFAULT.with(|slot| slot.borrow_mut().replace(fresh));
    drop(previous);
    scheduler
}

/// Discards the default scheduler and everything scheduled on it.
pub fn reset() {
    let previous = DEFAULT.with(|slot| slot.borrow_mut().take());
    drop(previous);
}

/// Advances the default scheduler by `delta` seconds.
///
/// The slot is not borrowed while callbacks run, so they may use the rest of
/// this module freely. A nested `tick` from inside a callback is ignored.
pub fn tick(delta: f64) {
    let shared = with_slot(|slot| slot.clock.clone());
    let Ok(mut clock) = shared.try_borrow_mut() else {
        warn!("global::tick called from inside a callback; ignored.");
        return;
    };
    clock.tick(delta);
}

pub fn delay(delay: f64, callback: impl FnOnce() + 'static) -> Result<ActionHandle> {
    scheduler().delay(delay, callback)
}

pub fn repeat(interval: f64, callback: impl FnMut() + 'static) -> Result<ActionHandle> {
    scheduler().repeat(interval, callback)
}

pub fn repeat_n(interval: f64, count: i64, callback: impl FnMut() + 'static) -> Result<ActionHandle> {
    scheduler().repeat_n(interval, count, callback)
}

pub fn cancel(handle: ActionHandle) -> bool {
    scheduler().cancel(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn default_scheduler_runs_from_the_frame_hook() {
        reset();
        let count = Rc::new(Cell::new(0));
        let sink = count.clone();
        repeat_n(1.0, 2, move || sink.set(sink.get() + 1)).unwrap();

        for _ in 0..4 {
            tick(1.0);
        }
        assert_eq!(count.get(), 2);
        assert!(scheduler().is_empty());
    }

    #[test]
    fn callbacks_can_reschedule_on_the_default() {
        reset();
        let count = Rc::new(Cell::new(0));
        let sink = count.clone();
        delay(1.0, move || {
            let sink = sink.clone();
            delay(1.0, move || sink.set(sink.get() + 1)).unwrap();
        })
        .unwrap();

        tick(1.0);
        assert_eq!(count.get(), 0);
        tick(1.0);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn install_isolates_previous_registrations() {
        reset();
        let handle = delay(1.0, || {}).unwrap();
        let fresh = install(SchedulerConfig::default());
        assert!(fresh.is_empty());
        assert!(!cancel(handle));
    }
}
