//! The scheduling engine that owns and evaluates every timed action.

use crate::common::{ActionId, ActionKind, EngineId};
use crate::components::action::{
    DelayedAction, DelayedCallback, RepeatingAction, RepeatingCallback, Repetitions,
};
use crate::components::ids::IdAllocator;
use crate::config::{FirePolicy, SchedulerConfig};
use crate::error::{Result, ScheduleError};
use crate::events::SchedulerEvent;
use crate::handle::ActionHandle;
use crate::time::TickSource;
use slotmap::SlotMap;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};
use tokio::sync::broadcast;
use tracing::{debug, error, trace, warn};

/// Upper bound on how many times one repeating action may fire within a single
/// tick under [`FirePolicy::CatchUp`]. The rest of the backlog carries over.
pub const MAX_CATCH_UP_FIRES: u32 = 1_000;

thread_local! {
    /// Live engines on this thread, so a bare handle can find its owner.
    static ENGINES: RefCell<SlotMap<EngineId, Weak<Inner>>> = RefCell::new(SlotMap::with_key());
}

/// Routes a handle's cancellation to the engine that issued it.
pub(crate) fn route_cancel(handle: ActionHandle) -> bool {
    let owner = ENGINES.with(|engines| engines.borrow().get(handle.owner()).and_then(Weak::upgrade));
    match owner {
        Some(inner) => inner.cancel(handle),
        None => {
            debug!(id = %handle.id(), kind = %handle.kind(), "Cancel on a handle whose engine is gone.");
            false
        }
    }
}

/// The tick-driven action scheduler.
///
/// A `Scheduler` holds every pending delayed and repeating action, subscribes
/// to a [`TickSource`] when it is created, and evaluates its actions each time
/// the source delivers elapsed time. Cloning a `Scheduler` yields another
/// handle to the same engine, which is how callbacks reach back into it.
///
/// The engine is single-threaded. No internal borrow is held while a callback
/// runs, so callbacks may freely register new actions or cancel existing ones,
/// including themselves.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<Inner>,
}

struct Inner {
    id: EngineId,
    config: SchedulerConfig,
    event_sender: broadcast::Sender<SchedulerEvent>,
    state: RefCell<State>,
}

#[derive(Default)]
struct State {
    delayed: Lane<DelayedAction>,
    repeating: Lane<RepeatingAction>,
    elapsed: f64,
    tick_count: u64,
    ticking: bool,
}

/// The bookkeeping for one kind of action.
///
/// `cancelled` only ever holds ids that are also in `live`; an id leaves both
/// sets when its action leaves the engine.
struct Lane<A> {
    actions: Vec<A>,
    live: HashSet<ActionId>,
    cancelled: HashSet<ActionId>,
    ids: IdAllocator,
}

impl<A> Default for Lane<A> {
    fn default() -> Self {
        Self {
            actions: Vec::new(),
            live: HashSet::new(),
            cancelled: HashSet::new(),
            ids: IdAllocator::default(),
        }
    }
}

trait Timed {
    fn id(&self) -> ActionId;
}

impl Timed for DelayedAction {
    fn id(&self) -> ActionId {
        self.id
    }
}

impl Timed for RepeatingAction {
    fn id(&self) -> ActionId {
        self.id
    }
}

impl<A: Timed> Lane<A> {
    fn register(&mut self, kind: ActionKind, make: impl FnOnce(ActionId) -> A) -> Result<ActionId> {
        let id = self
            .ids
            .allocate(&self.live)
            .ok_or(ScheduleError::IdSpaceExhausted { kind })?;
        self.live.insert(id);
        self.actions.push(make(id));
        Ok(id)
    }

    fn is_pending(&self, id: ActionId) -> bool {
        self.live.contains(&id) && !self.cancelled.contains(&id)
    }

    fn is_cancelled(&self, id: ActionId) -> bool {
        self.cancelled.contains(&id)
    }

    fn mark_cancelled(&mut self, id: ActionId) -> bool {
        self.is_pending(id) && self.cancelled.insert(id)
    }

    fn retire(&mut self, id: ActionId) {
        self.live.remove(&id);
        self.cancelled.remove(&id);
    }

    /// Puts the evaluated batch back in front of anything registered meanwhile.
    fn merge(&mut self, survivors: Vec<A>) {
        let added = std::mem::replace(&mut self.actions, survivors);
        self.actions.extend(added);
    }

    /// Drops every action marked for cancellation and forgets its id.
    fn apply_cancellations(&mut self) -> usize {
        if self.cancelled.is_empty() {
            return 0;
        }
        let cancelled = std::mem::take(&mut self.cancelled);
        let before = self.actions.len();
        self.actions.retain(|action| !cancelled.contains(&action.id()));
        for id in &cancelled {
            self.live.remove(id);
        }
        before - self.actions.len()
    }

    fn len(&self) -> usize {
        self.live.len() - self.cancelled.len()
    }
}

// Core implementation block for internal logic.
impl Inner {
    fn emit(&self, event: SchedulerEvent) {
        self.event_sender.send(event).ok();
    }

    fn cancel(&self, handle: ActionHandle) -> bool {
        if handle.owner() != self.id {
            warn!(id = %handle.id(), kind = %handle.kind(), "Rejected a handle issued by another scheduler.");
            return false;
        }
        let accepted = {
            let mut state = self.state.borrow_mut();
            match handle.kind() {
                ActionKind::Delayed => state.delayed.mark_cancelled(handle.id()),
                ActionKind::Repeating => state.repeating.mark_cancelled(handle.id()),
            }
        };
        if accepted {
            debug!(id = %handle.id(), kind = %handle.kind(), "Action marked for cancellation.");
            self.emit(SchedulerEvent::ActionCancelled {
                id: handle.id(),
                kind: handle.kind(),
            });
        }
        accepted
    }

    #[doc(hidden)]
    fn tick(&self, delta: f64) {
        let delta = if delta.is_finite() && delta >= 0.0 {
            delta
        } else {
            warn!("Ignoring invalid tick delta {}; treating it as 0.", delta);
            0.0
        };

        let (delayed, repeating, elapsed) = {
            let mut state = self.state.borrow_mut();
            if state.ticking {
                warn!("Tick delivered from inside a callback; ignored.");
                return;
            }
            state.ticking = true;
            state.tick_count += 1;
            state.elapsed += delta;
            trace!("Tick #{} (+{:.4}s, {:.4}s elapsed).", state.tick_count, delta, state.elapsed);
            // Both batches are taken up front so that nothing registered during
            // this tick, of either kind, is evaluated before the next one.
            (
                std::mem::take(&mut state.delayed.actions),
                std::mem::take(&mut state.repeating.actions),
                state.elapsed,
            )
        };

        self.evaluate_delayed(delayed, delta, elapsed);
        self.evaluate_repeating(repeating, delta, elapsed);

        let mut state = self.state.borrow_mut();
        let removed = state.delayed.apply_cancellations() + state.repeating.apply_cancellations();
        if removed > 0 {
            trace!("Removed {} cancelled actions.", removed);
        }
        state.ticking = false;
    }

    #[doc(hidden)]
    fn evaluate_delayed(&self, batch: Vec<DelayedAction>, delta: f64, elapsed: f64) {
        let mut survivors = Vec::with_capacity(batch.len());
        for mut action in batch {
            let id = action.id;
            if self.state.borrow().delayed.is_cancelled(id) {
                self.state.borrow_mut().delayed.retire(id);
                continue;
            }
            if !action.advance(delta) {
                survivors.push(action);
                continue;
            }
            let callback: DelayedCallback = action.into_callback();
            self.invoke(id, ActionKind::Delayed, callback);
            self.state.borrow_mut().delayed.retire(id);
            self.emit(SchedulerEvent::ActionFired {
                id,
                kind: ActionKind::Delayed,
                elapsed,
            });
            self.emit(SchedulerEvent::ActionCompleted {
                id,
                kind: ActionKind::Delayed,
            });
        }
        self.state.borrow_mut().delayed.merge(survivors);
    }

    #[doc(hidden)]
    fn evaluate_repeating(&self, batch: Vec<RepeatingAction>, delta: f64, elapsed: f64) {
        let mut survivors = Vec::with_capacity(batch.len());
        for mut action in batch {
            let id = action.id;
            if self.state.borrow().repeating.is_cancelled(id) {
                self.state.borrow_mut().repeating.retire(id);
                continue;
            }
            if !action.advance(delta) {
                survivors.push(action);
                continue;
            }
            let mut fires = 0;
            loop {
                fires += 1;
                let callback: &mut RepeatingCallback = action.callback_mut();
                self.invoke(id, ActionKind::Repeating, || (*callback)());
                action.reschedule();
                self.emit(SchedulerEvent::ActionFired {
                    id,
                    kind: ActionKind::Repeating,
                    elapsed,
                });
                if !self.should_catch_up(&action) {
                    break;
                }
                if fires >= MAX_CATCH_UP_FIRES {
                    warn!(%id, "Catch-up stopped after {} fires this tick; the backlog carries over.", fires);
                    break;
                }
            }
            if action.is_exhausted() {
                self.state.borrow_mut().repeating.retire(id);
                debug!(%id, "Repeating action completed.");
                self.emit(SchedulerEvent::ActionCompleted {
                    id,
                    kind: ActionKind::Repeating,
                });
            } else {
                survivors.push(action);
            }
        }
        self.state.borrow_mut().repeating.merge(survivors);
    }

    #[doc(hidden)]
    fn should_catch_up(&self, action: &RepeatingAction) -> bool {
        self.config.fire_policy == FirePolicy::CatchUp
            && action.interval > 0.0
            && action.is_due()
            && !action.is_exhausted()
            && !self.state.borrow().repeating.is_cancelled(action.id)
    }

    /// Runs a callback, containing any panic to that one invocation.
    #[doc(hidden)]
    fn invoke(&self, id: ActionId, kind: ActionKind, callback: impl FnOnce()) {
        trace!(%id, %kind, "Firing action.");
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(callback)) {
            error!(%id, %kind, "Action callback panicked: {}", panic_message(payload.as_ref()));
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let id = self.id;
        ENGINES
            .try_with(|engines| {
                if let Ok(mut engines) = engines.try_borrow_mut() {
                    engines.remove(id);
                }
            })
            .ok();
    }
}

// Public API implementation block.
impl Scheduler {
    /// Creates a new `Scheduler` and subscribes it to `source`.
    ///
    /// The subscription lives as long as the source. It only holds a weak
    /// reference, so once every `Scheduler` clone is dropped the deliveries
    /// become no-ops.
    pub fn new(config: SchedulerConfig, source: &mut impl TickSource) -> Self {
        Self::build(config, source, IdAllocator::default, IdAllocator::default)
    }

    #[doc(hidden)]
    fn build(
        config: SchedulerConfig,
        source: &mut impl TickSource,
        delayed_ids: impl FnOnce() -> IdAllocator,
        repeating_ids: impl FnOnce() -> IdAllocator,
    ) -> Self {
        let (event_sender, _) = broadcast::channel(config.event_capacity.max(1));
        let mut state = State::default();
        state.delayed.ids = delayed_ids();
        state.repeating.ids = repeating_ids();
        let inner = Rc::new_cyclic(|weak: &Weak<Inner>| {
            let id = ENGINES.with(|engines| engines.borrow_mut().insert(weak.clone()));
            Inner {
                id,
                config,
                event_sender,
                state: RefCell::new(state),
            }
        });

        let weak = Rc::downgrade(&inner);
        source.subscribe(Box::new(move |delta| {
            if let Some(inner) = weak.upgrade() {
                inner.tick(delta);
            }
        }));
        debug!(config = ?inner.config, "Scheduler created.");
        Self { inner }
    }

    /// Runs `callback` once, `delay` seconds from now.
    ///
    /// Any delay is accepted; a non-positive one fires on the next tick.
    ///
    /// # Errors
    /// `IdSpaceExhausted` if every delayed id is in use.
    pub fn delay(&self, delay: f64, callback: impl FnOnce() + 'static) -> Result<ActionHandle> {
        let id = self.inner.state.borrow_mut().delayed.register(ActionKind::Delayed, |id| {
            DelayedAction::new(id, delay, Box::new(callback))
        })?;
        debug!(%id, delay, "Delayed action scheduled.");
        self.inner.emit(SchedulerEvent::ActionScheduled {
            id,
            kind: ActionKind::Delayed,
            due_in: delay,
        });
        Ok(ActionHandle::new(id, ActionKind::Delayed, self.inner.id))
    }

    /// Runs `callback` every `interval` seconds until cancelled.
    ///
    /// The first fire is one `interval` away.
    pub fn repeat(&self, interval: f64, callback: impl FnMut() + 'static) -> Result<ActionHandle> {
        self.register_repeating(interval, Repetitions::Unbounded, Box::new(callback))
    }

    /// Runs `callback` every `interval` seconds, `count` times in total.
    ///
    /// # Errors
    /// `InvalidCount` if `count` is not positive; nothing is registered.
    pub fn repeat_n(
        &self,
        interval: f64,
        count: i64,
        callback: impl FnMut() + 'static,
    ) -> Result<ActionHandle> {
        let repetitions = Repetitions::bounded(count)?;
        self.register_repeating(interval, repetitions, Box::new(callback))
    }

    #[doc(hidden)]
    fn register_repeating(
        &self,
        interval: f64,
        repetitions: Repetitions,
        callback: RepeatingCallback,
    ) -> Result<ActionHandle> {
        let id = self
            .inner
            .state
            .borrow_mut()
            .repeating
            .register(ActionKind::Repeating, |id| {
                RepeatingAction::new(id, interval, repetitions, callback)
            })?;
        debug!(%id, interval, ?repetitions, "Repeating action scheduled.");
        self.inner.emit(SchedulerEvent::ActionScheduled {
            id,
            kind: ActionKind::Repeating,
            due_in: interval,
        });
        Ok(ActionHandle::new(id, ActionKind::Repeating, self.inner.id))
    }

    /// Cancels the action behind `handle`.
    ///
    /// Returns `true` if the action was live and is now marked for removal. The
    /// removal itself happens during the next tick, and a callback that is
    /// already running is not interrupted. Returns `false` for handles that
    /// already fired, were already cancelled, never existed, or were issued by
    /// a different scheduler.
    pub fn cancel(&self, handle: ActionHandle) -> bool {
        self.inner.cancel(handle)
    }

    /// Whether `handle` refers to an action that will still fire.
    pub fn is_scheduled(&self, handle: ActionHandle) -> bool {
        if handle.owner() != self.inner.id {
            return false;
        }
        let state = self.inner.state.borrow();
        match handle.kind() {
            ActionKind::Delayed => state.delayed.is_pending(handle.id()),
            ActionKind::Repeating => state.repeating.is_pending(handle.id()),
        }
    }

    /// Number of delayed actions that have neither fired nor been cancelled.
    pub fn pending_delayed(&self) -> usize {
        self.inner.state.borrow().delayed.len()
    }

    /// Number of repeating actions that have neither completed nor been cancelled.
    pub fn pending_repeating(&self) -> usize {
        self.inner.state.borrow().repeating.len()
    }

    pub fn len(&self) -> usize {
        self.pending_delayed() + self.pending_repeating()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total time delivered by the tick source, in seconds.
    pub fn elapsed(&self) -> f64 {
        self.inner.state.borrow().elapsed
    }

    /// Number of ticks evaluated so far.
    pub fn tick_count(&self) -> u64 {
        self.inner.state.borrow().tick_count
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    /// Subscribes to the `SchedulerEvent` stream.
    pub fn subscribe_events(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.inner.event_sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualClock;
    use std::cell::Cell;

    fn scheduler() -> (ManualClock, Scheduler) {
        let mut clock = ManualClock::new();
        let scheduler = Scheduler::new(SchedulerConfig::default(), &mut clock);
        (clock, scheduler)
    }

    fn counter() -> (Rc<Cell<u32>>, impl FnMut() + Clone + 'static) {
        let count = Rc::new(Cell::new(0));
        let sink = count.clone();
        (count, move || sink.set(sink.get() + 1))
    }

    #[test]
    fn delayed_ids_and_repeating_ids_are_independent() {
        let (_clock, scheduler) = scheduler();
        let delayed = scheduler.delay(1.0, || {}).unwrap();
        let repeating = scheduler.repeat(1.0, || {}).unwrap();
        assert_eq!(delayed.id(), repeating.id());
        assert_ne!(delayed, repeating);
        assert!(scheduler.cancel(delayed));
        assert!(scheduler.is_scheduled(repeating));
    }

    #[test]
    fn exhausted_id_space_fails_registration() {
        let mut clock = ManualClock::new();
        let scheduler = Scheduler::build(
            SchedulerConfig::default(),
            &mut clock,
            || IdAllocator::with_max(1),
            IdAllocator::default,
        );
        scheduler.delay(1.0, || {}).unwrap();
        scheduler.delay(1.0, || {}).unwrap();
        assert_eq!(
            scheduler.delay(1.0, || {}).unwrap_err(),
            ScheduleError::IdSpaceExhausted {
                kind: ActionKind::Delayed
            }
        );
        assert_eq!(scheduler.pending_delayed(), 2);

        // Firing frees the ids again.
        clock.tick(1.0);
        assert!(scheduler.delay(1.0, || {}).is_ok());
    }

    #[test]
    fn cancelled_id_is_not_reused_before_removal() {
        let mut clock = ManualClock::new();
        let scheduler = Scheduler::build(
            SchedulerConfig::default(),
            &mut clock,
            || IdAllocator::with_max(0),
            IdAllocator::default,
        );
        let (count, bump) = counter();
        let first = scheduler.delay(1.0, || {}).unwrap();
        assert!(scheduler.cancel(first));
        // The cancelled record still holds id 0 until the next tick removes it.
        assert!(scheduler.delay(1.0, bump.clone()).is_err());

        clock.tick(0.5);
        let second = scheduler.delay(1.0, bump).unwrap();
        assert_eq!(second.id(), first.id());
        clock.tick(1.0);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn handles_from_another_scheduler_are_rejected() {
        let (mut clock, first) = scheduler();
        let second = Scheduler::new(SchedulerConfig::default(), &mut clock);
        let (count, bump) = counter();

        let handle = first.delay(1.0, bump).unwrap();
        second.delay(1.0, || {}).unwrap();

        assert!(!second.cancel(handle));
        assert!(!second.is_scheduled(handle));
        clock.tick(1.0);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn handle_cancel_routes_to_its_owner() {
        let (mut clock, scheduler) = scheduler();
        let (count, bump) = counter();
        let handle = scheduler.repeat(1.0, bump).unwrap();

        assert!(handle.cancel());
        assert!(!handle.cancel());
        clock.tick(1.0);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn handle_cancel_after_engine_dropped_is_false() {
        let (_clock, scheduler) = scheduler();
        let handle = scheduler.delay(1.0, || {}).unwrap();
        drop(scheduler);
        assert!(!handle.cancel());
    }

    #[test]
    fn dropped_scheduler_ignores_ticks() {
        let (mut clock, scheduler) = scheduler();
        drop(scheduler);
        clock.tick(1.0);
    }

    #[test]
    fn panicking_callback_is_isolated() {
        let (mut clock, scheduler) = scheduler();
        let (count, bump) = counter();
        scheduler.delay(1.0, || panic!("boom")).unwrap();
        scheduler.delay(1.0, bump.clone()).unwrap();
        scheduler.repeat(1.0, bump).unwrap();

        clock.tick(1.0);
        assert_eq!(count.get(), 2);
        assert_eq!(scheduler.pending_delayed(), 0);
        assert_eq!(scheduler.pending_repeating(), 1);
    }

    #[test]
    fn negative_delta_is_treated_as_zero() {
        let (mut clock, scheduler) = scheduler();
        let (count, bump) = counter();
        scheduler.delay(1.0, bump).unwrap();
        clock.tick(-5.0);
        clock.tick(0.5);
        assert_eq!(count.get(), 0);
        clock.tick(0.5);
        assert_eq!(count.get(), 1);
        assert_eq!(scheduler.elapsed(), 1.0);
        assert_eq!(scheduler.tick_count(), 3);
    }

    #[test]
    fn events_follow_the_action_lifecycle() {
        let (mut clock, scheduler) = scheduler();
        let mut events = scheduler.subscribe_events();
        let once = scheduler.delay(1.0, || {}).unwrap();
        let twice = scheduler.repeat_n(1.0, 2, || {}).unwrap();
        let doomed = scheduler.repeat(5.0, || {}).unwrap();
        assert!(doomed.cancel());
        clock.tick(1.0);
        clock.tick(1.0);

        let seen: Vec<_> = std::iter::from_fn(|| events.try_recv().ok()).collect();
        assert_eq!(
            seen,
            vec![
                SchedulerEvent::ActionScheduled { id: once.id(), kind: ActionKind::Delayed, due_in: 1.0 },
                SchedulerEvent::ActionScheduled { id: twice.id(), kind: ActionKind::Repeating, due_in: 1.0 },
                SchedulerEvent::ActionScheduled { id: doomed.id(), kind: ActionKind::Repeating, due_in: 5.0 },
                SchedulerEvent::ActionCancelled { id: doomed.id(), kind: ActionKind::Repeating },
                SchedulerEvent::ActionFired { id: once.id(), kind: ActionKind::Delayed, elapsed: 1.0 },
                SchedulerEvent::ActionCompleted { id: once.id(), kind: ActionKind::Delayed },
                SchedulerEvent::ActionFired { id: twice.id(), kind: ActionKind::Repeating, elapsed: 1.0 },
                SchedulerEvent::ActionFired { id: twice.id(), kind: ActionKind::Repeating, elapsed: 2.0 },
                SchedulerEvent::ActionCompleted { id: twice.id(), kind: ActionKind::Repeating },
            ]
        );
    }

    #[test]
    fn catch_up_policy_fires_every_missed_interval() {
        let mut clock = ManualClock::new();
        let config = SchedulerConfig {
            fire_policy: FirePolicy::CatchUp,
            ..SchedulerConfig::default()
        };
        let scheduler = Scheduler::new(config, &mut clock);
        let (count, bump) = counter();
        let (bounded, bump_bounded) = counter();
        scheduler.repeat(1.0, bump).unwrap();
        scheduler.repeat_n(1.0, 2, bump_bounded).unwrap();

        clock.tick(3.5);
        assert_eq!(count.get(), 3);
        assert_eq!(bounded.get(), 2);
        assert_eq!(scheduler.pending_repeating(), 1);

        clock.tick(0.5);
        assert_eq!(count.get(), 4);
    }

    #[test]
    fn once_policy_fires_once_per_tick_and_keeps_phase() {
        let (mut clock, scheduler) = scheduler();
        let (count, bump) = counter();
        scheduler.repeat(1.0, bump).unwrap();

        clock.tick(3.5);
        assert_eq!(count.get(), 1);
        // Countdown is now -1.5, so the action stays due on the following ticks.
        clock.tick(0.0);
        assert_eq!(count.get(), 2);
        clock.tick(0.0);
        assert_eq!(count.get(), 3);
        clock.tick(0.0);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn catch_up_with_zero_interval_fires_once() {
        let mut clock = ManualClock::new();
        let config = SchedulerConfig {
            fire_policy: FirePolicy::CatchUp,
            ..SchedulerConfig::default()
        };
        let scheduler = Scheduler::new(config, &mut clock);
        let (count, bump) = counter();
        scheduler.repeat(0.0, bump).unwrap();
        clock.tick(1.0);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn infinite_delta_is_treated_as_zero_under_catch_up() {
        let mut clock = ManualClock::new();
        let config = SchedulerConfig {
            fire_policy: FirePolicy::CatchUp,
            ..SchedulerConfig::default()
        };
        let scheduler = Scheduler::new(config, &mut clock);
        let (count, bump) = counter();
        scheduler.repeat(1.0, bump).unwrap();

        clock.tick(f64::INFINITY);
        clock.tick(f64::NAN);
        assert_eq!(count.get(), 0);
        assert_eq!(scheduler.elapsed(), 0.0);

        clock.tick(1.0);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn infinite_delta_does_not_drain_a_bounded_repeat() {
        let (mut clock, scheduler) = scheduler();
        let (count, bump) = counter();
        let handle = scheduler.repeat_n(1.0, 3, bump).unwrap();

        clock.tick(f64::INFINITY);
        for _ in 0..5 {
            clock.tick(0.0);
        }
        assert_eq!(count.get(), 0);
        assert!(scheduler.is_scheduled(handle));

        for _ in 0..3 {
            clock.tick(1.0);
        }
        assert_eq!(count.get(), 3);
        assert!(!scheduler.is_scheduled(handle));
    }

    #[test]
    fn catch_up_is_capped_per_tick() {
        let mut clock = ManualClock::new();
        let config = SchedulerConfig {
            fire_policy: FirePolicy::CatchUp,
            ..SchedulerConfig::default()
        };
        let scheduler = Scheduler::new(config, &mut clock);
        let (count, bump) = counter();
        scheduler.repeat(0.001, bump).unwrap();

        clock.tick(10.0);
        assert_eq!(count.get(), MAX_CATCH_UP_FIRES);
        // The remaining backlog keeps the action due on the next tick.
        clock.tick(0.0);
        assert_eq!(count.get(), 2 * MAX_CATCH_UP_FIRES);
    }
}
