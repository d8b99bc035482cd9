//! # Tickwork
//!
//! A tick-driven action scheduler for Rust.
//!
//! Tickwork runs callbacks after a delay or on a repeating interval, measured
//! in the time steps an external tick source delivers (typically one per
//! rendered frame). Every registration returns a handle that can cancel it
//! later, from anywhere, including from inside a running callback.
//!
//! ## Core Concepts
//!
//! - **Tick Source**: anything implementing [`time::TickSource`]. It delivers
//!   "time advanced by Δ seconds" to its subscribers. [`time::ManualClock`] is
//!   driven by hand; [`time::SystemClock`] ticks in real time.
//! - **Scheduler**: subscribes to a tick source once and, on every tick, counts
//!   down its pending actions and fires the ones that are due, in registration
//!   order, delayed actions before repeating ones.
//! - **Handles**: `Copy` tokens naming one registration. Cancelling is
//!   idempotent; a handle whose action already fired simply returns `false`.
//! - **Deferred removal**: cancellations are recorded and applied at safe points
//!   of the tick, so callbacks can cancel or schedule without disturbing the
//!   evaluation in progress. Actions scheduled during a tick first run on the
//!   next one.
//!
//! ## Example Usage
//!
//! ```rust
//! use tickwork::prelude::*;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let mut clock = ManualClock::new();
//! let scheduler = Scheduler::new(SchedulerConfig::default(), &mut clock);
//! let history = Rc::new(RefCell::new(Vec::new()));
//!
//! let log = history.clone();
//! scheduler.delay(2.0, move || log.borrow_mut().push("A")).unwrap();
//! let log = history.clone();
//! let beat = scheduler.repeat(1.0, move || log.borrow_mut().push("B")).unwrap();
//!
//! clock.tick(1.0);
//! clock.tick(1.0);
//! assert_eq!(*history.borrow(), ["B", "A", "B"]);
//!
//! assert!(beat.cancel());
//! clock.tick(1.0);
//! assert_eq!(history.borrow().len(), 3);
//! ```

pub const ENGINE_NAME: &str = "Tickwork";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Declare all the modules in the crate.
pub mod common;
pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod global;
pub mod handle;
pub mod time;

/// A prelude module for easy importing of the most common Tickwork types.
pub mod prelude {
    pub use crate::common::{ActionId, ActionKind};
    pub use crate::config::{ClockResolution, FirePolicy, SchedulerConfig};
    pub use crate::engine::Scheduler;
    pub use crate::error::ScheduleError;
    pub use crate::events::SchedulerEvent;
    pub use crate::handle::ActionHandle;
    pub use crate::time::{ManualClock, SystemClock, TickSource};
}
