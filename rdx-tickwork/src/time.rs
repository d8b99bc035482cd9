//! Tick sources: the producers of "time advanced by Δ" for the scheduler.
//!
//! The scheduler does not own a clock. It subscribes to a [`TickSource`] once,
//! at construction, and treats every delivered delta as an opaque time step.
//! [`ManualClock`] delivers exactly what it is told, which is what tests and
//! host frame hooks want. [`SystemClock`] ticks in real time on a tokio
//! interval and delivers the measured elapsed time.

use crate::config::ClockResolution;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{info, trace};

/// A subscriber callback receiving the elapsed seconds since the last delivery.
pub type TickListener = Box<dyn FnMut(f64)>;

/// The contract a time source offers to the scheduler.
pub trait TickSource {
    /// Registers a listener that is invoked on every subsequent delivery.
    fn subscribe(&mut self, listener: TickListener);
}

/// Fans a single delta out to every subscribed listener.
#[derive(Default)]
struct Listeners {
    listeners: Vec<TickListener>,
}

impl Listeners {
    fn push(&mut self, listener: TickListener) {
        self.listeners.push(listener);
    }

    fn deliver(&mut self, delta: f64) {
        for listener in self.listeners.iter_mut() {
            listener(delta);
        }
    }
}

/// A tick source driven entirely by its owner.
///
/// Every call to [`ManualClock::tick`] delivers the given delta to all
/// subscribers, synchronously and in subscription order.
#[derive(Default)]
pub struct ManualClock {
    listeners: Listeners,
    tick_count: u64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `delta` seconds to every subscriber.
    pub fn tick(&mut self, delta: f64) {
        self.tick_count += 1;
        self.listeners.deliver(delta);
    }

    /// Number of deliveries made so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

impl TickSource for ManualClock {
    fn subscribe(&mut self, listener: TickListener) {
        self.listeners.push(listener);
    }
}

/// A real-time frame source.
///
/// The clock ticks on a tokio interval at the configured resolution and hands
/// its subscribers the wall time measured since the previous delivery, so late
/// or skipped frames show up as larger deltas rather than lost time.
///
/// Listeners are not `Send`, so the clock runs on the task that owns it; drive
/// it from a current-thread runtime or a `LocalSet`.
pub struct SystemClock {
    resolution: ClockResolution,
    listeners: Listeners,
    tick_count: u64,
}

impl SystemClock {
    pub fn new(resolution: ClockResolution) -> Self {
        Self {
            resolution,
            listeners: Listeners::default(),
            tick_count: 0,
        }
    }

    pub fn resolution(&self) -> &ClockResolution {
        &self.resolution
    }

    /// Number of deliveries made so far, real-time and manual alike.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Delivers `delta` seconds immediately, outside the real-time loop.
    pub fn advance(&mut self, delta: f64) {
        self.tick_count += 1;
        trace!("Tick #{} ({:.4}s).", self.tick_count, delta);
        self.listeners.deliver(delta);
    }

    /// Ticks in real time until a shutdown signal is received.
    pub async fn run(&mut self, mut shutdown_rx: broadcast::Receiver<()>) {
        let period = self.resolution.period();
        info!("SystemClock running with a period of {:?}.", period);
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        let mut last = Instant::now();
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                _ = ticker.tick() => {
                    let now = Instant::now();
                    self.advance(now.duration_since(last).as_secs_f64());
                    last = now;
                }
            }
        }
        info!("SystemClock stopped after {} ticks.", self.tick_count);
    }

    /// Ticks in real time for `duration`, then returns.
    ///
    /// The final delivery is trimmed so the deltas delivered by this call add up
    /// to `duration`.
    pub async fn run_for(&mut self, duration: Duration) {
        let period = self.resolution.period();
        let start = Instant::now();
        let deadline = start + duration;
        let mut ticker = time::interval_at(start + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last = start;
        while last < deadline {
            ticker.tick().await;
            let now = Instant::now().min(deadline);
            self.advance(now.duration_since(last).as_secs_f64());
            last = now;
        }
    }
}

impl TickSource for SystemClock {
    fn subscribe(&mut self, listener: TickListener) {
        self.listeners.push(listener);
    }
}
