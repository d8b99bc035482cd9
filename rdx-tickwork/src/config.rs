//! Defines all configuration structures for the scheduler.
//!
//! These structs are deserialized with `serde`, so a scheduler's behavior can be
//! set from a TOML file or from `TICKWORK_*` environment variables instead of
//! being hard-coded by the application.

use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix read by [`SchedulerConfig::load`].
pub const ENV_PREFIX: &str = "TICKWORK";

/// The top-level configuration for a `Scheduler` and its `SystemClock`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// The tick speed of the `SystemClock`.
    pub resolution: ClockResolution,

    /// How repeating actions behave when one tick spans several intervals.
    pub fire_policy: FirePolicy,

    /// Capacity of the scheduler's event broadcast channel.
    pub event_capacity: usize,
}

/// Defines the operational speed of the `SystemClock`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockResolution {
    /// ~60 ticks per second. One tick per rendered frame.
    High,
    /// ~30 ticks per second.
    Medium,
    /// ~1 tick per second. Suitable for turn-based logic.
    Low,
    /// A user-defined speed in ticks per second.
    Custom { ticks_per_second: u64 },
}

impl ClockResolution {
    /// The wall-clock period between two ticks at this resolution.
    pub fn period(&self) -> Duration {
        let ticks_per_second = match self {
            ClockResolution::High => 60,
            ClockResolution::Medium => 30,
            ClockResolution::Low => 1,
            ClockResolution::Custom { ticks_per_second } => (*ticks_per_second).max(1),
        };
        Duration::from_secs_f64(1.0 / ticks_per_second as f64)
    }
}

/// Controls how often a repeating action may fire within a single tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirePolicy {
    /// Fire at most once per tick, even when the delta spans several intervals.
    /// The accumulated phase is kept, so the action stays due on later ticks.
    #[default]
    Once,
    /// Keep firing within the tick until the countdown is positive again.
    CatchUp,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            resolution: ClockResolution::High,
            fire_policy: FirePolicy::Once,
            event_capacity: 256,
        }
    }
}

impl SchedulerConfig {
    /// Loads configuration from defaults, an optional TOML file and the
    /// environment, in that order of precedence (last wins).
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("failed to assemble scheduler configuration")?;
        settings
            .try_deserialize()
            .context("invalid scheduler configuration")
    }
}
