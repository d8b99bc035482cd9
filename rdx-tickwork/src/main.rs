use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;
use tickwork::prelude::*;
use tickwork::{ENGINE_NAME, VERSION};
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize structured logging. RUST_LOG overrides the default level.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    // 2. Load the configuration: defaults, then tickwork.toml, then TICKWORK_* vars.
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tickwork.toml"));
    let config = SchedulerConfig::load(Some(&config_path))?;

    // 3. Create the clock and the scheduler subscribed to it.
    let mut clock = SystemClock::new(config.resolution.clone());
    let scheduler = Scheduler::new(config, &mut clock);

    // 4. Listen to the event stream.
    spawn_event_listener(&scheduler);

    // 5. Register the demo actions.
    register_demo_actions(&scheduler)?;

    // 6. Run the clock until Ctrl+C.
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        } else {
            info!("Shutdown signal received.");
        }
        shutdown_tx.send(()).ok();
    });
    info!("{} v{} running. Press Ctrl+C to shut down.", ENGINE_NAME.cyan(), VERSION);
    clock.run(shutdown_rx).await;
    info!(
        "Stopped after {} ticks ({:.2}s simulated), {} actions still pending.",
        scheduler.tick_count(),
        scheduler.elapsed(),
        scheduler.len()
    );
    Ok(())
}

/// Spawns a task logging every scheduler event.
fn spawn_event_listener(scheduler: &Scheduler) {
    let mut event_rx = scheduler.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            info!("{} => {:?}", "[EVENT]".dimmed(), event);
        }
    });
}

/// Registers the demo set: two delays, an endless repeat and a bounded one.
fn register_demo_actions(scheduler: &Scheduler) -> Result<()> {
    info!("{} => A", "[FIRE]".green());
    scheduler.delay(2.0, || info!("{} => B (2s delay)", "[FIRE]".green()))?;
    scheduler.delay(3.0, || info!("{} => C (3s delay)", "[FIRE]".green()))?;
    scheduler.repeat(1.5, || info!("{} => D (every 1.5s)", "[FIRE]".yellow()))?;

    let mut fired = 0;
    scheduler.repeat_n(1.5, 2, move || {
        fired += 1;
        info!("{} => E ({} of 2)", "[FIRE]".yellow(), fired);
    })?;
    Ok(())
}
