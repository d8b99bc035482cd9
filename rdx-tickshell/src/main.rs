use anyhow::Result;
use colored::Colorize;
use rustyline::highlight::Highlighter;
use rustyline::Editor;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tickwork::prelude::*;
use tickwork::{ENGINE_NAME, VERSION as LIB_VERSION};
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A custom helper struct for rustyline that enables syntax highlighting.
#[derive(Completer, Helper, Hinter, Validator)]
struct MyHighlighter;

impl Highlighter for MyHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if let Some((command, rest)) = line.split_once(' ') {
            let colored_command = command.yellow().bold();
            let colored_rest = rest.yellow();
            Cow::Owned(format!("{} {}", colored_command, colored_rest))
        } else {
            Cow::Owned(line.yellow().bold().to_string())
        }
    }
    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn print_banner() {
    if env::var("QUIET_MODE").is_ok() {
        return;
    }
    println!("{}", format!("  {} shell", ENGINE_NAME).cyan().bold());
    println!("{}", "-".repeat(64).dimmed());
    println!(
        "          Shell   v{:<8} Library   v{:<8}",
        SHELL_VERSION, LIB_VERSION
    );
    println!(
        "{}",
        "    Distributed under the MIT OR Apache-2.0 license. Use at your own risk.".dimmed()
    );
    println!("{}", "-".repeat(64).dimmed());
}

/// One registration made from the shell.
struct Entry {
    handle: ActionHandle,
    description: String,
}

/// The shell's view of the scheduler: the engine, its clock and the handles
/// the user can refer to by number.
struct Session {
    runtime: tokio::runtime::Runtime,
    clock: SystemClock,
    scheduler: Scheduler,
    events: broadcast::Receiver<SchedulerEvent>,
    show_events: bool,
    entries: BTreeMap<usize, Entry>,
    next_handle: usize,
}

impl Session {
    fn new(config: SchedulerConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        let mut clock = SystemClock::new(config.resolution.clone());
        let scheduler = Scheduler::new(config, &mut clock);
        let events = scheduler.subscribe_events();
        Ok(Self {
            runtime,
            clock,
            scheduler,
            events,
            show_events: false,
            entries: BTreeMap::new(),
            next_handle: 0,
        })
    }

    fn remember(&mut self, handle: ActionHandle, description: String) -> usize {
        let number = self.next_handle;
        self.entries.insert(number, Entry { handle, description });
        self.next_handle += 1;
        number
    }

    /// Prints whatever events piled up since the last call.
    fn drain_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) if self.show_events => println!("<-- [EVENT] {:?}", event),
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    if self.show_events {
                        println!("<-- [EVENT] ... {} events dropped", missed);
                    }
                }
                Err(_) => break,
            }
        }
    }
}

/// Builds the callback for a shell registration; it announces itself when fired.
fn announce(label: String) -> impl FnMut() + 'static {
    move || {
        let now = chrono::Local::now().format("%H:%M:%S%.3f");
        println!("<-- [{}] {} fired", now.to_string().dimmed(), label.green().bold());
    }
}

fn parse_seconds(raw: Option<&&str>) -> Option<f64> {
    raw.and_then(|s| s.parse::<f64>().ok())
}

fn handle_command(session: &mut Session, args: &[&str]) -> Result<bool> {
    let Some(command) = args.first() else {
        return Ok(true);
    };
    match *command {
        "delay" => {
            let Some(seconds) = parse_seconds(args.get(1)) else {
                println!("Usage: delay <SECONDS> [LABEL]");
                return Ok(true);
            };
            let label = args.get(2).map_or_else(|| format!("delay {}s", seconds), |s| s.to_string());
            match session.scheduler.delay(seconds, announce(label.clone())) {
                Ok(handle) => {
                    let number = session.remember(handle, format!("{} (once after {}s)", label, seconds));
                    println!("--> Scheduled '{}' with handle #{}", label, number);
                }
                Err(e) => println!("Error: {}", e),
            }
        }
        "repeat" => {
            let Some(seconds) = parse_seconds(args.get(1)) else {
                println!("Usage: repeat <SECONDS> [COUNT] [LABEL]");
                return Ok(true);
            };
            let count = args.get(2).and_then(|s| s.parse::<i64>().ok());
            let label_index = if count.is_some() { 3 } else { 2 };
            let label = args
                .get(label_index)
                .map_or_else(|| format!("repeat {}s", seconds), |s| s.to_string());
            let callback = announce(label.clone());
            let (result, cadence) = match count {
                Some(n) => (
                    session.scheduler.repeat_n(seconds, n, callback),
                    format!("every {}s, {} times", seconds, n),
                ),
                None => (
                    session.scheduler.repeat(seconds, callback),
                    format!("every {}s", seconds),
                ),
            };
            match result {
                Ok(handle) => {
                    let number = session.remember(handle, format!("{} ({})", label, cadence));
                    println!("--> Scheduled '{}' with handle #{}", label, number);
                }
                Err(e) => println!("Error: {}", e),
            }
        }
        "cancel" => {
            let Some(number) = args.get(1).and_then(|s| s.parse::<usize>().ok()) else {
                println!("Usage: cancel <HANDLE>");
                return Ok(true);
            };
            match session.entries.get(&number) {
                Some(entry) => {
                    if session.scheduler.cancel(entry.handle) {
                        println!("--> Handle #{} cancelled.", number);
                    } else {
                        println!("--> Handle #{} is no longer scheduled.", number);
                    }
                }
                None => println!("Error: Unknown handle #{}. Use 'list' to see handles.", number),
            }
        }
        "tick" => {
            let Some(seconds) = parse_seconds(args.get(1)) else {
                println!("Usage: tick <SECONDS>");
                return Ok(true);
            };
            session.clock.advance(seconds);
            session.drain_events();
        }
        "run" => {
            let Some(seconds) = parse_seconds(args.get(1)).filter(|s| s.is_finite() && *s >= 0.0) else {
                println!("Usage: run <SECONDS>");
                return Ok(true);
            };
            info!("Running the clock for {}s at {:?}...", seconds, session.clock.resolution());
            let Session { runtime, clock, .. } = session;
            runtime.block_on(clock.run_for(Duration::from_secs_f64(seconds)));
            session.drain_events();
        }
        "list" => {
            println!("Handles:");
            for (number, entry) in &session.entries {
                let state = if session.scheduler.is_scheduled(entry.handle) {
                    "scheduled".green()
                } else {
                    "done".dimmed()
                };
                println!("  #{:<4} {:<10} {}", number, state, entry.description);
            }
        }
        "status" => {
            println!(
                "Elapsed {:.3}s over {} ticks; {} delayed and {} repeating actions pending.",
                session.scheduler.elapsed(),
                session.scheduler.tick_count(),
                session.scheduler.pending_delayed(),
                session.scheduler.pending_repeating()
            );
        }
        "events" => match args.get(1) {
            Some(&"on") => {
                session.show_events = true;
                println!("--> Showing scheduler events.");
            }
            Some(&"off") => {
                session.show_events = false;
                println!("--> Hiding scheduler events.");
            }
            _ => println!("Usage: events <on|off>"),
        },
        "help" => {
            println!("Available commands:");
            println!("  delay <S> [LABEL]        - Fires once after S seconds.");
            println!("  repeat <S> [N] [LABEL]   - Fires every S seconds, N times or forever.");
            println!("  cancel <H>               - Cancels the action behind handle H.");
            println!("  tick <S>                 - Advances the clock by S seconds at once.");
            println!("  run <S>                  - Runs the real-time clock for S seconds.");
            println!("  list                     - Shows handles and whether they are scheduled.");
            println!("  status                   - Shows elapsed time and pending counts.");
            println!("  events <on|off>          - Toggles printing of scheduler events.");
            println!("  exit                     - Quits the shell.");
        }
        "exit" => return Ok(false),
        "" => {}
        other => println!("Unknown command: '{}'. Type 'help'.", other),
    }
    Ok(true)
}

fn main() -> Result<()> {
    print_banner();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config_path = env::var("TICKWORK_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("tickwork.toml"));
    let config = SchedulerConfig::load(Some(&config_path))?;
    let mut session = Session::new(config)?;

    let mut rl = Editor::new()?;
    let helper = MyHighlighter {};
    rl.set_helper(Some(helper));

    println!("{} is ready. Type 'help' for commands or 'exit' to quit.", ENGINE_NAME.cyan());

    loop {
        let prompt = format!("{}", ">> ".cyan().bold());
        match rl.readline(&prompt) {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let args = line.split_whitespace().collect::<Vec<_>>();
                if !handle_command(&mut session, &args)? {
                    break;
                }
            }
            Err(_) => {
                println!("Exiting tickshell...");
                break;
            }
        }
    }

    Ok(())
}
