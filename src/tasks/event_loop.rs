//! Main event loop driving the countdown

use std::time::Duration;

use tokio::{
    sync::broadcast::{self, error::TryRecvError},
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, error, info, warn};

use super::console::{apply, spawn_stdin_reader, status_line, Command, Flow, HELP};
use crate::{
    config::Config,
    inhibit::{Inhibitor, Platform},
    state::{CountdownController, LogEvent, TickOutcome},
    utils::shutdown_signal,
};

const TICK: Duration = Duration::from_secs(1);

/// Own the controller and run until quit, a shutdown signal, or (with
/// `--once`) the end of the countdown
///
/// Everything happens on this one task, so the controller needs no locking.
pub async fn run_event_loop<I: Inhibitor>(
    mut controller: CountdownController<I>,
    config: &Config,
    platform: Platform,
) -> anyhow::Result<()> {
    let mut log_rx = controller.subscribe();
    let mut lines = spawn_stdin_reader();
    let mut stdin_open = true;

    let mut ticker = interval_at(Instant::now() + TICK, TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut signals_armed = true;

    controller.log_info(format!("Welcome! You are running: {}", platform.describe()));
    controller.log_info(format!("Version: {}", env!("CARGO_PKG_VERSION")));

    match start_on_launch(&mut controller, config) {
        Flow::Started => ticker.reset(),
        Flow::Quit => {
            controller.shutdown();
            drain_log(&mut log_rx, config.json);
            return Ok(());
        }
        Flow::Stopped | Flow::Continue => {}
    }
    if !config.json {
        println!("{}", HELP);
    }

    loop {
        tokio::select! {
            biased;

            result = &mut shutdown, if signals_armed => match result {
                Ok(()) => {
                    info!("Shutdown signal received");
                    break;
                }
                Err(e) => {
                    error!("Signal handling unavailable: {}", e);
                    signals_armed = false;
                }
            },

            received = log_rx.recv() => match received {
                Ok(event) => print_event(&event, config.json),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Activity log skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },

            _ = ticker.tick() => match controller.tick() {
                TickOutcome::Finished if config.once => {
                    info!("Countdown finished, exiting");
                    break;
                }
                TickOutcome::Running { remaining_seconds } if remaining_seconds % 60 == 0 => {
                    debug!("{}", status_line(&controller));
                }
                _ => {}
            },

            line = lines.recv(), if stdin_open => match line {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => match line.parse::<Command>() {
                    Ok(command) => match apply(&mut controller, command, config.hours) {
                        Flow::Quit => break,
                        Flow::Started => ticker.reset(),
                        Flow::Stopped if config.once => {
                            info!("Countdown stopped, exiting");
                            break;
                        }
                        Flow::Stopped | Flow::Continue => {}
                    },
                    Err(e) => println!("{}", e),
                },
                None => {
                    debug!("stdin closed, console commands disabled");
                    stdin_open = false;
                }
            },
        }
    }

    controller.shutdown();
    drain_log(&mut log_rx, config.json);
    Ok(())
}

/// Handle `--start`; with `--once`, a rejected start means there is nothing to wait for
fn start_on_launch<I: Inhibitor>(controller: &mut CountdownController<I>, config: &Config) -> Flow {
    if !config.start {
        return Flow::Continue;
    }
    match controller.start(config.hours) {
        Ok(_) => Flow::Started,
        Err(e) if config.once => {
            error!("Countdown could not start, exiting: {}", e);
            Flow::Quit
        }
        Err(_) => Flow::Continue,
    }
}

fn drain_log(log_rx: &mut broadcast::Receiver<LogEvent>, json: bool) {
    loop {
        match log_rx.try_recv() {
            Ok(event) => print_event(&event, json),
            Err(TryRecvError::Lagged(skipped)) => warn!("Activity log skipped {} events", skipped),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

fn print_event(event: &LogEvent, json: bool) {
    if !json {
        println!("{}", event);
        return;
    }
    match serde_json::to_string(event) {
        Ok(line) => println!("{}", line),
        Err(e) => warn!("Failed to serialize log event: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inhibit::NoopInhibitor;
    use clap::Parser;

    fn config(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("keep-awake").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_start_on_launch_starts_countdown() {
        let mut controller = CountdownController::new(NoopInhibitor::new());
        assert_eq!(start_on_launch(&mut controller, &config(&["--start", "-H", "2"])), Flow::Started);
        assert_eq!(controller.status().remaining_seconds, 7200);
    }

    #[test]
    fn test_start_on_launch_without_flag_waits() {
        let mut controller = CountdownController::new(NoopInhibitor::new());
        assert_eq!(start_on_launch(&mut controller, &config(&["--once"])), Flow::Continue);
        assert!(!controller.status().active);
    }

    #[test]
    fn test_rejected_start_with_once_quits() {
        let mut controller = CountdownController::new(NoopInhibitor::new());
        assert_eq!(start_on_launch(&mut controller, &config(&["--start", "--once", "-H", "0"])), Flow::Quit);
        assert!(!controller.status().active);
    }

    #[test]
    fn test_rejected_start_without_once_keeps_running() {
        let mut controller = CountdownController::new(NoopInhibitor::new());
        assert_eq!(start_on_launch(&mut controller, &config(&["--start", "-H", "0"])), Flow::Continue);
    }
}
