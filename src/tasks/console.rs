//! Line-based console commands

use std::{fmt, io::BufRead, str::FromStr, thread};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{inhibit::Inhibitor, state::CountdownController, utils::format_hms};

pub const HELP: &str = "Commands: start [hours] | toggle [hours] | stop | status | help | quit";

/// A command typed on stdin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start(Option<i64>),
    Toggle(Option<i64>),
    Stop,
    Status,
    Help,
    Quit,
}

/// Rejected console input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ERROR: {}", self.0)
    }
}

impl std::error::Error for ParseError {}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(ParseError("empty command".to_string()));
        };

        let hours = match words.next() {
            Some(word) => Some(
                word.parse::<i64>()
                    .map_err(|_| ParseError(format!("'{}' is not a whole number of hours", word)))?,
            ),
            None => None,
        };
        if let Some(extra) = words.next() {
            return Err(ParseError(format!("unexpected argument '{}'", extra)));
        }

        let command = match verb.to_ascii_lowercase().as_str() {
            "start" => Command::Start(hours),
            "toggle" | "t" => Command::Toggle(hours),
            "stop" | "reset" | "r" => Command::Stop,
            "status" | "s" => Command::Status,
            "help" | "h" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(ParseError(format!("unknown command '{}'", other))),
        };

        if hours.is_some() && !matches!(command, Command::Start(_) | Command::Toggle(_)) {
            return Err(ParseError(format!("'{}' takes no arguments", verb)));
        }
        Ok(command)
    }
}

/// Read stdin lines on a dedicated thread
///
/// A blocking reader thread does not hold up runtime shutdown the way a
/// pending `tokio::io::stdin` read does. The channel closes at end of input.
pub fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned = thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
        });
    if let Err(e) = spawned {
        warn!("Console input unavailable: {}", e);
    }
    rx
}

/// What the event loop should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// A countdown was just started; restart the tick schedule
    Started,
    /// The countdown was ended by hand
    Stopped,
    Quit,
}

/// Run a command against the controller, printing any direct reply
pub fn apply<I: Inhibitor>(
    controller: &mut CountdownController<I>,
    command: Command,
    default_hours: i64,
) -> Flow {
    debug!("Console command: {:?}", command);
    match command {
        Command::Start(hours) => match controller.start(hours.unwrap_or(default_hours)) {
            Ok(_) => Flow::Started,
            Err(_) => Flow::Continue,
        },
        Command::Toggle(hours) => {
            let was_active = controller.status().active;
            match controller.toggle(hours.unwrap_or(default_hours)) {
                Ok(status) if status.active && !was_active => Flow::Started,
                Ok(_) if was_active => Flow::Stopped,
                _ => Flow::Continue,
            }
        }
        Command::Stop => {
            controller.stop();
            Flow::Stopped
        }
        Command::Status => {
            println!("{}", status_line(controller));
            Flow::Continue
        }
        Command::Help => {
            println!("{}", HELP);
            Flow::Continue
        }
        Command::Quit => Flow::Quit,
    }
}

/// `State: ON  Timer: 01:59:58` style summary
pub fn status_line<I: Inhibitor>(controller: &CountdownController<I>) -> String {
    let status = controller.status();
    let mut line = format!(
        "State: {}  Timer: {}",
        if status.active { "ON" } else { "OFF" },
        format_hms(status.remaining_seconds)
    );
    if status.degraded {
        line.push_str("  (sleep is NOT being inhibited)");
    }
    line
}
