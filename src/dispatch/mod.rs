//! Command dispatch to the presentation application
//!
//! Dispatchers turn a [`Command`] into a key press. Several backends are
//! available:
//!
//! - **log**: print the command only (dry run, replay)
//! - **ydotool**: shell out to `ydotool key`, works under Wayland
//! - **enigo**: synthesize keys in-process (requires the `keyboard` feature)

#[cfg(feature = "keyboard")]
mod keyboard;
mod ydotool;

#[cfg(feature = "keyboard")]
pub use keyboard::EnigoDispatcher;
pub use ydotool::YdotoolDispatcher;

use std::io::Write;
use tracing::{info, warn};

use crate::command::Command;
use crate::config::BackendConfig;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: &'static str,
        source: std::io::Error,
    },
    #[error("{program} exited with {status}")]
    Status {
        program: &'static str,
        status: std::process::ExitStatus,
    },
    #[error("keyboard error: {0}")]
    Keyboard(String),
    #[error("backend {0} is not available in this build")]
    Unavailable(&'static str),
}

/// Sink for commands emitted by the gesture engine
pub trait CommandDispatcher {
    fn name(&self) -> &'static str;

    /// Perform the command. Called at most once per frame.
    fn dispatch(&mut self, command: Command) -> Result<(), DispatchError>;
}

impl<D: CommandDispatcher + ?Sized> CommandDispatcher for Box<D> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn dispatch(&mut self, command: Command) -> Result<(), DispatchError> {
        (**self).dispatch(command)
    }
}

/// Writes each command as a line instead of pressing keys
pub struct LogDispatcher<W: Write> {
    out: W,
}

impl LogDispatcher<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write> LogDispatcher<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> CommandDispatcher for LogDispatcher<W> {
    fn name(&self) -> &'static str {
        "log"
    }

    fn dispatch(&mut self, command: Command) -> Result<(), DispatchError> {
        // Output is informational; a closed pipe should not stop the loop
        let _ = writeln!(self.out, "{}", command);
        let _ = self.out.flush();
        Ok(())
    }
}

/// Records commands in memory
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    pub commands: Vec<Command>,
}

impl CommandDispatcher for RecordingDispatcher {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn dispatch(&mut self, command: Command) -> Result<(), DispatchError> {
        self.commands.push(command);
        Ok(())
    }
}

fn is_wayland() -> bool {
    std::env::var("XDG_SESSION_TYPE")
        .map(|v| v.eq_ignore_ascii_case("wayland"))
        .unwrap_or(false)
}

/// Build the dispatcher for a configured backend
pub fn from_config(backend: BackendConfig) -> Result<Box<dyn CommandDispatcher>, DispatchError> {
    let dispatcher: Box<dyn CommandDispatcher> = match backend {
        BackendConfig::Log => Box::new(LogDispatcher::stdout()),
        BackendConfig::Ydotool => Box::new(YdotoolDispatcher::new()),
        BackendConfig::Enigo => enigo_backend()?,
        BackendConfig::Auto => {
            if cfg!(target_os = "linux") && is_wayland() {
                Box::new(YdotoolDispatcher::new())
            } else {
                match enigo_backend() {
                    Ok(d) => d,
                    Err(e) => {
                        warn!("{}; commands will only be printed", e);
                        Box::new(LogDispatcher::stdout())
                    }
                }
            }
        }
    };
    info!("Dispatch backend: {}", dispatcher.name());
    Ok(dispatcher)
}

#[cfg(feature = "keyboard")]
fn enigo_backend() -> Result<Box<dyn CommandDispatcher>, DispatchError> {
    Ok(Box::new(EnigoDispatcher::new()?))
}

#[cfg(not(feature = "keyboard"))]
fn enigo_backend() -> Result<Box<dyn CommandDispatcher>, DispatchError> {
    Err(DispatchError::Unavailable("enigo"))
}
