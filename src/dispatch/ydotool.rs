//! Key injection through the `ydotool` daemon
//!
//! Sends raw evdev key codes, so it works under Wayland where in-process
//! synthesis is blocked.

use std::process::{Command as Process, Stdio};
use tracing::debug;

use super::{CommandDispatcher, DispatchError};
use crate::command::{Command, PresentationKey};

const PROGRAM: &str = "ydotool";

pub struct YdotoolDispatcher {
    program: &'static str,
}

impl YdotoolDispatcher {
    pub fn new() -> Self {
        Self { program: PROGRAM }
    }

    /// `ydotool key` arguments for one press-and-release
    pub fn key_args(key: PresentationKey) -> [String; 3] {
        let code = key.evdev_code();
        ["key".to_string(), format!("{}:1", code), format!("{}:0", code)]
    }
}

impl Default for YdotoolDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandDispatcher for YdotoolDispatcher {
    fn name(&self) -> &'static str {
        "ydotool"
    }

    fn dispatch(&mut self, command: Command) -> Result<(), DispatchError> {
        let Some(key) = command.key() else {
            return Ok(());
        };
        debug!(%command, code = key.evdev_code(), "ydotool key");

        let status = Process::new(self.program)
            .args(Self::key_args(key))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| DispatchError::Spawn {
                program: PROGRAM,
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(DispatchError::Status {
                program: PROGRAM,
                status,
            })
        }
    }
}
