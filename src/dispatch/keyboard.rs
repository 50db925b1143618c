//! In-process key synthesis using enigo

use enigo::{Direction, Enigo, Key, Keyboard, Settings};

use super::{CommandDispatcher, DispatchError};
use crate::command::{Command, PresentationKey};

fn enigo_key(key: PresentationKey) -> Key {
    match key {
        PresentationKey::RightArrow => Key::RightArrow,
        PresentationKey::LeftArrow => Key::LeftArrow,
        PresentationKey::F5 => Key::F5,
        PresentationKey::Escape => Key::Escape,
    }
}

/// Presses presentation keys on the focused window
pub struct EnigoDispatcher {
    enigo: Enigo,
}

impl EnigoDispatcher {
    pub fn new() -> Result<Self, DispatchError> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| DispatchError::Keyboard(format!("Failed to initialize Enigo: {}", e)))?;
        Ok(Self { enigo })
    }
}

impl CommandDispatcher for EnigoDispatcher {
    fn name(&self) -> &'static str {
        "enigo"
    }

    fn dispatch(&mut self, command: Command) -> Result<(), DispatchError> {
        let Some(key) = command.key() else {
            return Ok(());
        };
        self.enigo
            .key(enigo_key(key), Direction::Click)
            .map_err(|e| DispatchError::Keyboard(format!("Failed to send {}: {}", command, e)))
    }
}
