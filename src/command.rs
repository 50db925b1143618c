//! Presentation commands emitted by the gesture engine
//!
//! Each command maps to at most one presentation key. `ToggleEnabled` only
//! changes engine state and has no key of its own.

use std::fmt;

/// Navigation direction for auto-slide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlideDirection {
    Next,
    Prev,
}

impl SlideDirection {
    pub fn command(&self) -> Command {
        match self {
            SlideDirection::Next => Command::Next,
            SlideDirection::Prev => Command::Prev,
        }
    }
}

/// Discrete command token handed to a dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Advance one slide
    Next,
    /// Go back one slide
    Prev,
    /// Start the slideshow
    Start,
    /// Leave the slideshow
    Exit,
    /// Gestures were enabled or disabled
    ToggleEnabled,
}

/// Presentation key a command is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationKey {
    RightArrow,
    LeftArrow,
    F5,
    Escape,
}

impl PresentationKey {
    /// Linux input event code, as used by `ydotool key`
    pub fn evdev_code(&self) -> u16 {
        match self {
            PresentationKey::RightArrow => 106,
            PresentationKey::LeftArrow => 105,
            PresentationKey::F5 => 63,
            PresentationKey::Escape => 1,
        }
    }
}

impl Command {
    pub fn key(&self) -> Option<PresentationKey> {
        match self {
            Command::Next => Some(PresentationKey::RightArrow),
            Command::Prev => Some(PresentationKey::LeftArrow),
            Command::Start => Some(PresentationKey::F5),
            Command::Exit => Some(PresentationKey::Escape),
            Command::ToggleEnabled => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Next => "NEXT",
            Command::Prev => "PREV",
            Command::Start => "START",
            Command::Exit => "EXIT",
            Command::ToggleEnabled => "TOGGLE",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
