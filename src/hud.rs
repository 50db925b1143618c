//! Status display for the terminal

use crossterm::style::{Color, Stylize};
use std::io::Write;

use crate::command::SlideDirection;
use crate::gesture::GestureState;

const ENABLED_COLOR: Color = Color::Rgb { r: 0, g: 255, b: 0 };
const DISABLED_COLOR: Color = Color::Rgb { r: 255, g: 0, b: 0 };

/// Text and color describing whether gestures are active
#[derive(Debug, Clone, PartialEq)]
pub struct HudStatus {
    pub label: String,
    pub color: Color,
}

impl HudStatus {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            Self {
                label: "Gestures: ENABLED".to_string(),
                color: ENABLED_COLOR,
            }
        } else {
            Self {
                label: "Gestures: DISABLED".to_string(),
                color: DISABLED_COLOR,
            }
        }
    }
}

fn mode_string(mode: Option<SlideDirection>) -> &'static str {
    match mode {
        None => "idle",
        Some(SlideDirection::Next) => "▶ next",
        Some(SlideDirection::Prev) => "◀ prev",
    }
}

/// What the status line shows; redraw only when this changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HudSnapshot {
    pub enabled: bool,
    pub mode: Option<SlideDirection>,
}

impl HudSnapshot {
    pub fn of(state: &GestureState) -> Self {
        Self {
            enabled: state.gestures_enabled,
            mode: state.active_mode,
        }
    }

    pub fn status_line(&self) -> String {
        let status = HudStatus::from_enabled(self.enabled);
        format!(
            "{} \x1b[90m{}\x1b[0m",
            status.label.as_str().with(status.color),
            mode_string(self.mode)
        )
    }
}

/// Redraws a single status line on stderr
pub struct Hud {
    visible: bool,
    last: Option<HudSnapshot>,
}

impl Hud {
    pub fn new(visible: bool) -> Self {
        Self {
            visible,
            last: None,
        }
    }

    pub fn update(&mut self, state: &GestureState) {
        if !self.visible {
            return;
        }
        let snapshot = HudSnapshot::of(state);
        if self.last == Some(snapshot) {
            return;
        }
        self.last = Some(snapshot);
        let mut err = std::io::stderr();
        let _ = write!(err, "\r\x1b[K{}", snapshot.status_line());
        let _ = err.flush();
    }

    pub fn clear(&mut self) {
        if self.visible && self.last.is_some() {
            let mut err = std::io::stderr();
            let _ = write!(err, "\r\x1b[K");
            let _ = err.flush();
        }
        self.last = None;
    }
}
