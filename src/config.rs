use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::gesture::GestureTimings;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("timing.{field} must be a finite, non-negative number of seconds (got {value})")]
    InvalidDuration { field: &'static str, value: f64 },
    #[error("detection.{field} must be within [0, 1] (got {value})")]
    InvalidConfidence { field: &'static str, value: f32 },
    #[error("detection.max_num_hands must be at least 1")]
    NoHands,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            detection: DetectionConfig::default(),
            timing: TimingConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

// ============================================================================
// Detection Config
// ============================================================================

/// Settings forwarded to the landmark detector. The gesture engine never reads them.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DetectionConfig {
    #[serde(default = "default_max_num_hands")]
    pub max_num_hands: u32,
    #[serde(default = "default_confidence")]
    pub min_detection_confidence: f32,
    #[serde(default = "default_confidence")]
    pub min_tracking_confidence: f32,
    #[serde(default)]
    pub camera_index: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            max_num_hands: default_max_num_hands(),
            min_detection_confidence: default_confidence(),
            min_tracking_confidence: default_confidence(),
            camera_index: 0,
        }
    }
}

fn default_max_num_hands() -> u32 {
    2
}

fn default_confidence() -> f32 {
    0.7
}

// ============================================================================
// Timing Config
// ============================================================================

/// Gesture timing windows, all in seconds
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TimingConfig {
    /// Repeat interval for auto next/prev while pointing
    #[serde(default = "default_slide_interval")]
    pub slide_interval: f64,
    /// Minimum gap between start/exit actions
    #[serde(default = "default_special_cooldown")]
    pub special_cooldown: f64,
    /// Minimum gap between enable/disable toggles
    #[serde(default = "default_toggle_cooldown")]
    pub toggle_cooldown: f64,
    /// How long a single open palm must be held for start/exit
    #[serde(default = "default_palm_hold_time")]
    pub palm_hold_time: f64,
    /// How long both open palms must be held to toggle
    #[serde(default = "default_two_hand_hold_time")]
    pub two_hand_hold_time: f64,
    /// Grace window after a toggle during which single-hand gestures are ignored
    #[serde(default = "default_post_toggle_delay")]
    pub post_toggle_delay: f64,
    /// Single-hand lockout after any frame with two hands
    #[serde(default = "default_two_hand_lock_time")]
    pub two_hand_lock_time: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            slide_interval: default_slide_interval(),
            special_cooldown: default_special_cooldown(),
            toggle_cooldown: default_toggle_cooldown(),
            palm_hold_time: default_palm_hold_time(),
            two_hand_hold_time: default_two_hand_hold_time(),
            post_toggle_delay: default_post_toggle_delay(),
            two_hand_lock_time: default_two_hand_lock_time(),
        }
    }
}

fn default_slide_interval() -> f64 {
    1.0
}
fn default_special_cooldown() -> f64 {
    1.5
}
fn default_toggle_cooldown() -> f64 {
    1.5
}
fn default_palm_hold_time() -> f64 {
    0.6
}
fn default_two_hand_hold_time() -> f64 {
    1.0
}
fn default_post_toggle_delay() -> f64 {
    1.2
}
fn default_two_hand_lock_time() -> f64 {
    1.0
}

impl TimingConfig {
    fn fields(&self) -> [(&'static str, f64); 7] {
        [
            ("slide_interval", self.slide_interval),
            ("special_cooldown", self.special_cooldown),
            ("toggle_cooldown", self.toggle_cooldown),
            ("palm_hold_time", self.palm_hold_time),
            ("two_hand_hold_time", self.two_hand_hold_time),
            ("post_toggle_delay", self.post_toggle_delay),
            ("two_hand_lock_time", self.two_hand_lock_time),
        ]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in self.fields() {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidDuration { field, value });
            }
        }
        Ok(())
    }

    /// Convert to engine durations. Call `validate` first; invalid values clamp to zero.
    pub fn to_timings(&self) -> GestureTimings {
        let secs = |v: f64| {
            if v.is_finite() && v > 0.0 {
                Duration::try_from_secs_f64(v).unwrap_or(Duration::MAX)
            } else {
                Duration::ZERO
            }
        };
        GestureTimings {
            slide_interval: secs(self.slide_interval),
            special_cooldown: secs(self.special_cooldown),
            toggle_cooldown: secs(self.toggle_cooldown),
            palm_hold_time: secs(self.palm_hold_time),
            two_hand_hold_time: secs(self.two_hand_hold_time),
            post_toggle_delay: secs(self.post_toggle_delay),
            two_hand_lock_time: secs(self.two_hand_lock_time),
        }
    }
}

// ============================================================================
// Output Config
// ============================================================================

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendConfig {
    /// ydotool on Wayland, enigo when compiled in, otherwise log only
    #[default]
    Auto,
    /// Print commands without touching the keyboard
    Log,
    /// Shell out to `ydotool key`
    Ydotool,
    /// Synthesize keys with enigo (requires the `keyboard` feature)
    Enigo,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    /// Show the status line on the terminal
    #[serde(default = "default_hud")]
    pub hud: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            hud: default_hud(),
        }
    }
}

fn default_hud() -> bool {
    true
}

impl Config {
    /// Load `config.toml` from the working directory, falling back to defaults if absent
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_PATH))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timing.validate()?;

        if self.detection.max_num_hands == 0 {
            return Err(ConfigError::NoHands);
        }
        for (field, value) in [
            ("min_detection_confidence", self.detection.min_detection_confidence),
            ("min_tracking_confidence", self.detection.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidConfidence { field, value });
            }
        }
        Ok(())
    }
}
