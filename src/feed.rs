//! JSON-lines landmark feed
//!
//! An external detector writes one object per frame:
//!
//! ```text
//! {"t": 1.25, "hands": [{"handedness": "Right", "landmarks": [[0.51, 0.62], ...]}]}
//! ```
//!
//! `t` is optional and only used for replay. Points may be `[x, y]`,
//! `[x, y, z]` or `{"x": .., "y": .., "z": ..}`.

use flume::Sender;
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

use crate::gesture::{FrameObservation, HandPose, Handedness, Landmark, ObservedHand};

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("line {line}: invalid JSON: {source}")]
    Json {
        line: usize,
        source: serde_json::Error,
    },
    #[error("line {line}: timestamp must be finite and non-negative")]
    Timestamp { line: usize },
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(default)]
    t: Option<f64>,
    #[serde(default)]
    hands: Vec<RawHand>,
}

#[derive(Debug, Deserialize)]
struct RawHand {
    handedness: String,
    landmarks: Vec<RawPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPoint {
    Xyz([f32; 3]),
    Xy([f32; 2]),
    Object {
        x: f32,
        y: f32,
        #[serde(default)]
        z: f32,
    },
}

impl From<&RawPoint> for Landmark {
    fn from(point: &RawPoint) -> Self {
        match *point {
            RawPoint::Xyz([x, y, z]) => Landmark::with_depth(x, y, z),
            RawPoint::Xy([x, y]) => Landmark::new(x, y),
            RawPoint::Object { x, y, z } => Landmark::with_depth(x, y, z),
        }
    }
}

/// One parsed feed line
#[derive(Debug, Clone, PartialEq)]
pub struct FeedFrame {
    /// Seconds since the start of the recording, if the detector supplied it
    pub timestamp: Option<f64>,
    pub observation: FrameObservation,
}

/// Parse a single feed line. Blank lines yield `Ok(None)`.
///
/// Hands with an unknown handedness label or the wrong number of landmarks
/// are dropped rather than failing the frame.
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<FeedFrame>, FeedError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let raw: RawFrame = serde_json::from_str(line).map_err(|source| FeedError::Json {
        line: line_no,
        source,
    })?;

    if let Some(t) = raw.t {
        if !t.is_finite() || t < 0.0 {
            return Err(FeedError::Timestamp { line: line_no });
        }
    }

    let mut hands = Vec::with_capacity(raw.hands.len());
    for raw_hand in &raw.hands {
        let Some(handedness) = Handedness::from_label(&raw_hand.handedness) else {
            debug!(
                line = line_no,
                label = %raw_hand.handedness,
                "dropping hand with unknown handedness"
            );
            continue;
        };
        let points: Vec<Landmark> = raw_hand.landmarks.iter().map(Landmark::from).collect();
        match HandPose::from_landmarks(&points) {
            Some(pose) => hands.push(ObservedHand::new(pose, handedness)),
            None => debug!(
                line = line_no,
                points = points.len(),
                "dropping hand with unusable landmarks"
            ),
        }
    }

    Ok(Some(FeedFrame {
        timestamp: raw.t,
        observation: FrameObservation::new(hands),
    }))
}

/// Open a feed file, or stdin for `-` / no path
pub fn open(path: Option<&Path>) -> io::Result<Box<dyn BufRead + Send>> {
    match path {
        Some(p) if p != Path::new("-") => Ok(Box::new(BufReader::new(File::open(p)?))),
        _ => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

/// Parse every frame from `reader`.
///
/// A line that cannot be parsed still yields a frame with no hands and no
/// timestamp, so holds in progress are broken rather than bridged.
pub fn frames<R: BufRead>(reader: R) -> impl Iterator<Item = FeedFrame> {
    reader
        .lines()
        .enumerate()
        .map_while(|(idx, line)| match line {
            Ok(line) => Some((idx + 1, line)),
            Err(e) => {
                warn!("feed read error: {}", e);
                None
            }
        })
        .filter_map(|(line_no, line)| match parse_line(line_no, &line) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("unreadable feed line, treating as no hands: {}", e);
                Some(FeedFrame {
                    timestamp: None,
                    observation: FrameObservation::empty(),
                })
            }
        })
}

/// Read frames on a background thread and forward them to `tx`.
///
/// Stops at end of input, when the receiver is dropped, or once `running`
/// is cleared.
pub fn spawn_reader(
    reader: Box<dyn BufRead + Send>,
    tx: Sender<FeedFrame>,
    running: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        for frame in frames(reader) {
            if !running.load(Ordering::SeqCst) {
                break;
            }
            if tx.send(frame).is_err() {
                break;
            }
        }
        debug!("feed reader finished");
    })
}
