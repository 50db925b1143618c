//! Hand landmark data structures.
//!
//! Models the 21-point hand skeleton produced by MediaPipe-style landmark
//! models. Coordinates are normalized to the image, with y growing downward.

// ============================================================================
// Landmark indices
// ============================================================================

/// The 21 hand landmarks, in detector output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

impl HandLandmark {
    /// Position in the landmark array (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }
}

// ============================================================================
// Fingers
// ============================================================================

/// The four non-thumb fingers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 4] = [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];

    pub fn tip(&self) -> HandLandmark {
        match self {
            Self::Index => HandLandmark::IndexTip,
            Self::Middle => HandLandmark::MiddleTip,
            Self::Ring => HandLandmark::RingTip,
            Self::Pinky => HandLandmark::PinkyTip,
        }
    }

    /// The proximal interphalangeal joint the tip is compared against.
    pub fn pip(&self) -> HandLandmark {
        match self {
            Self::Index => HandLandmark::IndexPip,
            Self::Middle => HandLandmark::MiddlePip,
            Self::Ring => HandLandmark::RingPip,
            Self::Pinky => HandLandmark::PinkyPip,
        }
    }
}

// ============================================================================
// Handedness
// ============================================================================

/// Which hand, as seen in the mirrored camera image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Parse a detector label, case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

// ============================================================================
// Landmark / pose
// ============================================================================

/// A single normalized landmark position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn with_depth(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// A complete, validated hand pose.
#[derive(Debug, Clone, PartialEq)]
pub struct HandPose {
    points: [Landmark; LANDMARK_COUNT],
}

impl HandPose {
    /// Build a pose from detector output.
    ///
    /// Returns `None` unless there are exactly 21 finite points; callers
    /// treat that as "no hand observed".
    pub fn from_landmarks(points: &[Landmark]) -> Option<Self> {
        if points.len() != LANDMARK_COUNT || !points.iter().all(Landmark::is_finite) {
            return None;
        }
        let mut array = [Landmark::default(); LANDMARK_COUNT];
        array.copy_from_slice(points);
        Some(Self { points: array })
    }

    pub fn landmark(&self, which: HandLandmark) -> Landmark {
        self.points[which.index()]
    }

    pub fn landmarks(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }
}
