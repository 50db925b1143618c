//! Pose predicates over a single hand.
//!
//! A finger counts as raised when its tip sits above its PIP joint in the
//! image, i.e. has a smaller y coordinate.

use super::landmarks::{Finger, HandPose};

fn finger_raised(pose: &HandPose, finger: Finger) -> bool {
    pose.landmark(finger.tip()).y < pose.landmark(finger.pip()).y
}

/// Index fingertip above its PIP joint.
pub fn index_raised(pose: &HandPose) -> bool {
    finger_raised(pose, Finger::Index)
}

/// Number of raised non-thumb fingers (0-4).
pub fn finger_count(pose: &HandPose) -> usize {
    Finger::ALL
        .iter()
        .filter(|&&finger| finger_raised(pose, finger))
        .count()
}

/// All four non-thumb fingers raised.
pub fn is_open_palm(pose: &HandPose) -> bool {
    finger_count(pose) == Finger::ALL.len()
}
