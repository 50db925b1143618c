//! Per-frame hand observations handed to the engine.

use super::landmarks::{HandPose, Handedness, Landmark};

/// One detected hand.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedHand {
    pub pose: HandPose,
    pub handedness: Handedness,
}

impl ObservedHand {
    pub fn new(pose: HandPose, handedness: Handedness) -> Self {
        Self { pose, handedness }
    }
}

/// Everything the detector reported for a single frame, in detector order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameObservation {
    hands: Vec<ObservedHand>,
}

impl FrameObservation {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(hands: Vec<ObservedHand>) -> Self {
        Self { hands }
    }

    pub fn single(hand: ObservedHand) -> Self {
        Self { hands: vec![hand] }
    }

    pub fn pair(first: ObservedHand, second: ObservedHand) -> Self {
        Self {
            hands: vec![first, second],
        }
    }

    /// Build from raw detector output, dropping hands whose landmarks are unusable.
    pub fn from_raw<'a, I>(raw: I) -> Self
    where
        I: IntoIterator<Item = (&'a [Landmark], Handedness)>,
    {
        let hands = raw
            .into_iter()
            .filter_map(|(points, handedness)| {
                HandPose::from_landmarks(points).map(|pose| ObservedHand::new(pose, handedness))
            })
            .collect();
        Self { hands }
    }

    pub fn hands(&self) -> &[ObservedHand] {
        &self.hands
    }

    pub fn hand_count(&self) -> usize {
        self.hands.len()
    }

    /// The first reported hand drives single-hand gestures.
    pub fn primary(&self) -> Option<&ObservedHand> {
        self.hands.first()
    }

    pub fn is_empty(&self) -> bool {
        self.hands.is_empty()
    }
}
