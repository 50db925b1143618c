//! Hand gesture recognition for presentation control
//!
//! Classifies each detected hand from its 21 landmarks and feeds the result
//! through a timing state machine that emits debounced presentation commands.
//!
//! # Gestures
//!
//! - **Point** (index up): right hand advances, left hand goes back, repeating
//! - **Open palm hold**: right hand starts the slideshow, left hand exits
//! - **Two open palms hold**: enables or disables all other gestures

mod classifier;
mod engine;
mod landmarks;
mod observation;

pub use classifier::{finger_count, index_raised, is_open_palm};
pub use engine::{GestureEngine, GestureEvent, GestureState, GestureTimings, Tick};
pub use landmarks::{Finger, HandLandmark, HandPose, Handedness, LANDMARK_COUNT, Landmark};
pub use observation::{FrameObservation, ObservedHand};
