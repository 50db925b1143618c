//! Hand-gesture presentation remote
//!
//! Reads hand landmarks from an external detector, recognizes a small set of
//! gestures and turns them into slide navigation key presses.

pub mod command;
pub mod config;
pub mod dispatch;
pub mod feed;
pub mod gesture;
pub mod hud;
pub mod presenter;
