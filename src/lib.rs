//! Real-time virtual eyewear try-on.
//!
//! A capture session feeds a per-tick render loop that estimates where the
//! eyes are, places the selected frame asset over them, and lets the user
//! nudge and scale it. Capturing flattens the current frame and overlay into
//! a photo that can be downloaded or shared.

pub mod ascii;
pub mod camera;
pub mod catalog;
pub mod cli;
pub mod compositor;
pub mod config;
pub mod event_loop;
pub mod export;
pub mod input;
pub mod landmarks;
pub mod overlay;
pub mod preview;
pub mod render;
pub mod terminal;
pub mod tryon;
