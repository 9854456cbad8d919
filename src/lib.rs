//! Posture Sentinel: watches your head pitch through the webcam and beeps
//! when you stop looking straight at the screen.
//!
//! The core (`landmarks`, `posture`, `alert`, `session`) is plain Rust and
//! runs without any device. Camera capture, the landmark model and the
//! preview window live behind the `vision` feature.

pub mod alert;
pub mod config;
pub mod landmarks;
pub mod posture;
pub mod session;

#[cfg(feature = "vision")]
pub mod camera;
#[cfg(feature = "vision")]
pub mod feed;
#[cfg(feature = "vision")]
pub mod inference;
#[cfg(feature = "vision")]
pub mod overlay;

pub use alert::{AlertSink, AlertTimer, BellSink, Tone};
pub use config::{Config, ConfigError};
pub use landmarks::{Landmark, LandmarkFrame, LandmarkSource, Point};
pub use posture::{
    classify, CalibrationBaseline, Deviation, PostureMonitor, PostureState, Sensitivity, TickReport,
};
pub use session::{Command, Flow, Session};
