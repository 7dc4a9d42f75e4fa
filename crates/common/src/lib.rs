//! Shared types for the cubefield workspace.
//!
//! Holds the small value types every crate agrees on (object ids, transforms,
//! colors) and the scene configuration loaded at startup.

pub mod color;
pub mod config;
pub mod types;

pub use color::{Color, ColorParseError};
pub use config::{
    CameraConfig, ConfigError, MinimapConfig, MotionConfig, SceneConfig, TimeStep, WorldConfig,
};
pub use types::{ObjectId, Transform};
