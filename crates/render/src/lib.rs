//! Rendering Adapter: renderer-agnostic interface, camera controls and the
//! minimap overlay.
//!
//! # Invariants
//! - Renderers and the minimap never mutate the world.
//! - The minimap is relative: the camera is always drawn at its centre.

mod camera;
mod minimap;
mod renderer;
mod surface;

pub use camera::PointerLockCamera;
pub use minimap::{MinimapPoint, MinimapProjector};
pub use renderer::{DebugTextRenderer, Renderer};
pub use surface::{DrawCommand, DrawList, DrawSurface, PixelCanvas};
