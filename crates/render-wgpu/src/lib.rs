//! wgpu render backend.
//!
//! Draws the ground plane and one instanced cube per world cube, each with an
//! unlit flat color. Objects are registered from the world's event log once;
//! per frame only the cube transforms are re-uploaded.
//!
//! # Invariants
//! - Renderer never mutates world state.
//! - An object id is registered at most once.

mod gpu;
mod shaders;

pub use gpu::{FrameTarget, WgpuRenderer};
