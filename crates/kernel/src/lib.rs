//! World State: the ground plane, the randomly placed cubes and their spin.
//!
//! # Invariants
//! - The cube count is fixed at generation and never changes.
//! - Cube positions never change after generation; only rotation does.
//! - Every object is announced exactly once through the event log.

pub mod world;

pub use world::{Cube, GroundPlane, ObjectKind, World, WorldEvent};
