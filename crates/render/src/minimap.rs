use crate::camera::PointerLockCamera;
use crate::surface::DrawSurface;
use cubefield_common::MinimapConfig;
use cubefield_kernel::World;
use glam::{Vec2, Vec3};
use serde::Serialize;

/// A cube's marker centre on the minimap, in surface pixels.
///
/// Derived fresh every frame; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MinimapPoint {
    pub x: f32,
    pub y: f32,
}

impl From<MinimapPoint> for Vec2 {
    fn from(p: MinimapPoint) -> Self {
        Vec2::new(p.x, p.y)
    }
}

/// Top-down projection of cube positions relative to the camera.
///
/// The camera always sits at the centre of the surface; `span` world units
/// map onto the full width and height. Nothing is clipped here: markers that
/// land outside the surface are still issued and the surface drops them.
#[derive(Debug, Clone)]
pub struct MinimapProjector {
    config: MinimapConfig,
}

impl MinimapProjector {
    pub fn new(config: MinimapConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MinimapConfig {
        &self.config
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn center(&self) -> MinimapPoint {
        MinimapPoint {
            x: self.config.width as f32 / 2.0,
            y: self.config.height as f32 / 2.0,
        }
    }

    /// Map a world position onto the minimap. World x runs right, world z
    /// runs down.
    pub fn project(&self, position: Vec3, camera: Vec3) -> MinimapPoint {
        let w = self.config.width as f32;
        let h = self.config.height as f32;
        let rel_x = position.x - camera.x;
        let rel_z = position.z - camera.z;
        MinimapPoint {
            x: (rel_x / self.config.span) * w + w / 2.0,
            y: (rel_z / self.config.span) * h + h / 2.0,
        }
    }

    /// Marker centres for every cube, in world order.
    pub fn points(&self, world: &World, camera: &PointerLockCamera) -> Vec<MinimapPoint> {
        world
            .cubes()
            .iter()
            .map(|cube| self.project(cube.position(), camera.position))
            .collect()
    }

    /// Redraw the whole minimap: clear, one square per cube, then the camera
    /// dot at the centre.
    pub fn draw<S: DrawSurface + ?Sized>(
        &self,
        world: &World,
        camera: &PointerLockCamera,
        surface: &mut S,
    ) {
        let (w, h) = self.size();
        surface.clear_rect(0.0, 0.0, w as f32, h as f32);

        let size = self.config.cube_marker;
        let half = size / 2.0;
        for cube in world.cubes() {
            let p = self.project(cube.position(), camera.position);
            surface.fill_rect(p.x - half, p.y - half, size, size, self.config.cube_color);
        }

        let c = self.center();
        surface.fill_circle(c.x, c.y, self.config.camera_radius, self.config.camera_color);
    }
}
