use crate::camera::PointerLockCamera;
use cubefield_kernel::World;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads world state and the camera, then produces output. It
/// never mutates the world.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given world state and camera.
    fn render(&mut self, world: &World, camera: &PointerLockCamera) -> Self::Output;
}

/// Text renderer for headless runs and tests.
///
/// Produces a human-readable summary of the frame. `frames` counts how many
/// times it has been asked to draw.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    frames: u64,
    verbose: bool,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also list every cube with its position and rotation.
    pub fn verbose() -> Self {
        Self {
            verbose: true,
            ..Self::default()
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, world: &World, camera: &PointerLockCamera) -> String {
        self.frames += 1;

        let mut out = String::new();
        out.push_str(&format!(
            "=== Frame {} (tick={}) ===\n",
            self.frames,
            world.tick()
        ));
        out.push_str(&format!(
            "Ground: {0:.0}x{0:.0} {1}\n",
            world.ground().size,
            world.ground().color
        ));
        out.push_str(&format!("Cubes: {}\n", world.cube_count()));
        out.push_str(&format!(
            "Camera: pos=({:.2}, {:.2}, {:.2}) yaw={:.1} pitch={:.1} fov={:.0}{}\n",
            camera.position.x,
            camera.position.y,
            camera.position.z,
            camera.yaw.to_degrees(),
            camera.pitch.to_degrees(),
            camera.fov.to_degrees(),
            if camera.is_locked() { " [locked]" } else { "" }
        ));

        if self.verbose {
            for cube in world.cubes() {
                let p = cube.position();
                let r = cube.transform.rotation;
                out.push_str(&format!(
                    "  [{}] pos=({:.2}, {:.2}, {:.2}) rot=({:.2}, {:.2})\n",
                    cube.id, p.x, p.y, p.z, r.x, r.y
                ));
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubefield_common::WorldConfig;
    use glam::Vec3;

    #[test]
    fn debug_renderer_empty_world() {
        let world = World::from_positions(&WorldConfig::default(), &[]);
        let mut renderer = DebugTextRenderer::new();
        let output = renderer.render(&world, &PointerLockCamera::default());

        assert!(output.contains("tick=0"));
        assert!(output.contains("Cubes: 0"));
        assert!(output.contains("Ground: 100x100 #808080"));
        assert!(output.contains("fov=75"));
        assert_eq!(renderer.frames(), 1);
    }

    #[test]
    fn debug_renderer_lists_cubes_when_verbose() {
        let world = World::from_positions(
            &WorldConfig::default(),
            &[Vec3::new(1.0, 0.5, 2.0), Vec3::new(-3.0, 0.5, 4.0)],
        );
        let mut renderer = DebugTextRenderer::verbose();
        let output = renderer.render(&world, &PointerLockCamera::default());

        assert!(output.contains("Cubes: 2"));
        assert!(output.contains("[#1] pos=(1.00, 0.50, 2.00)"));
        assert!(output.contains("[#2] pos=(-3.00, 0.50, 4.00)"));
    }

    #[test]
    fn counts_frames() {
        let world = World::from_positions(&WorldConfig::default(), &[]);
        let cam = PointerLockCamera::default();
        let mut renderer = DebugTextRenderer::new();
        renderer.render(&world, &cam);
        let out = renderer.render(&world, &cam);
        assert!(out.starts_with("=== Frame 2"));
    }

    #[test]
    fn summary_is_one_line_per_item() {
        let world = World::from_positions(&WorldConfig::default(), &[Vec3::ZERO]);
        let cam = PointerLockCamera::default();

        let out = DebugTextRenderer::new().render(&world, &cam);
        assert_eq!(out.lines().count(), 4);
        assert!(out.ends_with('\n'));

        let out = DebugTextRenderer::verbose().render(&world, &cam);
        assert_eq!(out.lines().count(), 5);
    }
}
