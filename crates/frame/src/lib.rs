//! Frame Controller: the per-frame update pipeline.
//!
//! [`AppContext`] owns everything the loop touches. Each [`AppContext::tick`]
//! runs the same fixed stages in order:
//!
//! 1. move the camera from the held keys,
//! 2. spin every cube,
//! 3. reconcile the camera controls,
//! 4. render the scene,
//! 5. redraw the minimap.
//!
//! # Invariants
//! - No stage is skipped and no frame exits early.
//! - Opposite keys cancel exactly: their steps are summed before moving.
//! - With `TimeStep::PerTick` the elapsed time is ignored.

use cubefield_common::{MotionConfig, SceneConfig};
use cubefield_input::{Direction, InputState};
use cubefield_kernel::World;
use cubefield_render::{DrawSurface, MinimapProjector, PointerLockCamera, Renderer};
use std::time::Duration;

/// Application context owned by the entry point and passed to every stage.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub world: World,
    pub input: InputState,
    pub camera: PointerLockCamera,
    pub minimap: MinimapProjector,
    motion: MotionConfig,
    frames: u64,
}

impl AppContext {
    /// Generate the world and set up camera and minimap from `config`.
    pub fn new(config: &SceneConfig) -> Self {
        Self::with_world(World::from_config(&config.world), config)
    }

    /// Wrap an already generated world.
    pub fn with_world(world: World, config: &SceneConfig) -> Self {
        Self {
            world,
            input: InputState::new(),
            camera: PointerLockCamera::from_config(&config.camera),
            minimap: MinimapProjector::new(config.minimap.clone()),
            motion: config.motion.clone(),
            frames: 0,
        }
    }

    /// Number of completed ticks.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Run one frame. `dt` is the wall-clock time since the previous frame
    /// and only matters for `TimeStep::Scaled`.
    pub fn tick<R, S>(&mut self, dt: Duration, renderer: &mut R, minimap: &mut S) -> R::Output
    where
        R: Renderer + ?Sized,
        S: DrawSurface + ?Sized,
    {
        let _span = tracing::debug_span!("frame", n = self.frames).entered();
        let scale = self.motion.timestep.scale(dt.as_secs_f32());

        self.apply_movement(self.motion.move_step * scale);
        self.world.spin_cubes(self.motion.spin_step * scale);
        self.camera.update();
        let output = renderer.render(&self.world, &self.camera);
        self.minimap.draw(&self.world, &self.camera, minimap);

        self.frames += 1;
        output
    }

    /// Net step along each axis: held keys add, their opposites subtract.
    fn movement_amounts(&self, step: f32) -> (f32, f32) {
        let axis = |pos: Direction, neg: Direction| {
            let mut amount = 0.0;
            if self.input.is_held(pos) {
                amount += step;
            }
            if self.input.is_held(neg) {
                amount -= step;
            }
            amount
        };
        (
            axis(Direction::Forward, Direction::Backward),
            axis(Direction::Right, Direction::Left),
        )
    }

    fn apply_movement(&mut self, step: f32) {
        let (forward, right) = self.movement_amounts(step);
        if forward != 0.0 {
            self.camera.move_forward(forward);
        }
        if right != 0.0 {
            self.camera.move_right(right);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubefield_common::{TimeStep, WorldConfig};
    use cubefield_render::{DebugTextRenderer, DrawCommand, DrawList, MinimapPoint};
    use glam::Vec3;

    const FRAME: Duration = Duration::from_millis(16);

    /// Counts render calls and remembers the camera it was handed.
    #[derive(Default)]
    struct Probe {
        calls: u64,
        last_camera: Option<Vec3>,
        last_tick: u64,
    }

    impl Renderer for Probe {
        type Output = ();

        fn render(&mut self, world: &World, camera: &PointerLockCamera) -> Self::Output {
            self.calls += 1;
            self.last_camera = Some(camera.position);
            self.last_tick = world.tick();
        }
    }

    fn context(count: usize) -> AppContext {
        let config = SceneConfig {
            world: WorldConfig {
                cube_count: count,
                seed: Some(11),
                ..WorldConfig::default()
            },
            ..SceneConfig::default()
        };
        AppContext::new(&config)
    }

    fn run(ctx: &mut AppContext, frames: usize) -> DrawList {
        let (w, h) = ctx.minimap.size();
        let mut list = DrawList::new(w, h);
        let mut probe = Probe::default();
        for _ in 0..frames {
            ctx.tick(FRAME, &mut probe, &mut list);
        }
        list
    }

    #[test]
    fn idle_frames_only_spin() {
        let mut ctx = context(50);
        let start = ctx.camera.position;
        let positions: Vec<Vec3> = ctx.world.cubes().iter().map(|c| c.position()).collect();

        run(&mut ctx, 100);

        assert_eq!(ctx.frames(), 100);
        assert_eq!(ctx.camera.position, start);
        assert_eq!(ctx.world.cube_count(), 50);
        for (cube, pos) in ctx.world.cubes().iter().zip(positions) {
            assert_eq!(cube.position(), pos);
            assert!((cube.transform.rotation.x - 1.0).abs() < 1e-4);
            assert!((cube.transform.rotation.y - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn rotation_tracks_frame_index() {
        let mut ctx = context(3);
        for k in 1..=20u32 {
            run(&mut ctx, 1);
            let expected = k as f32 * 0.01;
            for cube in ctx.world.cubes() {
                assert!((cube.transform.rotation.x - expected).abs() < 1e-5);
                assert!((cube.transform.rotation.y - expected).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn holding_forward_walks_along_facing() {
        let mut ctx = context(0);
        let start = ctx.camera.position;
        let facing = ctx.camera.forward_flat();
        ctx.input.set_key(Direction::Forward, true);

        run(&mut ctx, 30);

        let moved = ctx.camera.position - start;
        assert!((moved.length() - 3.0).abs() < 1e-4, "{moved:?}");
        assert!(moved.normalize().dot(facing) > 0.9999);
        assert_eq!(ctx.camera.position.y, 1.0);
    }

    #[test]
    fn opposite_keys_cancel_exactly() {
        let mut ctx = context(0);
        let start = ctx.camera.position;
        ctx.input.set_key(Direction::Forward, true);
        ctx.input.set_key(Direction::Backward, true);
        ctx.input.set_key(Direction::Left, true);
        ctx.input.set_key(Direction::Right, true);

        run(&mut ctx, 10);

        assert_eq!(ctx.camera.position, start);
    }

    #[test]
    fn strafe_follows_yaw() {
        let mut ctx = context(0);
        ctx.camera.yaw = 0.0;
        ctx.input.set_key(Direction::Right, true);
        run(&mut ctx, 10);
        // Facing +X, right is +Z.
        assert!((ctx.camera.position - Vec3::new(0.0, 1.0, 1.0)).length() < 1e-4);
    }

    #[test]
    fn look_is_reconciled_before_render() {
        let mut ctx = context(0);
        ctx.camera.lock();
        let yaw = ctx.camera.yaw;
        ctx.camera.look(10.0, 0.0);
        run(&mut ctx, 1);
        assert!((ctx.camera.yaw - (yaw + 0.02)).abs() < 1e-6);
    }

    #[test]
    fn stages_run_in_order_every_frame() {
        let mut ctx = context(5);
        ctx.input.set_key(Direction::Forward, true);
        let mut probe = Probe::default();
        let mut list = DrawList::new(200, 200);

        for n in 1..=3u64 {
            ctx.tick(FRAME, &mut probe, &mut list);
            assert_eq!(probe.calls, n);
            // Renderer sees this frame's movement and spin.
            assert_eq!(probe.last_tick, n);
            assert_eq!(probe.last_camera, Some(ctx.camera.position));
        }
        // One frame's worth of minimap: clear, 5 cubes, camera.
        assert_eq!(list.commands().len(), 7);
        assert!(matches!(list.commands()[6], DrawCommand::FillCircle { .. }));
    }

    #[test]
    fn minimap_follows_camera() {
        let world = World::from_positions(&WorldConfig::default(), &[Vec3::new(10.0, 0.5, 0.0)]);
        let mut ctx = AppContext::with_world(world, &SceneConfig::default());
        ctx.camera.yaw = 0.0;
        ctx.input.set_key(Direction::Forward, true);

        let list = run(&mut ctx, 50);

        // Camera walked 5 units toward the cube: 5 / 100 * 200 + 100 = 110.
        let rect = list.commands()[1];
        let DrawCommand::FillRect { x, y, .. } = rect else {
            panic!("expected cube marker, got {rect:?}");
        };
        let centre = MinimapPoint { x: x + 2.0, y: y + 2.0 };
        assert!((centre.x - 110.0).abs() < 1e-3, "{centre:?}");
        assert!((centre.y - 100.0).abs() < 1e-3, "{centre:?}");
    }

    #[test]
    fn per_tick_ignores_elapsed_time() {
        let mut ctx = context(1);
        let mut list = DrawList::new(200, 200);
        let mut r = DebugTextRenderer::new();
        ctx.tick(Duration::from_secs(1), &mut r, &mut list);
        ctx.tick(Duration::ZERO, &mut r, &mut list);
        let rot = ctx.world.cubes()[0].transform.rotation.x;
        assert!((rot - 0.02).abs() < 1e-6);
    }

    #[test]
    fn scaled_timestep_uses_elapsed_time() {
        let config = SceneConfig {
            world: WorldConfig {
                cube_count: 1,
                seed: Some(1),
                ..WorldConfig::default()
            },
            motion: MotionConfig {
                timestep: TimeStep::Scaled { reference_hz: 60.0 },
                ..MotionConfig::default()
            },
            ..SceneConfig::default()
        };
        let mut ctx = AppContext::new(&config);
        ctx.input.set_key(Direction::Forward, true);
        let mut list = DrawList::new(200, 200);
        let mut r = DebugTextRenderer::new();

        // Half a second at 60 Hz reference is thirty ticks' worth.
        ctx.tick(Duration::from_millis(500), &mut r, &mut list);

        let rot = ctx.world.cubes()[0].transform.rotation.x;
        assert!((rot - 0.3).abs() < 1e-5);
        let moved = (ctx.camera.position - Vec3::new(0.0, 1.0, 0.0)).length();
        assert!((moved - 3.0).abs() < 1e-4);
    }

    #[test]
    fn text_renderer_output_is_returned() {
        let mut ctx = context(2);
        let mut list = DrawList::new(200, 200);
        let mut r = DebugTextRenderer::new();
        let out = ctx.tick(FRAME, &mut r, &mut list);
        assert!(out.contains("Cubes: 2"));
        assert!(out.contains("tick=1"));
    }
}
