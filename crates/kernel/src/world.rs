use cubefield_common::{Color, ObjectId, Transform, WorldConfig};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// What kind of scene object an id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    Ground,
    Cube,
}

/// An event record produced when the world creates an object.
///
/// Renderers drain these to register each object with their own scene
/// exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    Registered {
        id: ObjectId,
        kind: ObjectKind,
        transform: Transform,
        color: Color,
    },
}

/// The static ground plane, lying in the XZ plane at `y = 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundPlane {
    pub id: ObjectId,
    pub size: f32,
    pub color: Color,
}

/// A spinning cube. Its position is fixed; `transform.rotation.x/y` grow
/// every tick and are never wrapped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cube {
    pub id: ObjectId,
    pub transform: Transform,
}

impl Cube {
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }
}

/// The whole scene: one ground plane and a fixed set of cubes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    ground: GroundPlane,
    cubes: Vec<Cube>,
    tick: u64,
    seed: Option<u64>,
    #[serde(skip)]
    event_log: Vec<WorldEvent>,
}

impl World {
    /// Generate a world from `config`, seeding from `config.seed` when set and
    /// from OS entropy otherwise.
    pub fn from_config(config: &WorldConfig) -> Self {
        match config.seed {
            Some(seed) => Self::generate_seeded(config, seed),
            None => Self::generate(config, &mut StdRng::from_os_rng()),
        }
    }

    /// Generate a world with a deterministic placement for `seed`.
    pub fn generate_seeded(config: &WorldConfig, seed: u64) -> Self {
        let mut world = Self::generate(config, &mut StdRng::seed_from_u64(seed));
        world.seed = Some(seed);
        world
    }

    /// Place the ground plane and `config.cube_count` cubes, each with `x` and
    /// `z` drawn independently from `[-half_extent, half_extent)`.
    ///
    /// Overlapping cubes are allowed.
    pub fn generate<R: Rng>(config: &WorldConfig, rng: &mut R) -> Self {
        let mut next_id = 0u32;
        let mut alloc = || {
            let id = ObjectId(next_id);
            next_id += 1;
            id
        };

        let ground = GroundPlane {
            id: alloc(),
            size: config.ground_size,
            color: config.ground_color,
        };
        let mut event_log = vec![WorldEvent::Registered {
            id: ground.id,
            kind: ObjectKind::Ground,
            transform: Transform {
                scale: Vec3::new(ground.size, 1.0, ground.size),
                ..Transform::default()
            },
            color: ground.color,
        }];

        let h = config.half_extent;
        let mut cubes = Vec::with_capacity(config.cube_count);
        for _ in 0..config.cube_count {
            let (x, z) = if h > 0.0 {
                (rng.random_range(-h..h), rng.random_range(-h..h))
            } else {
                (0.0, 0.0)
            };
            let transform = Transform {
                position: Vec3::new(x, config.cube_height, z),
                scale: Vec3::splat(config.cube_size),
                ..Transform::default()
            };
            let cube = Cube {
                id: alloc(),
                transform,
            };
            event_log.push(WorldEvent::Registered {
                id: cube.id,
                kind: ObjectKind::Cube,
                transform,
                color: config.cube_color,
            });
            cubes.push(cube);
        }

        tracing::info!(cubes = cubes.len(), half_extent = h, "world generated");

        Self {
            ground,
            cubes,
            tick: 0,
            seed: None,
            event_log,
        }
    }

    /// Build a world from explicit cube positions. Rotation starts at zero.
    pub fn from_positions(config: &WorldConfig, positions: &[Vec3]) -> Self {
        let mut world = Self::generate(
            &WorldConfig {
                cube_count: 0,
                ..config.clone()
            },
            &mut StdRng::seed_from_u64(0),
        );
        for &position in positions {
            let id = ObjectId(world.cubes.len() as u32 + 1);
            let transform = Transform {
                position,
                scale: Vec3::splat(config.cube_size),
                ..Transform::default()
            };
            world.event_log.push(WorldEvent::Registered {
                id,
                kind: ObjectKind::Cube,
                transform,
                color: config.cube_color,
            });
            world.cubes.push(Cube { id, transform });
        }
        world
    }

    /// Number of completed spin ticks.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Seed the placement was drawn from, if it was deterministic.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn ground(&self) -> &GroundPlane {
        &self.ground
    }

    pub fn cubes(&self) -> &[Cube] {
        &self.cubes
    }

    pub fn cube_count(&self) -> usize {
        self.cubes.len()
    }

    /// Drain and return pending registration events.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Advance the ambient animation by one tick: every cube turns by `step`
    /// radians about both x and y, regardless of visibility.
    pub fn spin_cubes(&mut self, step: f32) {
        for cube in &mut self.cubes {
            cube.transform.rotation.x += step;
            cube.transform.rotation.y += step;
        }
        self.tick += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(count: usize) -> WorldConfig {
        WorldConfig {
            cube_count: count,
            ..WorldConfig::default()
        }
    }

    #[test]
    fn generates_exact_count_within_bounds() {
        for n in [0, 1, 50, 500] {
            let w = World::generate_seeded(&config(n), 1234);
            assert_eq!(w.cube_count(), n);
            for cube in w.cubes() {
                let p = cube.position();
                assert!(p.x.abs() <= 50.0 && p.z.abs() <= 50.0, "{p:?}");
                assert_eq!(p.y, 0.5);
                assert_eq!(cube.transform.rotation, Vec3::ZERO);
            }
        }
    }

    #[test]
    fn every_object_registered_once() {
        let mut w = World::generate_seeded(&config(50), 7);
        let events = w.drain_events();
        assert_eq!(events.len(), 51);

        let mut ids: Vec<ObjectId> = events
            .iter()
            .map(|WorldEvent::Registered { id, .. }| *id)
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 51);

        let grounds = events
            .iter()
            .filter(|WorldEvent::Registered { kind, .. }| *kind == ObjectKind::Ground)
            .count();
        assert_eq!(grounds, 1);
        assert!(w.drain_events().is_empty());
    }

    #[test]
    fn same_seed_same_layout() {
        let a = World::generate_seeded(&config(20), 99);
        let b = World::generate_seeded(&config(20), 99);
        let pa: Vec<Vec3> = a.cubes().iter().map(Cube::position).collect();
        let pb: Vec<Vec3> = b.cubes().iter().map(Cube::position).collect();
        assert_eq!(pa, pb);
        assert_eq!(a.seed(), Some(99));
    }

    #[test]
    fn different_seeds_diverge() {
        let a = World::generate_seeded(&config(5), 1);
        let b = World::generate_seeded(&config(5), 2);
        assert_ne!(a.cubes()[0].position(), b.cubes()[0].position());
    }

    #[test]
    fn positions_cover_both_signs() {
        let w = World::generate_seeded(&config(500), 3);
        assert!(w.cubes().iter().any(|c| c.position().x < 0.0));
        assert!(w.cubes().iter().any(|c| c.position().x > 0.0));
        assert!(w.cubes().iter().any(|c| c.position().z < 0.0));
        assert!(w.cubes().iter().any(|c| c.position().z > 0.0));
    }

    #[test]
    fn spin_accumulates_per_tick() {
        let mut w = World::generate_seeded(&config(10), 5);
        let before: Vec<Vec3> = w.cubes().iter().map(Cube::position).collect();
        for _ in 0..100 {
            w.spin_cubes(0.01);
        }
        assert_eq!(w.tick(), 100);
        for (cube, pos) in w.cubes().iter().zip(before) {
            assert!((cube.transform.rotation.x - 1.0).abs() < 1e-4);
            assert!((cube.transform.rotation.y - 1.0).abs() < 1e-4);
            assert_eq!(cube.transform.rotation.z, 0.0);
            assert_eq!(cube.position(), pos);
        }
    }

    #[test]
    fn spin_is_unbounded() {
        let mut w = World::generate_seeded(&config(1), 5);
        for _ in 0..1000 {
            w.spin_cubes(0.01);
        }
        let r = w.cubes()[0].transform.rotation.x;
        assert!(r > std::f32::consts::TAU, "rotation wrapped: {r}");
    }

    #[test]
    fn zero_extent_places_at_origin() {
        let cfg = WorldConfig {
            cube_count: 3,
            half_extent: 0.0,
            ..WorldConfig::default()
        };
        let w = World::generate_seeded(&cfg, 0);
        assert!(w.cubes().iter().all(|c| c.position() == Vec3::new(0.0, 0.5, 0.0)));
    }

    #[test]
    fn from_positions_keeps_given_layout() {
        let positions = [Vec3::new(10.0, 0.5, 0.0), Vec3::new(-3.0, 0.5, 4.0)];
        let mut w = World::from_positions(&WorldConfig::default(), &positions);
        assert_eq!(w.cube_count(), 2);
        assert_eq!(w.cubes()[1].position(), positions[1]);
        assert_eq!(w.drain_events().len(), 3);
    }
}
