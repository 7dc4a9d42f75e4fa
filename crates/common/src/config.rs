//! Scene configuration.
//!
//! Every field has a default, so an empty YAML document (or no file at all)
//! yields the stock scene: fifty red cubes on a grey 100x100 plane, a 200x200
//! minimap spanning 100 world units.

use crate::Color;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading or validating a [`SceneConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {field} {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub world: WorldConfig,
    pub camera: CameraConfig,
    pub motion: MotionConfig,
    pub minimap: MinimapConfig,
}

/// World generation parameters. Placement is always uniform over the square.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub cube_count: usize,
    /// Cubes are placed with `x, z` in `[-half_extent, half_extent)`.
    pub half_extent: f32,
    pub cube_height: f32,
    pub cube_size: f32,
    pub ground_size: f32,
    /// Fixed RNG seed. `None` draws placement from OS entropy.
    pub seed: Option<u64>,
    pub cube_color: Color,
    pub ground_color: Color,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            cube_count: 50,
            half_extent: 50.0,
            cube_height: 0.5,
            cube_size: 1.0,
            ground_size: 100.0,
            seed: None,
            cube_color: Color::RED,
            ground_color: Color::GREY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub eye_height: f32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Radians of look rotation per pixel of mouse motion.
    pub sensitivity: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye_height: 1.0,
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            sensitivity: 0.002,
        }
    }
}

/// How per-tick step sizes relate to wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeStep {
    /// Steps are applied as-is once per frame; speed follows the refresh rate.
    #[default]
    PerTick,
    /// Steps are multiplied by `dt * reference_hz`, so a display running at
    /// `reference_hz` sees the same motion as `PerTick`.
    Scaled { reference_hz: f32 },
}

impl TimeStep {
    /// Multiplier applied to every per-tick step for a frame lasting `dt_secs`.
    pub fn scale(self, dt_secs: f32) -> f32 {
        match self {
            Self::PerTick => 1.0,
            Self::Scaled { reference_hz } => dt_secs * reference_hz,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Camera translation per tick while a movement key is held.
    pub move_step: f32,
    /// Cube rotation per tick on each of the x and y axes, in radians.
    pub spin_step: f32,
    pub timestep: TimeStep,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            move_step: 0.1,
            spin_step: 0.01,
            timestep: TimeStep::PerTick,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinimapConfig {
    pub width: u32,
    pub height: u32,
    /// World distance mapped onto the full minimap width and height.
    pub span: f32,
    /// Edge length of the square cube marker, in pixels.
    pub cube_marker: f32,
    pub camera_radius: f32,
    pub cube_color: Color,
    pub camera_color: Color,
}

impl Default for MinimapConfig {
    fn default() -> Self {
        Self {
            width: 200,
            height: 200,
            span: 100.0,
            cube_marker: 4.0,
            camera_radius: 5.0,
            cube_color: Color::RED,
            camera_color: Color::GREEN,
        }
    }
}

impl SceneConfig {
    /// Read, parse and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&text)?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(text)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason| Err(ConfigError::Invalid { field, reason });

        let w = &self.world;
        if !(w.half_extent.is_finite() && w.half_extent >= 0.0) {
            return invalid("world.half_extent", "must be finite and >= 0");
        }
        if !positive(w.cube_size) {
            return invalid("world.cube_size", "must be finite and > 0");
        }
        if !positive(w.ground_size) {
            return invalid("world.ground_size", "must be finite and > 0");
        }

        let c = &self.camera;
        if !c.eye_height.is_finite() {
            return invalid("camera.eye_height", "must be finite");
        }
        if !(positive(c.fov_degrees) && c.fov_degrees < 180.0) {
            return invalid("camera.fov_degrees", "must be in (0, 180)");
        }
        if !positive(c.near) {
            return invalid("camera.near", "must be finite and > 0");
        }
        if !(c.far.is_finite() && c.far > c.near) {
            return invalid("camera.far", "must be finite and greater than camera.near");
        }
        if !positive(c.sensitivity) {
            return invalid("camera.sensitivity", "must be finite and > 0");
        }

        let m = &self.motion;
        if !positive(m.move_step) {
            return invalid("motion.move_step", "must be finite and > 0");
        }
        if !positive(m.spin_step) {
            return invalid("motion.spin_step", "must be finite and > 0");
        }
        if let TimeStep::Scaled { reference_hz } = m.timestep {
            if !positive(reference_hz) {
                return invalid("motion.timestep.reference_hz", "must be finite and > 0");
            }
        }

        let mm = &self.minimap;
        if mm.width == 0 || mm.height == 0 {
            return invalid("minimap.width/height", "must be > 0");
        }
        if !positive(mm.span) {
            return invalid("minimap.span", "must be finite and > 0");
        }
        if !positive(mm.cube_marker) {
            return invalid("minimap.cube_marker", "must be finite and > 0");
        }
        if !positive(mm.camera_radius) {
            return invalid("minimap.camera_radius", "must be finite and > 0");
        }
        Ok(())
    }
}

fn positive(x: f32) -> bool {
    x.is_finite() && x > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_stock_scene() {
        let c = SceneConfig::default();
        assert_eq!(c.world.cube_count, 50);
        assert_eq!(c.world.half_extent, 50.0);
        assert_eq!(c.world.cube_height, 0.5);
        assert_eq!(c.camera.eye_height, 1.0);
        assert_eq!(c.camera.fov_degrees, 75.0);
        assert_eq!(c.camera.near, 0.1);
        assert_eq!(c.camera.far, 1000.0);
        assert_eq!(c.motion.move_step, 0.1);
        assert_eq!(c.motion.spin_step, 0.01);
        assert_eq!(c.motion.timestep, TimeStep::PerTick);
        assert_eq!(c.minimap.span, 100.0);
        assert_eq!(c.minimap.cube_color, Color::RED);
        assert_eq!(c.minimap.camera_color, Color::GREEN);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(SceneConfig::from_yaml("").unwrap(), SceneConfig::default());
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let yaml = "world:\n  cube_count: 3\n  seed: 9\nminimap:\n  cube_color: '#0000ff'\n";
        let c = SceneConfig::from_yaml(yaml).unwrap();
        assert_eq!(c.world.cube_count, 3);
        assert_eq!(c.world.seed, Some(9));
        assert_eq!(c.world.half_extent, 50.0);
        assert_eq!(c.minimap.cube_color, Color::rgb(0, 0, 255));
        assert_eq!(c.minimap.width, 200);
    }

    #[test]
    fn scaled_timestep_parses() {
        let yaml = "motion:\n  timestep: !scaled\n    reference_hz: 60.0\n";
        let c = SceneConfig::from_yaml(yaml).unwrap();
        assert_eq!(c.motion.timestep, TimeStep::Scaled { reference_hz: 60.0 });
        assert!((c.motion.timestep.scale(1.0 / 60.0) - 1.0).abs() < 1e-6);
        assert_eq!(TimeStep::PerTick.scale(0.5), 1.0);
    }

    #[test]
    fn yaml_roundtrip_preserves_config() {
        let mut c = SceneConfig::default();
        c.world.seed = Some(42);
        let yaml = c.to_yaml().unwrap();
        assert_eq!(SceneConfig::from_yaml(&yaml).unwrap(), c);
    }

    #[test]
    fn rejects_invalid_values() {
        let mut c = SceneConfig::default();
        c.minimap.span = 0.0;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::Invalid { field: "minimap.span", .. })
        ));

        let mut c = SceneConfig::default();
        c.camera.far = 0.05;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::Invalid { field: "camera.far", .. })
        ));

        let mut c = SceneConfig::default();
        c.minimap.width = 0;
        assert!(c.validate().is_err());

        let mut c = SceneConfig::default();
        c.world.half_extent = f32::NAN;
        assert!(c.validate().is_err());

        let cases: [(&str, fn(&mut SceneConfig)); 8] = [
            ("motion.spin_step", |c| c.motion.spin_step = -0.01),
            ("motion.spin_step", |c| c.motion.spin_step = f32::INFINITY),
            ("motion.move_step", |c| c.motion.move_step = f32::NAN),
            ("motion.move_step", |c| c.motion.move_step = 0.0),
            ("camera.eye_height", |c| c.camera.eye_height = f32::INFINITY),
            ("camera.sensitivity", |c| c.camera.sensitivity = f32::NAN),
            ("minimap.cube_marker", |c| c.minimap.cube_marker = f32::NEG_INFINITY),
            ("minimap.camera_radius", |c| c.minimap.camera_radius = f32::NAN),
        ];
        for (expected, breakage) in cases {
            let mut c = SceneConfig::default();
            breakage(&mut c);
            match c.validate() {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected),
                other => panic!("{expected}: expected Invalid, got {other:?}"),
            }
        }
    }

    #[test]
    fn yaml_with_bad_steps_is_rejected() {
        let err = SceneConfig::from_yaml("motion:\n  spin_step: -0.01\n  move_step: .nan\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn bad_color_is_a_yaml_error() {
        let err = SceneConfig::from_yaml("world:\n  cube_color: red\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "world:\n  cube_count: 7").unwrap();
        let c = SceneConfig::load(file.path()).unwrap();
        assert_eq!(c.world.cube_count, 7);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SceneConfig::load(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
