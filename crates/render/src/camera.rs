use cubefield_common::CameraConfig;
use glam::{Mat4, Vec2, Vec3};

/// First-person camera with pointer-lock mouse look.
///
/// Mouse motion is queued with [`look`](Self::look) while the pointer is
/// locked and folded into yaw/pitch by [`update`](Self::update) once per
/// frame. Movement is horizontal: `move_forward` and `move_right` never change
/// the eye height.
#[derive(Debug, Clone)]
pub struct PointerLockCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub sensitivity: f32,
    locked: bool,
    pending_look: Vec2,
}

const PITCH_LIMIT_DEG: f32 = 89.0;

impl Default for PointerLockCamera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl PointerLockCamera {
    /// Camera at the origin, raised to the eye height, facing -Z.
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            position: Vec3::new(0.0, config.eye_height, 0.0),
            yaw: -90.0_f32.to_radians(),
            pitch: 0.0,
            fov: config.fov_degrees.to_radians(),
            aspect: 16.0 / 9.0,
            near: config.near,
            far: config.far,
            sensitivity: config.sensitivity,
            locked: false,
            pending_look: Vec2::ZERO,
        }
    }

    /// Engage pointer lock. Returns `false` if it was already engaged.
    pub fn lock(&mut self) -> bool {
        let changed = !self.locked;
        self.locked = true;
        changed
    }

    /// Release pointer lock and discard any look motion not yet applied.
    pub fn unlock(&mut self) -> bool {
        let changed = self.locked;
        self.locked = false;
        self.pending_look = Vec2::ZERO;
        changed
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Queue relative mouse motion in pixels. Ignored while unlocked.
    pub fn look(&mut self, dx: f32, dy: f32) {
        if self.locked {
            self.pending_look += Vec2::new(dx, dy);
        }
    }

    /// Per-frame reconcile: apply queued look motion to yaw and pitch.
    pub fn update(&mut self) {
        let delta = std::mem::take(&mut self.pending_look);
        if delta == Vec2::ZERO {
            return;
        }
        self.yaw += delta.x * self.sensitivity;
        self.pitch -= delta.y * self.sensitivity;
        self.pitch = self
            .pitch
            .clamp(-PITCH_LIMIT_DEG.to_radians(), PITCH_LIMIT_DEG.to_radians());
        tracing::trace!(yaw = self.yaw, pitch = self.pitch, "look applied");
    }

    /// Full look direction including pitch.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize()
    }

    /// Look direction flattened onto the ground plane.
    pub fn forward_flat(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, self.yaw.sin())
    }

    /// Horizontal right vector.
    pub fn right(&self) -> Vec3 {
        self.forward_flat().cross(Vec3::Y).normalize()
    }

    pub fn move_forward(&mut self, distance: f32) {
        self.position += self.forward_flat() * distance;
    }

    pub fn move_right(&mut self, distance: f32) {
        self.position += self.right() * distance;
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
