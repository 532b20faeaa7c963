use bevy::math::Vec3;
use galaxy_gpu::Frustum;

/// Keeps the orbit away from the poles, where `up` and `forward` align
const MAX_PITCH: f32 = 1.45;

/// Perspective parameters shared by the frustum and the Bevy projection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Vertical field of view in radians
    pub fov_y: f32,
    pub aspect: f32,
    pub far: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            fov_y: 60f32.to_radians(),
            aspect: 16.0 / 9.0,
            far: 2_000.0,
        }
    }
}

impl Viewport {
    pub fn set_size(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }
}

/// Damped orbit camera around `focus`.
///
/// Input moves the goal angles/distance; `update` eases the current values
/// toward them.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    pub focus: Vec3,
    /// Fraction of the remaining gap closed per 1/60 s
    pub damping: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    yaw: f32,
    pitch: f32,
    distance: f32,
    goal_yaw: f32,
    goal_pitch: f32,
    goal_distance: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        let (yaw, pitch, distance) = (0.0, 0.6, 220.0);
        Self {
            focus: Vec3::ZERO,
            damping: 0.08,
            rotate_speed: 0.005,
            zoom_speed: 0.1,
            min_distance: 10.0,
            max_distance: 900.0,
            yaw,
            pitch,
            distance,
            goal_yaw: yaw,
            goal_pitch: pitch,
            goal_distance: distance,
        }
    }
}

impl OrbitControls {
    /// Mouse drag in pixels
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.goal_yaw -= dx * self.rotate_speed;
        self.goal_pitch = (self.goal_pitch + dy * self.rotate_speed).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Scroll lines; positive zooms in
    pub fn zoom(&mut self, scroll: f32) {
        let factor = (1.0 - scroll * self.zoom_speed).max(0.1);
        self.goal_distance =
            (self.goal_distance * factor).clamp(self.min_distance, self.max_distance);
    }

    /// Ease toward the goal. Frame-rate independent: two 1/120 s steps land
    /// where one 1/60 s step does.
    pub fn update(&mut self, delta: f64) {
        let steps = (delta.max(0.0) * 60.0) as f32;
        let alpha = 1.0 - (1.0 - self.damping.clamp(0.0, 1.0)).powf(steps);
        self.yaw += (self.goal_yaw - self.yaw) * alpha;
        self.pitch += (self.goal_pitch - self.pitch) * alpha;
        self.distance += (self.goal_distance - self.distance) * alpha;
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn eye(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.focus + Vec3::new(cp * sy, sp, cp * cy) * self.distance
    }

    pub fn forward(&self) -> Vec3 {
        (self.focus - self.eye()).normalize_or_zero()
    }

    pub fn frustum(&self, viewport: &Viewport) -> Frustum {
        Frustum::from_perspective(
            self.eye(),
            self.forward(),
            Vec3::Y,
            viewport.fov_y,
            viewport.aspect,
            viewport.far,
        )
    }
}
