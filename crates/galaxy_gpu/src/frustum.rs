use bevy::math::Vec3;

/// Anything that can answer "is this point on screen?"
pub trait ViewVolume {
    fn contains(&self, point: Vec3) -> bool;
}

/// Accepts every point. Headless runs and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl ViewVolume for Unbounded {
    fn contains(&self, _point: Vec3) -> bool {
        true
    }
}

/// Perspective view pyramid.
///
/// Four side planes pass through the eye, plus a far plane. There is no near
/// plane: the eye and everything between it and the image plane count as
/// inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    apex: Vec3,
    forward: Vec3,
    far: f32,
    /// Inward normals of right, left, top, bottom planes
    sides: [Vec3; 4],
}

impl Frustum {
    pub fn from_perspective(
        eye: Vec3,
        forward: Vec3,
        up: Vec3,
        fov_y: f32,
        aspect: f32,
        far: f32,
    ) -> Self {
        let forward = forward.try_normalize().unwrap_or(Vec3::NEG_Z);
        let right = forward
            .cross(up)
            .try_normalize()
            .unwrap_or_else(|| forward.any_orthonormal_vector());
        let true_up = right.cross(forward);

        let fov_y = fov_y.clamp(0.01, std::f32::consts::PI - 0.01);
        let half_v = (fov_y * 0.5).tan();
        let half_h = half_v * aspect.max(0.01);

        let to_right = forward + right * half_h;
        let to_left = forward - right * half_h;
        let to_top = forward + true_up * half_v;
        let to_bottom = forward - true_up * half_v;

        Self {
            apex: eye,
            forward,
            far: far.max(0.0),
            sides: [
                true_up.cross(to_right),
                to_left.cross(true_up),
                to_top.cross(right),
                right.cross(to_bottom),
            ],
        }
    }

    pub fn apex(&self) -> Vec3 {
        self.apex
    }
}

impl ViewVolume for Frustum {
    fn contains(&self, point: Vec3) -> bool {
        let rel = point - self.apex;
        if self.forward.dot(rel) > self.far {
            return false;
        }
        self.sides.iter().all(|n| n.dot(rel) >= 0.0)
    }
}
