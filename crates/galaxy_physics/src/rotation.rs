use galaxy_core::{PLATEAU_RADIUS, ROTATION_FALLOFF, SOLID_BODY_RADIUS};
use std::f64::consts::TAU;

/// Differential rotation curve (radians per second at a given radius).
///
/// Solid-body inside SOLID_BODY_RADIUS, flat out to PLATEAU_RADIUS, then a
/// slow power-law decay. Linear in `rotation_speed` everywhere.
pub fn calculate_angular_velocity(radius: f32, rotation_speed: f32) -> f32 {
    if radius < SOLID_BODY_RADIUS {
        rotation_speed * (radius / SOLID_BODY_RADIUS)
    } else if radius < PLATEAU_RADIUS {
        rotation_speed
    } else {
        rotation_speed * (PLATEAU_RADIUS / radius).powf(ROTATION_FALLOFF)
    }
}

/// Per-star orbit parameters captured at generation time.
///
/// Positions are recomputed from absolute elapsed time rather than by
/// accumulating per-frame deltas, so radius and height never drift.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RotationState {
    radius: Vec<f32>,
    initial_angle: Vec<f32>,
    angular_velocity: Vec<f32>,
}

impl RotationState {
    pub fn from_positions(positions: &[f32], rotation_speed: f32) -> Self {
        let n = positions.len() / 3;
        let mut state = Self {
            radius: Vec::with_capacity(n),
            initial_angle: Vec::with_capacity(n),
            angular_velocity: Vec::with_capacity(n),
        };
        for p in positions.chunks_exact(3) {
            let (x, z) = (p[0], p[2]);
            let r = (x * x + z * z).sqrt();
            state.radius.push(r);
            state.initial_angle.push(z.atan2(x));
            state
                .angular_velocity
                .push(calculate_angular_velocity(r, rotation_speed));
        }
        state
    }

    pub fn len(&self) -> usize {
        self.radius.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radius.is_empty()
    }

    pub fn radius(&self, index: usize) -> f32 {
        self.radius[index]
    }

    /// Angle of star `index` after `elapsed` seconds, wrapped to [0, 2π)
    pub fn angle_at(&self, index: usize, elapsed: f64) -> f32 {
        let angle =
            self.initial_angle[index] as f64 + self.angular_velocity[index] as f64 * elapsed;
        angle.rem_euclid(TAU) as f32
    }

    /// Rewrite X/Z of every star for time `elapsed`. Y is left alone.
    /// Extra trailing positions beyond `len()` are ignored.
    pub fn apply(&self, positions: &mut [f32], elapsed: f64) {
        for (i, p) in positions.chunks_exact_mut(3).take(self.len()).enumerate() {
            let angle = self.angle_at(i, elapsed);
            let r = self.radius[i];
            p[0] = angle.cos() * r;
            p[2] = angle.sin() * r;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_does_not_move() {
        assert_eq!(calculate_angular_velocity(0.0, 0.2), 0.0);
    }

    #[test]
    fn test_solid_body_is_linear() {
        let ratio = calculate_angular_velocity(5.0, 0.2) / calculate_angular_velocity(2.5, 0.2);
        assert!((ratio - 2.0).abs() < 1e-5, "ratio {}", ratio);
    }

    #[test]
    fn test_plateau_is_flat() {
        for r in [10.0, 15.0, 29.9] {
            assert_eq!(calculate_angular_velocity(r, 0.2), 0.2);
        }
    }

    #[test]
    fn test_decays_past_plateau() {
        let mut last = calculate_angular_velocity(30.0, 0.2);
        for r in [35.0, 50.0, 80.0, 120.0, 500.0] {
            let v = calculate_angular_velocity(r, 0.2);
            assert!(v < last, "v({}) = {} not below {}", r, v, last);
            assert!(v > 0.0);
            last = v;
        }
    }

    #[test]
    fn test_linear_in_speed() {
        for r in [3.0, 20.0, 75.0] {
            let base = calculate_angular_velocity(r, 0.2);
            let triple = calculate_angular_velocity(r, 0.6);
            assert!((triple - 3.0 * base).abs() < 1e-5);
        }
    }

    #[test]
    fn test_rotation_preserves_radius_and_height() {
        let positions = vec![
            10.0, 1.5, 0.0, //
            0.0, -0.5, 40.0, //
            -3.0, 0.0, -4.0, //
            0.0, 0.2, 0.0,
        ];
        let state = RotationState::from_positions(&positions, 0.2);
        assert_eq!(state.len(), 4);

        let mut moved = positions.clone();
        for t in [0.5, 60.0, 3_600.0, 86_400.0] {
            state.apply(&mut moved, t);
            for i in 0..state.len() {
                let p = &moved[i * 3..i * 3 + 3];
                let r = (p[0] * p[0] + p[2] * p[2]).sqrt();
                assert!((r - state.radius(i)).abs() < 1e-3, "t {} star {}", t, i);
                assert_eq!(p[1], positions[i * 3 + 1]);
            }
        }
    }

    #[test]
    fn test_apply_at_zero_is_identity() {
        let positions = vec![7.0, 0.0, -2.0, -30.0, 1.0, 12.0];
        let state = RotationState::from_positions(&positions, 0.4);
        let mut moved = positions.clone();
        state.apply(&mut moved, 0.0);
        for (a, b) in moved.iter().zip(&positions) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_angle_advances_with_time() {
        let state = RotationState::from_positions(&[20.0, 0.0, 0.0], 0.2);
        // Plateau star: 0.2 rad/s
        assert!((state.angle_at(0, 2.0) - 0.4).abs() < 1e-5);
        assert!(state.angle_at(0, 1e6) <= std::f32::consts::TAU);
    }
}
