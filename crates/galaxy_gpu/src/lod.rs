use bevy::math::Vec3;
use galaxy_core::{DEFAULT_LOD_THRESHOLDS, LOD_CUTOFF_FACTOR};

use crate::frustum::ViewVolume;

/// Sphere segments per level, highest detail first
const SEGMENTS_BY_LEVEL: [u32; 5] = [16, 12, 8, 6, 4];

/// Detail tier; 0 is the closest and most detailed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LodLevel(pub u8);

impl LodLevel {
    pub fn detail(self) -> GeometryDetail {
        let i = (self.0 as usize).min(SEGMENTS_BY_LEVEL.len() - 1);
        GeometryDetail {
            segments: SEGMENTS_BY_LEVEL[i],
        }
    }
}

/// Sphere tessellation for one LOD level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryDetail {
    /// Longitudinal segments
    pub segments: u32,
}

impl GeometryDetail {
    /// Latitudinal rings
    pub fn rings(&self) -> u32 {
        (self.segments / 2).max(2)
    }
}

/// Ascending distance thresholds separating LOD levels
#[derive(Debug, Clone, PartialEq)]
pub struct LodThresholds {
    distances: Vec<f32>,
}

impl Default for LodThresholds {
    fn default() -> Self {
        Self {
            distances: DEFAULT_LOD_THRESHOLDS.to_vec(),
        }
    }
}

impl LodThresholds {
    pub fn new(distances: Vec<f32>) -> Result<Self, String> {
        if distances.is_empty() {
            return Err("At least one LOD threshold is required".to_string());
        }
        if distances.len() >= u8::MAX as usize {
            return Err(format!("Too many LOD thresholds: {}", distances.len()));
        }
        if distances.iter().any(|d| !d.is_finite() || *d <= 0.0) {
            return Err(format!("LOD thresholds must be positive: {:?}", distances));
        }
        if distances.windows(2).any(|w| w[0] >= w[1]) {
            return Err(format!("LOD thresholds must ascend: {:?}", distances));
        }
        Ok(Self { distances })
    }

    /// Stars further than this are never drawn
    pub fn cutoff(&self) -> f32 {
        self.distances.last().copied().unwrap_or(0.0) * LOD_CUTOFF_FACTOR
    }

    pub fn level_count(&self) -> usize {
        self.distances.len() + 1
    }

    /// Level for a camera distance, or `None` past the cutoff
    pub fn level_for(&self, distance: f32) -> Option<LodLevel> {
        if distance.is_nan() || distance > self.cutoff() {
            return None;
        }
        let index = self
            .distances
            .iter()
            .position(|&t| t > distance)
            .unwrap_or(self.distances.len());
        Some(LodLevel(index as u8))
    }
}

/// A star assigned to a bucket
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodEntry {
    pub index: u32,
    pub distance: f32,
}

/// Per-level star lists for one frame
#[derive(Debug, Clone, Default)]
pub struct LodBuckets {
    levels: Vec<Vec<LodEntry>>,
}

impl LodBuckets {
    fn reset(&mut self, level_count: usize) {
        self.levels.resize_with(level_count, Vec::new);
        self.levels.truncate(level_count);
        for bucket in &mut self.levels {
            bucket.clear();
        }
    }

    pub fn level(&self, level: LodLevel) -> &[LodEntry] {
        self.levels
            .get(level.0 as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (LodLevel, &[LodEntry])> {
        self.levels
            .iter()
            .enumerate()
            .map(|(i, b)| (LodLevel(i as u8), b.as_slice()))
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Stars that survived culling
    pub fn visible_count(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    pub(crate) fn level_mut(&mut self, level: LodLevel) -> Option<&mut Vec<LodEntry>> {
        self.levels.get_mut(level.0 as usize)
    }
}

/// Distance + frustum classifier. Bucket storage is kept between frames.
#[derive(Debug, Clone, Default)]
pub struct LodClassifier {
    thresholds: LodThresholds,
    buckets: LodBuckets,
}

impl LodClassifier {
    pub fn new(thresholds: LodThresholds) -> Self {
        Self {
            thresholds,
            buckets: LodBuckets::default(),
        }
    }

    pub fn thresholds(&self) -> &LodThresholds {
        &self.thresholds
    }

    pub fn buckets(&self) -> &LodBuckets {
        &self.buckets
    }

    pub(crate) fn buckets_mut(&mut self) -> &mut LodBuckets {
        &mut self.buckets
    }

    /// Bucket every star in `positions` (flat xyz) by distance to `camera`.
    /// Stars past the cutoff or outside `view` are dropped.
    pub fn classify<V: ViewVolume + ?Sized>(
        &mut self,
        camera: Vec3,
        view: &V,
        positions: &[f32],
    ) -> &LodBuckets {
        self.buckets.reset(self.thresholds.level_count());

        for (i, p) in positions.chunks_exact(3).enumerate() {
            let point = Vec3::new(p[0], p[1], p[2]);
            let distance = camera.distance(point);
            let Some(level) = self.thresholds.level_for(distance) else {
                continue;
            };
            if !view.contains(point) {
                continue;
            }
            if let Some(bucket) = self.buckets.level_mut(level) {
                bucket.push(LodEntry {
                    index: i as u32,
                    distance,
                });
            }
        }

        &self.buckets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frustum::{Frustum, Unbounded};

    #[test]
    fn test_detail_decreases_with_level() {
        for l in 0..4u8 {
            assert!(LodLevel(l).detail().segments > LodLevel(l + 1).detail().segments);
        }
        // Past the table the coarsest mesh is reused
        assert_eq!(LodLevel(9).detail(), LodLevel(4).detail());
    }

    #[test]
    fn test_thresholds_validate() {
        assert!(LodThresholds::new(vec![]).is_err());
        assert!(LodThresholds::new(vec![10.0, 5.0]).is_err());
        assert!(LodThresholds::new(vec![10.0, f32::NAN]).is_err());
        let t = LodThresholds::new(vec![10.0, 20.0]).unwrap();
        assert_eq!(t.level_count(), 3);
        assert_eq!(t.cutoff(), 40.0);
    }

    #[test]
    fn test_level_boundaries() {
        let t = LodThresholds::default();
        assert_eq!(t.level_for(0.0), Some(LodLevel(0)));
        assert_eq!(t.level_for(49.9), Some(LodLevel(0)));
        assert_eq!(t.level_for(50.0), Some(LodLevel(1)));
        assert_eq!(t.level_for(399.0), Some(LodLevel(3)));
        assert_eq!(t.level_for(400.0), Some(LodLevel(4)));
        assert_eq!(t.level_for(800.0), Some(LodLevel(4)));
        assert_eq!(t.level_for(800.5), None);
        assert_eq!(t.level_for(f32::NAN), None);
    }

    #[test]
    fn test_star_at_camera_is_level_zero() {
        let eye = Vec3::new(0.0, 50.0, 150.0);
        let frustum = Frustum::from_perspective(
            eye,
            (Vec3::ZERO - eye).normalize(),
            Vec3::Y,
            1.0,
            1.5,
            2_000.0,
        );
        let mut classifier = LodClassifier::default();
        let buckets = classifier.classify(eye, &frustum, &[eye.x, eye.y, eye.z]);
        assert_eq!(buckets.level(LodLevel(0)).len(), 1);
        assert_eq!(buckets.visible_count(), 1);
    }

    #[test]
    fn test_far_stars_excluded() {
        let mut classifier = LodClassifier::default();
        let positions = [0.0, 0.0, 0.0, 801.0, 0.0, 0.0, 0.0, 0.0, -5_000.0];
        let buckets = classifier.classify(Vec3::ZERO, &Unbounded, &positions);
        assert_eq!(buckets.visible_count(), 1);
        assert_eq!(buckets.level(LodLevel(0))[0].index, 0);
    }

    #[test]
    fn test_frustum_culls() {
        let eye = Vec3::new(0.0, 0.0, 100.0);
        let frustum = Frustum::from_perspective(eye, Vec3::NEG_Z, Vec3::Y, 1.0, 1.0, 1_000.0);
        let mut classifier = LodClassifier::default();
        // One ahead, one behind the camera
        let positions = [0.0, 0.0, 0.0, 0.0, 0.0, 150.0];
        let buckets = classifier.classify(eye, &frustum, &positions);
        assert_eq!(buckets.visible_count(), 1);
        assert_eq!(buckets.level(LodLevel(2))[0].index, 0);
    }

    #[test]
    fn test_buckets_reset_between_frames() {
        let mut classifier = LodClassifier::default();
        let positions = [10.0, 0.0, 0.0, 120.0, 0.0, 0.0];
        assert_eq!(
            classifier
                .classify(Vec3::ZERO, &Unbounded, &positions)
                .visible_count(),
            2
        );
        let buckets = classifier.classify(Vec3::ZERO, &Unbounded, &positions[..3]);
        assert_eq!(buckets.visible_count(), 1);
        assert_eq!(buckets.level_count(), 5);
    }
}
