use galaxy_core::QualityTier;

/// FPS below which quality drops
pub const LOW_FPS: f32 = 30.0;
/// FPS above which quality recovers
pub const HIGH_FPS: f32 = 45.0;
/// Star counts above this are halved on a downgrade
pub const STAR_REDUCTION_THRESHOLD: u32 = 10_000;
/// Pixel ratio change per step
pub const PIXEL_RATIO_STEP: f32 = 0.25;
pub const MIN_PIXEL_RATIO: f32 = 0.5;
/// Length of one FPS measurement window in seconds
pub const FPS_WINDOW: f64 = 1.0;

/// Frame counter over fixed windows of accumulated delta time
#[derive(Debug, Clone)]
pub struct FrameStats {
    window: f64,
    accumulated: f64,
    frames: u32,
    fps: Option<f32>,
    total_frames: u64,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new(FPS_WINDOW)
    }
}

impl FrameStats {
    pub fn new(window: f64) -> Self {
        Self {
            window,
            accumulated: 0.0,
            frames: 0,
            fps: None,
            total_frames: 0,
        }
    }

    /// Count one frame; returns the measured FPS when a window closes
    pub fn record(&mut self, delta: f64) -> Option<f32> {
        self.accumulated += delta.max(0.0);
        self.frames += 1;
        self.total_frames += 1;
        if self.accumulated < self.window {
            return None;
        }
        let fps = (self.frames as f64 / self.accumulated) as f32;
        self.accumulated = 0.0;
        self.frames = 0;
        self.fps = Some(fps);
        self.fps
    }

    /// Last measured FPS
    pub fn fps(&self) -> Option<f32> {
        self.fps
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityDirection {
    Downgrade,
    Upgrade,
}

/// Result of a quality evaluation that changed something
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityChange {
    pub direction: QualityDirection,
    pub pixel_ratio: f32,
    pub star_fraction: f32,
    /// The star fraction moved; stars must be regenerated
    pub regenerate: bool,
}

/// Two-threshold hysteresis controller over pixel ratio and star count
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveQuality {
    pub low_fps: f32,
    pub high_fps: f32,
    pixel_ratio: f32,
    max_pixel_ratio: f32,
    star_fraction: f32,
}

impl Default for AdaptiveQuality {
    fn default() -> Self {
        Self::for_tier(QualityTier::Medium)
    }
}

impl AdaptiveQuality {
    /// Starts at the tier's pixel ratio; upgrades never climb past it
    pub fn for_tier(tier: QualityTier) -> Self {
        Self {
            low_fps: LOW_FPS,
            high_fps: HIGH_FPS,
            pixel_ratio: tier.pixel_ratio(),
            max_pixel_ratio: tier.pixel_ratio(),
            star_fraction: 1.0,
        }
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Share of the configured stars actually generated
    pub fn star_fraction(&self) -> f32 {
        self.star_fraction
    }

    pub fn effective_star_count(&self, star_count: u32) -> u32 {
        (star_count as f64 * self.star_fraction as f64).round() as u32
    }

    /// Feed one measured FPS. `star_count` is the configured arm star count.
    pub fn evaluate(&mut self, fps: f32, star_count: u32) -> Option<QualityChange> {
        let before = (self.pixel_ratio, self.star_fraction);

        let direction = if fps < self.low_fps {
            self.pixel_ratio = (self.pixel_ratio - PIXEL_RATIO_STEP).max(MIN_PIXEL_RATIO);
            if self.effective_star_count(star_count) > STAR_REDUCTION_THRESHOLD {
                self.star_fraction *= 0.5;
            }
            QualityDirection::Downgrade
        } else if fps > self.high_fps {
            self.pixel_ratio = (self.pixel_ratio + PIXEL_RATIO_STEP).min(self.max_pixel_ratio);
            self.star_fraction = (self.star_fraction * 2.0).min(1.0);
            QualityDirection::Upgrade
        } else {
            return None;
        };

        if (self.pixel_ratio, self.star_fraction) == before {
            return None;
        }
        Some(QualityChange {
            direction,
            pixel_ratio: self.pixel_ratio,
            star_fraction: self.star_fraction,
            regenerate: self.star_fraction != before.1,
        })
    }
}
