use serde::{Deserialize, Serialize};

use crate::types::Rgb;

/// Galaxy configuration, immutable for one generation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalaxyConfig {
    /// Number of arm (disk) stars
    pub star_count: u32,
    /// Number of spiral arms (at least 1 after sanitizing)
    pub arm_count: u32,
    /// Outer extent of the disk
    pub galaxy_radius: f32,
    /// Peak angular velocity in radians per second
    pub rotation_speed: f32,
    /// Radius of the central bulge
    pub core_size: f32,
    /// Mid-region palette
    pub star_colors: Vec<Rgb>,
    /// Base sprite size
    pub particle_size: f32,
    /// Multiplier applied to every generated color (uncapped)
    pub brightness: f32,
    /// Bulge stars as a fraction of `star_count`, within [0, 1]
    pub bulge_fraction: f32,
    /// Random seed for reproducible generation (None = entropy)
    pub seed: Option<u64>,
}

impl Default for GalaxyConfig {
    fn default() -> Self {
        Self {
            star_count: 15_000,
            arm_count: 3,
            galaxy_radius: 100.0,
            rotation_speed: 0.2,
            core_size: 15.0,
            star_colors: default_palette(),
            particle_size: 0.5,
            brightness: 1.0,
            bulge_fraction: 0.2,
            seed: None,
        }
    }
}

/// Blue-white to orange main-sequence tints
pub fn default_palette() -> Vec<Rgb> {
    vec![
        Rgb::new(0.61, 0.69, 1.0),
        Rgb::new(0.79, 0.84, 1.0),
        Rgb::new(1.0, 0.96, 0.92),
        Rgb::new(1.0, 0.82, 0.63),
        Rgb::new(1.0, 0.8, 0.44),
    ]
}

impl GalaxyConfig {
    /// Clamp every field into its documented domain.
    /// Non-finite reals fall back to the defaults, negatives clamp to zero,
    /// `arm_count` is at least 1 and an empty palette becomes the default one.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();

        let star_colors: Vec<Rgb> = self
            .star_colors
            .iter()
            .map(|c| {
                Rgb::new(
                    non_negative(c.r, 0.0),
                    non_negative(c.g, 0.0),
                    non_negative(c.b, 0.0),
                )
            })
            .collect();

        Self {
            star_count: self.star_count,
            arm_count: self.arm_count.max(1),
            galaxy_radius: non_negative(self.galaxy_radius, defaults.galaxy_radius),
            rotation_speed: if self.rotation_speed.is_finite() {
                self.rotation_speed
            } else {
                defaults.rotation_speed
            },
            core_size: non_negative(self.core_size, defaults.core_size),
            star_colors: if star_colors.is_empty() {
                defaults.star_colors
            } else {
                star_colors
            },
            particle_size: non_negative(self.particle_size, defaults.particle_size),
            brightness: non_negative(self.brightness, defaults.brightness),
            bulge_fraction: unit_fraction(self.bulge_fraction, defaults.bulge_fraction),
            seed: self.seed,
        }
    }

    /// Number of bulge stars added on top of the arm stars
    pub fn bulge_star_count(&self) -> u32 {
        let fraction = unit_fraction(self.bulge_fraction, 0.0);
        (self.star_count as f64 * fraction as f64).round() as u32
    }

    /// Arm stars plus bulge stars
    pub fn total_star_count(&self) -> u32 {
        self.star_count.saturating_add(self.bulge_star_count())
    }

    /// Start from a quality preset
    pub fn for_tier(tier: QualityTier) -> Self {
        let mut config = Self::default();
        tier.apply(&mut config);
        config
    }
}

fn non_negative(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        fallback
    }
}

fn unit_fraction(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

/// Initial quality presets. Chosen by the caller (device probing is not our
/// concern), then consumed as plain config values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    Low,
    Medium,
    High,
    Ultra,
}

impl QualityTier {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Ultra => "Ultra",
        }
    }

    pub fn star_count(&self) -> u32 {
        match self {
            Self::Low => 5_000,
            Self::Medium => 15_000,
            Self::High => 30_000,
            Self::Ultra => 50_000,
        }
    }

    /// Render resolution relative to the window
    pub fn pixel_ratio(&self) -> f32 {
        match self {
            Self::Low => 0.75,
            Self::Medium => 1.0,
            Self::High => 1.5,
            Self::Ultra => 2.0,
        }
    }

    pub fn apply(&self, config: &mut GalaxyConfig) {
        config.star_count = self.star_count();
        // Fewer stars read better slightly larger
        config.particle_size = match self {
            Self::Low => 0.7,
            Self::Medium => 0.5,
            Self::High | Self::Ultra => 0.4,
        };
    }
}
