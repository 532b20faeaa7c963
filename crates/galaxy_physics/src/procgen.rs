use galaxy_core::*;
use rand::Rng;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use std::f32::consts::TAU;

/// RNG for one generation pass: seeded when the config carries a seed,
/// entropy otherwise
pub fn galaxy_rng(config: &GalaxyConfig) -> ChaCha8Rng {
    match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Arms plus central bulge, sized from the config
pub fn generate_galaxy(config: &GalaxyConfig, rng: &mut impl Rng) -> StarSet {
    let config = config.sanitized();
    let mut stars = generate_spiral_arms(&config, rng);
    add_central_bulge(&config, &mut stars, config.bulge_star_count() as usize, rng);
    stars
}

/// Radial band of the disk a star falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StarRegion {
    Core,
    Mid,
    Outer,
}

impl StarRegion {
    /// `ratio` is radius / galaxy radius
    pub fn from_ratio(ratio: f32) -> Self {
        if ratio < CORE_REGION_RATIO {
            Self::Core
        } else if ratio < MID_REGION_RATIO {
            Self::Mid
        } else {
            Self::Outer
        }
    }

    pub fn size_multiplier(&self) -> f32 {
        match self {
            Self::Core => CORE_SIZE_MULTIPLIER,
            Self::Mid => MID_SIZE_MULTIPLIER,
            Self::Outer => OUTER_SIZE_MULTIPLIER,
        }
    }
}

/// Winding per unit radius; grows with arm count so arms stay apart
pub fn effective_tightness(arm_count: u32) -> f32 {
    SPIRAL_TIGHTNESS * (1.0 + (arm_count.max(1) as f32 - 2.0) * TIGHTNESS_PER_ARM)
}

/// Generate the disk stars along logarithmic-looking spiral arms.
/// Every star is independent of the others; output order carries no meaning.
pub fn generate_spiral_arms(config: &GalaxyConfig, rng: &mut impl Rng) -> StarSet {
    let config = config.sanitized();
    let n = config.star_count as usize;
    let mut stars = StarSet::with_capacity(n);

    let arm_count = config.arm_count;
    let galaxy_radius = config.galaxy_radius;
    let tightness = effective_tightness(arm_count);
    let jitter_scale = 3.0 / arm_count as f32;
    let max_radius = galaxy_radius * MAX_RADIUS_FACTOR;

    for _ in 0..n {
        let arm = rng.gen_range(0..arm_count);
        let arm_angle = arm as f32 * TAU / arm_count as f32;

        let radius = unit(rng) * galaxy_radius;
        let angle = arm_angle + radius * tightness + symmetric(rng, ANGULAR_JITTER) * jitter_scale;
        let radius = (radius + symmetric(rng, RADIAL_JITTER)).clamp(0.0, max_radius);

        let x = angle.cos() * radius;
        let z = angle.sin() * radius;
        // Thick center, thin outer disk
        let y = symmetric(rng, DISK_THICKNESS) * (-radius / DISK_SCALE_LENGTH).exp();

        let ratio = if galaxy_radius > 0.0 {
            radius / galaxy_radius
        } else {
            0.0
        };
        let region = StarRegion::from_ratio(ratio);
        let color = region_color(region, &config.star_colors, rng).scale(config.brightness);
        let size = config.particle_size
            * rng.gen_range(MIN_STAR_SCALE..MAX_STAR_SCALE)
            * region.size_multiplier();

        stars.push([x, y, z], color, size);
    }

    stars
}

fn region_color(region: StarRegion, palette: &[Rgb], rng: &mut impl Rng) -> Rgb {
    match region {
        StarRegion::Core => Rgb::WHITE.lerp(Rgb::WARM_WHITE, unit(rng)),
        StarRegion::Mid => palette.choose(rng).copied().unwrap_or(Rgb::WHITE),
        StarRegion::Outer => {
            if rng.gen_bool(OUTER_PALETTE_CHANCE) {
                palette
                    .choose(rng)
                    .copied()
                    .unwrap_or(Rgb::PALE_BLUE)
                    .scale(OUTER_DIMMING)
            } else {
                Rgb::PALE_BLUE.lerp(Rgb::DEEP_BLUE, unit(rng))
            }
        }
    }
}

/// Append `bulge_star_count` old red stars in a flattened sphere around the
/// origin. Existing stars are never touched.
pub fn add_central_bulge(
    config: &GalaxyConfig,
    stars: &mut StarSet,
    bulge_star_count: usize,
    rng: &mut impl Rng,
) {
    if bulge_star_count == 0 {
        return;
    }
    let config = config.sanitized();

    let mut bulge = StarSet::with_capacity(bulge_star_count);
    for _ in 0..bulge_star_count {
        // Product of two uniforms piles stars toward the center
        let r = unit(rng) * unit(rng) * config.core_size;
        let theta = unit(rng) * TAU;
        let phi = (2.0 * unit(rng) - 1.0).clamp(-1.0, 1.0).acos();

        let x = r * phi.sin() * theta.cos();
        let y = r * phi.cos() * BULGE_FLATTENING;
        let z = r * phi.sin() * theta.sin();

        let color = Rgb::BULGE_ORANGE
            .lerp(Rgb::BULGE_RED, unit(rng))
            .scale(config.brightness);
        let size = config.particle_size * (BULGE_BASE_SCALE + unit(rng));

        bulge.push([x, y, z], color, size);
    }
    stars.extend(bulge);
}

fn unit(rng: &mut impl Rng) -> f32 {
    rng.gen_range(0.0..1.0)
}

fn symmetric(rng: &mut impl Rng, half_width: f32) -> f32 {
    rng.gen_range(-1.0f32..1.0) * half_width
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    fn axis_distance(stars: &StarSet, i: usize) -> f32 {
        let [x, _, z] = stars.position(i);
        (x * x + z * z).sqrt()
    }

    #[test]
    fn test_array_lengths() {
        for count in [0u32, 1, 7, 2_000] {
            let config = GalaxyConfig {
                star_count: count,
                ..Default::default()
            };
            let stars = generate_spiral_arms(&config, &mut seeded(1));
            assert_eq!(stars.positions().len(), 3 * count as usize);
            assert_eq!(stars.colors().len(), 3 * count as usize);
            assert_eq!(stars.sizes().len(), count as usize);
        }
    }

    #[test]
    fn test_stars_stay_inside_jitter_bound() {
        for radius in [100.0f32, 40.0, 10.0, 2.0] {
            let config = GalaxyConfig {
                star_count: 3_000,
                galaxy_radius: radius,
                ..Default::default()
            };
            let stars = generate_spiral_arms(&config, &mut seeded(7));
            for i in 0..stars.len() {
                let d = axis_distance(&stars, i);
                assert!(
                    d <= radius * MAX_RADIUS_FACTOR + 1e-3,
                    "radius {}: star {} at {}",
                    radius,
                    i,
                    d
                );
            }
        }
    }

    #[test]
    fn test_disk_thins_outward() {
        let config = GalaxyConfig {
            star_count: 20_000,
            ..Default::default()
        };
        let stars = generate_spiral_arms(&config, &mut seeded(3));
        let (mut inner, mut outer) = ((0.0f32, 0u32), (0.0f32, 0u32));
        for i in 0..stars.len() {
            let d = axis_distance(&stars, i);
            let y = stars.position(i)[1].abs();
            if d < 20.0 {
                inner = (inner.0 + y, inner.1 + 1);
            } else if d > 60.0 {
                outer = (outer.0 + y, outer.1 + 1);
            }
        }
        let inner_mean = inner.0 / inner.1 as f32;
        let outer_mean = outer.0 / outer.1 as f32;
        assert!(
            inner_mean > outer_mean * 2.0,
            "inner {} vs outer {}",
            inner_mean,
            outer_mean
        );
    }

    #[test]
    fn test_bulge_on_empty_set() {
        let config = GalaxyConfig {
            core_size: 12.0,
            particle_size: 0.8,
            ..Default::default()
        };
        let mut stars = StarSet::new();
        add_central_bulge(&config, &mut stars, 500, &mut seeded(11));
        assert_eq!(stars.len(), 500);
        for i in 0..stars.len() {
            let [x, y, z] = stars.position(i);
            let d = (x * x + y * y + z * z).sqrt();
            assert!(d <= 12.0 * 1.2, "bulge star {} at distance {}", i, d);
            assert!(stars.size(i) > 0.8, "bulge star {} size {}", i, stars.size(i));
        }
    }

    #[test]
    fn test_bulge_appends_only() {
        let config = GalaxyConfig {
            star_count: 100,
            ..Default::default()
        };
        let mut stars = generate_spiral_arms(&config, &mut seeded(5));
        let before = stars.clone();
        add_central_bulge(&config, &mut stars, 50, &mut seeded(6));
        assert_eq!(stars.len(), 150);
        assert_eq!(&stars.positions()[..300], before.positions());
        assert_eq!(&stars.colors()[..300], before.colors());

        add_central_bulge(&config, &mut stars, 0, &mut seeded(6));
        assert_eq!(stars.len(), 150);
    }

    #[test]
    fn test_brightness_monotonic() {
        let dim = GalaxyConfig {
            star_count: 2_000,
            brightness: 0.5,
            ..Default::default()
        };
        let bright = GalaxyConfig {
            brightness: 2.0,
            ..dim.clone()
        };
        let a = generate_spiral_arms(&dim, &mut seeded(9));
        let b = generate_spiral_arms(&bright, &mut seeded(9));
        assert!(b.mean_intensity() > a.mean_intensity());
        // Over-bright values survive: nothing is clamped to 1
        assert!(b.colors().iter().any(|&c| c > 1.0));
    }

    #[test]
    fn test_arm_count_moves_most_stars() {
        let two = GalaxyConfig {
            star_count: 1_000,
            arm_count: 2,
            ..Default::default()
        };
        let five = GalaxyConfig {
            arm_count: 5,
            ..two.clone()
        };
        let a = generate_spiral_arms(&two, &mut seeded(21));
        let b = generate_spiral_arms(&five, &mut seeded(21));
        let moved = (0..a.len())
            .filter(|&i| {
                let (p, q) = (a.position(i), b.position(i));
                (p[0] - q[0]).abs() > 1e-3 || (p[2] - q[2]).abs() > 1e-3
            })
            .count();
        assert!(moved > a.len() / 2, "only {} of {} moved", moved, a.len());
    }

    #[test]
    fn test_same_seed_same_galaxy() {
        let config = GalaxyConfig {
            star_count: 500,
            seed: Some(42),
            ..Default::default()
        };
        let a = generate_galaxy(&config, &mut galaxy_rng(&config));
        let b = generate_galaxy(&config, &mut galaxy_rng(&config));
        assert_eq!(a, b);
        assert_eq!(a.len(), config.total_star_count() as usize);
    }

    #[test]
    fn test_degenerate_configs_do_not_panic() {
        let configs = [
            GalaxyConfig {
                arm_count: 0,
                star_count: 100,
                ..Default::default()
            },
            GalaxyConfig {
                galaxy_radius: 0.0,
                core_size: 0.0,
                star_count: 100,
                ..Default::default()
            },
            GalaxyConfig {
                galaxy_radius: f32::NAN,
                particle_size: -1.0,
                star_colors: Vec::new(),
                star_count: 100,
                ..Default::default()
            },
            GalaxyConfig {
                bulge_fraction: 1e9,
                star_count: 100,
                ..Default::default()
            },
        ];
        for config in &configs {
            let stars = generate_galaxy(config, &mut seeded(2));
            assert_eq!(stars.len(), config.sanitized().total_star_count() as usize);
            assert!(stars.positions().iter().all(|v| v.is_finite()));
            assert!(stars.colors().iter().all(|&c| c >= 0.0));
        }
    }

    #[test]
    fn test_region_sizes() {
        assert_eq!(StarRegion::from_ratio(0.0), StarRegion::Core);
        assert_eq!(StarRegion::from_ratio(0.3), StarRegion::Mid);
        assert_eq!(StarRegion::from_ratio(0.69), StarRegion::Mid);
        assert_eq!(StarRegion::from_ratio(0.7), StarRegion::Outer);
        assert!(StarRegion::Core.size_multiplier() > StarRegion::Mid.size_multiplier());
        assert!(StarRegion::Mid.size_multiplier() > StarRegion::Outer.size_multiplier());
    }

    /// Each channel of `c` lies between the matching channels of `a` and `b`
    fn between(c: [f32; 3], a: Rgb, b: Rgb) -> bool {
        c.iter()
            .zip(a.to_array().iter().zip(b.to_array()))
            .all(|(&v, (&lo, hi))| v >= lo.min(hi) - 1e-5 && v <= lo.max(hi) + 1e-5)
    }

    fn same_color(c: [f32; 3], rgb: Rgb) -> bool {
        c.iter().zip(rgb.to_array()).all(|(&v, w)| (v - w).abs() < 1e-5)
    }

    #[test]
    fn test_region_sizes_and_colors() {
        let config = GalaxyConfig {
            star_count: 5_000,
            particle_size: 0.6,
            ..Default::default()
        };
        let palette = config.star_colors.clone();
        let stars = generate_spiral_arms(&config, &mut seeded(13));

        let mut seen = [0u32; 3];
        for i in 0..stars.len() {
            let ratio = axis_distance(&stars, i) / config.galaxy_radius;
            // Recomputed radius can round across a band edge
            if (ratio - CORE_REGION_RATIO).abs() < 1e-3 || (ratio - MID_REGION_RATIO).abs() < 1e-3
            {
                continue;
            }
            let region = StarRegion::from_ratio(ratio);

            let scale = stars.size(i) / (config.particle_size * region.size_multiplier());
            assert!(
                (MIN_STAR_SCALE - 1e-4..MAX_STAR_SCALE + 1e-4).contains(&scale),
                "{:?} star {} scale {}",
                region,
                i,
                scale
            );

            let color = stars.color(i);
            let ok = match region {
                StarRegion::Core => between(color, Rgb::WHITE, Rgb::WARM_WHITE),
                StarRegion::Mid => palette.iter().any(|&p| same_color(color, p)),
                StarRegion::Outer => {
                    palette
                        .iter()
                        .any(|&p| same_color(color, p.scale(OUTER_DIMMING)))
                        || between(color, Rgb::PALE_BLUE, Rgb::DEEP_BLUE)
                }
            };
            assert!(ok, "{:?} star {} has color {:?}", region, i, color);

            let slot = match region {
                StarRegion::Core => 0,
                StarRegion::Mid => 1,
                StarRegion::Outer => 2,
            };
            seen[slot] += 1;
        }
        assert!(seen.iter().all(|&n| n > 0), "every region populated: {:?}", seen);
    }

    #[test]
    fn test_bulge_colors_and_sizes() {
        let config = GalaxyConfig {
            particle_size: 0.4,
            ..Default::default()
        };
        let mut stars = StarSet::new();
        add_central_bulge(&config, &mut stars, 1_000, &mut seeded(17));
        for i in 0..stars.len() {
            let color = stars.color(i);
            assert!(
                between(color, Rgb::BULGE_ORANGE, Rgb::BULGE_RED),
                "bulge star {} has color {:?}",
                i,
                color
            );
            let scale = stars.size(i) / config.particle_size;
            assert!(
                (BULGE_BASE_SCALE - 1e-4..BULGE_BASE_SCALE + 1.0 + 1e-4).contains(&scale),
                "bulge star {} scale {}",
                i,
                scale
            );
        }
    }

    #[test]
    fn test_tightness_grows_with_arms() {
        assert!((effective_tightness(2) - SPIRAL_TIGHTNESS).abs() < 1e-6);
        assert!(effective_tightness(6) > effective_tightness(3));
    }
}
