// Generation and rotation constants (scene units)
// - Distance: 1 unit ~ the galaxy's default radius / 100
// - Time: seconds of animation time
// - Angles: radians

/// Base spiral tightness (radians of winding per unit radius)
pub const SPIRAL_TIGHTNESS: f32 = 0.3;

/// Extra tightness per arm beyond two, keeps many-armed spirals distinct
pub const TIGHTNESS_PER_ARM: f32 = 0.05;

/// Half-width of the angular jitter for a three-arm galaxy
pub const ANGULAR_JITTER: f32 = 0.25;

/// Half-width of the radial jitter
pub const RADIAL_JITTER: f32 = 5.0;

/// Generated arm stars never sit further than this factor times the galaxy radius
pub const MAX_RADIUS_FACTOR: f32 = 1.2;

/// Half-thickness of the disk at the center
pub const DISK_THICKNESS: f32 = 2.5;

/// Exponential scale length of the disk thickness
pub const DISK_SCALE_LENGTH: f32 = 30.0;

/// Normalized radius below which stars belong to the core region
pub const CORE_REGION_RATIO: f32 = 0.3;

/// Normalized radius below which stars belong to the mid region
pub const MID_REGION_RATIO: f32 = 0.7;

/// Probability that an outer star reuses the palette instead of the cool blues
pub const OUTER_PALETTE_CHANCE: f64 = 0.7;

/// Dimming applied to palette colors in the outer region
pub const OUTER_DIMMING: f32 = 0.85;

/// Size multipliers per region (core, mid, outer)
pub const CORE_SIZE_MULTIPLIER: f32 = 1.5;
pub const MID_SIZE_MULTIPLIER: f32 = 1.2;
pub const OUTER_SIZE_MULTIPLIER: f32 = 1.0;

/// Random size spread for arm stars (times particle size)
pub const MIN_STAR_SCALE: f32 = 0.5;
pub const MAX_STAR_SCALE: f32 = 2.5;

/// Vertical flattening of the central bulge
pub const BULGE_FLATTENING: f32 = 0.3;

/// Bulge star size is particle size times (BULGE_BASE_SCALE + uniform(0, 1))
pub const BULGE_BASE_SCALE: f32 = 1.5;

/// Rotation curve: solid-body core radius and end of the flat plateau
pub const SOLID_BODY_RADIUS: f32 = 10.0;
pub const PLATEAU_RADIUS: f32 = 30.0;

/// Exponent of the power-law decay past the plateau
pub const ROTATION_FALLOFF: f32 = 0.3;

/// Default LOD distance thresholds, ascending
pub const DEFAULT_LOD_THRESHOLDS: [f32; 4] = [50.0, 100.0, 200.0, 400.0];

/// Stars further than this multiple of the last LOD threshold are never drawn
pub const LOD_CUTOFF_FACTOR: f32 = 2.0;
