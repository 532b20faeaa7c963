use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Linear RGB color. Channels are not clamped to 1: additive blending
/// expects over-bright values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);
    /// Core region tint
    pub const WARM_WHITE: Self = Self::new(1.0, 0.93, 0.78);
    /// Outer region blues
    pub const PALE_BLUE: Self = Self::new(0.62, 0.75, 1.0);
    pub const DEEP_BLUE: Self = Self::new(0.35, 0.48, 0.95);
    /// Bulge palette (old, cool stars)
    pub const BULGE_ORANGE: Self = Self::new(1.0, 0.62, 0.32);
    pub const BULGE_RED: Self = Self::new(1.0, 0.36, 0.22);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `rrggbb`
    pub fn from_hex(hex: &str) -> Result<Self, ColorParseError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ColorParseError::Length(hex.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|_| ColorParseError::Digit(hex.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }

    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.r * factor, self.g * factor, self.b * factor)
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Mean of the three channels
    pub fn intensity(self) -> f32 {
        (self.r + self.g + self.b) / 3.0
    }
}

/// Errors from parsing a hex color string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    /// Not six hex digits
    Length(String),
    /// A character outside 0-9 / a-f
    Digit(String),
}

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorParseError::Length(s) => write!(f, "Expected six hex digits, got '{}'", s),
            ColorParseError::Digit(s) => write!(f, "Invalid hex digit in '{}'", s),
        }
    }
}

impl std::error::Error for ColorParseError {}

/// Per-instance record for instanced star batches.
/// Must be repr(C) and Pod for GPU buffer upload
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct StarInstance {
    pub position: [f32; 3],
    pub size: f32,
    /// rgb + alpha (always 1, blending is additive)
    pub color: [f32; 4],
}

/// Flat star attribute arrays.
///
/// Three floats of position and color per star, one float of size. The
/// fields are private so the arrays can only grow together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StarSet {
    positions: Vec<f32>,
    colors: Vec<f32>,
    sizes: Vec<f32>,
}

impl StarSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(stars: usize) -> Self {
        Self {
            positions: Vec::with_capacity(stars * 3),
            colors: Vec::with_capacity(stars * 3),
            sizes: Vec::with_capacity(stars),
        }
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn push(&mut self, position: [f32; 3], color: Rgb, size: f32) {
        self.positions.extend_from_slice(&position);
        self.colors.extend_from_slice(&color.to_array());
        self.sizes.push(size);
    }

    /// Append every star of `other`
    pub fn extend(&mut self, other: StarSet) {
        self.positions.extend(other.positions);
        self.colors.extend(other.colors);
        self.sizes.extend(other.sizes);
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Positions can be moved in place, but never resized
    pub fn positions_mut(&mut self) -> &mut [f32] {
        &mut self.positions
    }

    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    pub fn position(&self, index: usize) -> [f32; 3] {
        let i = index * 3;
        [self.positions[i], self.positions[i + 1], self.positions[i + 2]]
    }

    pub fn color(&self, index: usize) -> [f32; 3] {
        let i = index * 3;
        [self.colors[i], self.colors[i + 1], self.colors[i + 2]]
    }

    pub fn size(&self, index: usize) -> f32 {
        self.sizes[index]
    }

    pub fn instance(&self, index: usize) -> StarInstance {
        let [r, g, b] = self.color(index);
        StarInstance {
            position: self.position(index),
            size: self.sizes[index],
            color: [r, g, b, 1.0],
        }
    }

    /// Mean over every color channel of every star (0 for an empty set)
    pub fn mean_intensity(&self) -> f32 {
        if self.colors.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.colors.iter().map(|&c| c as f64).sum();
        (sum / self.colors.len() as f64) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        let c = Rgb::from_hex("#ff8000").unwrap();
        assert_eq!(c.r, 1.0);
        assert!((c.g - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.b, 0.0);
        assert_eq!(Rgb::from_hex("ffffff").unwrap(), Rgb::WHITE);
    }

    #[test]
    fn test_from_hex_rejects_garbage() {
        assert!(matches!(Rgb::from_hex("#fff"), Err(ColorParseError::Length(_))));
        assert!(matches!(Rgb::from_hex("#gg0000"), Err(ColorParseError::Digit(_))));
        assert!(matches!(Rgb::from_hex("#ééé"), Err(ColorParseError::Length(_))));
    }

    #[test]
    fn test_star_set_lengths_stay_aligned() {
        let mut set = StarSet::new();
        set.push([1.0, 2.0, 3.0], Rgb::WHITE, 0.5);
        set.push([4.0, 5.0, 6.0], Rgb::DEEP_BLUE, 1.5);
        assert_eq!(set.len(), 2);
        assert_eq!(set.positions().len(), 6);
        assert_eq!(set.colors().len(), 6);
        assert_eq!(set.position(1), [4.0, 5.0, 6.0]);

        let mut other = StarSet::new();
        other.push([0.0; 3], Rgb::WHITE, 1.0);
        set.extend(other);
        assert_eq!(set.len(), 3);
        assert_eq!(set.sizes().len() * 3, set.positions().len());
    }

    #[test]
    fn test_instance_is_pod_sized() {
        assert_eq!(std::mem::size_of::<StarInstance>(), 32);
        let mut set = StarSet::new();
        set.push([1.0, 0.0, -1.0], Rgb::new(2.0, 0.5, 0.25), 3.0);
        let inst = set.instance(0);
        assert_eq!(inst.color, [2.0, 0.5, 0.25, 1.0]);
        assert_eq!(bytemuck::bytes_of(&inst).len(), 32);
    }
}
