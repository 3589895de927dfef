//! Shadow Configuration
//!
//! Pure data describing how realtime shadows are rendered: the shadow
//! distance and its fade band, and the atlas size and filter for the
//! directional (cascaded) and "other" (spot + point) atlases.
//!
//! # Atlas Sizes
//!
//! Both atlases are square and must be a power of two between
//! [`MIN_ATLAS_SIZE`] and [`MAX_ATLAS_SIZE`], which keeps
//! `atlas_size / split` an exact integer for every tile split.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::errors::{PrismError, Result};

/// Smallest supported shadow atlas edge length.
pub const MIN_ATLAS_SIZE: u32 = 256;
/// Largest supported shadow atlas edge length.
pub const MAX_ATLAS_SIZE: u32 = 8192;

/// Percentage-closer filter kernel used when sampling a shadow atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShadowFilter {
    /// Hardware 2×2 bilinear comparison (no extra keyword).
    #[default]
    Pcf2x2,
    /// 3×3 tent filter.
    Pcf3x3,
    /// 5×5 tent filter.
    Pcf5x5,
    /// 7×7 tent filter.
    Pcf7x7,
}

impl ShadowFilter {
    /// Returns a human-readable name for the filter.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pcf2x2 => "PCF 2x2",
            Self::Pcf3x3 => "PCF 3x3",
            Self::Pcf5x5 => "PCF 5x5",
            Self::Pcf7x7 => "PCF 7x7",
        }
    }

    /// Returns all available filters.
    #[must_use]
    pub const fn all() -> &'static [ShadowFilter] {
        &[Self::Pcf2x2, Self::Pcf3x3, Self::Pcf5x5, Self::Pcf7x7]
    }

    /// Ordinal of the filter (`0` for 2×2 up to `3` for 7×7).
    ///
    /// The filter footprint in texels is `ordinal + 1`.
    #[inline]
    #[must_use]
    pub const fn ordinal(self) -> u32 {
        self as u32
    }

    /// Filter footprint in texels, used to pad cascade spheres and normal bias.
    #[inline]
    #[must_use]
    pub fn footprint(self) -> f32 {
        (self.ordinal() + 1) as f32
    }
}

/// How neighbouring shadow cascades are blended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CascadeBlendMode {
    /// Hard switch at the cascade boundary.
    #[default]
    Hard,
    /// Linear cross-fade across the fade band.
    Soft,
    /// Dithered switch across the fade band.
    Dither,
}

impl CascadeBlendMode {
    /// Returns a human-readable name for the blend mode.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hard => "Hard",
            Self::Soft => "Soft",
            Self::Dither => "Dither",
        }
    }
}

/// How baked shadow masks combine with realtime shadows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShadowMaskMode {
    /// Baked shadows are used everywhere, including inside the shadow distance.
    Always,
    /// Baked shadows take over only beyond the realtime shadow distance.
    #[default]
    Distance,
}

/// Directional (cascaded) shadow atlas configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalShadowSettings {
    /// Atlas edge length in texels.
    pub atlas_size: u32,
    /// Sampling filter.
    pub filter: ShadowFilter,
    /// Number of cascades (1–4).
    pub cascade_count: u32,
    /// Split ratios of the first three cascades, relative to the shadow distance.
    pub cascade_ratios: [f32; 3],
    /// Relative width of the fade band at the end of each cascade.
    pub cascade_fade: f32,
    /// Blend between cascades.
    pub cascade_blend: CascadeBlendMode,
}

impl Default for DirectionalShadowSettings {
    fn default() -> Self {
        Self {
            atlas_size: 1024,
            filter: ShadowFilter::Pcf2x2,
            cascade_count: 4,
            cascade_ratios: [0.1, 0.25, 0.5],
            cascade_fade: 0.1,
            cascade_blend: CascadeBlendMode::Hard,
        }
    }
}

impl DirectionalShadowSettings {
    /// Cascade ratios as a vector, the shape the host split query expects.
    #[inline]
    #[must_use]
    pub fn cascade_ratio_vec(&self) -> Vec3 {
        Vec3::from_array(self.cascade_ratios)
    }
}

/// Spot and point light shadow atlas configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OtherShadowSettings {
    /// Atlas edge length in texels.
    pub atlas_size: u32,
    /// Sampling filter.
    pub filter: ShadowFilter,
}

impl Default for OtherShadowSettings {
    fn default() -> Self {
        Self {
            atlas_size: 1024,
            filter: ShadowFilter::Pcf2x2,
        }
    }
}

/// Realtime shadow configuration.
///
/// # Usage
///
/// ```rust,ignore
/// let mut shadows = ShadowSettings::default();
/// shadows.directional.cascade_count = 2;
/// shadows.set_max_distance(50.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowSettings {
    /// Maximum distance from the camera at which realtime shadows are rendered.
    ///
    /// Default: `100.0`
    max_distance: f32,

    /// Relative width of the fade band at the end of the shadow distance.
    ///
    /// Default: `0.1`
    distance_fade: f32,

    /// How shadow masks combine with realtime shadows.
    pub shadow_mask_mode: ShadowMaskMode,

    /// Directional atlas settings.
    pub directional: DirectionalShadowSettings,

    /// Spot/point atlas settings.
    pub other: OtherShadowSettings,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            max_distance: 100.0,
            distance_fade: 0.1,
            shadow_mask_mode: ShadowMaskMode::default(),
            directional: DirectionalShadowSettings::default(),
            other: OtherShadowSettings::default(),
        }
    }
}

impl ShadowSettings {
    /// Creates shadow settings with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn max_distance(&self) -> f32 {
        self.max_distance
    }

    #[inline]
    #[must_use]
    pub fn distance_fade(&self) -> f32 {
        self.distance_fade
    }

    /// Sets the maximum shadow distance (at least `0.001`).
    pub fn set_max_distance(&mut self, distance: f32) {
        self.max_distance = distance.max(0.001);
    }

    /// Sets the distance fade band (clamped to `0.001..=1`).
    pub fn set_distance_fade(&mut self, fade: f32) {
        self.distance_fade = fade.clamp(0.001, 1.0);
    }

    /// Checks every field against its supported range.
    pub fn validate(&self) -> Result<()> {
        validate_atlas_size("shadows.directional.atlas_size", self.directional.atlas_size)?;
        validate_atlas_size("shadows.other.atlas_size", self.other.atlas_size)?;

        if !(1..=4).contains(&self.directional.cascade_count) {
            return Err(PrismError::InvalidSetting {
                field: "shadows.directional.cascade_count",
                reason: format!("{} is outside 1..=4", self.directional.cascade_count),
            });
        }
        if self.max_distance.is_nan() || self.max_distance <= 0.0 {
            return Err(PrismError::InvalidSetting {
                field: "shadows.max_distance",
                reason: format!("{} must be positive", self.max_distance),
            });
        }
        if !in_unit_interval(self.distance_fade) {
            return Err(PrismError::InvalidSetting {
                field: "shadows.distance_fade",
                reason: format!("{} is outside (0, 1]", self.distance_fade),
            });
        }
        if !in_unit_interval(self.directional.cascade_fade) {
            return Err(PrismError::InvalidSetting {
                field: "shadows.directional.cascade_fade",
                reason: format!("{} is outside (0, 1]", self.directional.cascade_fade),
            });
        }
        if self
            .directional
            .cascade_ratios
            .iter()
            .any(|r| !(0.0..=1.0).contains(r))
        {
            return Err(PrismError::InvalidSetting {
                field: "shadows.directional.cascade_ratios",
                reason: format!("{:?} must lie in 0..=1", self.directional.cascade_ratios),
            });
        }
        Ok(())
    }
}

/// `true` for values in `(0, 1]`.
fn in_unit_interval(value: f32) -> bool {
    value > 0.0 && value <= 1.0
}

fn validate_atlas_size(field: &'static str, size: u32) -> Result<()> {
    if size.is_power_of_two() && (MIN_ATLAS_SIZE..=MAX_ATLAS_SIZE).contains(&size) {
        Ok(())
    } else {
        Err(PrismError::InvalidSetting {
            field,
            reason: format!(
                "{size} is not a power of two in {MIN_ATLAS_SIZE}..={MAX_ATLAS_SIZE}"
            ),
        })
    }
}
