//! FXAA (Fast Approximate Anti-Aliasing) Configuration
//!
//! FXAA identifies aliased edges via luma contrast detection and blends
//! across them. It runs on the color-graded LDR image, so it is configured
//! together with the camera buffer rather than with the post-FX settings.
//!
//! # Quality Presets
//!
//! | Preset   | Keyword                | Best for             |
//! |----------|------------------------|----------------------|
//! | `Low`    | `FXAA_QUALITY_LOW`     | Mobile / low-end GPU |
//! | `Medium` | `FXAA_QUALITY_MEDIUM`  | Default balance      |
//! | `High`   | (none)                 | Maximum quality      |

use glam::Vec4;
use serde::{Deserialize, Serialize};

/// FXAA quality preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FxaaQuality {
    /// Fewest edge search steps.
    Low,
    /// Balanced edge search (default).
    #[default]
    Medium,
    /// Longest edge search.
    High,
}

impl FxaaQuality {
    /// Returns a human-readable name for the quality preset.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Returns all available quality presets.
    #[must_use]
    pub const fn all() -> &'static [FxaaQuality] {
        &[Self::Low, Self::Medium, Self::High]
    }
}

/// FXAA configuration.
///
/// # Usage
///
/// ```rust,ignore
/// let mut fxaa = FxaaSettings::default();
/// fxaa.enabled = true;
/// fxaa.set_quality(FxaaQuality::High);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FxaaSettings {
    /// Whether FXAA is enabled.
    pub enabled: bool,

    /// Preserve the source alpha instead of storing luma in it.
    ///
    /// When set, luma is recomputed in the FXAA pass.
    pub keep_alpha: bool,

    /// Absolute contrast below which edges are ignored (`0.0312..=0.0833`).
    fixed_threshold: f32,

    /// Contrast relative to local luma below which edges are ignored (`0.063..=0.333`).
    relative_threshold: f32,

    /// Strength of subpixel blending (`0..=1`).
    subpixel_blending: f32,

    /// Quality preset.
    quality: FxaaQuality,
}

impl Default for FxaaSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            keep_alpha: false,
            fixed_threshold: 0.0833,
            relative_threshold: 0.166,
            subpixel_blending: 0.75,
            quality: FxaaQuality::default(),
        }
    }
}

impl FxaaSettings {
    /// Creates FXAA settings with default values (disabled, medium quality).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn quality(&self) -> FxaaQuality {
        self.quality
    }

    pub fn set_quality(&mut self, quality: FxaaQuality) {
        self.quality = quality;
    }

    pub fn set_fixed_threshold(&mut self, value: f32) {
        self.fixed_threshold = value.clamp(0.0312, 0.0833);
    }

    pub fn set_relative_threshold(&mut self, value: f32) {
        self.relative_threshold = value.clamp(0.063, 0.333);
    }

    pub fn set_subpixel_blending(&mut self, value: f32) {
        self.subpixel_blending = value.clamp(0.0, 1.0);
    }

    /// Packs `(fixed_threshold, relative_threshold, subpixel_blending, 0)`.
    #[must_use]
    pub fn config_vector(&self) -> Vec4 {
        Vec4::new(
            self.fixed_threshold,
            self.relative_threshold,
            self.subpixel_blending,
            0.0,
        )
    }
}
