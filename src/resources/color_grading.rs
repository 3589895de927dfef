//! Color Grading Configuration
//!
//! The grading controls that are baked into the color LUT every frame. All
//! colors are authored in gamma space (as picked in a color picker) unless
//! noted otherwise; conversion to linear happens when the LUT parameters are
//! packed.
//!
//! | Group | Controls |
//! |-------|----------|
//! | [`ColorAdjustments`] | exposure, contrast, color filter, hue shift, saturation |
//! | [`WhiteBalance`] | temperature, tint |
//! | [`SplitToning`] | shadow tint, highlight tint, balance |
//! | [`ChannelMixer`] | 3×3 channel recombination |
//! | [`ShadowsMidtonesHighlights`] | three range-gated tints |

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Basic color adjustments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorAdjustments {
    /// Exposure offset in stops.
    pub post_exposure: f32,
    /// Contrast, `-100..=100`.
    pub contrast: f32,
    /// Multiplicative color filter (gamma space, HDR allowed).
    pub color_filter: Vec3,
    /// Hue rotation in degrees, `-180..=180`.
    pub hue_shift: f32,
    /// Saturation, `-100..=100`.
    pub saturation: f32,
}

impl Default for ColorAdjustments {
    fn default() -> Self {
        Self {
            post_exposure: 0.0,
            contrast: 0.0,
            color_filter: Vec3::ONE,
            hue_shift: 0.0,
            saturation: 0.0,
        }
    }
}

/// White balance in the LMS cone-response space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhiteBalance {
    /// Color temperature shift, `-100..=100`.
    pub temperature: f32,
    /// Green/magenta tint shift, `-100..=100`.
    pub tint: f32,
}

/// Tints shadows and highlights separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitToning {
    /// Shadow tint (gamma space, LDR).
    pub shadows: Vec3,
    /// Highlight tint (gamma space, LDR).
    pub highlights: Vec3,
    /// Moves the split point, `-100..=100`.
    pub balance: f32,
}

impl Default for SplitToning {
    fn default() -> Self {
        Self {
            shadows: Vec3::splat(0.5),
            highlights: Vec3::splat(0.5),
            balance: 0.0,
        }
    }
}

/// Per-output-channel weights of the input channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMixer {
    pub red: Vec3,
    pub green: Vec3,
    pub blue: Vec3,
}

impl Default for ChannelMixer {
    fn default() -> Self {
        Self {
            red: Vec3::X,
            green: Vec3::Y,
            blue: Vec3::Z,
        }
    }
}

/// Range-gated tints for shadows, midtones and highlights.
///
/// Shadows fade out between `shadows_start` and `shadows_end`, highlights
/// fade in between `highlights_start` and `highlights_end`; midtones take
/// the remaining weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowsMidtonesHighlights {
    pub shadows: Vec3,
    pub midtones: Vec3,
    pub highlights: Vec3,
    pub shadows_start: f32,
    pub shadows_end: f32,
    pub highlights_start: f32,
    pub highlights_end: f32,
}

impl Default for ShadowsMidtonesHighlights {
    fn default() -> Self {
        Self {
            shadows: Vec3::ONE,
            midtones: Vec3::ONE,
            highlights: Vec3::ONE,
            shadows_start: 0.0,
            shadows_end: 0.3,
            highlights_start: 0.55,
            highlights_end: 1.0,
        }
    }
}
