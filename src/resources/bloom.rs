//! Bloom Post-Processing Configuration
//!
//! Bloom blurs the bright parts of the image through a half-resolution
//! pyramid and adds them back on top of the source. The pyramid is built with
//! separable Gaussian blurs and recombined either additively or with an
//! energy-conserving "scatter" lerp.
//!
//! # Soft Threshold
//!
//! Pixels are weighted by a soft-knee curve before blurring. The curve is
//! uploaded as a single vector (see [`BloomSettings::threshold_vector`]) so
//! the prefilter shader can evaluate it without branching.

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::utils::color::gamma_to_linear;

/// Hard upper bound on blur iterations.
pub const MAX_BLOOM_ITERATIONS: u32 = 16;

/// How pyramid levels are recombined on the way back up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BloomMode {
    /// Each level is added on top of the next finer one.
    #[default]
    Additive,
    /// Each level is lerped into the next finer one by the scatter factor.
    Scattering,
}

impl BloomMode {
    /// Returns a human-readable name for the mode.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Additive => "Additive",
            Self::Scattering => "Scattering",
        }
    }
}

/// Bloom configuration.
///
/// # Usage
///
/// ```rust,ignore
/// let mut bloom = BloomSettings::default();
/// bloom.set_intensity(0.8);
/// bloom.mode = BloomMode::Scattering;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomSettings {
    /// Size the pyramid from the camera pixel size instead of the scaled buffer.
    pub ignore_render_scale: bool,

    /// Maximum number of blur levels (`0` disables bloom).
    ///
    /// Default: `16`
    pub max_iterations: u32,

    /// Smallest pyramid level edge length, in pixels.
    ///
    /// Default: `2`
    pub downscale_limit: u32,

    /// Use bicubic filtering when upsampling pyramid levels.
    pub bicubic_upsampling: bool,

    /// Brightness threshold, in gamma space.
    ///
    /// Default: `0.5`
    pub threshold: f32,

    /// Softness of the threshold knee (`0` = hard cut-off).
    ///
    /// Default: `0.5`
    pub threshold_knee: f32,

    /// Strength of the final combine (`<= 0` disables bloom).
    ///
    /// Default: `1.0`
    pub intensity: f32,

    /// Suppress isolated very bright pixels during the prefilter.
    pub fade_fireflies: bool,

    /// Recombination mode.
    pub mode: BloomMode,

    /// Scatter factor used by [`BloomMode::Scattering`].
    ///
    /// Default: `0.7`
    pub scatter: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            ignore_render_scale: false,
            max_iterations: MAX_BLOOM_ITERATIONS,
            downscale_limit: 2,
            bicubic_upsampling: false,
            threshold: 0.5,
            threshold_knee: 0.5,
            intensity: 1.0,
            fade_fireflies: false,
            mode: BloomMode::Additive,
            scatter: 0.7,
        }
    }
}

impl BloomSettings {
    /// Creates bloom settings with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of blur levels (clamped to `0..=16`).
    pub fn set_max_iterations(&mut self, iterations: u32) {
        self.max_iterations = iterations.min(MAX_BLOOM_ITERATIONS);
    }

    /// Sets the downscale limit (at least `1`).
    pub fn set_downscale_limit(&mut self, limit: u32) {
        self.downscale_limit = limit.max(1);
    }

    /// Sets the threshold (non-negative, gamma space).
    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold.max(0.0);
    }

    /// Sets the threshold knee (clamped to `0..=1`).
    pub fn set_threshold_knee(&mut self, knee: f32) {
        self.threshold_knee = knee.clamp(0.0, 1.0);
    }

    /// Sets the final combine intensity (clamped to `0..=30`).
    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.clamp(0.0, 30.0);
    }

    /// Sets the scatter factor (clamped to `0.05..=0.95`).
    pub fn set_scatter(&mut self, scatter: f32) {
        self.scatter = scatter.clamp(0.05, 0.95);
    }

    /// Iteration count actually honoured by the pyramid.
    #[inline]
    #[must_use]
    pub fn effective_iterations(&self) -> u32 {
        self.max_iterations.min(MAX_BLOOM_ITERATIONS)
    }

    /// Packs the soft-knee threshold curve.
    ///
    /// With `t` the linear-space threshold and `tk = t * knee`:
    /// `(t, -t + tk, 2 * tk, 1 / (4 * tk + 1e-5))`.
    #[must_use]
    pub fn threshold_vector(&self) -> Vec4 {
        let t = gamma_to_linear(self.threshold);
        let tk = t * self.threshold_knee;
        Vec4::new(t, -t + tk, 2.0 * tk, 1.0 / (4.0 * tk + 0.000_01))
    }
}

/// Evaluates the prefilter threshold response for one color.
///
/// Mirrors what the prefilter pass does per pixel with the vector produced
/// by [`BloomSettings::threshold_vector`]: the brightest channel is pushed
/// through the soft knee and the color is scaled by the resulting weight.
#[must_use]
pub fn apply_threshold(color: glam::Vec3, threshold: Vec4) -> glam::Vec3 {
    let brightness = color.max_element();
    let soft = (brightness + threshold.y).clamp(0.0, threshold.z);
    let soft = soft * soft * threshold.w;
    let contribution = soft.max(brightness - threshold.x) / brightness.max(0.000_01);
    color * contribution
}
