//! Camera Buffer Configuration
//!
//! Controls the intermediate buffers a camera renders into: HDR allowance,
//! color/depth texture copies, render scale and the final rescale filter.

use serde::{Deserialize, Serialize};

use super::fxaa::FxaaSettings;

/// Smallest supported render scale.
pub const MIN_RENDER_SCALE: f32 = 0.1;
/// Largest supported render scale.
pub const MAX_RENDER_SCALE: f32 = 2.0;

/// When the final rescale blit uses bicubic filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BicubicRescalingMode {
    /// Always bilinear.
    #[default]
    Off,
    /// Bicubic only when upscaling to the camera target.
    UpOnly,
    /// Bicubic in both directions.
    UpAndDown,
}

impl BicubicRescalingMode {
    /// Whether a rescale from `buffer_width` to `target_width` is bicubic.
    #[inline]
    #[must_use]
    pub fn uses_bicubic(self, buffer_width: u32, target_width: u32) -> bool {
        match self {
            Self::Off => false,
            Self::UpOnly => buffer_width < target_width,
            Self::UpAndDown => true,
        }
    }
}

/// Per-pipeline camera buffer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraBufferSettings {
    /// Allow HDR rendering for cameras that request it.
    pub allow_hdr: bool,
    /// Copy the color attachment for sampling by transparent geometry.
    pub copy_color: bool,
    /// Same as `copy_color`, for reflection cameras.
    pub copy_color_reflection: bool,
    /// Copy the depth attachment for sampling by transparent geometry.
    pub copy_depth: bool,
    /// Same as `copy_depth`, for reflection cameras.
    pub copy_depth_reflection: bool,
    /// Render scale (`0.1..=2`).
    render_scale: f32,
    /// Filter of the final rescale blit.
    pub bicubic_rescaling: BicubicRescalingMode,
    /// Anti-aliasing.
    pub fxaa: FxaaSettings,
}

impl Default for CameraBufferSettings {
    fn default() -> Self {
        Self {
            allow_hdr: true,
            copy_color: false,
            copy_color_reflection: false,
            copy_depth: false,
            copy_depth_reflection: false,
            render_scale: 1.0,
            bicubic_rescaling: BicubicRescalingMode::Off,
            fxaa: FxaaSettings::default(),
        }
    }
}

impl CameraBufferSettings {
    /// Render scale, clamped to the supported range.
    #[inline]
    #[must_use]
    pub fn render_scale(&self) -> f32 {
        if self.render_scale.is_nan() {
            1.0
        } else {
            self.render_scale.clamp(MIN_RENDER_SCALE, MAX_RENDER_SCALE)
        }
    }

    /// Sets the render scale (clamped to `0.1..=2`).
    pub fn set_render_scale(&mut self, scale: f32) {
        self.render_scale = scale.clamp(MIN_RENDER_SCALE, MAX_RENDER_SCALE);
    }

    /// Raw render scale as configured, before clamping.
    #[inline]
    #[must_use]
    pub(crate) fn raw_render_scale(&self) -> f32 {
        self.render_scale
    }
}
