//! Pipeline Settings
//!
//! One explicit, versioned configuration struct consumed by
//! [`RenderPipeline`](crate::RenderPipeline) every frame.
//!
//! # Fields
//!
//! | Field                     | Description                          | Default   |
//! |---------------------------|--------------------------------------|-----------|
//! | `version`                 | Document version                     | `1`       |
//! | `use_dynamic_batching`    | Let the host batch small meshes      | `true`    |
//! | `use_gpu_instancing`      | Let the host instance draws          | `true`    |
//! | `use_srp_batcher`         | Host-side constant buffer batching   | `true`    |
//! | `use_lights_per_object`   | Upload a per-object light index map  | `true`    |
//! | `shadows`                 | Realtime shadow configuration        | see type  |
//! | `post_fx`                 | Post-processing, `None` disables it  | `None`    |
//! | `camera_buffer`           | HDR, copies, render scale, FXAA      | see type  |
//! | `color_lut_resolution`    | Color grading LUT size (16, 32, 64)  | `32`      |
//!
//! # Example
//!
//! ```rust,ignore
//! let settings = PipelineSettings::from_json(r#"{
//!     "version": 1,
//!     "color_lut_resolution": 64,
//!     "post_fx": { "tone_mapping": "Aces" }
//! }"#)?;
//! assert!(settings.post_fx.is_some());
//! ```

use serde::{Deserialize, Serialize};

use super::post::color_grading::LUT_RESOLUTIONS;
use crate::errors::{PrismError, Result};
use crate::resources::camera_buffer::{MAX_RENDER_SCALE, MIN_RENDER_SCALE};
use crate::resources::{CameraBufferSettings, PostFxSettings, ShadowSettings};

/// Version written by this build.
pub const SETTINGS_VERSION: u32 = 1;

const fn default_version() -> u32 {
    SETTINGS_VERSION
}

/// Pipeline-wide configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    #[serde(default = "default_version")]
    pub version: u32,

    // === Draw Submission ===
    pub use_dynamic_batching: bool,
    pub use_gpu_instancing: bool,
    pub use_srp_batcher: bool,
    pub use_lights_per_object: bool,

    // === Subsystems ===
    pub shadows: ShadowSettings,
    pub post_fx: Option<PostFxSettings>,
    pub camera_buffer: CameraBufferSettings,

    /// Edge length of the color grading LUT.
    pub color_lut_resolution: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            use_dynamic_batching: true,
            use_gpu_instancing: true,
            use_srp_batcher: true,
            use_lights_per_object: true,
            shadows: ShadowSettings::default(),
            post_fx: None,
            camera_buffer: CameraBufferSettings::default(),
            color_lut_resolution: 32,
        }
    }
}

impl PipelineSettings {
    /// Parses and validates a JSON settings document.
    ///
    /// Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serializes the settings as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks every field against its supported range.
    pub fn validate(&self) -> Result<()> {
        if self.version != SETTINGS_VERSION {
            return Err(PrismError::UnsupportedVersion {
                found: self.version,
                expected: SETTINGS_VERSION,
            });
        }

        self.shadows.validate()?;

        if !LUT_RESOLUTIONS.contains(&self.color_lut_resolution) {
            return Err(PrismError::InvalidSetting {
                field: "color_lut_resolution",
                reason: format!(
                    "{} is not one of {:?}",
                    self.color_lut_resolution, LUT_RESOLUTIONS
                ),
            });
        }

        if let Some(post_fx) = &self.post_fx
            && post_fx.bloom.downscale_limit == 0
        {
            return Err(PrismError::InvalidSetting {
                field: "post_fx.bloom.downscale_limit",
                reason: "must be at least 1".to_string(),
            });
        }

        let scale = self.camera_buffer.raw_render_scale();
        if !(MIN_RENDER_SCALE..=MAX_RENDER_SCALE).contains(&scale) {
            return Err(PrismError::InvalidSetting {
                field: "camera_buffer.render_scale",
                reason: format!("{scale} is outside {MIN_RENDER_SCALE}..={MAX_RENDER_SCALE}"),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(PipelineSettings::default().validate().is_ok());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let settings = PipelineSettings::from_json(r#"{ "color_lut_resolution": 16 }"#)
            .expect("valid document");
        assert_eq!(settings.color_lut_resolution, 16);
        assert_eq!(settings.version, SETTINGS_VERSION);
        assert!(settings.use_lights_per_object);
        assert!(settings.post_fx.is_none());
    }

    #[test]
    fn rejects_unknown_lut_resolution() {
        let err = PipelineSettings::from_json(r#"{ "color_lut_resolution": 48 }"#).unwrap_err();
        assert!(matches!(
            err,
            PrismError::InvalidSetting {
                field: "color_lut_resolution",
                ..
            }
        ));
    }

    #[test]
    fn rejects_future_version() {
        let err = PipelineSettings::from_json(r#"{ "version": 7 }"#).unwrap_err();
        assert!(matches!(
            err,
            PrismError::UnsupportedVersion {
                found: 7,
                expected: SETTINGS_VERSION
            }
        ));
    }

    #[test]
    fn rejects_zero_bloom_downscale_limit() {
        let json = r#"{ "post_fx": { "bloom": { "downscale_limit": 0 } } }"#;
        let err = PipelineSettings::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            PrismError::InvalidSetting {
                field: "post_fx.bloom.downscale_limit",
                ..
            }
        ));
    }

    #[test]
    fn json_round_trip_preserves_post_fx() {
        let mut settings = PipelineSettings::default();
        settings.post_fx = Some(PostFxSettings::default());
        let json = settings.to_json().expect("serializable");
        assert_eq!(PipelineSettings::from_json(&json).expect("valid"), settings);
    }
}
