//! Pipeline configuration data.
//!
//! Everything in this module is plain data with `Default` values and serde
//! support; nothing here talks to the host.

pub mod bloom;
pub mod camera_buffer;
pub mod color_grading;
pub mod fxaa;
pub mod post_fx;
pub mod shadow;
pub mod tone_mapping;

pub use bloom::{BloomMode, BloomSettings};
pub use camera_buffer::{BicubicRescalingMode, CameraBufferSettings};
pub use color_grading::{
    ChannelMixer, ColorAdjustments, ShadowsMidtonesHighlights, SplitToning, WhiteBalance,
};
pub use fxaa::{FxaaQuality, FxaaSettings};
pub use post_fx::PostFxSettings;
pub use shadow::{
    CascadeBlendMode, DirectionalShadowSettings, OtherShadowSettings, ShadowFilter,
    ShadowMaskMode, ShadowSettings,
};
pub use tone_mapping::ToneMappingMode;
