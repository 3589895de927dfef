//! Post-FX settings snapshot.
//!
//! One immutable-per-frame bundle of everything the post-processing stack
//! reads. Binding `None` instead of a snapshot disables the stack.

use serde::{Deserialize, Serialize};

use super::bloom::BloomSettings;
use super::color_grading::{
    ChannelMixer, ColorAdjustments, ShadowsMidtonesHighlights, SplitToning, WhiteBalance,
};
use super::tone_mapping::ToneMappingMode;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostFxSettings {
    pub bloom: BloomSettings,
    pub color_adjustments: ColorAdjustments,
    pub white_balance: WhiteBalance,
    pub split_toning: SplitToning,
    pub channel_mixer: ChannelMixer,
    pub shadows_midtones_highlights: ShadowsMidtonesHighlights,
    pub tone_mapping: ToneMappingMode,
    /// Show LUT quantization bands (debug aid).
    pub lut_banding: bool,
}
