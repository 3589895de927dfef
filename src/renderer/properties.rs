//! Shader Property Identifiers
//!
//! Every global uniform and temporary render target is addressed by a
//! [`ShaderProperty`]: a shader-visible name interned once into a stable
//! integer id. The ids never change for the lifetime of the process, so the
//! same handles are reused every frame.
//!
//! All names the pipeline uses are gathered in [`Properties`], built lazily on
//! first access through [`properties()`].

use std::fmt;
use std::sync::LazyLock;

use crate::utils::interner::{self, Symbol};

/// Number of pre-interned bloom pyramid slots (two per level).
pub const BLOOM_PYRAMID_SLOTS: usize = 32;

/// Interned shader property name.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderProperty(Symbol);

impl ShaderProperty {
    /// Interns `name` and returns its property id.
    #[inline]
    pub fn new(name: &str) -> Self {
        Self(interner::intern(name))
    }

    /// The shader-visible name.
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        interner::resolve(self.0)
    }

    /// The raw interned symbol.
    #[inline]
    #[must_use]
    pub fn symbol(self) -> Symbol {
        self.0
    }
}

impl fmt::Debug for ShaderProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShaderProperty({})", self.name())
    }
}

impl fmt::Display for ShaderProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// All shader property ids used by the pipeline.
pub struct Properties {
    // ========================================================================
    // Camera
    // ========================================================================
    pub camera_buffer_size: ShaderProperty,
    pub camera_color_attachment: ShaderProperty,
    pub camera_depth_attachment: ShaderProperty,
    pub camera_color_texture: ShaderProperty,
    pub camera_depth_texture: ShaderProperty,
    pub source_texture: ShaderProperty,

    // ========================================================================
    // Lighting
    // ========================================================================
    pub dir_light_count: ShaderProperty,
    pub dir_light_colors: ShaderProperty,
    pub dir_light_directions: ShaderProperty,
    pub dir_light_shadow_data: ShaderProperty,
    pub other_light_count: ShaderProperty,
    pub other_light_colors: ShaderProperty,
    pub other_light_positions: ShaderProperty,
    pub other_light_directions: ShaderProperty,
    pub other_light_spot_angles: ShaderProperty,
    pub other_light_shadow_data: ShaderProperty,

    // ========================================================================
    // Shadows
    // ========================================================================
    pub dir_shadow_atlas: ShaderProperty,
    pub dir_shadow_matrices: ShaderProperty,
    pub other_shadow_atlas: ShaderProperty,
    pub other_shadow_matrices: ShaderProperty,
    pub other_shadow_tiles: ShaderProperty,
    pub cascade_count: ShaderProperty,
    pub cascade_culling_spheres: ShaderProperty,
    pub cascade_data: ShaderProperty,
    pub shadow_atlas_size: ShaderProperty,
    pub shadow_distance_fade: ShaderProperty,
    pub shadow_pancaking: ShaderProperty,

    // ========================================================================
    // Post FX
    // ========================================================================
    pub post_fx_source: ShaderProperty,
    pub post_fx_source_aux: ShaderProperty,
    pub bloom_bicubic_upsampling: ShaderProperty,
    pub bloom_prefilter: ShaderProperty,
    pub bloom_result: ShaderProperty,
    pub bloom_threshold: ShaderProperty,
    pub bloom_intensity: ShaderProperty,
    pub bloom_pyramid: [ShaderProperty; BLOOM_PYRAMID_SLOTS],
    pub color_grading_lut: ShaderProperty,
    pub color_grading_lut_parameters: ShaderProperty,
    pub color_grading_lut_in_log_c: ShaderProperty,
    pub color_grading_result: ShaderProperty,
    pub final_src_blend: ShaderProperty,
    pub final_dst_blend: ShaderProperty,
    pub final_result: ShaderProperty,
    pub copy_bicubic: ShaderProperty,
    pub fxaa_config: ShaderProperty,
}

impl Properties {
    fn new() -> Self {
        let p = ShaderProperty::new;
        Self {
            camera_buffer_size: p("_CameraBufferSize"),
            camera_color_attachment: p("_CameraColorAttachment"),
            camera_depth_attachment: p("_CameraDepthAttachment"),
            camera_color_texture: p("_CameraColorTexture"),
            camera_depth_texture: p("_CameraDepthTexture"),
            source_texture: p("_SourceTexture"),

            dir_light_count: p("_DirectionalLightCount"),
            dir_light_colors: p("_DirectionalLightColors"),
            dir_light_directions: p("_DirectionalLightDirections"),
            dir_light_shadow_data: p("_DirectionalLightShadowData"),
            other_light_count: p("_OtherLightCount"),
            other_light_colors: p("_OtherLightColors"),
            other_light_positions: p("_OtherLightPositions"),
            other_light_directions: p("_OtherLightDirections"),
            other_light_spot_angles: p("_OtherLightSpotAngles"),
            other_light_shadow_data: p("_OtherLightShadowData"),

            dir_shadow_atlas: p("_DirectionalShadowAtlas"),
            dir_shadow_matrices: p("_DirectionalShadowMatrices"),
            other_shadow_atlas: p("_OtherShadowAtlas"),
            other_shadow_matrices: p("_OtherShadowMatrices"),
            other_shadow_tiles: p("_OtherShadowTiles"),
            cascade_count: p("_CascadeCount"),
            cascade_culling_spheres: p("_CascadeCullingSpheres"),
            cascade_data: p("_CascadeData"),
            shadow_atlas_size: p("_ShadowAtlasSize"),
            shadow_distance_fade: p("_ShadowDistanceFade"),
            shadow_pancaking: p("_ShadowPancaking"),

            post_fx_source: p("_PostFXSource"),
            post_fx_source_aux: p("_PostFXSourceAuxiliary"),
            bloom_bicubic_upsampling: p("_BloomBicubicUpsampling"),
            bloom_prefilter: p("_BloomPrefilter"),
            bloom_result: p("_BloomResult"),
            bloom_threshold: p("_BloomThreshold"),
            bloom_intensity: p("_BloomIntensity"),
            bloom_pyramid: std::array::from_fn(|i| p(&format!("_BloomPyramid{i}"))),
            color_grading_lut: p("_ColorGradingLUT"),
            color_grading_lut_parameters: p("_ColorGradingLUTParameters"),
            color_grading_lut_in_log_c: p("_ColorGradingLUTInLogC"),
            color_grading_result: p("_ColorGradingResult"),
            final_src_blend: p("_FinalSrcBlend"),
            final_dst_blend: p("_FinalDstBlend"),
            final_result: p("_FinalResult"),
            copy_bicubic: p("_CopyBicubic"),
            fxaa_config: p("_FXAAConfig"),
        }
    }
}

static PROPERTIES: LazyLock<Properties> = LazyLock::new(Properties::new);

/// Returns the process-wide property table.
#[inline]
#[must_use]
pub fn properties() -> &'static Properties {
    &PROPERTIES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_stable_across_lookups() {
        let a = properties().bloom_prefilter;
        let b = ShaderProperty::new("_BloomPrefilter");
        assert_eq!(a, b);
        assert_eq!(a.name(), "_BloomPrefilter");
    }

    #[test]
    fn bloom_pyramid_slots_are_distinct() {
        let slots = &properties().bloom_pyramid;
        for (i, a) in slots.iter().enumerate() {
            for b in &slots[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(slots[3].name(), "_BloomPyramid3");
    }
}
