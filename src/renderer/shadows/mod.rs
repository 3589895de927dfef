//! Shadow Atlas Allocator & Renderer
//!
//! Packs shadow-casting lights into two square depth atlases and records the
//! caster draws that fill them:
//!
//! | Atlas       | Contents                         | Capacity             |
//! |-------------|----------------------------------|----------------------|
//! | Directional | `cascade_count` tiles per light  | 4 lights × 4 tiles   |
//! | Other       | 1 tile per spot, 6 per point     | 16 tiles             |
//!
//! # Frame Cycle
//!
//! ```text
//! setup ──► reserve_* (per light) ──► render ──► cleanup
//! ```
//!
//! Calls made out of this order are logged and ignored. Reservations are
//! all-or-nothing: a light that does not fit gets the "baked only" sentinel
//! (negative strength) and no tile.

pub mod atlas;
pub mod utils;

use glam::{Mat4, Vec2, Vec4};

use self::atlas::{AtlasLayout, convert_to_atlas_matrix};
use super::context::FrameContext;
use super::host::{
    Attachment, CubemapFace, LoadAction, RenderHost, RenderTarget, ShadowDrawSettings,
    TemporaryTargetDesc,
};
use super::keywords::KeywordSelection;
use super::properties::{ShaderProperty, properties};
use crate::resources::ShadowSettings;
use crate::scene::light::{LightType, VisibleLight};

pub const MAX_SHADOWED_DIRECTIONAL_LIGHTS: usize = 4;
pub const MAX_SHADOWED_OTHER_LIGHTS: usize = 16;
pub const MAX_CASCADES: usize = 4;

/// Tiles a point light occupies in the other atlas.
pub const POINT_LIGHT_TILES: usize = 6;

const SAMPLE_NAME: &str = "Shadows";

/// Cascade-blend culling factor for a cascade fade.
#[inline]
#[must_use]
pub fn cascade_culling_factor(cascade_fade: f32) -> f32 {
    (0.8 - cascade_fade).max(0.0)
}

// ============================================================================
// Shadow Data
// ============================================================================

/// Per-light shadow parameters handed to the light arrays.
///
/// For directional lights `parameter` is the normal bias; for other lights it
/// is `1` for point lights and `0` for spot lights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowData {
    pub strength: f32,
    /// First atlas tile of the light.
    pub tile_index: f32,
    pub parameter: f32,
    /// Shadow mask channel, `-1` if none.
    pub mask_channel: f32,
}

impl ShadowData {
    /// The light has no shadows at all.
    pub const NONE: Self = Self {
        strength: 0.0,
        tile_index: 0.0,
        parameter: 0.0,
        mask_channel: -1.0,
    };

    /// Only baked shadows (realtime rejected); signalled by negative strength.
    #[must_use]
    pub fn baked_only(strength: f32, mask_channel: f32) -> Self {
        Self {
            strength: -strength,
            tile_index: 0.0,
            parameter: 0.0,
            mask_channel,
        }
    }

    /// Whether a realtime tile was reserved.
    #[inline]
    #[must_use]
    pub fn is_realtime(&self) -> bool {
        self.strength > 0.0
    }

    #[inline]
    #[must_use]
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(self.strength, self.tile_index, self.parameter, self.mask_channel)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ShadowedDirectionalLight {
    visible_light_index: usize,
    slope_scale_bias: f32,
    near_plane_offset: f32,
}

#[derive(Debug, Clone, Copy, Default)]
struct ShadowedOtherLight {
    visible_light_index: usize,
    slope_scale_bias: f32,
    normal_bias: f32,
    is_point: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowPhase {
    Idle,
    Reserving,
    Rendered,
}

// ============================================================================
// Shadows
// ============================================================================

/// Shadow reservation table and atlas renderer.
pub struct Shadows {
    phase: ShadowPhase,
    settings: ShadowSettings,
    reversed_z: bool,
    use_shadow_mask: bool,

    directional_count: usize,
    directional: [ShadowedDirectionalLight; MAX_SHADOWED_DIRECTIONAL_LIGHTS],
    /// Consumed other-atlas slots (not lights).
    other_slots: usize,
    other: [ShadowedOtherLight; MAX_SHADOWED_OTHER_LIGHTS],

    atlas_sizes: Vec4,
    dir_matrices: [Mat4; MAX_SHADOWED_DIRECTIONAL_LIGHTS * MAX_CASCADES],
    other_matrices: [Mat4; MAX_SHADOWED_OTHER_LIGHTS],
    other_tiles: [Vec4; MAX_SHADOWED_OTHER_LIGHTS],
    cascade_spheres: [Vec4; MAX_CASCADES],
    cascade_data: [Vec4; MAX_CASCADES],
}

impl Default for Shadows {
    fn default() -> Self {
        Self::new()
    }
}

impl Shadows {
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: ShadowPhase::Idle,
            settings: ShadowSettings::default(),
            reversed_z: false,
            use_shadow_mask: false,
            directional_count: 0,
            directional: [ShadowedDirectionalLight::default(); MAX_SHADOWED_DIRECTIONAL_LIGHTS],
            other_slots: 0,
            other: [ShadowedOtherLight::default(); MAX_SHADOWED_OTHER_LIGHTS],
            atlas_sizes: Vec4::ONE,
            dir_matrices: [Mat4::IDENTITY; MAX_SHADOWED_DIRECTIONAL_LIGHTS * MAX_CASCADES],
            other_matrices: [Mat4::IDENTITY; MAX_SHADOWED_OTHER_LIGHTS],
            other_tiles: [Vec4::ZERO; MAX_SHADOWED_OTHER_LIGHTS],
            cascade_spheres: [Vec4::ZERO; MAX_CASCADES],
            cascade_data: [Vec4::ZERO; MAX_CASCADES],
        }
    }

    /// Starts a new frame cycle, clearing every reservation.
    pub fn setup(&mut self, settings: &ShadowSettings, reversed_z: bool) {
        if self.phase == ShadowPhase::Rendered {
            log::warn!("Shadows: setup called before cleanup of the previous cycle");
        }
        self.settings = settings.clone();
        self.reversed_z = reversed_z;
        self.use_shadow_mask = false;
        self.directional_count = 0;
        self.other_slots = 0;
        self.atlas_sizes = Vec4::ONE;
        self.phase = ShadowPhase::Reserving;
    }

    fn check_reserving(&self, operation: &str) -> bool {
        if self.phase == ShadowPhase::Reserving {
            true
        } else {
            log::warn!("Shadows: {operation} called in phase {:?}, skipping", self.phase);
            false
        }
    }

    /// Records the shadow-mask channel of a mixed shadow-mask light.
    fn mask_channel(&mut self, light: &VisibleLight) -> f32 {
        match light.baking.shadow_mask_channel() {
            Some(channel) => {
                self.use_shadow_mask = true;
                channel as f32
            }
            None => -1.0,
        }
    }

    // ========================================================================
    // Reservation
    // ========================================================================

    /// Reserves `cascade_count` tiles in the directional atlas.
    pub fn reserve_directional_shadows(
        &mut self,
        host: &dyn RenderHost,
        light: &VisibleLight,
        visible_light_index: usize,
    ) -> ShadowData {
        if !self.check_reserving("reserve_directional_shadows") {
            return ShadowData::NONE;
        }
        if self.directional_count >= MAX_SHADOWED_DIRECTIONAL_LIGHTS
            || !light.shadows.casts_shadows()
        {
            return ShadowData::NONE;
        }

        let mask_channel = self.mask_channel(light);
        if host.shadow_caster_bounds(visible_light_index).is_none() {
            return ShadowData::baked_only(light.shadows.strength, mask_channel);
        }

        let index = self.directional_count;
        self.directional[index] = ShadowedDirectionalLight {
            visible_light_index,
            slope_scale_bias: light.shadows.bias,
            near_plane_offset: light.shadows.near_plane,
        };
        self.directional_count += 1;

        ShadowData {
            strength: light.shadows.strength,
            tile_index: (self.settings.directional.cascade_count as usize * index) as f32,
            parameter: light.shadows.normal_bias,
            mask_channel,
        }
    }

    /// Reserves one tile (spot) or six tiles (point) in the other atlas.
    pub fn reserve_other_shadows(
        &mut self,
        host: &dyn RenderHost,
        light: &VisibleLight,
        visible_light_index: usize,
    ) -> ShadowData {
        if !self.check_reserving("reserve_other_shadows") {
            return ShadowData::NONE;
        }
        if !light.shadows.casts_shadows() {
            return ShadowData::NONE;
        }

        let mask_channel = self.mask_channel(light);
        let is_point = light.light_type == LightType::Point;
        let needed = if is_point { POINT_LIGHT_TILES } else { 1 };
        let new_slots = self.other_slots + needed;
        if new_slots > MAX_SHADOWED_OTHER_LIGHTS
            || host.shadow_caster_bounds(visible_light_index).is_none()
        {
            return ShadowData::baked_only(light.shadows.strength, mask_channel);
        }

        let first = self.other_slots;
        self.other[first] = ShadowedOtherLight {
            visible_light_index,
            slope_scale_bias: light.shadows.bias,
            normal_bias: light.shadows.normal_bias,
            is_point,
        };
        self.other_slots = new_slots;

        ShadowData {
            strength: light.shadows.strength,
            tile_index: first as f32,
            parameter: if is_point { 1.0 } else { 0.0 },
            mask_channel,
        }
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Renders both atlases and uploads the shadow globals.
    pub fn render(&mut self, ctx: &mut FrameContext<'_>) {
        if !self.check_reserving("render") {
            return;
        }
        let p = properties();

        if self.directional_count > 0 {
            self.render_directional(ctx);
        } else {
            ctx.get_temporary(p.dir_shadow_atlas, TemporaryTargetDesc::shadow_atlas(1));
        }

        if self.other_slots > 0 {
            self.render_other(ctx);
        } else {
            ctx.get_temporary(p.other_shadow_atlas, TemporaryTargetDesc::shadow_atlas(1));
        }

        let host = &mut *ctx.host;
        host.begin_sample(SAMPLE_NAME);

        let directional = &self.settings.directional;
        host.set_keyword(KeywordSelection::DirectionalFilter(directional.filter));
        host.set_keyword(KeywordSelection::CascadeBlend(directional.cascade_blend));
        host.set_keyword(KeywordSelection::OtherFilter(self.settings.other.filter));
        host.set_keyword(KeywordSelection::ShadowMask(
            self.use_shadow_mask
                .then_some(self.settings.shadow_mask_mode),
        ));

        let cascade_count = if self.directional_count > 0 {
            directional.cascade_count as i32
        } else {
            0
        };
        host.set_global_int(p.cascade_count, cascade_count);

        let f = 1.0 - directional.cascade_fade;
        host.set_global_vector(
            p.shadow_distance_fade,
            Vec4::new(
                1.0 / self.settings.max_distance(),
                1.0 / self.settings.distance_fade(),
                1.0 / (1.0 - f * f),
                0.0,
            ),
        );
        host.set_global_vector(p.shadow_atlas_size, self.atlas_sizes);

        host.end_sample(SAMPLE_NAME);
        self.phase = ShadowPhase::Rendered;
    }

    fn begin_atlas(ctx: &mut FrameContext<'_>, id: ShaderProperty, size: u32) {
        ctx.get_temporary(id, TemporaryTargetDesc::shadow_atlas(size));
        ctx.host.set_render_target(
            Attachment::new(RenderTarget::Temporary(id), LoadAction::DontCare),
            None,
        );
        ctx.host
            .clear_render_target(true, false, wgpu::Color::TRANSPARENT);
    }

    fn render_directional(&mut self, ctx: &mut FrameContext<'_>) {
        let p = properties();
        let settings = self.settings.directional.clone();
        let atlas_size = settings.atlas_size;
        self.atlas_sizes.x = atlas_size as f32;
        self.atlas_sizes.y = 1.0 / atlas_size as f32;

        Self::begin_atlas(ctx, p.dir_shadow_atlas, atlas_size);
        ctx.host.set_global_float(p.shadow_pancaking, 1.0);
        ctx.host.begin_sample(SAMPLE_NAME);

        let cascade_count = settings.cascade_count.clamp(1, MAX_CASCADES as u32);
        let tiles = self.directional_count as u32 * cascade_count;
        let layout = AtlasLayout::new(atlas_size, tiles);
        let ratios = settings.cascade_ratio_vec();
        let culling_factor = cascade_culling_factor(settings.cascade_fade);
        let filter_footprint = settings.filter.footprint();

        for index in 0..self.directional_count {
            let light = self.directional[index];
            for cascade in 0..cascade_count {
                let tile_index = index as u32 * cascade_count + cascade;
                let Some(matrices) = ctx.host.compute_directional_shadow_matrices(
                    light.visible_light_index,
                    cascade,
                    cascade_count,
                    ratios,
                    layout.tile_size,
                    light.near_plane_offset,
                ) else {
                    log::warn!(
                        "Shadows: no matrices for directional light {} cascade {cascade}, skipping",
                        light.visible_light_index
                    );
                    self.dir_matrices[tile_index as usize] = Mat4::ZERO;
                    if index == 0 {
                        self.cascade_data[cascade as usize] = Vec4::ZERO;
                        self.cascade_spheres[cascade as usize] = Vec4::ZERO;
                    }
                    continue;
                };

                if index == 0 {
                    self.set_cascade_data(
                        cascade as usize,
                        matrices.split.culling_sphere,
                        layout.tile_size,
                        filter_footprint,
                    );
                }
                let mut split = matrices.split;
                split.cascade_blend_culling_factor = culling_factor;

                let tile = layout.tile(tile_index);
                ctx.host.set_viewport(tile.viewport);
                self.dir_matrices[tile_index as usize] = convert_to_atlas_matrix(
                    matrices.projection * matrices.view,
                    tile.offset,
                    layout.tile_scale(),
                    self.reversed_z,
                );

                ctx.host
                    .set_view_projection(matrices.view, matrices.projection);
                ctx.host.set_global_depth_bias(0.0, light.slope_scale_bias);
                ctx.host.draw_shadows(&ShadowDrawSettings {
                    visible_light_index: light.visible_light_index,
                    split,
                });
                ctx.host.set_global_depth_bias(0.0, 0.0);
            }
        }

        ctx.host
            .set_global_matrix_array(p.dir_shadow_matrices, &self.dir_matrices);
        ctx.host
            .set_global_vector_array(p.cascade_culling_spheres, &self.cascade_spheres);
        ctx.host
            .set_global_vector_array(p.cascade_data, &self.cascade_data);
        ctx.host.end_sample(SAMPLE_NAME);
    }

    fn set_cascade_data(&mut self, index: usize, sphere: Vec4, tile_size: u32, footprint: f32) {
        let texel_size = 2.0 * sphere.w / tile_size as f32;
        let filter_size = texel_size * footprint;
        let radius = sphere.w - filter_size;
        let radius_sq = radius * radius;
        self.cascade_data[index] = Vec4::new(
            1.0 / radius_sq,
            filter_size * std::f32::consts::SQRT_2,
            0.0,
            0.0,
        );
        self.cascade_spheres[index] = sphere.truncate().extend(radius_sq);
    }

    fn render_other(&mut self, ctx: &mut FrameContext<'_>) {
        let p = properties();
        let atlas_size = self.settings.other.atlas_size;
        self.atlas_sizes.z = atlas_size as f32;
        self.atlas_sizes.w = 1.0 / atlas_size as f32;

        Self::begin_atlas(ctx, p.other_shadow_atlas, atlas_size);
        ctx.host.set_global_float(p.shadow_pancaking, 0.0);
        ctx.host.begin_sample(SAMPLE_NAME);

        let layout = AtlasLayout::new(atlas_size, self.other_slots as u32);
        let mut index = 0;
        while index < self.other_slots {
            if self.other[index].is_point {
                self.render_point(ctx, index, &layout);
                index += POINT_LIGHT_TILES;
            } else {
                self.render_spot(ctx, index, &layout);
                index += 1;
            }
        }

        ctx.host
            .set_global_matrix_array(p.other_shadow_matrices, &self.other_matrices);
        ctx.host
            .set_global_vector_array(p.other_shadow_tiles, &self.other_tiles);
        ctx.host.end_sample(SAMPLE_NAME);
    }

    fn render_spot(&mut self, ctx: &mut FrameContext<'_>, index: usize, layout: &AtlasLayout) {
        let light = self.other[index];
        let Some(matrices) = ctx
            .host
            .compute_spot_shadow_matrices(light.visible_light_index)
        else {
            log::warn!(
                "Shadows: no matrices for spot light {}, skipping",
                light.visible_light_index
            );
            self.clear_other_slot(index);
            return;
        };

        let texel_size = 2.0 / (layout.tile_size as f32 * matrices.projection.x_axis.x);
        let filter_size = texel_size * self.settings.other.filter.footprint();
        let bias = filter_size * light.normal_bias * std::f32::consts::SQRT_2;

        let tile = layout.tile(index as u32);
        ctx.host.set_viewport(tile.viewport);
        self.set_other_tile_data(index, tile.offset, layout.tile_scale(), bias);
        self.other_matrices[index] = convert_to_atlas_matrix(
            matrices.projection * matrices.view,
            tile.offset,
            layout.tile_scale(),
            self.reversed_z,
        );

        ctx.host
            .set_view_projection(matrices.view, matrices.projection);
        ctx.host.set_global_depth_bias(0.0, light.slope_scale_bias);
        ctx.host.draw_shadows(&ShadowDrawSettings {
            visible_light_index: light.visible_light_index,
            split: matrices.split,
        });
        ctx.host.set_global_depth_bias(0.0, 0.0);
    }

    fn render_point(&mut self, ctx: &mut FrameContext<'_>, index: usize, layout: &AtlasLayout) {
        let light = self.other[index];
        // Cube faces always have a 90° field of view.
        let texel_size = 2.0 / layout.tile_size as f32;
        let filter_size = texel_size * self.settings.other.filter.footprint();
        let bias = filter_size * light.normal_bias * std::f32::consts::SQRT_2;
        let fov_bias = (1.0 + bias + filter_size).atan().to_degrees() * 2.0 - 90.0;

        for (face_index, face) in CubemapFace::all().into_iter().enumerate() {
            let Some(matrices) =
                ctx.host
                    .compute_point_shadow_matrices(light.visible_light_index, face, fov_bias)
            else {
                log::warn!(
                    "Shadows: no matrices for point light {} face {face:?}, skipping",
                    light.visible_light_index
                );
                self.clear_other_slot(index + face_index);
                continue;
            };

            // Undo the host's Y flip so front faces stay front-facing.
            let mut view = matrices.view;
            view.y_axis.y = -view.y_axis.y;
            view.z_axis.y = -view.z_axis.y;
            view.w_axis.y = -view.w_axis.y;

            let tile_index = index + face_index;
            let tile = layout.tile(tile_index as u32);
            ctx.host.set_viewport(tile.viewport);
            self.set_other_tile_data(tile_index, tile.offset, layout.tile_scale(), bias);
            self.other_matrices[tile_index] = convert_to_atlas_matrix(
                matrices.projection * view,
                tile.offset,
                layout.tile_scale(),
                self.reversed_z,
            );

            ctx.host.set_view_projection(view, matrices.projection);
            ctx.host.set_global_depth_bias(0.0, light.slope_scale_bias);
            ctx.host.draw_shadows(&ShadowDrawSettings {
                visible_light_index: light.visible_light_index,
                split: matrices.split,
            });
            ctx.host.set_global_depth_bias(0.0, 0.0);
        }
    }

    fn set_other_tile_data(&mut self, index: usize, offset: Vec2, scale: f32, bias: f32) {
        let border = self.atlas_sizes.w * 0.5;
        self.other_tiles[index] = Vec4::new(
            offset.x * scale + border,
            offset.y * scale + border,
            scale - border - border,
            bias,
        );
    }

    /// Zeroes a tile whose light produced no matrices this frame.
    fn clear_other_slot(&mut self, index: usize) {
        self.other_matrices[index] = Mat4::ZERO;
        self.other_tiles[index] = Vec4::ZERO;
    }

    /// Releases both atlases and ends the cycle.
    pub fn cleanup(&mut self, ctx: &mut FrameContext<'_>) {
        match self.phase {
            ShadowPhase::Rendered => {
                let p = properties();
                ctx.release_temporary(p.dir_shadow_atlas);
                ctx.release_temporary(p.other_shadow_atlas);
            }
            ShadowPhase::Reserving => {
                log::debug!("Shadows: cleanup without render, nothing to release");
            }
            ShadowPhase::Idle => {
                log::warn!("Shadows: cleanup called while idle, skipping");
                return;
            }
        }
        self.phase = ShadowPhase::Idle;
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn phase(&self) -> ShadowPhase {
        self.phase
    }

    /// Number of directional lights with reserved cascades.
    #[inline]
    #[must_use]
    pub fn directional_count(&self) -> usize {
        self.directional_count
    }

    /// Number of consumed other-atlas tiles.
    #[inline]
    #[must_use]
    pub fn other_slot_count(&self) -> usize {
        self.other_slots
    }

    #[inline]
    #[must_use]
    pub fn uses_shadow_mask(&self) -> bool {
        self.use_shadow_mask
    }

    /// `(dir_size, 1/dir_size, other_size, 1/other_size)`; `1` for dummy atlases.
    #[inline]
    #[must_use]
    pub fn atlas_sizes(&self) -> Vec4 {
        self.atlas_sizes
    }

    /// Atlas-space matrices of the reserved directional tiles.
    #[must_use]
    pub fn directional_matrices(&self) -> &[Mat4] {
        let tiles = self.directional_count * self.settings.directional.cascade_count as usize;
        &self.dir_matrices[..tiles.min(self.dir_matrices.len())]
    }

    /// Atlas-space matrices of the reserved other tiles.
    #[must_use]
    pub fn other_matrices(&self) -> &[Mat4] {
        &self.other_matrices[..self.other_slots]
    }

    /// Per-tile `(min_u, min_v, extent, normal_bias)` of the other atlas.
    #[must_use]
    pub fn other_tiles(&self) -> &[Vec4] {
        &self.other_tiles[..self.other_slots]
    }

    #[must_use]
    pub fn cascade_culling_spheres(&self) -> &[Vec4; MAX_CASCADES] {
        &self.cascade_spheres
    }

    #[must_use]
    pub fn cascade_data(&self) -> &[Vec4; MAX_CASCADES] {
        &self.cascade_data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::recording::RecordingHost;
    use crate::renderer::transient::TransientTargets;
    use crate::scene::light::LightShadows;
    use glam::Vec3;

    fn shadowed_point(i: usize) -> VisibleLight {
        VisibleLight::point(Vec3::new(i as f32, 1.0, 0.0), 5.0, Vec3::ONE)
            .with_shadows(LightShadows::Soft, 1.0)
    }

    #[test]
    fn out_of_order_reservation_is_ignored() {
        let host = RecordingHost::new();
        let mut shadows = Shadows::new();
        let light = shadowed_point(0);
        assert_eq!(
            shadows.reserve_other_shadows(&host, &light, 0),
            ShadowData::NONE
        );
        assert_eq!(shadows.other_slot_count(), 0);
    }

    #[test]
    fn point_reservation_is_all_or_nothing() {
        let mut host = RecordingHost::new();
        host.set_lights((0..3).map(shadowed_point).collect());
        let mut shadows = Shadows::new();
        shadows.setup(&ShadowSettings::default(), false);

        let a = shadows.reserve_other_shadows(&host, &shadowed_point(0), 0);
        let b = shadows.reserve_other_shadows(&host, &shadowed_point(1), 1);
        let c = shadows.reserve_other_shadows(&host, &shadowed_point(2), 2);

        assert_eq!(a.tile_index, 0.0);
        assert_eq!(b.tile_index, 6.0);
        assert!(c.strength < 0.0);
        assert_eq!(shadows.other_slot_count(), 12);
    }

    #[test]
    fn spot_fills_remaining_slots_exactly() {
        let mut host = RecordingHost::new();
        let spot = VisibleLight::spot(Vec3::Y, Vec3::NEG_Y, 5.0, 40.0, Vec3::ONE)
            .with_shadows(LightShadows::Hard, 1.0);
        let mut lights: Vec<_> = (0..2).map(shadowed_point).collect();
        lights.extend(std::iter::repeat_n(spot.clone(), 5));
        host.set_lights(lights);

        let mut shadows = Shadows::new();
        shadows.setup(&ShadowSettings::default(), false);
        shadows.reserve_other_shadows(&host, &shadowed_point(0), 0);
        shadows.reserve_other_shadows(&host, &shadowed_point(1), 1);
        let accepted = (2..7)
            .filter(|&i| shadows.reserve_other_shadows(&host, &spot, i).is_realtime())
            .count();

        assert_eq!(accepted, 4);
        assert_eq!(shadows.other_slot_count(), MAX_SHADOWED_OTHER_LIGHTS);
    }

    #[test]
    fn cleanup_releases_both_atlases() {
        let mut host = RecordingHost::new();
        let mut targets = TransientTargets::new();
        let mut shadows = Shadows::new();
        shadows.setup(&ShadowSettings::default(), false);
        {
            let mut ctx = FrameContext::new(&mut host, &mut targets);
            shadows.render(&mut ctx);
            assert_eq!(ctx.targets.live_count(), 2);
            shadows.cleanup(&mut ctx);
        }
        assert_eq!(targets.live_count(), 0);
        assert_eq!(shadows.phase(), ShadowPhase::Idle);
        assert_eq!(shadows.atlas_sizes(), Vec4::ONE);
    }
}
