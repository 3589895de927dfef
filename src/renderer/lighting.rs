//! Light Aggregator
//!
//! Walks the visible lights once per camera, packs them into fixed-capacity
//! uniform arrays and drives the shadow reservation and render cycle.
//!
//! | Array              | Capacity | Per-light data                               |
//! |--------------------|----------|----------------------------------------------|
//! | Directional lights | 4        | color, direction, shadow data                |
//! | Other lights       | 64       | color, position, direction, spot angles, shadow data |
//!
//! Lights beyond capacity are dropped and stay unlit.

use glam::Vec4;

use super::context::FrameContext;
use super::host::CullingResults;
use super::keywords::KeywordSelection;
use super::properties::properties;
use super::shadows::Shadows;
use crate::resources::ShadowSettings;
use crate::scene::light::{LightType, VisibleLight};

pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;
pub const MAX_OTHER_LIGHTS: usize = 64;

const SAMPLE_NAME: &str = "Lighting";

/// Spot angle attenuation parameters `(1 / angle_range, -cos(outer/2) / angle_range)`.
#[must_use]
pub fn spot_angles(inner_degrees: f32, outer_degrees: f32) -> Vec4 {
    let inner_cos = (inner_degrees.to_radians() * 0.5).cos();
    let outer_cos = (outer_degrees.to_radians() * 0.5).cos();
    let angle_range_inv = 1.0 / (inner_cos - outer_cos).max(0.001);
    Vec4::new(angle_range_inv, -outer_cos * angle_range_inv, 0.0, 0.0)
}

/// Counts of lights packed for one camera.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightingSummary {
    pub directional: usize,
    pub other: usize,
    /// Visible lights that did not fit and stay unlit.
    pub dropped: usize,
    pub shadowed_directional: usize,
    /// Consumed other-atlas tiles.
    pub shadowed_other_tiles: usize,
}

/// Packs visible lights into uniform arrays.
pub struct Lighting {
    shadows: Shadows,

    dir_colors: [Vec4; MAX_DIRECTIONAL_LIGHTS],
    dir_directions: [Vec4; MAX_DIRECTIONAL_LIGHTS],
    dir_shadow_data: [Vec4; MAX_DIRECTIONAL_LIGHTS],

    other_colors: [Vec4; MAX_OTHER_LIGHTS],
    other_positions: [Vec4; MAX_OTHER_LIGHTS],
    other_directions: [Vec4; MAX_OTHER_LIGHTS],
    other_spot_angles: [Vec4; MAX_OTHER_LIGHTS],
    other_shadow_data: [Vec4; MAX_OTHER_LIGHTS],

    /// Visible index → other-light index (or `-1`).
    index_map: Vec<i32>,
}

impl Default for Lighting {
    fn default() -> Self {
        Self::new()
    }
}

impl Lighting {
    #[must_use]
    pub fn new() -> Self {
        Self {
            shadows: Shadows::new(),
            dir_colors: [Vec4::ZERO; MAX_DIRECTIONAL_LIGHTS],
            dir_directions: [Vec4::ZERO; MAX_DIRECTIONAL_LIGHTS],
            dir_shadow_data: [Vec4::ZERO; MAX_DIRECTIONAL_LIGHTS],
            other_colors: [Vec4::ZERO; MAX_OTHER_LIGHTS],
            other_positions: [Vec4::ZERO; MAX_OTHER_LIGHTS],
            other_directions: [Vec4::ZERO; MAX_OTHER_LIGHTS],
            other_spot_angles: [Vec4::ZERO; MAX_OTHER_LIGHTS],
            other_shadow_data: [Vec4::ZERO; MAX_OTHER_LIGHTS],
            index_map: Vec::new(),
        }
    }

    /// Packs the lights, reserves and renders their shadows.
    pub fn setup(
        &mut self,
        ctx: &mut FrameContext<'_>,
        culling: &CullingResults,
        shadow_settings: &ShadowSettings,
        lights_per_object: bool,
    ) -> LightingSummary {
        ctx.host.begin_sample(SAMPLE_NAME);

        let reversed_z = ctx.host.uses_reversed_z();
        self.shadows.setup(shadow_settings, reversed_z);
        let mut summary = self.setup_lights(ctx, &culling.visible_lights, lights_per_object);
        self.shadows.render(ctx);

        summary.shadowed_directional = self.shadows.directional_count();
        summary.shadowed_other_tiles = self.shadows.other_slot_count();

        ctx.host.end_sample(SAMPLE_NAME);
        log::trace!("Lighting: {summary:?}");
        summary
    }

    fn setup_lights(
        &mut self,
        ctx: &mut FrameContext<'_>,
        lights: &[VisibleLight],
        lights_per_object: bool,
    ) -> LightingSummary {
        let p = properties();
        let mut dir_count = 0;
        let mut other_count = 0;
        let mut dropped = 0;

        self.index_map.clear();
        if lights_per_object {
            self.index_map.reserve(lights.len());
        }

        for (i, light) in lights.iter().enumerate() {
            let mut new_index = -1;
            match light.light_type {
                LightType::Directional => {
                    if dir_count < MAX_DIRECTIONAL_LIGHTS {
                        self.setup_directional(ctx, dir_count, i, light);
                        dir_count += 1;
                    } else {
                        dropped += 1;
                    }
                }
                LightType::Point | LightType::Spot => {
                    if other_count < MAX_OTHER_LIGHTS {
                        new_index = other_count as i32;
                        self.setup_other(ctx, other_count, i, light);
                        other_count += 1;
                    } else {
                        dropped += 1;
                    }
                }
            }
            if lights_per_object {
                self.index_map.push(new_index);
            }
        }

        if lights_per_object {
            ctx.host.set_light_index_map(&self.index_map);
        }
        ctx.host
            .set_keyword(KeywordSelection::LightsPerObject(lights_per_object));

        ctx.host.set_global_int(p.dir_light_count, dir_count as i32);
        if dir_count > 0 {
            ctx.host
                .set_global_vector_array(p.dir_light_colors, &self.dir_colors);
            ctx.host
                .set_global_vector_array(p.dir_light_directions, &self.dir_directions);
            ctx.host
                .set_global_vector_array(p.dir_light_shadow_data, &self.dir_shadow_data);
        }

        ctx.host.set_global_int(p.other_light_count, other_count as i32);
        if other_count > 0 {
            ctx.host
                .set_global_vector_array(p.other_light_colors, &self.other_colors);
            ctx.host
                .set_global_vector_array(p.other_light_positions, &self.other_positions);
            ctx.host
                .set_global_vector_array(p.other_light_directions, &self.other_directions);
            ctx.host
                .set_global_vector_array(p.other_light_spot_angles, &self.other_spot_angles);
            ctx.host
                .set_global_vector_array(p.other_light_shadow_data, &self.other_shadow_data);
        }

        if dropped > 0 {
            log::debug!("Lighting: {dropped} visible lights over capacity, left unlit");
        }

        LightingSummary {
            directional: dir_count,
            other: other_count,
            dropped,
            ..LightingSummary::default()
        }
    }

    fn setup_directional(
        &mut self,
        ctx: &FrameContext<'_>,
        index: usize,
        visible_index: usize,
        light: &VisibleLight,
    ) {
        self.dir_colors[index] = light.final_color;
        self.dir_directions[index] = (-light.forward()).extend(0.0);
        self.dir_shadow_data[index] = self
            .shadows
            .reserve_directional_shadows(&*ctx.host, light, visible_index)
            .to_vec4();
    }

    fn setup_other(
        &mut self,
        ctx: &FrameContext<'_>,
        index: usize,
        visible_index: usize,
        light: &VisibleLight,
    ) {
        self.other_colors[index] = light.final_color;
        let range_sq = (light.range * light.range).max(0.00001);
        self.other_positions[index] = light.position().extend(1.0 / range_sq);

        if light.light_type == LightType::Spot {
            self.other_directions[index] = (-light.forward()).extend(0.0);
            self.other_spot_angles[index] = spot_angles(light.inner_spot_angle, light.spot_angle);
        } else {
            self.other_directions[index] = Vec4::ZERO;
            self.other_spot_angles[index] = Vec4::new(0.0, 1.0, 0.0, 0.0);
        }

        self.other_shadow_data[index] = self
            .shadows
            .reserve_other_shadows(&*ctx.host, light, visible_index)
            .to_vec4();
    }

    /// Releases the shadow atlases.
    pub fn cleanup(&mut self, ctx: &mut FrameContext<'_>) {
        self.shadows.cleanup(ctx);
    }

    #[inline]
    #[must_use]
    pub fn shadows(&self) -> &Shadows {
        &self.shadows
    }

    /// Visible index → other-light index map of the last setup.
    #[inline]
    #[must_use]
    pub fn light_index_map(&self) -> &[i32] {
        &self.index_map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spot_angles_clamp_degenerate_cone() {
        let angles = spot_angles(40.0, 40.0);
        assert!((angles.x - 1000.0).abs() < 1e-2);
    }

    #[test]
    fn spot_angles_reach_zero_at_outer_edge() {
        let angles = spot_angles(20.0, 60.0);
        let outer_cos = 30f32.to_radians().cos();
        let attenuation = outer_cos * angles.x + angles.y;
        assert!(attenuation.abs() < 1e-5);
    }
}
