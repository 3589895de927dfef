//! Visible lights, as reported by the host's culling stage.
//!
//! A [`VisibleLight`] is a read-only, one-frame snapshot: the final linear
//! color (color × intensity), the light's transform, its range and cone, its
//! realtime shadow parameters and its baking output.

use glam::{Mat4, Vec3, Vec4};

/// Light classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LightType {
    #[default]
    Directional,
    Spot,
    Point,
}

/// Realtime shadow mode of a light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LightShadows {
    #[default]
    None,
    Hard,
    Soft,
}

/// How a light participates in lightmap baking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LightmapBakeType {
    #[default]
    Realtime,
    Mixed,
    Baked,
}

/// Mixed lighting mode used when a light is [`LightmapBakeType::Mixed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MixedLightingMode {
    #[default]
    IndirectOnly,
    Shadowmask,
    Subtractive,
}

/// Baking metadata of a light.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LightBakingOutput {
    pub bake_type: LightmapBakeType,
    pub mixed_mode: MixedLightingMode,
    /// Shadow mask channel assigned by the baker (`-1` if none).
    pub occlusion_mask_channel: i32,
}

impl LightBakingOutput {
    /// Shadow mask channel, when the light bakes into the shadow mask.
    #[inline]
    #[must_use]
    pub fn shadow_mask_channel(&self) -> Option<i32> {
        (self.bake_type == LightmapBakeType::Mixed
            && self.mixed_mode == MixedLightingMode::Shadowmask)
            .then_some(self.occlusion_mask_channel)
    }
}

/// Realtime shadow parameters of a light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightShadowParams {
    pub mode: LightShadows,
    /// Shadow strength, `0..=1`.
    pub strength: f32,
    /// Slope-scale depth bias applied while drawing casters.
    pub bias: f32,
    /// Normal bias applied while sampling.
    pub normal_bias: f32,
    /// Near plane offset of directional shadow projections.
    pub near_plane: f32,
}

impl Default for LightShadowParams {
    fn default() -> Self {
        Self {
            mode: LightShadows::None,
            strength: 1.0,
            bias: 0.05,
            normal_bias: 0.4,
            near_plane: 0.2,
        }
    }
}

impl LightShadowParams {
    /// Whether this light wants realtime shadows at all.
    #[inline]
    #[must_use]
    pub fn casts_shadows(&self) -> bool {
        self.mode != LightShadows::None && self.strength > 0.0
    }
}

/// A light the host determined visible to the current camera.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleLight {
    pub light_type: LightType,
    /// Linear color multiplied by intensity.
    pub final_color: Vec4,
    /// Local-to-world transform; column 2 is the forward direction.
    pub local_to_world: Mat4,
    /// Attenuation range (spot/point).
    pub range: f32,
    /// Outer cone angle in degrees (spot).
    pub spot_angle: f32,
    /// Inner cone angle in degrees (spot).
    pub inner_spot_angle: f32,
    pub shadows: LightShadowParams,
    pub baking: LightBakingOutput,
}

impl Default for VisibleLight {
    fn default() -> Self {
        Self {
            light_type: LightType::Directional,
            final_color: Vec4::ONE,
            local_to_world: Mat4::IDENTITY,
            range: 10.0,
            spot_angle: 30.0,
            inner_spot_angle: 21.8,
            shadows: LightShadowParams::default(),
            baking: LightBakingOutput {
                occlusion_mask_channel: -1,
                ..LightBakingOutput::default()
            },
        }
    }
}

impl VisibleLight {
    /// A directional light shining along `direction`.
    #[must_use]
    pub fn directional(direction: Vec3, color: Vec3) -> Self {
        let forward = direction.try_normalize().unwrap_or(Vec3::NEG_Y);
        Self {
            light_type: LightType::Directional,
            final_color: color.extend(1.0),
            local_to_world: basis_from_forward(forward, Vec3::ZERO),
            ..Self::default()
        }
    }

    /// A point light at `position`.
    #[must_use]
    pub fn point(position: Vec3, range: f32, color: Vec3) -> Self {
        Self {
            light_type: LightType::Point,
            final_color: color.extend(1.0),
            local_to_world: Mat4::from_translation(position),
            range,
            ..Self::default()
        }
    }

    /// A spot light at `position` pointing along `direction`.
    #[must_use]
    pub fn spot(position: Vec3, direction: Vec3, range: f32, outer_angle: f32, color: Vec3) -> Self {
        let forward = direction.try_normalize().unwrap_or(Vec3::NEG_Y);
        Self {
            light_type: LightType::Spot,
            final_color: color.extend(1.0),
            local_to_world: basis_from_forward(forward, position),
            range,
            spot_angle: outer_angle,
            inner_spot_angle: outer_angle * 0.7,
            ..Self::default()
        }
    }

    /// Enables realtime shadows with the given strength.
    #[must_use]
    pub fn with_shadows(mut self, mode: LightShadows, strength: f32) -> Self {
        self.shadows.mode = mode;
        self.shadows.strength = strength;
        self
    }

    /// World-space direction the light shines towards.
    #[inline]
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.local_to_world.z_axis.truncate()
    }

    /// World-space position.
    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.local_to_world.w_axis.truncate()
    }
}

/// Builds a rigid transform whose Z column is `forward`.
fn basis_from_forward(forward: Vec3, position: Vec3) -> Mat4 {
    let up = if forward.y.abs() > 0.99 { Vec3::X } else { Vec3::Y };
    let right = up.cross(forward).normalize();
    let up = forward.cross(right);
    Mat4::from_cols(
        right.extend(0.0),
        up.extend(0.0),
        forward.extend(0.0),
        position.extend(1.0),
    )
}
