//! Host Interface
//!
//! The pipeline never owns a GPU device. Culling, draw submission, temporary
//! render targets and global shader state all belong to the embedding
//! engine, which exposes them through the [`RenderHost`] trait.
//!
//! # Contract
//!
//! - Calls arrive strictly in recording order, one camera at a time.
//! - Temporary render targets are addressed by [`ShaderProperty`] ids and are
//!   always released within the frame they were allocated in.
//! - Shadow queries (`shadow_caster_bounds`, `compute_*_shadow_matrices`)
//!   refer to the most recent [`RenderHost::cull`] result.
//! - Keyword groups are one-hot: [`RenderHost::set_keyword`] enables the
//!   selected keyword and disables the rest of its group.
//!
//! A headless implementation that records every call is provided by
//! [`RecordingHost`](super::recording::RecordingHost).

use bitflags::bitflags;
use glam::{Mat4, Vec3, Vec4};
use smallvec::SmallVec;

use super::keywords::KeywordSelection;
use super::properties::ShaderProperty;
use crate::scene::camera::Camera;
use crate::scene::light::VisibleLight;

/// Texture format of HDR color buffers.
pub const HDR_COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// Texture format of LDR color buffers.
pub const LDR_COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
/// Texture format of depth buffers and shadow atlases.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Color buffer format for the given HDR state.
#[inline]
#[must_use]
pub const fn color_format(hdr: bool) -> wgpu::TextureFormat {
    if hdr { HDR_COLOR_FORMAT } else { LDR_COLOR_FORMAT }
}

// ============================================================================
// Handles
// ============================================================================

/// Host-owned persistent texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Host-owned GPU program (a shader with numbered passes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u64);

/// Programs the pipeline creates at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// Bloom, color grading, FXAA and rescale passes.
    PostFxStack,
    /// Full-screen color (pass 0) and depth (pass 1) copies.
    CameraCopy,
}

impl ProgramKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PostFxStack => "Hidden/Prism/Post FX Stack",
            Self::CameraCopy => "Hidden/Prism/Camera Copy",
        }
    }
}

/// Something that can be rendered to or sampled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    /// The camera's native output.
    CameraTarget,
    /// A temporary render target.
    Temporary(ShaderProperty),
    /// A persistent host texture.
    Texture(TextureHandle),
}

// ============================================================================
// Render Target Descriptions
// ============================================================================

/// Descriptor of a temporary render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemporaryTargetDesc {
    pub width: u32,
    pub height: u32,
    /// Depth buffer bits (`0` for color-only targets).
    pub depth_bits: u32,
    pub filter: wgpu::FilterMode,
    pub format: wgpu::TextureFormat,
    /// Sampled with depth comparison.
    pub shadow_map: bool,
}

impl TemporaryTargetDesc {
    /// Bilinear color target.
    #[must_use]
    pub const fn color(width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        Self {
            width,
            height,
            depth_bits: 0,
            filter: wgpu::FilterMode::Linear,
            format,
            shadow_map: false,
        }
    }

    /// Point-filtered 32-bit depth target.
    #[must_use]
    pub const fn depth(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth_bits: 32,
            filter: wgpu::FilterMode::Nearest,
            format: DEPTH_FORMAT,
            shadow_map: false,
        }
    }

    /// Square shadow atlas (32-bit depth, bilinear comparison sampling).
    #[must_use]
    pub const fn shadow_atlas(size: u32) -> Self {
        Self {
            width: size,
            height: size,
            depth_bits: 32,
            filter: wgpu::FilterMode::Linear,
            format: DEPTH_FORMAT,
            shadow_map: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadAction {
    Load,
    Clear,
    DontCare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreAction {
    Store,
    DontCare,
}

/// A render target bound as a color or depth attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attachment {
    pub target: RenderTarget,
    pub load: LoadAction,
    pub store: StoreAction,
}

impl Attachment {
    /// Binds `target`, storing the result.
    #[must_use]
    pub const fn new(target: RenderTarget, load: LoadAction) -> Self {
        Self {
            target,
            load,
            store: StoreAction::Store,
        }
    }
}

/// Pixel rectangle of a render target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the two rectangles share any area.
    #[must_use]
    pub fn overlaps(&self, other: &Viewport) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

// ============================================================================
// Culling
// ============================================================================

/// Culling parameters produced by the host for one camera.
#[derive(Debug, Clone, PartialEq)]
pub struct CullingParameters {
    /// Maximum distance at which shadow casters are considered.
    pub shadow_distance: f32,
    /// Host-private token identifying the camera state.
    pub token: u64,
}

/// Result of culling one camera.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CullingResults {
    pub visible_lights: Vec<VisibleLight>,
}

/// Axis-aligned world-space bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub center: Vec3,
    pub extents: Vec3,
}

/// Per-split culling data of a shadow draw.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShadowSplitData {
    /// xyz: center, w: radius.
    pub culling_sphere: Vec4,
    /// Fraction of the previous cascade's sphere used to cull casters.
    pub cascade_blend_culling_factor: f32,
}

/// View and projection of one shadow tile plus its culling data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowMatrices {
    pub view: Mat4,
    pub projection: Mat4,
    pub split: ShadowSplitData,
}

/// Arguments of a shadow caster draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowDrawSettings {
    pub visible_light_index: usize,
    pub split: ShadowSplitData,
}

/// Faces of a point light's shadow cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubemapFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubemapFace {
    #[must_use]
    pub const fn all() -> [CubemapFace; 6] {
        [
            Self::PositiveX,
            Self::NegativeX,
            Self::PositiveY,
            Self::NegativeY,
            Self::PositiveZ,
            Self::NegativeZ,
        ]
    }
}

// ============================================================================
// Draw Settings
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortingCriteria {
    /// Front to back, grouped by material.
    CommonOpaque,
    /// Back to front.
    CommonTransparent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderQueueRange {
    Opaque,
    Transparent,
}

/// Shader pass tags a renderer draw accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderPassTag {
    Unlit,
    Lit,
}

impl ShaderPassTag {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unlit => "SRPDefaultUnlit",
            Self::Lit => "CustomLit",
        }
    }
}

bitflags! {
    /// Per-object data the host must provide to shaders.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PerObjectData: u32 {
        const REFLECTION_PROBES = 1 << 0;
        const LIGHTMAPS = 1 << 1;
        const SHADOW_MASK = 1 << 2;
        const LIGHT_PROBE = 1 << 3;
        const OCCLUSION_PROBE = 1 << 4;
        const LIGHT_PROBE_PROXY_VOLUME = 1 << 5;
        const OCCLUSION_PROBE_PROXY_VOLUME = 1 << 6;
        const LIGHT_DATA = 1 << 7;
        const LIGHT_INDICES = 1 << 8;

        /// Everything global illumination needs.
        const GLOBAL_ILLUMINATION = Self::REFLECTION_PROBES.bits()
            | Self::LIGHTMAPS.bits()
            | Self::SHADOW_MASK.bits()
            | Self::LIGHT_PROBE.bits()
            | Self::OCCLUSION_PROBE.bits()
            | Self::LIGHT_PROBE_PROXY_VOLUME.bits()
            | Self::OCCLUSION_PROBE_PROXY_VOLUME.bits();
    }
}

/// How visible renderers are drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingSettings {
    pub sorting: SortingCriteria,
    pub passes: SmallVec<[ShaderPassTag; 2]>,
    pub dynamic_batching: bool,
    pub instancing: bool,
    pub per_object_data: PerObjectData,
}

/// Which visible renderers are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilteringSettings {
    pub queue: RenderQueueRange,
}

// ============================================================================
// RenderHost
// ============================================================================

/// The narrow interface the pipeline drives.
pub trait RenderHost {
    // === Capabilities ===

    /// Whether clip-space depth is reversed (near = 1).
    fn uses_reversed_z(&self) -> bool;

    /// Whether the backend can copy textures directly.
    fn copy_texture_supported(&self) -> bool;

    // === Owned Resources ===

    fn create_program(&mut self, kind: ProgramKind) -> Option<ProgramHandle>;

    fn destroy_program(&mut self, program: ProgramHandle);

    /// Creates a persistent texture filled with one color.
    fn create_solid_texture(
        &mut self,
        label: &'static str,
        width: u32,
        height: u32,
        color: wgpu::Color,
    ) -> Option<TextureHandle>;

    fn destroy_texture(&mut self, texture: TextureHandle);

    /// Enables or disables the host's SRP-style batcher.
    fn set_srp_batching(&mut self, enabled: bool);

    // === Culling ===

    /// Returns `None` when the camera cannot be culled (degenerate frustum).
    fn try_get_culling_parameters(&mut self, camera: &Camera) -> Option<CullingParameters>;

    fn cull(&mut self, parameters: &CullingParameters) -> CullingResults;

    /// Bounds of the shadow casters of a visible light, `None` if it has none.
    fn shadow_caster_bounds(&self, visible_light_index: usize) -> Option<Bounds>;

    fn compute_directional_shadow_matrices(
        &mut self,
        visible_light_index: usize,
        cascade_index: u32,
        cascade_count: u32,
        cascade_ratios: Vec3,
        tile_size: u32,
        near_plane_offset: f32,
    ) -> Option<ShadowMatrices>;

    fn compute_spot_shadow_matrices(&mut self, visible_light_index: usize)
    -> Option<ShadowMatrices>;

    /// `fov_bias` widens the 90° face frustum, in degrees.
    fn compute_point_shadow_matrices(
        &mut self,
        visible_light_index: usize,
        face: CubemapFace,
        fov_bias: f32,
    ) -> Option<ShadowMatrices>;

    /// Maps visible light indices to other-light indices (`-1` = not packed).
    fn set_light_index_map(&mut self, map: &[i32]);

    // === Drawing ===

    fn setup_camera_properties(&mut self, camera: &Camera);

    fn draw_renderers(&mut self, drawing: &DrawingSettings, filtering: &FilteringSettings);

    fn draw_skybox(&mut self, camera: &Camera);

    fn draw_shadows(&mut self, settings: &ShadowDrawSettings);

    /// Procedural full-screen triangle with the given program pass.
    fn draw_fullscreen(&mut self, program: ProgramHandle, pass: u32);

    // === Render Targets ===

    fn get_temporary_rt(&mut self, id: ShaderProperty, desc: &TemporaryTargetDesc);

    fn release_temporary_rt(&mut self, id: ShaderProperty);

    fn set_render_target(&mut self, color: Attachment, depth: Option<Attachment>);

    fn clear_render_target(&mut self, clear_depth: bool, clear_color: bool, color: wgpu::Color);

    fn set_viewport(&mut self, viewport: Viewport);

    fn copy_texture(&mut self, source: RenderTarget, destination: RenderTarget);

    /// Uploads raw texel data into a render target.
    fn write_texture(&mut self, target: RenderTarget, texels: &[u8]);

    // === Global State ===

    fn set_view_projection(&mut self, view: Mat4, projection: Mat4);

    fn set_global_depth_bias(&mut self, bias: f32, slope_bias: f32);

    fn set_global_float(&mut self, id: ShaderProperty, value: f32);

    fn set_global_int(&mut self, id: ShaderProperty, value: i32);

    fn set_global_vector(&mut self, id: ShaderProperty, value: Vec4);

    fn set_global_vector_array(&mut self, id: ShaderProperty, values: &[Vec4]);

    fn set_global_matrix_array(&mut self, id: ShaderProperty, values: &[Mat4]);

    fn set_global_texture(&mut self, id: ShaderProperty, texture: RenderTarget);

    fn set_keyword(&mut self, selection: KeywordSelection);

    // === Debugging & Submission ===

    fn begin_sample(&mut self, _name: &str) {}

    fn end_sample(&mut self, _name: &str) {}

    /// Hands everything recorded for the current camera to the GPU.
    fn submit(&mut self);
}
