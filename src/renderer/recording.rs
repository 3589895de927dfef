//! Headless Recording Host
//!
//! [`RecordingHost`] implements [`RenderHost`] without a GPU. It logs every
//! call as a [`Command`], tracks live temporaries, global uniforms, keywords
//! and texture uploads, and answers culling and shadow-matrix queries from a
//! configured light list.
//!
//! Misuse of the temporary target protocol (double allocation, releasing a
//! target that is not live) is recorded in [`RecordingHost::protocol_errors`]
//! instead of panicking, so tests can assert on it.

use glam::{Mat4, Vec3, Vec4};
use rustc_hash::{FxHashMap, FxHashSet};

use super::host::{
    Attachment, Bounds, CubemapFace, CullingParameters, CullingResults, DrawingSettings,
    FilteringSettings, ProgramHandle, ProgramKind, RenderHost, RenderTarget, ShadowDrawSettings,
    ShadowMatrices, ShadowSplitData, TemporaryTargetDesc, TextureHandle, Viewport,
};
use super::keywords::{KeywordGroup, KeywordSelection};
use super::properties::ShaderProperty;
use super::shadows::utils::{
    bounding_sphere, cascade_ranges, cascade_view_projection, frustum_corners_world,
    point_face_view_projection, spot_view_projection,
};
use crate::scene::camera::Camera;
use crate::scene::light::VisibleLight;

/// One recorded host call.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    BeginSample(String),
    EndSample(String),
    SetupCamera(String),
    DrawRenderers(DrawingSettings, FilteringSettings),
    DrawSkybox,
    DrawShadows(ShadowDrawSettings),
    DrawFullscreen { program: ProgramHandle, pass: u32 },
    GetTemporary(ShaderProperty, TemporaryTargetDesc),
    ReleaseTemporary(ShaderProperty),
    SetRenderTarget {
        color: Attachment,
        depth: Option<Attachment>,
    },
    Clear {
        depth: bool,
        color: bool,
        value: wgpu::Color,
    },
    SetViewport(Viewport),
    CopyTexture {
        source: RenderTarget,
        destination: RenderTarget,
    },
    WriteTexture { target: RenderTarget, len: usize },
    SetViewProjection,
    SetDepthBias { bias: f32, slope_bias: f32 },
    SetKeyword(KeywordSelection),
    Submit,
}

/// Last value written to a global shader property.
#[derive(Debug, Clone, PartialEq)]
pub enum GlobalValue {
    Float(f32),
    Int(i32),
    Vector(Vec4),
    VectorArray(Vec<Vec4>),
    MatrixArray(Vec<Mat4>),
    Texture(RenderTarget),
}

/// A host that records instead of rendering.
#[derive(Debug, Default)]
pub struct RecordingHost {
    // === Configuration ===
    /// Reported by [`RenderHost::uses_reversed_z`].
    pub reversed_z: bool,
    /// Reported by [`RenderHost::copy_texture_supported`].
    pub copy_supported: bool,
    lights: Vec<VisibleLight>,
    lights_without_casters: FxHashSet<usize>,
    lights_without_matrices: FxHashSet<usize>,
    unculled_cameras: FxHashSet<String>,
    failing_programs: FxHashSet<ProgramKind>,
    failing_textures: bool,

    // === State ===
    commands: Vec<Command>,
    globals: FxHashMap<ShaderProperty, GlobalValue>,
    keywords: FxHashMap<KeywordGroup, KeywordSelection>,
    live_temporaries: FxHashMap<ShaderProperty, TemporaryTargetDesc>,
    peak_temporaries: usize,
    uploads: FxHashMap<RenderTarget, Vec<u8>>,
    programs: FxHashMap<ProgramHandle, ProgramKind>,
    textures: FxHashSet<TextureHandle>,
    next_handle: u64,
    camera: Option<Camera>,
    shadow_distance: f32,
    light_index_map: Vec<i32>,
    srp_batching: bool,
    submits: usize,
    protocol_errors: Vec<String>,
}

impl RecordingHost {
    /// A host with direct texture copies and no lights.
    #[must_use]
    pub fn new() -> Self {
        Self {
            copy_supported: true,
            ..Self::default()
        }
    }

    // === Configuration ===

    /// Lights returned by every subsequent cull.
    pub fn set_lights(&mut self, lights: Vec<VisibleLight>) {
        self.lights = lights;
    }

    /// Reports no shadow casters for the given visible light.
    pub fn without_casters(&mut self, visible_light_index: usize) {
        self.lights_without_casters.insert(visible_light_index);
    }

    /// Answers every shadow matrix query for the given visible light with
    /// nothing, as if the light's frustum were degenerate.
    pub fn without_shadow_matrices(&mut self, visible_light_index: usize) {
        self.lights_without_matrices.insert(visible_light_index);
    }

    /// Makes culling fail for cameras with this name.
    pub fn fail_culling_for(&mut self, camera_name: impl Into<String>) {
        self.unculled_cameras.insert(camera_name.into());
    }

    /// Makes program creation fail for `kind`.
    pub fn fail_program(&mut self, kind: ProgramKind) {
        self.failing_programs.insert(kind);
    }

    /// Makes solid texture creation fail.
    pub fn fail_textures(&mut self) {
        self.failing_textures = true;
    }

    // === Inspection ===

    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    #[must_use]
    pub fn count(&self, predicate: impl Fn(&Command) -> bool) -> usize {
        self.commands.iter().filter(|c| predicate(c)).count()
    }

    /// Passes drawn with `program`, in order.
    #[must_use]
    pub fn fullscreen_passes(&self, program: ProgramHandle) -> Vec<u32> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::DrawFullscreen { program: p, pass } if *p == program => Some(*pass),
                _ => None,
            })
            .collect()
    }

    /// Every target allocated so far, in order.
    #[must_use]
    pub fn allocations(&self) -> Vec<(ShaderProperty, TemporaryTargetDesc)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::GetTemporary(id, desc) => Some((*id, *desc)),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn global(&self, id: ShaderProperty) -> Option<&GlobalValue> {
        self.globals.get(&id)
    }

    #[must_use]
    pub fn global_float(&self, id: ShaderProperty) -> Option<f32> {
        match self.globals.get(&id) {
            Some(GlobalValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn global_int(&self, id: ShaderProperty) -> Option<i32> {
        match self.globals.get(&id) {
            Some(GlobalValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn global_vector(&self, id: ShaderProperty) -> Option<Vec4> {
        match self.globals.get(&id) {
            Some(GlobalValue::Vector(v)) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn global_vectors(&self, id: ShaderProperty) -> Option<&[Vec4]> {
        match self.globals.get(&id) {
            Some(GlobalValue::VectorArray(v)) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn global_matrices(&self, id: ShaderProperty) -> Option<&[Mat4]> {
        match self.globals.get(&id) {
            Some(GlobalValue::MatrixArray(v)) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn global_texture(&self, id: ShaderProperty) -> Option<RenderTarget> {
        match self.globals.get(&id) {
            Some(GlobalValue::Texture(t)) => Some(*t),
            _ => None,
        }
    }

    #[must_use]
    pub fn keyword(&self, group: KeywordGroup) -> Option<KeywordSelection> {
        self.keywords.get(&group).copied()
    }

    #[must_use]
    pub fn live_temporaries(&self) -> &FxHashMap<ShaderProperty, TemporaryTargetDesc> {
        &self.live_temporaries
    }

    #[must_use]
    pub fn peak_temporaries(&self) -> usize {
        self.peak_temporaries
    }

    #[must_use]
    pub fn upload(&self, target: RenderTarget) -> Option<&[u8]> {
        self.uploads.get(&target).map(Vec::as_slice)
    }

    #[must_use]
    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    #[must_use]
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    #[must_use]
    pub fn srp_batching(&self) -> bool {
        self.srp_batching
    }

    #[must_use]
    pub fn light_index_map(&self) -> &[i32] {
        &self.light_index_map
    }

    #[must_use]
    pub fn submits(&self) -> usize {
        self.submits
    }

    #[must_use]
    pub fn protocol_errors(&self) -> &[String] {
        &self.protocol_errors
    }

    fn next_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn light(&self, index: usize) -> Option<&VisibleLight> {
        self.lights.get(index)
    }

    fn shadowed_light(&self, index: usize) -> Option<&VisibleLight> {
        if self.lights_without_matrices.contains(&index) {
            return None;
        }
        self.light(index)
    }
}

impl RenderHost for RecordingHost {
    fn uses_reversed_z(&self) -> bool {
        self.reversed_z
    }

    fn copy_texture_supported(&self) -> bool {
        self.copy_supported
    }

    fn create_program(&mut self, kind: ProgramKind) -> Option<ProgramHandle> {
        if self.failing_programs.contains(&kind) {
            return None;
        }
        let handle = ProgramHandle(self.next_handle());
        self.programs.insert(handle, kind);
        Some(handle)
    }

    fn destroy_program(&mut self, program: ProgramHandle) {
        if self.programs.remove(&program).is_none() {
            self.protocol_errors
                .push(format!("destroy of unknown program {program:?}"));
        }
    }

    fn create_solid_texture(
        &mut self,
        _label: &'static str,
        _width: u32,
        _height: u32,
        _color: wgpu::Color,
    ) -> Option<TextureHandle> {
        if self.failing_textures {
            return None;
        }
        let handle = TextureHandle(self.next_handle());
        self.textures.insert(handle);
        Some(handle)
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        if !self.textures.remove(&texture) {
            self.protocol_errors
                .push(format!("destroy of unknown texture {texture:?}"));
        }
    }

    fn set_srp_batching(&mut self, enabled: bool) {
        self.srp_batching = enabled;
    }

    fn try_get_culling_parameters(&mut self, camera: &Camera) -> Option<CullingParameters> {
        if self.unculled_cameras.contains(&camera.name) {
            return None;
        }
        self.camera = Some(camera.clone());
        Some(CullingParameters {
            shadow_distance: camera.far_clip_plane,
            token: self.next_handle(),
        })
    }

    fn cull(&mut self, parameters: &CullingParameters) -> CullingResults {
        self.shadow_distance = parameters.shadow_distance;
        CullingResults {
            visible_lights: self.lights.clone(),
        }
    }

    fn shadow_caster_bounds(&self, visible_light_index: usize) -> Option<Bounds> {
        if self.lights_without_casters.contains(&visible_light_index) {
            return None;
        }
        let light = self.light(visible_light_index)?;
        Some(Bounds {
            center: light.position(),
            extents: Vec3::splat(light.range.max(1.0)),
        })
    }

    fn compute_directional_shadow_matrices(
        &mut self,
        visible_light_index: usize,
        cascade_index: u32,
        cascade_count: u32,
        cascade_ratios: Vec3,
        tile_size: u32,
        near_plane_offset: f32,
    ) -> Option<ShadowMatrices> {
        let light = self.shadowed_light(visible_light_index)?;
        let camera = self.camera.as_ref()?;
        let ranges = cascade_ranges(
            camera.near_clip_plane,
            self.shadow_distance,
            cascade_count,
            cascade_ratios,
        );
        let (near, far) = *ranges.get(cascade_index as usize)?;
        let corners =
            frustum_corners_world(camera.view_matrix, camera.projection_matrix, near, far);
        let sphere = bounding_sphere(&corners);
        let (view, projection) =
            cascade_view_projection(light.forward(), sphere, tile_size, near_plane_offset);
        Some(ShadowMatrices {
            view,
            projection,
            split: ShadowSplitData {
                culling_sphere: sphere,
                cascade_blend_culling_factor: 0.0,
            },
        })
    }

    fn compute_spot_shadow_matrices(
        &mut self,
        visible_light_index: usize,
    ) -> Option<ShadowMatrices> {
        let light = self.shadowed_light(visible_light_index)?;
        let (view, projection) =
            spot_view_projection(light.position(), light.forward(), light.spot_angle, light.range);
        Some(ShadowMatrices {
            view,
            projection,
            split: ShadowSplitData::default(),
        })
    }

    fn compute_point_shadow_matrices(
        &mut self,
        visible_light_index: usize,
        face: CubemapFace,
        fov_bias: f32,
    ) -> Option<ShadowMatrices> {
        let light = self.shadowed_light(visible_light_index)?;
        let (view, projection) =
            point_face_view_projection(light.position(), face, fov_bias, light.range);
        Some(ShadowMatrices {
            view,
            projection,
            split: ShadowSplitData::default(),
        })
    }

    fn set_light_index_map(&mut self, map: &[i32]) {
        self.light_index_map = map.to_vec();
    }

    fn setup_camera_properties(&mut self, camera: &Camera) {
        self.commands.push(Command::SetupCamera(camera.name.clone()));
    }

    fn draw_renderers(&mut self, drawing: &DrawingSettings, filtering: &FilteringSettings) {
        self.commands
            .push(Command::DrawRenderers(drawing.clone(), *filtering));
    }

    fn draw_skybox(&mut self, _camera: &Camera) {
        self.commands.push(Command::DrawSkybox);
    }

    fn draw_shadows(&mut self, settings: &ShadowDrawSettings) {
        self.commands.push(Command::DrawShadows(*settings));
    }

    fn draw_fullscreen(&mut self, program: ProgramHandle, pass: u32) {
        if !self.programs.contains_key(&program) {
            self.protocol_errors
                .push(format!("draw with unknown program {program:?}"));
        }
        self.commands.push(Command::DrawFullscreen { program, pass });
    }

    fn get_temporary_rt(&mut self, id: ShaderProperty, desc: &TemporaryTargetDesc) {
        if self.live_temporaries.insert(id, *desc).is_some() {
            self.protocol_errors
                .push(format!("{id} allocated while already live"));
        }
        self.peak_temporaries = self.peak_temporaries.max(self.live_temporaries.len());
        self.commands.push(Command::GetTemporary(id, *desc));
    }

    fn release_temporary_rt(&mut self, id: ShaderProperty) {
        if self.live_temporaries.remove(&id).is_none() {
            self.protocol_errors
                .push(format!("{id} released while not live"));
        }
        self.commands.push(Command::ReleaseTemporary(id));
    }

    fn set_render_target(&mut self, color: Attachment, depth: Option<Attachment>) {
        self.commands.push(Command::SetRenderTarget { color, depth });
    }

    fn clear_render_target(&mut self, clear_depth: bool, clear_color: bool, color: wgpu::Color) {
        self.commands.push(Command::Clear {
            depth: clear_depth,
            color: clear_color,
            value: color,
        });
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.commands.push(Command::SetViewport(viewport));
    }

    fn copy_texture(&mut self, source: RenderTarget, destination: RenderTarget) {
        self.commands.push(Command::CopyTexture {
            source,
            destination,
        });
    }

    fn write_texture(&mut self, target: RenderTarget, texels: &[u8]) {
        self.uploads.insert(target, texels.to_vec());
        self.commands.push(Command::WriteTexture {
            target,
            len: texels.len(),
        });
    }

    fn set_view_projection(&mut self, _view: Mat4, _projection: Mat4) {
        self.commands.push(Command::SetViewProjection);
    }

    fn set_global_depth_bias(&mut self, bias: f32, slope_bias: f32) {
        self.commands.push(Command::SetDepthBias { bias, slope_bias });
    }

    fn set_global_float(&mut self, id: ShaderProperty, value: f32) {
        self.globals.insert(id, GlobalValue::Float(value));
    }

    fn set_global_int(&mut self, id: ShaderProperty, value: i32) {
        self.globals.insert(id, GlobalValue::Int(value));
    }

    fn set_global_vector(&mut self, id: ShaderProperty, value: Vec4) {
        self.globals.insert(id, GlobalValue::Vector(value));
    }

    fn set_global_vector_array(&mut self, id: ShaderProperty, values: &[Vec4]) {
        self.globals
            .insert(id, GlobalValue::VectorArray(values.to_vec()));
    }

    fn set_global_matrix_array(&mut self, id: ShaderProperty, values: &[Mat4]) {
        self.globals
            .insert(id, GlobalValue::MatrixArray(values.to_vec()));
    }

    fn set_global_texture(&mut self, id: ShaderProperty, texture: RenderTarget) {
        self.globals.insert(id, GlobalValue::Texture(texture));
    }

    fn set_keyword(&mut self, selection: KeywordSelection) {
        self.keywords.insert(selection.group(), selection);
        self.commands.push(Command::SetKeyword(selection));
    }

    fn begin_sample(&mut self, name: &str) {
        self.commands.push(Command::BeginSample(name.to_owned()));
    }

    fn end_sample(&mut self, name: &str) {
        self.commands.push(Command::EndSample(name.to_owned()));
    }

    fn submit(&mut self) {
        self.submits += 1;
        self.commands.push(Command::Submit);
    }
}
