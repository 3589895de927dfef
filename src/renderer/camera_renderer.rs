//! Per-Camera Renderer
//!
//! Records everything one camera needs, in order:
//!
//! ```text
//! Prepare ─► Cull ─► Lighting + Shadows ─► Geometry setup ─► Opaque ─► Skybox
//!    ─► Copy attachments ─► Transparent ─► Post FX (or copy) ─► Cleanup ─► Submit
//! ```
//!
//! # Intermediate Buffer
//!
//! Geometry is drawn into `_CameraColorAttachment` / `_CameraDepthAttachment`
//! instead of the camera target whenever anything downstream needs to read
//! it back: scaled rendering, a color or depth copy, or active post FX.

use glam::{UVec2, Vec4};
use smallvec::smallvec;

use super::context::FrameContext;
use super::host::{
    Attachment, DrawingSettings, FilteringSettings, LoadAction, PerObjectData, ProgramHandle,
    RenderHost, RenderQueueRange, RenderTarget, ShaderPassTag, SortingCriteria,
    TemporaryTargetDesc, TextureHandle, Viewport, color_format,
};
use super::lighting::{Lighting, LightingSummary};
use super::pipeline::{CameraOutcome, SkipReason};
use super::post::{PostFxReport, PostFxStack};
use super::properties::{ShaderProperty, properties};
use super::settings::PipelineSettings;
use super::transient::TransientTargets;
use crate::scene::camera::{Camera, CameraType, ClearFlags};
use crate::utils::color::linear_wgpu;

/// Render scales inside this band are treated as exactly 1.
const UNSCALED_BAND: (f32, f32) = (0.99, 1.01);

/// Full-screen copy program passes.
const COPY_COLOR_PASS: u32 = 0;
const COPY_DEPTH_PASS: u32 = 1;

/// Buffer size for a camera at the given render scale.
///
/// Returns the size and whether scaled rendering is in effect.
#[must_use]
pub fn camera_buffer_size(camera: &Camera, render_scale: f32) -> (UVec2, bool) {
    let native = UVec2::new(camera.pixel_width, camera.pixel_height);
    let scaled = render_scale < UNSCALED_BAND.0 || render_scale > UNSCALED_BAND.1;
    if !scaled {
        return (native, false);
    }
    let width = ((native.x as f32 * render_scale).floor() as u32).max(1);
    let height = ((native.y as f32 * render_scale).floor() as u32).max(1);
    (UVec2::new(width, height), true)
}

/// What one camera render did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraStats {
    pub buffer_size: UVec2,
    pub use_hdr: bool,
    pub scaled: bool,
    /// Geometry went into intermediate attachments.
    pub intermediate: bool,
    pub copied_color: bool,
    pub copied_depth: bool,
    pub lighting: LightingSummary,
    pub post_fx: Option<PostFxReport>,
    /// Temporaries that were still live at the end of the camera.
    pub leaked_targets: usize,
}

/// Per-camera flags resolved during prepare.
#[derive(Debug, Clone, Copy)]
struct CameraFrame {
    buffer_size: UVec2,
    scaled: bool,
    use_hdr: bool,
    use_color_texture: bool,
    use_depth_texture: bool,
    intermediate: bool,
}

/// Renders one camera at a time, reusing its subsystems across cameras.
pub struct CameraRenderer {
    copy_program: ProgramHandle,
    missing_texture: TextureHandle,
    lighting: Lighting,
    post_fx: PostFxStack,
    targets: TransientTargets,
}

impl CameraRenderer {
    #[must_use]
    pub fn new(
        post_fx_program: ProgramHandle,
        copy_program: ProgramHandle,
        missing_texture: TextureHandle,
    ) -> Self {
        Self {
            copy_program,
            missing_texture,
            lighting: Lighting::new(),
            post_fx: PostFxStack::new(post_fx_program),
            targets: TransientTargets::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn lighting(&self) -> &Lighting {
        &self.lighting
    }

    #[inline]
    #[must_use]
    pub fn post_fx(&self) -> &PostFxStack {
        &self.post_fx
    }

    #[inline]
    #[must_use]
    pub fn targets(&self) -> &TransientTargets {
        &self.targets
    }

    /// Renders `camera` and submits its commands.
    pub fn render(
        &mut self,
        host: &mut dyn RenderHost,
        camera: &Camera,
        settings: &PipelineSettings,
    ) -> CameraOutcome {
        if camera.pixel_width == 0 || camera.pixel_height == 0 {
            log::debug!("CameraRenderer: '{}' has an empty viewport, skipping", camera.name);
            return CameraOutcome::Skipped(SkipReason::EmptyViewport);
        }

        let buffer_settings = &settings.camera_buffer;
        let (buffer_size, scaled) = camera_buffer_size(camera, buffer_settings.render_scale());

        let shadow_distance = settings.shadows.max_distance().min(camera.far_clip_plane);
        let Some(mut parameters) = host.try_get_culling_parameters(camera) else {
            log::warn!("CameraRenderer: no culling parameters for '{}', skipping", camera.name);
            return CameraOutcome::Skipped(SkipReason::CullingFailed);
        };
        parameters.shadow_distance = shadow_distance;
        let culling = host.cull(&parameters);

        let (use_color_texture, use_depth_texture) = if camera.camera_type == CameraType::Reflection
        {
            (
                buffer_settings.copy_color_reflection,
                buffer_settings.copy_depth_reflection,
            )
        } else {
            (buffer_settings.copy_color, buffer_settings.copy_depth)
        };
        let use_hdr = buffer_settings.allow_hdr && camera.allow_hdr;

        let p = properties();
        let sample = camera.name.as_str();
        host.begin_sample(sample);

        let mut targets = std::mem::take(&mut self.targets);
        let mut ctx = FrameContext::new(host, &mut targets);
        ctx.host.set_global_vector(
            p.camera_buffer_size,
            Vec4::new(
                1.0 / buffer_size.x as f32,
                1.0 / buffer_size.y as f32,
                buffer_size.x as f32,
                buffer_size.y as f32,
            ),
        );

        let lighting = self.lighting.setup(
            &mut ctx,
            &culling,
            &settings.shadows,
            settings.use_lights_per_object,
        );
        self.post_fx.setup(
            &mut ctx,
            camera,
            buffer_size,
            settings.post_fx.as_ref(),
            use_hdr,
            settings.color_lut_resolution,
            buffer_settings,
        );

        let frame = CameraFrame {
            buffer_size,
            scaled,
            use_hdr,
            use_color_texture,
            use_depth_texture,
            intermediate: scaled
                || use_color_texture
                || use_depth_texture
                || self.post_fx.is_active(),
        };

        self.setup_geometry(&mut ctx, camera, &frame);
        self.draw_visible_geometry(&mut ctx, camera, &frame, settings);

        let post_fx = if self.post_fx.is_active() {
            Some(self.post_fx.render(&mut ctx, p.camera_color_attachment))
        } else {
            if frame.intermediate {
                ctx.host.set_viewport(Viewport::new(
                    camera.pixel_x as f32,
                    camera.pixel_y as f32,
                    camera.pixel_width as f32,
                    camera.pixel_height as f32,
                ));
                self.draw_copy(
                    &mut ctx,
                    RenderTarget::Temporary(p.camera_color_attachment),
                    RenderTarget::CameraTarget,
                    COPY_COLOR_PASS,
                );
            }
            None
        };

        self.cleanup(&mut ctx, &frame);
        let leaked_targets = ctx.release_leaked();
        self.targets = targets;

        host.end_sample(sample);
        host.submit();

        CameraOutcome::Rendered(CameraStats {
            buffer_size,
            use_hdr,
            scaled: frame.scaled,
            intermediate: frame.intermediate,
            copied_color: frame.use_color_texture,
            copied_depth: frame.use_depth_texture,
            lighting,
            post_fx,
            leaked_targets,
        })
    }

    fn setup_geometry(&self, ctx: &mut FrameContext<'_>, camera: &Camera, frame: &CameraFrame) {
        let p = properties();
        ctx.host.setup_camera_properties(camera);

        let mut flags = camera.clear_flags;
        if frame.intermediate {
            if flags > ClearFlags::Color {
                flags = ClearFlags::Color;
            }
            let size = frame.buffer_size;
            ctx.get_temporary(
                p.camera_color_attachment,
                TemporaryTargetDesc::color(size.x, size.y, color_format(frame.use_hdr)),
            );
            ctx.get_temporary(
                p.camera_depth_attachment,
                TemporaryTargetDesc::depth(size.x, size.y),
            );
            ctx.host.set_render_target(
                Attachment::new(
                    RenderTarget::Temporary(p.camera_color_attachment),
                    LoadAction::DontCare,
                ),
                Some(Attachment::new(
                    RenderTarget::Temporary(p.camera_depth_attachment),
                    LoadAction::DontCare,
                )),
            );
        }

        let clear_color = flags == ClearFlags::Color;
        ctx.host.clear_render_target(
            flags <= ClearFlags::Depth,
            clear_color,
            if clear_color {
                linear_wgpu(camera.background_color)
            } else {
                wgpu::Color::TRANSPARENT
            },
        );

        let missing = RenderTarget::Texture(self.missing_texture);
        ctx.host.set_global_texture(p.camera_color_texture, missing);
        ctx.host.set_global_texture(p.camera_depth_texture, missing);
    }

    fn draw_visible_geometry(
        &mut self,
        ctx: &mut FrameContext<'_>,
        camera: &Camera,
        frame: &CameraFrame,
        settings: &PipelineSettings,
    ) {
        let mut per_object_data = PerObjectData::GLOBAL_ILLUMINATION;
        if settings.use_lights_per_object {
            per_object_data |= PerObjectData::LIGHT_DATA | PerObjectData::LIGHT_INDICES;
        }
        let mut drawing = DrawingSettings {
            sorting: SortingCriteria::CommonOpaque,
            passes: smallvec![ShaderPassTag::Unlit, ShaderPassTag::Lit],
            dynamic_batching: settings.use_dynamic_batching,
            instancing: settings.use_gpu_instancing,
            per_object_data,
        };
        let mut filtering = FilteringSettings {
            queue: RenderQueueRange::Opaque,
        };
        ctx.host.draw_renderers(&drawing, &filtering);

        if camera.clear_flags == ClearFlags::Skybox {
            ctx.host.draw_skybox(camera);
        }

        if frame.use_color_texture || frame.use_depth_texture {
            self.copy_attachments(ctx, frame);
        }

        drawing.sorting = SortingCriteria::CommonTransparent;
        filtering.queue = RenderQueueRange::Transparent;
        ctx.host.draw_renderers(&drawing, &filtering);
    }

    fn copy_attachments(&mut self, ctx: &mut FrameContext<'_>, frame: &CameraFrame) {
        let p = properties();
        let size = frame.buffer_size;
        let direct = ctx.host.copy_texture_supported();

        if frame.use_color_texture {
            ctx.get_temporary(
                p.camera_color_texture,
                TemporaryTargetDesc::color(size.x, size.y, color_format(frame.use_hdr)),
            );
            self.copy_or_draw(
                ctx,
                direct,
                p.camera_color_attachment,
                p.camera_color_texture,
                COPY_COLOR_PASS,
            );
        }
        if frame.use_depth_texture {
            ctx.get_temporary(
                p.camera_depth_texture,
                TemporaryTargetDesc::depth(size.x, size.y),
            );
            self.copy_or_draw(
                ctx,
                direct,
                p.camera_depth_attachment,
                p.camera_depth_texture,
                COPY_DEPTH_PASS,
            );
        }

        if !direct {
            ctx.host.set_render_target(
                Attachment::new(
                    RenderTarget::Temporary(p.camera_color_attachment),
                    LoadAction::Load,
                ),
                Some(Attachment::new(
                    RenderTarget::Temporary(p.camera_depth_attachment),
                    LoadAction::Load,
                )),
            );
        }
    }

    fn copy_or_draw(
        &self,
        ctx: &mut FrameContext<'_>,
        direct: bool,
        from: ShaderProperty,
        to: ShaderProperty,
        pass: u32,
    ) {
        let (from, to) = (RenderTarget::Temporary(from), RenderTarget::Temporary(to));
        if direct {
            ctx.host.copy_texture(from, to);
        } else {
            self.draw_copy(ctx, from, to, pass);
        }
    }

    fn draw_copy(&self, ctx: &mut FrameContext<'_>, from: RenderTarget, to: RenderTarget, pass: u32) {
        ctx.host.set_global_texture(properties().source_texture, from);
        ctx.host
            .set_render_target(Attachment::new(to, LoadAction::DontCare), None);
        ctx.host.draw_fullscreen(self.copy_program, pass);
    }

    fn cleanup(&mut self, ctx: &mut FrameContext<'_>, frame: &CameraFrame) {
        let p = properties();
        self.lighting.cleanup(ctx);
        if frame.intermediate {
            ctx.release_temporary(p.camera_color_attachment);
            ctx.release_temporary(p.camera_depth_attachment);
            if frame.use_color_texture {
                ctx.release_temporary(p.camera_color_texture);
            }
            if frame.use_depth_texture {
                ctx.release_temporary(p.camera_depth_texture);
            }
        }
    }
}
