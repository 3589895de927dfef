//! Post-Processing Stack
//!
//! Runs after all geometry of a camera is drawn, reading the camera's
//! intermediate color attachment and writing the camera target.
//!
//! # Stages
//!
//! ```text
//! source ─► Bloom ─► LUT bake ─► Apply LUT (+ FXAA) ─► Final / Rescale ─► camera
//! ```
//!
//! | Stage     | Skipped when                                        |
//! |-----------|-----------------------------------------------------|
//! | Bloom     | resolution, iterations or intensity degenerate      |
//! | FXAA      | disabled in the camera buffer settings              |
//! | Rescale   | buffer size equals camera pixel size                |
//!
//! The stack is active only when settings are bound and the camera type is
//! Game or SceneView. It never fails a frame: degenerate inputs skip stages.

pub mod bloom;
pub mod color_grading;
pub mod composite;
pub mod tone_mapping;

use glam::UVec2;

use self::bloom::BloomReport;
use self::color_grading::LutCache;
use super::context::FrameContext;
use super::host::{Attachment, LoadAction, ProgramHandle, RenderTarget, Viewport};
use super::keywords::KeywordSelection;
use super::properties::{ShaderProperty, properties};
use crate::resources::{BicubicRescalingMode, CameraBufferSettings, FxaaSettings, PostFxSettings};
use crate::scene::camera::Camera;

/// Passes of the post-FX program, in program order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostFxPass {
    BloomHorizontal,
    BloomVertical,
    BloomAdd,
    BloomScatter,
    BloomFinal,
    BloomPrefilter,
    BloomPrefilterFadeFireflies,
    ApplyColorGrading,
    ApplyColorGradingWithLuma,
    FinalRescale,
    Fxaa,
    FxaaWithLuma,
}

impl PostFxPass {
    /// Pass index inside the post-FX program.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self as u32
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BloomHorizontal => "Bloom Horizontal",
            Self::BloomVertical => "Bloom Vertical",
            Self::BloomAdd => "Bloom Add",
            Self::BloomScatter => "Bloom Scatter",
            Self::BloomFinal => "Bloom Final",
            Self::BloomPrefilter => "Bloom Prefilter",
            Self::BloomPrefilterFadeFireflies => "Bloom Prefilter Fade Fireflies",
            Self::ApplyColorGrading => "Apply Color Grading",
            Self::ApplyColorGradingWithLuma => "Apply Color Grading With Luma",
            Self::FinalRescale => "Final Rescale",
            Self::Fxaa => "FXAA",
            Self::FxaaWithLuma => "FXAA With Luma",
        }
    }

    #[must_use]
    pub const fn all() -> &'static [PostFxPass] {
        &[
            Self::BloomHorizontal,
            Self::BloomVertical,
            Self::BloomAdd,
            Self::BloomScatter,
            Self::BloomFinal,
            Self::BloomPrefilter,
            Self::BloomPrefilterFadeFireflies,
            Self::ApplyColorGrading,
            Self::ApplyColorGradingWithLuma,
            Self::FinalRescale,
            Self::Fxaa,
            Self::FxaaWithLuma,
        ]
    }
}

/// What the stack did for one camera.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostFxReport {
    pub bloom: Option<BloomReport>,
    /// The LUT was re-baked (as opposed to reused).
    pub lut_baked: bool,
    pub fxaa: bool,
    /// A final rescale blit ran.
    pub rescaled: bool,
    pub bicubic: bool,
}

/// Post-processing stack bound to one camera at a time.
pub struct PostFxStack {
    program: ProgramHandle,
    settings: Option<PostFxSettings>,
    camera_origin: UVec2,
    camera_size: UVec2,
    buffer_size: UVec2,
    use_hdr: bool,
    lut_resolution: u32,
    bicubic_rescaling: BicubicRescalingMode,
    fxaa: FxaaSettings,
    lut_cache: LutCache,
}

impl PostFxStack {
    #[must_use]
    pub fn new(program: ProgramHandle) -> Self {
        Self {
            program,
            settings: None,
            camera_origin: UVec2::ZERO,
            camera_size: UVec2::ONE,
            buffer_size: UVec2::ONE,
            use_hdr: false,
            lut_resolution: 32,
            bicubic_rescaling: BicubicRescalingMode::Off,
            fxaa: FxaaSettings::default(),
            lut_cache: LutCache::new(),
        }
    }

    /// Binds the stack to a camera.
    ///
    /// Settings are dropped for camera types that do not support post FX.
    #[allow(clippy::too_many_arguments)]
    pub fn setup(
        &mut self,
        ctx: &mut FrameContext<'_>,
        camera: &Camera,
        buffer_size: UVec2,
        settings: Option<&PostFxSettings>,
        use_hdr: bool,
        lut_resolution: u32,
        buffer_settings: &CameraBufferSettings,
    ) {
        self.camera_origin = UVec2::new(camera.pixel_x, camera.pixel_y);
        self.camera_size = UVec2::new(camera.pixel_width, camera.pixel_height).max(UVec2::ONE);
        self.buffer_size = buffer_size.max(UVec2::ONE);
        self.use_hdr = use_hdr;
        self.lut_resolution = lut_resolution;
        self.bicubic_rescaling = buffer_settings.bicubic_rescaling;
        self.fxaa = buffer_settings.fxaa.clone();
        self.settings = if camera.supports_post_fx() {
            settings.cloned()
        } else {
            None
        };

        let banding = self.settings.as_ref().is_some_and(|s| s.lut_banding);
        ctx.host.set_keyword(KeywordSelection::LutBanding(banding));
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.settings.is_some()
    }

    #[inline]
    #[must_use]
    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    #[inline]
    #[must_use]
    pub fn lut_cache(&self) -> &LutCache {
        &self.lut_cache
    }

    /// Runs the stack on `source`, ending on the camera target.
    pub fn render(&mut self, ctx: &mut FrameContext<'_>, source: ShaderProperty) -> PostFxReport {
        let Some(settings) = self.settings.take() else {
            log::warn!("PostFxStack: render called without settings, skipping");
            return PostFxReport::default();
        };
        let p = properties();
        ctx.host.begin_sample("Post FX");

        let source = RenderTarget::Temporary(source);
        let bloom = self.draw_bloom(ctx, &settings.bloom, source);
        let graded_source = if bloom.is_some() {
            RenderTarget::Temporary(p.bloom_result)
        } else {
            source
        };

        let mut report = self.apply_color_grading(ctx, &settings, graded_source);
        report.bloom = bloom;
        if bloom.is_some() {
            ctx.release_temporary(p.bloom_result);
        }

        ctx.host.end_sample("Post FX");
        self.settings = Some(settings);
        report
    }

    fn draw(&self, ctx: &mut FrameContext<'_>, from: RenderTarget, to: RenderTarget, pass: PostFxPass) {
        ctx.host
            .set_global_texture(properties().post_fx_source, from);
        ctx.host
            .set_render_target(Attachment::new(to, LoadAction::DontCare), None);
        ctx.host.draw_fullscreen(self.program, pass.index());
    }

    fn draw_final(&self, ctx: &mut FrameContext<'_>, from: RenderTarget, pass: PostFxPass) {
        ctx.host
            .set_global_texture(properties().post_fx_source, from);
        ctx.host.set_render_target(
            Attachment::new(RenderTarget::CameraTarget, LoadAction::DontCare),
            None,
        );
        ctx.host.set_viewport(Viewport::new(
            self.camera_origin.x as f32,
            self.camera_origin.y as f32,
            self.camera_size.x as f32,
            self.camera_size.y as f32,
        ));
        ctx.host.draw_fullscreen(self.program, pass.index());
    }
}
