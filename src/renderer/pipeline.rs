//! Frame Driver
//!
//! [`RenderPipeline`] owns the GPU objects that outlive a frame (the post-FX
//! program, the camera copy program and the 1×1 "missing" texture) and walks
//! the frame's cameras in order.
//!
//! # Lifecycle
//!
//! ```text
//! new(host, settings) ──► render_frame(host, cameras, settings) ... ──► dispose(host)
//! ```
//!
//! Construction and settings validation are the only fallible steps. A camera
//! that cannot be rendered is reported as [`CameraOutcome::Skipped`] and the
//! remaining cameras still render.

use super::camera_renderer::{CameraRenderer, CameraStats};
use super::host::{ProgramHandle, ProgramKind, RenderHost, TextureHandle};
use super::settings::PipelineSettings;
use crate::errors::{PrismError, Result};
use crate::scene::camera::Camera;

/// Fill color of the texture bound where a camera copy is missing.
const MISSING_TEXTURE_COLOR: wgpu::Color = wgpu::Color {
    r: 0.5,
    g: 0.5,
    b: 0.5,
    a: 0.5,
};

/// Why a camera was not rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The camera has a zero-sized pixel rect.
    EmptyViewport,
    /// The host could not produce culling parameters.
    CullingFailed,
}

/// Result of rendering one camera.
#[derive(Debug, Clone, PartialEq)]
pub enum CameraOutcome {
    Rendered(CameraStats),
    Skipped(SkipReason),
}

impl CameraOutcome {
    #[inline]
    #[must_use]
    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered(_))
    }

    #[inline]
    #[must_use]
    pub fn stats(&self) -> Option<&CameraStats> {
        match self {
            Self::Rendered(stats) => Some(stats),
            Self::Skipped(_) => None,
        }
    }
}

/// Per-camera outcomes of one frame, in camera order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub frame_index: u64,
    pub cameras: Vec<(String, CameraOutcome)>,
}

impl FrameReport {
    #[must_use]
    pub fn rendered_count(&self) -> usize {
        self.cameras.iter().filter(|(_, o)| o.is_rendered()).count()
    }

    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.cameras.len() - self.rendered_count()
    }

    /// Outcome of the first camera with the given name.
    #[must_use]
    pub fn outcome(&self, name: &str) -> Option<&CameraOutcome> {
        self.cameras
            .iter()
            .find(|(camera, _)| camera == name)
            .map(|(_, outcome)| outcome)
    }
}

/// The pipeline entry point.
pub struct RenderPipeline {
    post_fx_program: ProgramHandle,
    copy_program: ProgramHandle,
    missing_texture: TextureHandle,
    renderer: CameraRenderer,
    srp_batching: bool,
    frame_index: u64,
}

impl RenderPipeline {
    /// Validates `settings` and creates the pipeline-owned GPU objects.
    ///
    /// Objects created before a failure are destroyed again.
    pub fn new(host: &mut dyn RenderHost, settings: &PipelineSettings) -> Result<Self> {
        settings.validate()?;

        let post_fx_program = host
            .create_program(ProgramKind::PostFxStack)
            .ok_or(PrismError::ProgramCreateFailed(ProgramKind::PostFxStack.name()))?;

        let Some(copy_program) = host.create_program(ProgramKind::CameraCopy) else {
            host.destroy_program(post_fx_program);
            return Err(PrismError::ProgramCreateFailed(ProgramKind::CameraCopy.name()));
        };

        let Some(missing_texture) = host.create_solid_texture("Missing", 1, 1, MISSING_TEXTURE_COLOR)
        else {
            host.destroy_program(copy_program);
            host.destroy_program(post_fx_program);
            return Err(PrismError::TextureCreateFailed("Missing"));
        };

        host.set_srp_batching(settings.use_srp_batcher);
        log::debug!(
            "RenderPipeline: created (post fx {post_fx_program:?}, copy {copy_program:?}, missing {missing_texture:?})"
        );

        Ok(Self {
            post_fx_program,
            copy_program,
            missing_texture,
            renderer: CameraRenderer::new(post_fx_program, copy_program, missing_texture),
            srp_batching: settings.use_srp_batcher,
            frame_index: 0,
        })
    }

    #[inline]
    #[must_use]
    pub fn camera_renderer(&self) -> &CameraRenderer {
        &self.renderer
    }

    #[inline]
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Renders every camera in order.
    pub fn render_frame(
        &mut self,
        host: &mut dyn RenderHost,
        cameras: &[Camera],
        settings: &PipelineSettings,
    ) -> Result<FrameReport> {
        settings.validate()?;

        if settings.use_srp_batcher != self.srp_batching {
            host.set_srp_batching(settings.use_srp_batcher);
            self.srp_batching = settings.use_srp_batcher;
        }

        let mut report = FrameReport {
            frame_index: self.frame_index,
            cameras: Vec::with_capacity(cameras.len()),
        };
        for camera in cameras {
            let outcome = self.renderer.render(host, camera, settings);
            if let CameraOutcome::Skipped(reason) = outcome {
                log::debug!("RenderPipeline: camera '{}' skipped ({reason:?})", camera.name);
            }
            report.cameras.push((camera.name.clone(), outcome));
        }

        self.frame_index += 1;
        Ok(report)
    }

    /// Releases the pipeline-owned GPU objects.
    pub fn dispose(self, host: &mut dyn RenderHost) {
        host.destroy_program(self.post_fx_program);
        host.destroy_program(self.copy_program);
        host.destroy_texture(self.missing_texture);
        log::debug!("RenderPipeline: disposed after {} frames", self.frame_index);
    }
}
