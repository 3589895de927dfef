//! Prism — a forward render pipeline core.
//!
//! Prism decides, per frame and per camera, what is drawn, how it is lit,
//! how shadows are produced and how the final image is post-processed. It
//! never touches a GPU directly: every draw, temporary render target and
//! global uniform goes through the [`RenderHost`](renderer::host::RenderHost)
//! trait implemented by the embedding engine.
//!
//! # Layout
//!
//! - [`resources`]: pure configuration data (shadow, bloom, color grading,
//!   tone mapping, FXAA and camera buffer settings).
//! - [`scene`]: per-frame inputs supplied by the host (cameras, visible lights).
//! - [`renderer`]: the pipeline proper — shadow atlases, light packing, the
//!   post-processing stack, the camera renderer and the frame driver.
//! - [`utils`]: string interning for shader property names and color space helpers.
//!
//! # Usage
//!
//! ```rust,ignore
//! use prism::prelude::*;
//!
//! let mut host = RecordingHost::new();
//! let settings = PipelineSettings::default();
//! let mut pipeline = RenderPipeline::new(&mut host, &settings)?;
//! let report = pipeline.render_frame(&mut host, &[camera], &settings)?;
//! pipeline.dispose(&mut host);
//! ```

pub mod errors;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod utils;

pub use errors::{PrismError, Result};
pub use renderer::pipeline::{CameraOutcome, FrameReport, RenderPipeline, SkipReason};
pub use renderer::settings::PipelineSettings;

/// Commonly used types, re-exported for convenience.
pub mod prelude {
    pub use crate::errors::{PrismError, Result};
    pub use crate::renderer::host::RenderHost;
    pub use crate::renderer::pipeline::{CameraOutcome, FrameReport, RenderPipeline, SkipReason};
    pub use crate::renderer::recording::RecordingHost;
    pub use crate::renderer::settings::PipelineSettings;
    pub use crate::resources::{
        BicubicRescalingMode, BloomMode, BloomSettings, CameraBufferSettings, CascadeBlendMode,
        FxaaQuality, FxaaSettings, PostFxSettings, ShadowFilter, ShadowSettings,
        ToneMappingMode,
    };
    pub use crate::scene::camera::{Camera, CameraType, ClearFlags};
    pub use crate::scene::light::{LightShadows, LightType, VisibleLight};
}
