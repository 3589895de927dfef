//! Render pipeline core.
//!
//! # Architecture
//!
//! ```text
//! RenderPipeline ──► CameraRenderer ──┬─► Lighting ──► Shadows
//!                                     ├─► draw opaque / skybox / copies / transparent
//!                                     └─► PostFxStack (bloom, LUT, FXAA, rescale)
//! ```
//!
//! Every subsystem records through a [`FrameContext`](context::FrameContext),
//! which pairs the [`RenderHost`](host::RenderHost) with the transient target
//! ledger of the current camera.

pub mod camera_renderer;
pub mod context;
pub mod host;
pub mod keywords;
pub mod lighting;
pub mod pipeline;
pub mod post;
pub mod properties;
pub mod recording;
pub mod settings;
pub mod shadows;
pub mod transient;
