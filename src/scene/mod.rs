//! Per-frame scene inputs supplied by the host.

pub mod camera;
pub mod light;

pub use camera::{Camera, CameraType, ClearFlags};
pub use light::{LightShadowParams, LightShadows, LightType, VisibleLight};
