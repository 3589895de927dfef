//! Camera description supplied by the host for one frame.

use glam::Mat4;

/// Kind of camera, ordered so that anything above [`CameraType::SceneView`]
/// skips post-processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum CameraType {
    /// A gameplay camera.
    #[default]
    Game,
    /// The editor scene view.
    SceneView,
    /// Asset preview thumbnails.
    Preview,
    /// Reflection probe capture.
    Reflection,
}

/// What a camera clears before drawing, ordered from most to least clearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ClearFlags {
    /// Clear depth and draw the skybox as background.
    #[default]
    Skybox,
    /// Clear depth and color to the background color.
    Color,
    /// Clear depth only.
    Depth,
    /// Clear nothing.
    Nothing,
}

/// A camera to render this frame.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Label used for debug groups and logs.
    pub name: String,
    pub camera_type: CameraType,
    /// Left edge of the camera's pixel rect on its target.
    pub pixel_x: u32,
    /// Top edge of the camera's pixel rect on its target.
    pub pixel_y: u32,
    /// Native target width in pixels.
    pub pixel_width: u32,
    /// Native target height in pixels.
    pub pixel_height: u32,
    pub near_clip_plane: f32,
    pub far_clip_plane: f32,
    pub clear_flags: ClearFlags,
    /// Background color in gamma space.
    pub background_color: wgpu::Color,
    /// Whether this camera wants an HDR buffer.
    pub allow_hdr: bool,
    /// World-to-view transform.
    pub view_matrix: Mat4,
    /// View-to-clip transform.
    pub projection_matrix: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            name: String::from("Camera"),
            camera_type: CameraType::Game,
            pixel_x: 0,
            pixel_y: 0,
            pixel_width: 1920,
            pixel_height: 1080,
            near_clip_plane: 0.3,
            far_clip_plane: 1000.0,
            clear_flags: ClearFlags::Skybox,
            background_color: wgpu::Color::BLACK,
            allow_hdr: true,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::perspective_rh(
                60f32.to_radians(),
                1920.0 / 1080.0,
                0.3,
                1000.0,
            ),
        }
    }
}

impl Camera {
    /// Creates a game camera with the given native size.
    #[must_use]
    pub fn new(name: impl Into<String>, pixel_width: u32, pixel_height: u32) -> Self {
        let aspect = pixel_width.max(1) as f32 / pixel_height.max(1) as f32;
        let mut camera = Self {
            name: name.into(),
            pixel_width,
            pixel_height,
            ..Self::default()
        };
        camera.projection_matrix = Mat4::perspective_rh(
            60f32.to_radians(),
            aspect,
            camera.near_clip_plane,
            camera.far_clip_plane,
        );
        camera
    }

    /// Whether post-processing may run for this camera type.
    #[inline]
    #[must_use]
    pub fn supports_post_fx(&self) -> bool {
        self.camera_type <= CameraType::SceneView
    }
}
