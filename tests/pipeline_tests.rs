//! Camera Renderer & Pipeline Tests
//!
//! Tests for:
//! - Direct-to-target rendering without intermediate buffers
//! - Attachment copies (direct and shader fallback)
//! - Camera skipping (empty viewport, culling failure)
//! - Clear flag handling and the skybox
//! - Pipeline construction failures and disposal
//! - Settings changes between frames

use glam::{UVec2, Vec3, Vec4};

use prism::prelude::*;
use prism::renderer::host::{
    LoadAction, PerObjectData, ProgramKind, RenderQueueRange, RenderTarget, SortingCriteria,
};
use prism::renderer::properties::properties;
use prism::renderer::recording::Command;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn render_one(
    host: &mut RecordingHost,
    camera: &Camera,
    settings: &PipelineSettings,
) -> CameraOutcome {
    let mut pipeline = RenderPipeline::new(host, settings).expect("pipeline");
    let report = pipeline
        .render_frame(host, std::slice::from_ref(camera), settings)
        .expect("frame");
    pipeline.dispose(host);
    report.cameras[0].1.clone()
}

fn assert_clean(host: &RecordingHost) {
    assert!(host.protocol_errors().is_empty(), "{:?}", host.protocol_errors());
    assert!(host.live_temporaries().is_empty());
}

fn fullscreen_passes(host: &RecordingHost) -> Vec<u32> {
    host.commands()
        .iter()
        .filter_map(|c| match c {
            Command::DrawFullscreen { pass, .. } => Some(*pass),
            _ => None,
        })
        .collect()
}

/// The camera clear (the first clear recorded after camera setup).
fn camera_clear(host: &RecordingHost) -> (bool, bool, wgpu::Color) {
    host.commands()
        .iter()
        .skip_while(|c| !matches!(c, Command::SetupCamera(_)))
        .find_map(|c| match c {
            Command::Clear {
                depth,
                color,
                value,
            } => Some((*depth, *color, *value)),
            _ => None,
        })
        .expect("camera clear recorded")
}

// ============================================================================
// Geometry Path
// ============================================================================

#[test]
fn unscaled_camera_without_copies_draws_to_target() {
    init();
    let mut host = RecordingHost::new();
    let camera = Camera::new("Main", 1280, 720);

    let outcome = render_one(&mut host, &camera, &PipelineSettings::default());

    let stats = outcome.stats().expect("rendered");
    assert!(!stats.intermediate);
    assert!(!stats.scaled);
    assert!(stats.post_fx.is_none());
    assert_eq!(stats.leaked_targets, 0);

    let p = properties();
    assert!(
        host.allocations()
            .iter()
            .all(|(id, _)| *id != p.camera_color_attachment && *id != p.camera_depth_attachment)
    );
    assert!(fullscreen_passes(&host).is_empty());
    assert_eq!(host.count(|c| matches!(c, Command::DrawSkybox)), 1);
    assert_eq!(host.count(|c| matches!(c, Command::DrawRenderers(..))), 2);
    assert_eq!(host.submits(), 1);
    assert_clean(&host);
}

#[test]
fn opaque_then_transparent_with_lights_per_object() {
    init();
    let mut host = RecordingHost::new();
    let camera = Camera::new("Main", 640, 480);

    render_one(&mut host, &camera, &PipelineSettings::default());

    let draws: Vec<_> = host
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::DrawRenderers(drawing, filtering) => Some((drawing.clone(), *filtering)),
            _ => None,
        })
        .collect();
    assert_eq!(draws[0].1.queue, RenderQueueRange::Opaque);
    assert_eq!(draws[0].0.sorting, SortingCriteria::CommonOpaque);
    assert_eq!(draws[1].1.queue, RenderQueueRange::Transparent);
    assert_eq!(draws[1].0.sorting, SortingCriteria::CommonTransparent);
    assert!(
        draws[0]
            .0
            .per_object_data
            .contains(PerObjectData::LIGHT_DATA | PerObjectData::LIGHT_INDICES)
    );
}

#[test]
fn missing_texture_is_bound_when_nothing_is_copied() {
    init();
    let mut host = RecordingHost::new();
    let settings = PipelineSettings::default();
    let mut pipeline = RenderPipeline::new(&mut host, &settings).expect("pipeline");
    pipeline
        .render_frame(&mut host, &[Camera::new("Main", 64, 64)], &settings)
        .expect("frame");

    let p = properties();
    let bound = host.global_texture(p.camera_color_texture);
    assert!(matches!(bound, Some(RenderTarget::Texture(_))), "{bound:?}");
    assert_eq!(bound, host.global_texture(p.camera_depth_texture));
    pipeline.dispose(&mut host);
}

#[test]
fn scaled_camera_publishes_buffer_size_and_copies_to_target() {
    init();
    let mut host = RecordingHost::new();
    let mut settings = PipelineSettings::default();
    settings.camera_buffer.set_render_scale(0.5);
    let camera = Camera::new("Main", 1920, 1080);

    let outcome = render_one(&mut host, &camera, &settings);

    let stats = outcome.stats().expect("rendered");
    assert!(stats.scaled && stats.intermediate);
    assert_eq!(stats.buffer_size, UVec2::new(960, 540));
    assert_eq!(
        host.global_vector(properties().camera_buffer_size),
        Some(Vec4::new(1.0 / 960.0, 1.0 / 540.0, 960.0, 540.0))
    );
    assert_eq!(fullscreen_passes(&host), vec![0]);

    // The final copy covers the whole camera.
    let final_viewport = host
        .commands()
        .iter()
        .rev()
        .find_map(|c| match c {
            Command::SetViewport(v) => Some(*v),
            _ => None,
        })
        .expect("viewport");
    assert_eq!((final_viewport.width, final_viewport.height), (1920.0, 1080.0));
    assert_clean(&host);
}

#[test]
fn final_copy_keeps_camera_rect_origin() {
    init();
    let mut host = RecordingHost::new();
    let mut settings = PipelineSettings::default();
    settings.camera_buffer.set_render_scale(0.5);
    let mut camera = Camera::new("Inset", 800, 600);
    camera.pixel_x = 320;
    camera.pixel_y = 240;

    let _ = render_one(&mut host, &camera, &settings);

    let final_viewport = host
        .commands()
        .iter()
        .rev()
        .find_map(|c| match c {
            Command::SetViewport(v) => Some(*v),
            _ => None,
        })
        .expect("viewport");
    assert_eq!((final_viewport.x, final_viewport.y), (320.0, 240.0));
    assert_eq!((final_viewport.width, final_viewport.height), (800.0, 600.0));
    assert_clean(&host);
}

// ============================================================================
// Attachment Copies
// ============================================================================

#[test]
fn direct_copies_when_supported() {
    init();
    let mut host = RecordingHost::new();
    let mut settings = PipelineSettings::default();
    settings.camera_buffer.copy_color = true;
    settings.camera_buffer.copy_depth = true;

    let outcome = render_one(&mut host, &Camera::new("Main", 800, 600), &settings);

    let stats = outcome.stats().expect("rendered");
    assert!(stats.copied_color && stats.copied_depth && stats.intermediate);
    assert_eq!(host.count(|c| matches!(c, Command::CopyTexture { .. })), 2);
    // Only the final copy to the camera target uses the copy program.
    assert_eq!(fullscreen_passes(&host), vec![0]);
    assert_clean(&host);
}

#[test]
fn shader_copies_restore_attachments() {
    init();
    let mut host = RecordingHost::new();
    host.copy_supported = false;
    let mut settings = PipelineSettings::default();
    settings.camera_buffer.copy_color = true;
    settings.camera_buffer.copy_depth = true;

    render_one(&mut host, &Camera::new("Main", 800, 600), &settings);

    assert_eq!(host.count(|c| matches!(c, Command::CopyTexture { .. })), 0);
    assert_eq!(fullscreen_passes(&host), vec![0, 1, 0]);

    let p = properties();
    let restored = host.commands().iter().any(|c| {
        matches!(
            c,
            Command::SetRenderTarget { color, depth: Some(depth) }
                if color.target == RenderTarget::Temporary(p.camera_color_attachment)
                    && color.load == LoadAction::Load
                    && depth.load == LoadAction::Load
        )
    });
    assert!(restored, "attachments should be re-bound with Load after shader copies");
    assert_clean(&host);
}

#[test]
fn reflection_cameras_use_reflection_copy_flags() {
    init();
    let mut settings = PipelineSettings::default();
    settings.camera_buffer.copy_color = false;
    settings.camera_buffer.copy_color_reflection = true;

    let mut host = RecordingHost::new();
    let mut probe = Camera::new("Probe", 128, 128);
    probe.camera_type = CameraType::Reflection;
    let outcome = render_one(&mut host, &probe, &settings);
    assert!(outcome.stats().expect("rendered").copied_color);

    let mut host = RecordingHost::new();
    let outcome = render_one(&mut host, &Camera::new("Main", 128, 128), &settings);
    assert!(!outcome.stats().expect("rendered").copied_color);
}

// ============================================================================
// Clear Flags
// ============================================================================

#[test]
fn intermediate_buffer_promotes_depth_clear_to_color() {
    init();
    let mut settings = PipelineSettings::default();
    settings.camera_buffer.copy_depth = true;
    let mut camera = Camera::new("Main", 320, 240);
    camera.clear_flags = ClearFlags::Depth;
    camera.background_color = wgpu::Color {
        r: 0.5,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    let mut host = RecordingHost::new();
    let _ = render_one(&mut host, &camera, &settings);

    let (depth, color, value) = camera_clear(&host);
    assert!(depth && color);
    // Background colors are converted to linear space.
    assert!(value.r < 0.5 && value.r > 0.2, "{value:?}");
    assert_eq!(host.count(|c| matches!(c, Command::DrawSkybox)), 0);
}

#[test]
fn depth_only_clear_on_camera_target() {
    init();
    let mut camera = Camera::new("Overlay", 320, 240);
    camera.clear_flags = ClearFlags::Depth;

    let mut host = RecordingHost::new();
    render_one(&mut host, &camera, &PipelineSettings::default());

    let (depth, color, _) = camera_clear(&host);
    assert!(depth && !color);
}

#[test]
fn nothing_clear_flag_clears_nothing() {
    init();
    let mut camera = Camera::new("Overlay", 320, 240);
    camera.clear_flags = ClearFlags::Nothing;

    let mut host = RecordingHost::new();
    render_one(&mut host, &camera, &PipelineSettings::default());

    let (depth, color, _) = camera_clear(&host);
    assert!(!depth && !color);
}

// ============================================================================
// Post FX Through The Pipeline
// ============================================================================

#[test]
fn post_fx_renders_and_releases_everything() {
    init();
    let mut settings = PipelineSettings::default();
    settings.post_fx = Some(PostFxSettings::default());
    settings.camera_buffer.fxaa.enabled = true;

    let mut host = RecordingHost::new();
    host.set_lights(vec![
        VisibleLight::directional(Vec3::new(0.2, -1.0, 0.1), Vec3::ONE)
            .with_shadows(LightShadows::Soft, 1.0),
    ]);
    let outcome = render_one(&mut host, &Camera::new("Main", 1280, 720), &settings);

    let stats = outcome.stats().expect("rendered");
    let report = stats.post_fx.expect("post fx ran");
    assert!(report.bloom.is_some());
    assert!(report.lut_baked && report.fxaa);
    assert!(stats.intermediate);
    assert_eq!(stats.leaked_targets, 0);
    assert_eq!(stats.lighting.shadowed_directional, 1);
    assert_clean(&host);
}

#[test]
fn lut_is_baked_once_across_frames() {
    init();
    let mut settings = PipelineSettings::default();
    settings.post_fx = Some(PostFxSettings::default());

    let mut host = RecordingHost::new();
    let mut pipeline = RenderPipeline::new(&mut host, &settings).expect("pipeline");
    let cameras = [Camera::new("Main", 640, 360)];
    for _ in 0..3 {
        pipeline
            .render_frame(&mut host, &cameras, &settings)
            .expect("frame");
    }

    assert_eq!(pipeline.camera_renderer().post_fx().lut_cache().bake_count(), 1);
    assert_eq!(pipeline.frame_index(), 3);
    pipeline.dispose(&mut host);
    assert_clean(&host);
}

// ============================================================================
// Skipped Cameras
// ============================================================================

#[test]
fn failed_culling_skips_only_that_camera() {
    init();
    let mut host = RecordingHost::new();
    host.fail_culling_for("Broken");
    let settings = PipelineSettings::default();
    let mut pipeline = RenderPipeline::new(&mut host, &settings).expect("pipeline");

    let cameras = [
        Camera::new("Main", 320, 240),
        Camera::new("Broken", 320, 240),
        Camera::new("Minimap", 128, 128),
    ];
    let report = pipeline
        .render_frame(&mut host, &cameras, &settings)
        .expect("frame");

    assert_eq!(report.rendered_count(), 2);
    assert_eq!(report.skipped_count(), 1);
    assert_eq!(
        report.outcome("Broken"),
        Some(&CameraOutcome::Skipped(SkipReason::CullingFailed))
    );
    assert!(report.outcome("Minimap").is_some_and(CameraOutcome::is_rendered));
    assert_eq!(host.submits(), 2);
    pipeline.dispose(&mut host);
    assert_clean(&host);
}

#[test]
fn empty_viewport_is_skipped() {
    init();
    let mut host = RecordingHost::new();
    let camera = Camera::new("Collapsed", 0, 240);

    let outcome = render_one(&mut host, &camera, &PipelineSettings::default());

    assert_eq!(outcome, CameraOutcome::Skipped(SkipReason::EmptyViewport));
    assert_eq!(host.submits(), 0);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn program_failure_destroys_partial_objects() {
    init();
    let mut host = RecordingHost::new();
    host.fail_program(ProgramKind::CameraCopy);

    let result = RenderPipeline::new(&mut host, &PipelineSettings::default());

    assert!(matches!(
        result,
        Err(PrismError::ProgramCreateFailed(name)) if name == ProgramKind::CameraCopy.name()
    ));
    assert_eq!(host.live_programs(), 0);
    assert!(host.protocol_errors().is_empty());
}

#[test]
fn texture_failure_destroys_programs() {
    init();
    let mut host = RecordingHost::new();
    host.fail_textures();

    let result = RenderPipeline::new(&mut host, &PipelineSettings::default());

    assert!(matches!(result, Err(PrismError::TextureCreateFailed(_))));
    assert_eq!(host.live_programs(), 0);
}

#[test]
fn dispose_releases_owned_objects() {
    init();
    let mut host = RecordingHost::new();
    let pipeline = RenderPipeline::new(&mut host, &PipelineSettings::default()).expect("pipeline");
    assert_eq!(host.live_programs(), 2);
    assert_eq!(host.live_textures(), 1);

    pipeline.dispose(&mut host);

    assert_eq!(host.live_programs(), 0);
    assert_eq!(host.live_textures(), 0);
    assert!(host.protocol_errors().is_empty());
}

#[test]
fn invalid_settings_are_rejected() {
    init();
    let mut host = RecordingHost::new();
    let mut settings = PipelineSettings::default();
    settings.color_lut_resolution = 12;

    assert!(RenderPipeline::new(&mut host, &settings).is_err());
    assert_eq!(host.live_programs(), 0);

    let valid = PipelineSettings::default();
    let mut pipeline = RenderPipeline::new(&mut host, &valid).expect("pipeline");
    let result = pipeline.render_frame(&mut host, &[Camera::new("Main", 64, 64)], &settings);
    assert!(matches!(
        result,
        Err(PrismError::InvalidSetting {
            field: "color_lut_resolution",
            ..
        })
    ));
    pipeline.dispose(&mut host);
}

#[test]
fn srp_batching_follows_settings() {
    init();
    let mut host = RecordingHost::new();
    let mut settings = PipelineSettings::default();
    let mut pipeline = RenderPipeline::new(&mut host, &settings).expect("pipeline");
    assert!(host.srp_batching());

    settings.use_srp_batcher = false;
    pipeline
        .render_frame(&mut host, &[Camera::new("Main", 64, 64)], &settings)
        .expect("frame");
    assert!(!host.srp_batching());
    pipeline.dispose(&mut host);
}

#[test]
fn settings_document_drives_a_frame() {
    init();
    let settings = PipelineSettings::from_json(
        r#"{
            "version": 1,
            "use_lights_per_object": false,
            "post_fx": { "tone_mapping": "Aces" },
            "camera_buffer": { "allow_hdr": false }
        }"#,
    )
    .expect("valid settings");

    let mut host = RecordingHost::new();
    let outcome = render_one(&mut host, &Camera::new("Main", 200, 100), &settings);

    let stats = outcome.stats().expect("rendered");
    assert!(!stats.use_hdr);
    assert!(stats.post_fx.is_some());
    assert!(host.light_index_map().is_empty());
    assert_clean(&host);
}
