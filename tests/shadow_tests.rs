//! Shadow Atlas Tests
//!
//! Tests for:
//! - Tile split selection and integer tile sizes
//! - Non-overlapping tile rectangles
//! - Atlas matrix remapping into tile UV bounds
//! - Directional cascade reservation and rendering
//! - Other-atlas capacity with point lights (all-or-nothing)
//! - Baked-only fallback and shadow mask keywords
//! - Slots cleared when a light yields no shadow matrices

use glam::{Mat4, Vec3, Vec4};

use prism::renderer::context::FrameContext;
use prism::renderer::host::{CullingResults, RenderHost, TemporaryTargetDesc, Viewport};
use prism::renderer::keywords::{KeywordGroup, KeywordSelection};
use prism::renderer::lighting::Lighting;
use prism::renderer::properties::properties;
use prism::renderer::recording::{Command, RecordingHost};
use prism::renderer::shadows::atlas::{AtlasLayout, convert_to_atlas_matrix, split_for_tiles};
use prism::renderer::shadows::{
    MAX_SHADOWED_OTHER_LIGHTS, POINT_LIGHT_TILES, ShadowPhase, Shadows,
};
use prism::renderer::transient::TransientTargets;
use prism::resources::{ShadowMaskMode, ShadowSettings};
use prism::scene::camera::Camera;
use prism::scene::light::{
    LightBakingOutput, LightShadows, LightmapBakeType, MixedLightingMode, VisibleLight,
};

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn culled_host(lights: Vec<VisibleLight>) -> (RecordingHost, CullingResults) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut host = RecordingHost::new();
    host.set_lights(lights);
    let camera = Camera::new("Main", 1280, 720);
    let parameters = host
        .try_get_culling_parameters(&camera)
        .expect("camera can be culled");
    let culling = host.cull(&parameters);
    (host, culling)
}

fn shadowed_sun() -> VisibleLight {
    VisibleLight::directional(Vec3::new(-0.3, -1.0, -0.2), Vec3::ONE)
        .with_shadows(LightShadows::Soft, 1.0)
}

fn shadowed_point(i: usize) -> VisibleLight {
    VisibleLight::point(Vec3::new(i as f32 * 2.0, 1.0, 0.0), 4.0, Vec3::ONE)
        .with_shadows(LightShadows::Hard, 0.8)
}

fn shadow_viewports(host: &RecordingHost) -> Vec<Viewport> {
    host.commands()
        .iter()
        .filter_map(|c| match c {
            Command::SetViewport(v) => Some(*v),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Atlas Layout
// ============================================================================

#[test]
fn split_selection_is_monotonic() {
    assert_eq!(split_for_tiles(1), 1);
    assert_eq!(split_for_tiles(4), 2);
    assert_eq!(split_for_tiles(5), 4);
    assert_eq!(split_for_tiles(16), 4);

    let mut previous = 0;
    for tiles in 1..=16 {
        let split = split_for_tiles(tiles);
        assert!(split >= previous, "split decreased at {tiles} tiles");
        assert!(split * split >= tiles, "{tiles} tiles do not fit a {split}x{split} grid");
        previous = split;
    }
}

#[test]
fn tile_size_is_an_exact_integer() {
    let mut size = 256;
    while size <= 8192 {
        for tiles in 1..=16 {
            let layout = AtlasLayout::new(size, tiles);
            assert!(layout.tile_size >= 1);
            assert_eq!(layout.tile_size * layout.split, size);
        }
        size *= 2;
    }
}

#[test]
fn tiles_never_overlap_and_stay_inside_atlas() {
    for tiles in 1..=16u32 {
        let layout = AtlasLayout::new(1024, tiles);
        let rects: Vec<_> = (0..tiles).map(|i| layout.tile(i).viewport).collect();
        for (i, a) in rects.iter().enumerate() {
            assert!(a.x >= 0.0 && a.y >= 0.0);
            assert!(a.x + a.width <= 1024.0 && a.y + a.height <= 1024.0);
            for b in &rects[i + 1..] {
                assert!(!a.overlaps(b), "{tiles} tiles: {a:?} overlaps {b:?}");
            }
        }
    }
}

#[test]
fn atlas_matrix_maps_clip_space_into_tile() {
    let view = Mat4::look_at_rh(Vec3::new(0.0, 5.0, 5.0), Vec3::ZERO, Vec3::Y);
    let projection = Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 20.0);
    let view_projection = projection * view;
    let inverse = view_projection.inverse();

    let layout = AtlasLayout::new(2048, 16);
    for index in [0, 5, 15] {
        let tile = layout.tile(index);
        let scale = layout.tile_scale();
        let atlas = convert_to_atlas_matrix(view_projection, tile.offset, scale, false);

        for clip in [
            Vec4::new(-1.0, -1.0, 0.2, 1.0),
            Vec4::new(1.0, 1.0, 0.9, 1.0),
            Vec4::new(0.3, -0.7, 0.5, 1.0),
        ] {
            let world = inverse * clip;
            let world = world / world.w;
            let uv = atlas * world;
            let uv = uv / uv.w;
            let min = tile.offset * scale;
            let max = min + scale;
            assert!(
                uv.x >= min.x - EPSILON && uv.x <= max.x + EPSILON,
                "tile {index}: u {} outside [{}, {}]",
                uv.x,
                min.x,
                max.x
            );
            assert!(uv.y >= min.y - EPSILON && uv.y <= max.y + EPSILON);
            assert!(uv.z >= -EPSILON && uv.z <= 1.0 + EPSILON);
        }
    }
}

// ============================================================================
// Directional Cascades
// ============================================================================

#[test]
fn one_directional_light_fills_four_cascade_tiles() {
    let (mut host, _) = culled_host(vec![shadowed_sun()]);
    let mut targets = TransientTargets::new();
    let mut shadows = Shadows::new();
    let settings = ShadowSettings::default();

    shadows.setup(&settings, false);
    let data = shadows.reserve_directional_shadows(&host, &shadowed_sun(), 0);
    assert!(data.is_realtime());
    assert!(approx(data.tile_index, 0.0));

    {
        let mut ctx = FrameContext::new(&mut host, &mut targets);
        shadows.render(&mut ctx);
    }

    let viewports = shadow_viewports(&host);
    assert_eq!(viewports.len(), 4);
    let origins: Vec<_> = viewports.iter().map(|v| (v.x, v.y, v.width)).collect();
    assert_eq!(
        origins,
        vec![
            (0.0, 0.0, 512.0),
            (512.0, 0.0, 512.0),
            (0.0, 512.0, 512.0),
            (512.0, 512.0, 512.0)
        ]
    );
    for (i, a) in viewports.iter().enumerate() {
        for b in &viewports[i + 1..] {
            assert!(!a.overlaps(b));
        }
    }
    assert_eq!(host.count(|c| matches!(c, Command::DrawShadows(_))), 4);

    let p = properties();
    assert_eq!(host.global_int(p.cascade_count), Some(4));
    assert_eq!(shadows.directional_matrices().len(), 4);
    assert_eq!(
        shadows.atlas_sizes(),
        Vec4::new(1024.0, 1.0 / 1024.0, 1.0, 1.0)
    );

    let spheres = shadows.cascade_culling_spheres();
    for pair in spheres.windows(2) {
        assert!(pair[0].w > 0.0);
        assert!(pair[1].w >= pair[0].w, "cascade spheres should grow outwards");
    }
}

#[test]
fn light_without_casters_is_baked_only() {
    let (mut host, _) = culled_host(vec![shadowed_sun()]);
    host.without_casters(0);
    let mut targets = TransientTargets::new();
    let mut shadows = Shadows::new();

    shadows.setup(&ShadowSettings::default(), false);
    let data = shadows.reserve_directional_shadows(&host, &shadowed_sun(), 0);
    assert!(data.strength < 0.0);
    assert_eq!(shadows.directional_count(), 0);

    {
        let mut ctx = FrameContext::new(&mut host, &mut targets);
        shadows.render(&mut ctx);
        shadows.cleanup(&mut ctx);
    }

    assert_eq!(host.count(|c| matches!(c, Command::DrawShadows(_))), 0);
    let dummy = TemporaryTargetDesc::shadow_atlas(1);
    let allocations = host.allocations();
    assert_eq!(allocations.len(), 2);
    assert!(allocations.iter().all(|(_, desc)| *desc == dummy));
    assert!(host.live_temporaries().is_empty());
    assert_eq!(shadows.phase(), ShadowPhase::Idle);
}

/// Runs one full shadow cycle for the lights the caller reserves.
fn shadow_frame(
    host: &mut RecordingHost,
    shadows: &mut Shadows,
    reserve: impl FnOnce(&mut Shadows, &RecordingHost),
) {
    let mut targets = TransientTargets::new();
    shadows.setup(&ShadowSettings::default(), false);
    reserve(shadows, host);
    let mut ctx = FrameContext::new(host, &mut targets);
    shadows.render(&mut ctx);
    shadows.cleanup(&mut ctx);
}

#[test]
fn missing_directional_matrices_clear_last_frames_cascades() {
    let (mut host, _) = culled_host(vec![shadowed_sun()]);
    let mut shadows = Shadows::new();
    let reserve = |shadows: &mut Shadows, host: &RecordingHost| {
        shadows.reserve_directional_shadows(host, &shadowed_sun(), 0);
    };

    shadow_frame(&mut host, &mut shadows, reserve);
    assert!(shadows.directional_matrices().iter().all(|m| *m != Mat4::ZERO));
    assert!(shadows.cascade_data()[0].x > 0.0);

    host.clear_commands();
    host.without_shadow_matrices(0);
    shadow_frame(&mut host, &mut shadows, reserve);

    assert_eq!(host.count(|c| matches!(c, Command::DrawShadows(_))), 0);
    assert!(shadows.directional_matrices().iter().all(|m| *m == Mat4::ZERO));
    assert!(shadows.cascade_data().iter().all(|d| *d == Vec4::ZERO));
    assert!(shadows.cascade_culling_spheres().iter().all(|s| *s == Vec4::ZERO));
}

#[test]
fn missing_point_matrices_clear_last_frames_tiles() {
    let (mut host, _) = culled_host(vec![shadowed_point(0)]);
    let mut shadows = Shadows::new();
    let reserve = |shadows: &mut Shadows, host: &RecordingHost| {
        shadows.reserve_other_shadows(host, &shadowed_point(0), 0);
    };

    shadow_frame(&mut host, &mut shadows, reserve);
    assert_eq!(shadows.other_tiles().len(), POINT_LIGHT_TILES);
    assert!(shadows.other_tiles().iter().all(|t| t.z > 0.0));

    host.clear_commands();
    host.without_shadow_matrices(0);
    shadow_frame(&mut host, &mut shadows, reserve);

    assert_eq!(host.count(|c| matches!(c, Command::DrawShadows(_))), 0);
    assert!(shadows.other_tiles().iter().all(|t| *t == Vec4::ZERO));
    assert!(shadows.other_matrices().iter().all(|m| *m == Mat4::ZERO));
    assert!(host.live_temporaries().is_empty());
}

// ============================================================================
// Other Atlas Capacity
// ============================================================================

#[test]
fn twenty_point_lights_keep_the_first_two_shadowed() {
    let lights: Vec<_> = (0..20).map(shadowed_point).collect();
    let (mut host, culling) = culled_host(lights);
    let mut targets = TransientTargets::new();
    let mut lighting = Lighting::new();

    let summary = {
        let mut ctx = FrameContext::new(&mut host, &mut targets);
        let summary = lighting.setup(&mut ctx, &culling, &ShadowSettings::default(), false);
        lighting.cleanup(&mut ctx);
        summary
    };

    assert_eq!(summary.other, 20);
    assert_eq!(summary.shadowed_other_tiles, 2 * POINT_LIGHT_TILES);
    assert!(summary.shadowed_other_tiles <= MAX_SHADOWED_OTHER_LIGHTS);

    let p = properties();
    let shadow_data = host
        .global_vectors(p.other_light_shadow_data)
        .expect("other lights uploaded");
    assert!(approx(shadow_data[0].x, 0.8) && approx(shadow_data[0].y, 0.0));
    assert!(approx(shadow_data[1].x, 0.8) && approx(shadow_data[1].y, 6.0));
    assert!(approx(shadow_data[0].z, 1.0), "point lights flag their cube tiles");
    for data in &shadow_data[2..20] {
        assert!(data.x < 0.0, "excess light should be baked only, got {data}");
    }

    assert_eq!(host.count(|c| matches!(c, Command::DrawShadows(_))), 12);
    let viewports = shadow_viewports(&host);
    assert_eq!(viewports.len(), 12);
    for (i, a) in viewports.iter().enumerate() {
        for b in &viewports[i + 1..] {
            assert!(!a.overlaps(b));
        }
    }
    assert!(host.live_temporaries().is_empty());
    assert!(host.protocol_errors().is_empty());
}

#[test]
fn other_tiles_are_inset_by_half_a_texel() {
    let (mut host, _) = culled_host(vec![shadowed_point(0)]);
    let mut targets = TransientTargets::new();
    let mut shadows = Shadows::new();
    let settings = ShadowSettings::default();

    shadows.setup(&settings, false);
    shadows.reserve_other_shadows(&host, &shadowed_point(0), 0);
    {
        let mut ctx = FrameContext::new(&mut host, &mut targets);
        shadows.render(&mut ctx);
    }

    let border = 0.5 / settings.other.atlas_size as f32;
    let tiles = shadows.other_tiles();
    assert_eq!(tiles.len(), POINT_LIGHT_TILES);
    // Six tiles need a 4×4 grid.
    assert!(approx(tiles[0].x, border));
    assert!(approx(tiles[0].z, 0.25 - 2.0 * border));
    assert!(approx(tiles[5].x, 0.25 + border));
    assert!(approx(tiles[5].y, 0.25 + border));
    assert!(tiles.iter().all(|t| t.w > 0.0), "normal bias should be positive");
}

// ============================================================================
// Keywords
// ============================================================================

#[test]
fn shadow_mask_light_enables_distance_keyword() {
    let mut light = shadowed_sun();
    light.baking = LightBakingOutput {
        bake_type: LightmapBakeType::Mixed,
        mixed_mode: MixedLightingMode::Shadowmask,
        occlusion_mask_channel: 2,
    };
    let (mut host, _) = culled_host(vec![light.clone()]);
    let mut targets = TransientTargets::new();
    let mut shadows = Shadows::new();

    shadows.setup(&ShadowSettings::default(), false);
    let data = shadows.reserve_directional_shadows(&host, &light, 0);
    assert!(approx(data.mask_channel, 2.0));
    {
        let mut ctx = FrameContext::new(&mut host, &mut targets);
        shadows.render(&mut ctx);
    }

    assert_eq!(
        host.keyword(KeywordGroup::ShadowMask),
        Some(KeywordSelection::ShadowMask(Some(ShadowMaskMode::Distance)))
    );
}

#[test]
fn keywords_are_reset_when_no_light_uses_the_mask() {
    let (mut host, _) = culled_host(vec![]);
    let mut targets = TransientTargets::new();
    let mut shadows = Shadows::new();

    shadows.setup(&ShadowSettings::default(), false);
    {
        let mut ctx = FrameContext::new(&mut host, &mut targets);
        shadows.render(&mut ctx);
    }

    assert_eq!(
        host.keyword(KeywordGroup::ShadowMask),
        Some(KeywordSelection::ShadowMask(None))
    );
    assert_eq!(host.global_int(properties().cascade_count), Some(0));
}
