//! Color Grading & Tone Mapping Tests
//!
//! Tests for:
//! - Neutral settings leaving colors untouched
//! - Individual grading controls (exposure, saturation, color filter)
//! - ACES grading in ACEScc/ACEScg
//! - Deterministic LUT bakes
//! - Tone curves over the HDR range
//! - Bloom soft-knee threshold response

use glam::Vec3;
use half::f16;

use prism::renderer::post::color_grading::{GradingParams, bake_lut, grade, lut_coordinate};
use prism::renderer::post::tone_mapping::{aces, neutral, reinhard, tone_map};
use prism::resources::bloom::apply_threshold;
use prism::resources::{BloomSettings, PostFxSettings, ToneMappingMode};

const EPSILON: f32 = 5e-3;

fn approx_vec(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < EPSILON
}

fn params(edit: impl FnOnce(&mut PostFxSettings)) -> GradingParams {
    let mut settings = PostFxSettings::default();
    edit(&mut settings);
    GradingParams::from_settings(&settings)
}

#[test]
fn neutral_settings_are_identity() {
    let p = params(|_| {});
    for color in [
        Vec3::ZERO,
        Vec3::splat(0.18),
        Vec3::new(0.9, 0.4, 0.1),
        Vec3::new(0.05, 0.6, 0.8),
        Vec3::ONE,
    ] {
        let graded = grade(color, &p);
        assert!(approx_vec(graded, color), "{color} graded to {graded}");
    }
}

#[test]
fn post_exposure_doubles_per_stop() {
    let p = params(|s| s.color_adjustments.post_exposure = 1.0);
    let graded = grade(Vec3::splat(0.25), &p);
    assert!(approx_vec(graded, Vec3::splat(0.5)), "{graded}");
}

#[test]
fn zero_saturation_is_gray() {
    let p = params(|s| s.color_adjustments.saturation = -100.0);
    let graded = grade(Vec3::new(0.8, 0.2, 0.1), &p);
    assert!((graded.x - graded.y).abs() < 1e-5);
    assert!((graded.y - graded.z).abs() < 1e-5);
}

#[test]
fn color_filter_multiplies_channels() {
    let p = params(|s| s.color_adjustments.color_filter = Vec3::new(1.0, 0.0, 1.0));
    let graded = grade(Vec3::splat(0.5), &p);
    assert!(graded.y.abs() < EPSILON, "{graded}");
    assert!(graded.x > 0.1 && graded.z > 0.1);
}

#[test]
fn contrast_spreads_around_middle_gray() {
    let p = params(|s| s.color_adjustments.contrast = 50.0);
    let dark = grade(Vec3::splat(0.05), &p);
    let bright = grade(Vec3::splat(0.8), &p);
    assert!(dark.x < 0.05);
    assert!(bright.x > 0.8);
}

#[test]
fn aces_grading_round_trips_neutral_colors() {
    let p = params(|s| s.tone_mapping = ToneMappingMode::Aces);
    for color in [
        Vec3::ZERO,
        Vec3::splat(0.18),
        Vec3::new(0.9, 0.4, 0.1),
        Vec3::new(0.05, 0.6, 0.8),
        Vec3::ONE,
    ] {
        let graded = grade(color, &p);
        assert!(approx_vec(graded, color), "{color} graded to {graded}");
    }
}

#[test]
fn aces_desaturation_uses_ap1_luminance() {
    let color = Vec3::new(0.8, 0.2, 0.1);
    let rec709 = grade(color, &params(|s| s.color_adjustments.saturation = -100.0));
    let aces = grade(
        color,
        &params(|s| {
            s.tone_mapping = ToneMappingMode::Aces;
            s.color_adjustments.saturation = -100.0;
        }),
    );

    assert!((rec709.x - 0.3204).abs() < 5e-4, "{rec709}");
    assert!((aces.x - 0.3224).abs() < 5e-4, "{aces}");
    assert!((aces.x - aces.z).abs() < 1e-3);
}

#[test]
fn aces_contrast_pivots_on_middle_gray() {
    let p = params(|s| {
        s.tone_mapping = ToneMappingMode::Aces;
        s.color_adjustments.contrast = 50.0;
    });
    let gray = grade(Vec3::splat(0.18), &p);
    assert!(approx_vec(gray, Vec3::splat(0.18)), "{gray}");
    assert!(grade(Vec3::splat(0.05), &p).x < 0.05);
    assert!(grade(Vec3::splat(0.8), &p).x > 0.8);
}

#[test]
fn bake_is_deterministic() {
    let p = params(|s| {
        s.tone_mapping = ToneMappingMode::Aces;
        s.color_adjustments.hue_shift = 30.0;
    });
    let a = bake_lut(&p, 16, true);
    let b = bake_lut(&p, 16, true);
    assert_eq!(a, b);
    assert_eq!(a.len(), 16 * 16 * 16 * 4);
}

#[test]
fn identity_lut_encodes_its_coordinates() {
    let p = params(|_| {});
    let resolution = 16;
    let texels = bake_lut(&p, resolution, false);
    let width = resolution * resolution;

    for (x, y) in [(0, 0), (17, 3), (255, 15), (128, 8)] {
        let i = ((y * width + x) * 4) as usize;
        let texel = Vec3::new(
            texels[i].to_f32(),
            texels[i + 1].to_f32(),
            texels[i + 2].to_f32(),
        );
        let expected = lut_coordinate(x, y, resolution, false);
        assert!(approx_vec(texel, expected), "({x}, {y}): {texel} vs {expected}");
        assert_eq!(texels[i + 3], f16::ONE);
    }
}

#[test]
fn log_c_lut_covers_hdr_range() {
    let top = lut_coordinate(16 * 16 - 1, 15, 16, true);
    assert!(top.x > 30.0, "LogC top corner should decode far above 1, got {top}");
    let bottom = lut_coordinate(0, 0, 16, true);
    assert!(bottom.max_element() < 0.01);
}

// ============================================================================
// Tone Mapping
// ============================================================================

#[test]
fn tone_curves_stay_in_display_range() {
    for v in [0.0, 0.18, 1.0, 4.0, 16.0, 60.0] {
        let c = Vec3::splat(v);
        for out in [aces(c), reinhard(c)] {
            assert!(out.min_element() >= 0.0);
            assert!(out.max_element() <= 1.0 + 1e-3, "{v} -> {out}");
        }
    }
}

#[test]
fn neutral_rescales_input_and_output_by_white_level() {
    // The input is scaled before the curve, so the white level itself lands
    // slightly above 1 and the output keeps rising past it.
    let white = neutral(Vec3::splat(5.3));
    assert!(approx_vec(white, Vec3::splat(1.0465)), "{white}");
    assert!(neutral(Vec3::splat(4.0)).x < 1.0);

    let mut previous = 0.0;
    for v in [0.5, 1.0, 2.0, 4.0, 5.3, 8.0, 16.0, 60.0] {
        let out = neutral(Vec3::splat(v)).x;
        assert!(out > previous, "neutral decreased at {v}");
        previous = out;
    }
    assert!(previous < 1.25);
}

#[test]
fn none_passes_through() {
    let c = Vec3::new(2.0, 0.5, 0.1);
    assert_eq!(tone_map(ToneMappingMode::None, c), c);
}

#[test]
fn reinhard_halves_one() {
    assert!(approx_vec(reinhard(Vec3::ONE), Vec3::splat(0.5)));
}

// ============================================================================
// Bloom Threshold
// ============================================================================

#[test]
fn pixel_exactly_at_threshold_with_hard_knee_is_cut() {
    let mut settings = BloomSettings::default();
    settings.set_threshold(1.0);
    settings.set_threshold_knee(0.0);
    let t = settings.threshold_vector();

    let at = apply_threshold(Vec3::splat(t.x), t);
    assert!(at.max_element().abs() < 1e-5, "{at}");

    let above = apply_threshold(Vec3::splat(t.x * 2.0), t);
    assert!(above.x > 0.0);
}

#[test]
fn pixel_exactly_at_threshold_with_half_knee_keeps_an_eighth() {
    let mut settings = BloomSettings::default();
    settings.set_threshold(1.0);
    settings.set_threshold_knee(0.5);
    let t = settings.threshold_vector();
    assert!((t.x - 1.0).abs() < 1e-6);

    // At the threshold the knee term is (t * k)^2 / (4 * t * k) = k / 4.
    let color = Vec3::splat(1.0);
    let factor = apply_threshold(color, t).x / color.x;
    assert!((factor - 0.125).abs() < 1e-3, "factor {factor}");

    let dark = apply_threshold(Vec3::splat(t.x * 0.2), t);
    assert!(dark.max_element() < 1e-5);
}
