//! Color Grading LUT
//!
//! The whole grading chain is evaluated on the CPU into an `N × N²` strip of
//! `Rgba16Float` texels (`N` slices of `N × N`, blue selecting the slice),
//! which the apply pass samples instead of grading every pixel.
//!
//! # Grading Order
//!
//! ```text
//! exposure → white balance → contrast → color filter → split toning
//!   → channel mixer → shadows/midtones/highlights → hue shift → saturation
//!   → tone mapping
//! ```
//!
//! For HDR cameras with a tone mapper, LUT coordinates are LogC-encoded so the
//! strip covers the HDR range; they are decoded before grading.
//!
//! With ACES tone mapping, contrast is applied in ACEScc and every later step
//! works in ACEScg with AP1 luminance weights. The result is brought back to
//! linear Rec.709 before the tone curve.
//!
//! Baking is deterministic: identical parameters always produce identical
//! bytes, and [`LutCache`] skips the bake entirely when nothing changed.

use glam::{Mat3, Vec3, Vec4};
use half::f16;

use super::tone_mapping::tone_map;
use crate::resources::{PostFxSettings, ToneMappingMode};
use crate::utils::color::linear_rgb;

/// Supported LUT resolutions.
pub const LUT_RESOLUTIONS: [u32; 3] = [16, 32, 64];

/// Log-space middle gray used as the contrast pivot.
const LOG_MIDDLE_GRAY: f32 = 0.413_588_4;

/// Rec.709 luminance weights.
const LUMINANCE: Vec3 = Vec3::new(0.212_672_9, 0.715_152_2, 0.072_175);

/// AP1 (ACEScg) luminance weights.
const ACES_LUMINANCE: Vec3 = Vec3::new(0.272_228_7, 0.674_081_8, 0.053_689_5);

/// Largest finite half-float value.
const HALF_MAX: f32 = 65_504.0;

// ============================================================================
// Color Space Helpers
// ============================================================================

mod log_c {
    pub const CUT: f32 = 0.011_361;
    pub const A: f32 = 5.555_556;
    pub const B: f32 = 0.047_996;
    pub const C: f32 = 0.244_161;
    pub const D: f32 = 0.386_036;
    pub const E: f32 = 5.301_883;
    pub const F: f32 = 0.092_819;
}

#[must_use]
pub fn linear_to_log_c(x: f32) -> f32 {
    use log_c::{A, B, C, CUT, D, E, F};
    if x > CUT {
        C * (A * x + B).log10() + D
    } else {
        E * x + F
    }
}

#[must_use]
pub fn log_c_to_linear(x: f32) -> f32 {
    use log_c::{A, B, C, CUT, D, E, F};
    if x > E * CUT + F {
        (10f32.powf((x - D) / C) - B) / A
    } else {
        (x - F) / E
    }
}

fn map(v: Vec3, f: impl Fn(f32) -> f32) -> Vec3 {
    Vec3::new(f(v.x), f(v.y), f(v.z))
}

fn linear_to_lms() -> Mat3 {
    Mat3::from_cols_array(&[
        0.390_405, 0.549_941, 0.008_926_32, //
        0.070_841_6, 0.963_172, 0.001_357_75, //
        0.023_108_2, 0.128_021, 0.936_245,
    ])
    .transpose()
}

fn lms_to_linear() -> Mat3 {
    Mat3::from_cols_array(&[
        2.858_47, -1.628_79, -0.024_891, //
        -0.210_182, 1.158_2, 0.000_324_281, //
        -0.041_812, -0.118_169, 1.068_67,
    ])
    .transpose()
}

mod aces {
    use glam::{Mat3, Vec3};

    use super::{HALF_MAX, map};

    fn rows(m: [f32; 9]) -> Mat3 {
        Mat3::from_cols_array(&m).transpose()
    }

    /// Linear Rec.709 to ACES2065-1 (AP0).
    pub fn from_linear(color: Vec3) -> Vec3 {
        rows([
            0.439_701, 0.382_978, 0.177_335, //
            0.089_792_3, 0.813_423, 0.096_761_6, //
            0.017_544, 0.111_544, 0.870_704,
        ]) * color
    }

    /// AP0 to ACEScg (AP1).
    pub fn to_cg(color: Vec3) -> Vec3 {
        rows([
            1.451_439_3, -0.236_510_7, -0.214_928_6, //
            -0.076_553_8, 1.176_229_7, -0.099_675_9, //
            0.008_316_1, -0.006_032_4, 0.997_716_3,
        ]) * color
    }

    /// ACEScg (AP1) to linear Rec.709.
    pub fn cg_to_linear(color: Vec3) -> Vec3 {
        rows([
            1.705_05, -0.621_79, -0.083_26, //
            -0.130_26, 1.140_8, -0.010_55, //
            -0.024, -0.128_97, 1.152_97,
        ]) * color
    }

    /// ACES2065-1 to ACEScc.
    pub fn to_cc(color: Vec3) -> Vec3 {
        map(color.clamp(Vec3::ZERO, Vec3::splat(HALF_MAX)), |x| {
            let tiny = 2f32.powi(-16);
            if x <= 0.0 {
                (tiny.log2() + 9.72) / 17.52
            } else if x < 2f32.powi(-15) {
                ((tiny + x * 0.5).log2() + 9.72) / 17.52
            } else {
                (x.log2() + 9.72) / 17.52
            }
        })
    }

    /// ACEScc to ACES2065-1.
    pub fn from_cc(color: Vec3) -> Vec3 {
        map(color, |x| {
            if x < -0.301_369_86 {
                (2f32.powf(x * 17.52 - 9.72) - 2f32.powi(-16)) * 2.0
            } else if x < (HALF_MAX.log2() + 9.72) / 17.52 {
                2f32.powf(x * 17.52 - 9.72)
            } else {
                HALF_MAX
            }
        })
    }
}

/// Per-channel LMS scale for a temperature and tint, both `-100..=100`.
#[must_use]
pub fn white_balance_coefficients(temperature: f32, tint: f32) -> Vec3 {
    let t1 = temperature / 65.0;
    let t2 = tint / 65.0;

    // Chromaticity of the shifted white point.
    let x = 0.312_71 - t1 * if t1 < 0.0 { 0.1 } else { 0.05 };
    let y = 2.87 * x - 3.0 * x * x - 0.275_095_07 + t2 * 0.05;

    let big_x = x / y;
    let big_z = (1.0 - x - y) / y;
    let lms = Vec3::new(
        0.7328 * big_x + 0.4296 - 0.1624 * big_z,
        -0.7036 * big_x + 1.6975 + 0.0061 * big_z,
        0.0030 * big_x + 0.0136 + 0.9834 * big_z,
    );

    // D65 white in LMS.
    Vec3::new(0.949_237, 1.035_42, 1.087_28) / lms
}

#[inline]
fn luminance(color: Vec3, use_aces: bool) -> f32 {
    color.dot(if use_aces { ACES_LUMINANCE } else { LUMINANCE })
}

fn step(edge: Vec3, x: Vec3) -> Vec3 {
    Vec3::select(x.cmpge(edge), Vec3::ONE, Vec3::ZERO)
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn soft_light(base: Vec3, blend: Vec3) -> Vec3 {
    let r1 = 2.0 * base * blend + base * base * (Vec3::ONE - 2.0 * blend);
    let r2 = map(base, f32::sqrt) * (2.0 * blend - Vec3::ONE) + 2.0 * base * (Vec3::ONE - blend);
    let t = step(Vec3::splat(0.5), blend);
    r2 * t + (Vec3::ONE - t) * r1
}

fn rgb_to_hsv(c: Vec3) -> Vec3 {
    let k = Vec4::new(0.0, -1.0 / 3.0, 2.0 / 3.0, -1.0);
    let p = if c.z <= c.y {
        Vec4::new(c.y, c.z, k.x, k.y)
    } else {
        Vec4::new(c.z, c.y, k.w, k.z)
    };
    let q = if p.x <= c.x {
        Vec4::new(c.x, p.y, p.z, p.x)
    } else {
        Vec4::new(p.x, p.y, p.w, c.x)
    };
    let d = q.x - q.w.min(q.y);
    let e = 1.0e-4;
    Vec3::new(
        (q.z + (q.w - q.y) / (6.0 * d + e)).abs(),
        d / (q.x + e),
        q.x,
    )
}

fn hsv_to_rgb(c: Vec3) -> Vec3 {
    let shifted = Vec3::splat(c.x) + Vec3::new(1.0, 2.0 / 3.0, 1.0 / 3.0);
    let p = ((shifted - shifted.floor()) * 6.0 - Vec3::splat(3.0)).abs();
    let rgb = (p - Vec3::ONE).clamp(Vec3::ZERO, Vec3::ONE);
    c.z * Vec3::ONE.lerp(rgb, c.y)
}

fn rotate_hue(hue: f32) -> f32 {
    if hue < 0.0 {
        hue + 1.0
    } else if hue > 1.0 {
        hue - 1.0
    } else {
        hue
    }
}

// ============================================================================
// Grading Parameters
// ============================================================================

/// Grading settings converted into the form the grading math consumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradingParams {
    /// `2^post_exposure`
    pub exposure: f32,
    /// `0..=2`
    pub contrast: f32,
    /// Linear color filter.
    pub color_filter: Vec3,
    /// Hue rotation in turns, `-0.5..=0.5`.
    pub hue_shift: f32,
    /// `0..=2`
    pub saturation: f32,
    pub white_balance: Vec3,
    /// Gamma-space shadow tint.
    pub split_shadows: Vec3,
    /// Gamma-space highlight tint.
    pub split_highlights: Vec3,
    /// `-1..=1`
    pub split_balance: f32,
    pub mixer_red: Vec3,
    pub mixer_green: Vec3,
    pub mixer_blue: Vec3,
    /// Linear tints.
    pub smh_shadows: Vec3,
    pub smh_midtones: Vec3,
    pub smh_highlights: Vec3,
    /// `(shadows_start, shadows_end, highlights_start, highlights_end)`
    pub smh_range: Vec4,
    pub tone_mapping: ToneMappingMode,
}

impl GradingParams {
    #[must_use]
    pub fn from_settings(settings: &PostFxSettings) -> Self {
        let adjust = &settings.color_adjustments;
        let split = &settings.split_toning;
        let mixer = &settings.channel_mixer;
        let smh = &settings.shadows_midtones_highlights;
        Self {
            exposure: 2f32.powf(adjust.post_exposure),
            contrast: adjust.contrast * 0.01 + 1.0,
            color_filter: linear_rgb(adjust.color_filter),
            hue_shift: adjust.hue_shift / 360.0,
            saturation: adjust.saturation * 0.01 + 1.0,
            white_balance: white_balance_coefficients(
                settings.white_balance.temperature,
                settings.white_balance.tint,
            ),
            split_shadows: split.shadows,
            split_highlights: split.highlights,
            split_balance: split.balance * 0.01,
            mixer_red: mixer.red,
            mixer_green: mixer.green,
            mixer_blue: mixer.blue,
            smh_shadows: linear_rgb(smh.shadows),
            smh_midtones: linear_rgb(smh.midtones),
            smh_highlights: linear_rgb(smh.highlights),
            smh_range: Vec4::new(
                smh.shadows_start,
                smh.shadows_end,
                smh.highlights_start,
                smh.highlights_end,
            ),
            tone_mapping: settings.tone_mapping,
        }
    }
}

fn white_balance(color: Vec3, coefficients: Vec3) -> Vec3 {
    let lms = linear_to_lms() * color;
    lms_to_linear() * (lms * coefficients)
}

/// Applies contrast around middle gray in log space.
///
/// The ACES variant pivots in ACEScc and returns ACEScg.
fn contrast(color: Vec3, amount: f32, use_aces: bool) -> Vec3 {
    let log = if use_aces {
        aces::to_cc(aces::from_linear(color))
    } else {
        map(color, linear_to_log_c)
    };
    let log = (log - Vec3::splat(LOG_MIDDLE_GRAY)) * amount + Vec3::splat(LOG_MIDDLE_GRAY);
    if use_aces {
        aces::to_cg(aces::from_cc(log))
    } else {
        map(log, log_c_to_linear)
    }
}

fn split_toning(color: Vec3, p: &GradingParams, use_aces: bool) -> Vec3 {
    let color = color.powf(1.0 / 2.2);
    let lum = luminance(color.clamp(Vec3::ZERO, Vec3::ONE), use_aces);
    let t = (lum + p.split_balance).clamp(0.0, 1.0);
    let shadows = Vec3::splat(0.5).lerp(p.split_shadows, 1.0 - t);
    let highlights = Vec3::splat(0.5).lerp(p.split_highlights, t);
    let color = soft_light(color, shadows);
    let color = soft_light(color, highlights);
    color.max(Vec3::ZERO).powf(2.2)
}

fn channel_mixer(color: Vec3, p: &GradingParams) -> Vec3 {
    Vec3::new(
        p.mixer_red.dot(color),
        p.mixer_green.dot(color),
        p.mixer_blue.dot(color),
    )
}

fn shadows_midtones_highlights(color: Vec3, p: &GradingParams, use_aces: bool) -> Vec3 {
    let lum = luminance(color, use_aces);
    let shadows_weight = 1.0 - smoothstep(p.smh_range.x, p.smh_range.y, lum);
    let highlights_weight = smoothstep(p.smh_range.z, p.smh_range.w, lum);
    let midtones_weight = 1.0 - shadows_weight - highlights_weight;
    color * p.smh_shadows * shadows_weight
        + color * p.smh_midtones * midtones_weight
        + color * p.smh_highlights * highlights_weight
}

fn hue_shift(color: Vec3, shift: f32) -> Vec3 {
    let mut hsv = rgb_to_hsv(color);
    hsv.x = rotate_hue(hsv.x + shift);
    hsv_to_rgb(hsv)
}

fn saturation(color: Vec3, amount: f32, use_aces: bool) -> Vec3 {
    let lum = luminance(color, use_aces);
    (color - Vec3::splat(lum)) * amount + Vec3::splat(lum)
}

/// Runs the grading chain (without tone mapping) on one linear color.
#[must_use]
pub fn grade(color: Vec3, p: &GradingParams) -> Vec3 {
    let use_aces = p.tone_mapping == ToneMappingMode::Aces;
    let mut c = color.min(Vec3::splat(60.0));
    c *= p.exposure;
    c = white_balance(c, p.white_balance);
    c = contrast(c, p.contrast, use_aces);
    c *= p.color_filter;
    c = c.max(Vec3::ZERO);
    c = split_toning(c, p, use_aces);
    c = channel_mixer(c, p);
    c = c.max(Vec3::ZERO);
    c = shadows_midtones_highlights(c, p, use_aces);
    c = hue_shift(c, p.hue_shift);
    c = saturation(c, p.saturation, use_aces);
    if use_aces {
        c = aces::cg_to_linear(c.max(Vec3::ZERO));
    }
    c.max(Vec3::ZERO)
}

// ============================================================================
// LUT Baking
// ============================================================================

/// The input color a LUT texel encodes.
#[must_use]
pub fn lut_coordinate(x: u32, y: u32, resolution: u32, log_c: bool) -> Vec3 {
    let scale = 1.0 / (resolution - 1).max(1) as f32;
    let color = Vec3::new(
        (x % resolution) as f32,
        y as f32,
        (x / resolution) as f32,
    ) * scale;
    if log_c { map(color, log_c_to_linear) } else { color }
}

/// Bakes the LUT strip as row-major `Rgba16Float` texels.
///
/// The strip is `resolution²` texels wide and `resolution` texels high.
#[must_use]
pub fn bake_lut(params: &GradingParams, resolution: u32, log_c: bool) -> Vec<f16> {
    let width = resolution * resolution;
    let mut texels = Vec::with_capacity((width * resolution * 4) as usize);
    for y in 0..resolution {
        for x in 0..width {
            let input = lut_coordinate(x, y, resolution, log_c);
            let graded = tone_map(params.tone_mapping, grade(input, params));
            texels.extend_from_slice(&[
                f16::from_f32(graded.x),
                f16::from_f32(graded.y),
                f16::from_f32(graded.z),
                f16::ONE,
            ]);
        }
    }
    texels
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct LutKey {
    params: GradingParams,
    resolution: u32,
    log_c: bool,
}

/// Keeps the last baked LUT and re-bakes only when its inputs change.
#[derive(Debug, Default)]
pub struct LutCache {
    key: Option<LutKey>,
    texels: Vec<f16>,
    bakes: u64,
}

impl LutCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the LUT bytes for the given inputs and whether a bake ran.
    pub fn get_or_bake(&mut self, params: &GradingParams, resolution: u32, log_c: bool) -> (&[u8], bool) {
        let key = LutKey {
            params: *params,
            resolution,
            log_c,
        };
        let baked = self.key != Some(key);
        if baked {
            self.texels = bake_lut(params, resolution, log_c);
            self.key = Some(key);
            self.bakes += 1;
            log::debug!(
                "LUT baked: {}×{} ({:?}, log_c={log_c})",
                resolution * resolution,
                resolution,
                params.tone_mapping
            );
        }
        (bytemuck::cast_slice(&self.texels), baked)
    }

    /// Number of bakes performed so far.
    #[must_use]
    pub fn bake_count(&self) -> u64 {
        self.bakes
    }
}
