//! CPU tone curves baked into the color grading LUT.

use glam::Vec3;

use crate::resources::ToneMappingMode;

/// Maps a graded linear HDR color through the selected curve.
#[must_use]
pub fn tone_map(mode: ToneMappingMode, color: Vec3) -> Vec3 {
    match mode {
        ToneMappingMode::None => color,
        ToneMappingMode::Aces => aces(color),
        ToneMappingMode::Neutral => neutral(color),
        ToneMappingMode::Reinhard => reinhard(color),
    }
}

/// Reinhard: `c / (c + 1)`
#[must_use]
pub fn reinhard(color: Vec3) -> Vec3 {
    color / (color + Vec3::ONE)
}

/// ACES filmic fit (Narkowicz), clamped to `[0, 1]`.
#[must_use]
pub fn aces(color: Vec3) -> Vec3 {
    let a = 2.51;
    let b = 0.03;
    let c = 2.43;
    let d = 0.59;
    let e = 0.14;
    ((color * (color * a + b)) / (color * (color * c + d) + e)).clamp(Vec3::ZERO, Vec3::ONE)
}

fn neutral_curve(x: Vec3) -> Vec3 {
    let a = 0.2;
    let b = 0.29;
    let c = 0.24;
    let d = 0.272;
    let e = 0.02;
    let f = 0.3;
    ((x * (x * a + Vec3::splat(c * b)) + Vec3::splat(d * e))
        / (x * (x * a + b) + Vec3::splat(d * f)))
        - Vec3::splat(e / f)
}

/// Neutral filmic curve with a white level of 5.3.
#[must_use]
pub fn neutral(color: Vec3) -> Vec3 {
    const WHITE_LEVEL: f32 = 5.3;
    let white_scale = Vec3::ONE / neutral_curve(Vec3::splat(WHITE_LEVEL));
    neutral_curve(color * white_scale) * white_scale
}
