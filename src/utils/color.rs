//! Color space helpers shared by settings packing and LUT baking.

use glam::{Vec3, Vec4};

/// Converts one sRGB-encoded channel to linear space.
#[must_use]
pub fn gamma_to_linear(value: f32) -> f32 {
    if value <= 0.040_45 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

/// Converts an sRGB-encoded color to linear space.
#[inline]
#[must_use]
pub fn linear_rgb(color: Vec3) -> Vec3 {
    Vec3::new(
        gamma_to_linear(color.x),
        gamma_to_linear(color.y),
        gamma_to_linear(color.z),
    )
}

/// Converts an sRGB-encoded color to linear space, keeping alpha untouched.
#[inline]
#[must_use]
pub fn linear_rgba(color: Vec4) -> Vec4 {
    linear_rgb(color.truncate()).extend(color.w)
}

/// Converts a gamma-space `wgpu::Color` to linear space (alpha untouched).
#[must_use]
pub fn linear_wgpu(color: wgpu::Color) -> wgpu::Color {
    let lin = |c: f64| f64::from(gamma_to_linear(c as f32));
    wgpu::Color {
        r: lin(color.r),
        g: lin(color.g),
        b: lin(color.b),
        a: color.a,
    }
}
