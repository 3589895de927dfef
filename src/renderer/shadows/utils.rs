//! Shadow Utilities
//!
//! Pure matrix math for shadow views, usable by any host that has no culling
//! system of its own to answer the pipeline's shadow matrix queries.
//!
//! # Provided Functions
//!
//! - Cascade slice ranges from cascade ratios
//! - Frustum corner extraction in world space
//! - Bounding (culling) sphere of a frustum slice
//! - Texel-snapped orthographic view/projection for a cascade
//! - Perspective view/projection for spot lights and point-light cube faces

use glam::{Mat4, Vec3, Vec4};

use super::MAX_CASCADES;
use crate::renderer::host::CubemapFace;

/// Near plane of spot and point shadow projections.
pub const LOCAL_SHADOW_NEAR: f32 = 0.05;

// ============================================================================
// Cascade Slices
// ============================================================================

/// Near/far view distances of every cascade slice.
///
/// Cascade `i` ends at `ratios[i] · shadow_distance`; the last cascade ends at
/// `shadow_distance`. Unused entries are zero.
#[must_use]
pub fn cascade_ranges(
    near: f32,
    shadow_distance: f32,
    cascade_count: u32,
    ratios: Vec3,
) -> [(f32, f32); MAX_CASCADES] {
    let mut ranges = [(0.0, 0.0); MAX_CASCADES];
    let n = (cascade_count as usize).clamp(1, MAX_CASCADES);
    let ratios = ratios.to_array();

    let mut prev = near;
    for (i, range) in ranges.iter_mut().enumerate().take(n) {
        let far = if i + 1 == n {
            shadow_distance
        } else {
            (ratios[i] * shadow_distance).max(prev)
        };
        *range = (prev, far);
        prev = far;
    }
    ranges
}

// ============================================================================
// Frustum Corners in World Space
// ============================================================================

/// Computes the 8 world-space corners of a view-space frustum slice.
///
/// FOV and aspect are read back from the perspective projection; the view is
/// right-handed with -Z forward.
#[must_use]
pub fn frustum_corners_world(view: Mat4, projection: Mat4, near: f32, far: f32) -> [Vec3; 8] {
    let tan_half_fov = 1.0 / projection.y_axis.y;
    let aspect = projection.y_axis.y / projection.x_axis.x;

    let h_near = tan_half_fov * near;
    let w_near = h_near * aspect;
    let h_far = tan_half_fov * far;
    let w_far = h_far * aspect;

    let corners_view = [
        Vec3::new(-w_near, -h_near, -near),
        Vec3::new(w_near, -h_near, -near),
        Vec3::new(w_near, h_near, -near),
        Vec3::new(-w_near, h_near, -near),
        Vec3::new(-w_far, -h_far, -far),
        Vec3::new(w_far, -h_far, -far),
        Vec3::new(w_far, h_far, -far),
        Vec3::new(-w_far, h_far, -far),
    ];

    let inv_view = view.inverse();
    corners_view.map(|c| inv_view.transform_point3(c))
}

/// Sphere around the corners: xyz center (the centroid), w radius.
#[must_use]
pub fn bounding_sphere(corners: &[Vec3; 8]) -> Vec4 {
    let center = corners.iter().copied().sum::<Vec3>() / 8.0;
    let radius = corners
        .iter()
        .map(|c| c.distance(center))
        .fold(0.0f32, f32::max);
    center.extend(radius)
}

fn safe_up(direction: Vec3) -> Vec3 {
    if direction.y.abs() > 0.99 { Vec3::X } else { Vec3::Y }
}

// ============================================================================
// Directional Cascades
// ============================================================================

/// Orthographic view and projection enclosing a cascade's culling sphere.
///
/// The sphere center is snapped to the texel grid of a `tile_size` tile in
/// light space so the cascade does not shimmer as the camera moves.
/// `near_plane_offset` pulls the near plane towards the light.
#[must_use]
pub fn cascade_view_projection(
    light_direction: Vec3,
    sphere: Vec4,
    tile_size: u32,
    near_plane_offset: f32,
) -> (Mat4, Mat4) {
    let dir = light_direction.try_normalize().unwrap_or(Vec3::NEG_Z);
    let radius = sphere.w.max(1e-4);
    let center = sphere.truncate();

    let up = safe_up(dir);
    let rotation = Mat4::look_at_rh(Vec3::ZERO, dir, up);

    // Texel snapping in light space.
    let texel = 2.0 * radius / tile_size.max(1) as f32;
    let ls_center = rotation.transform_point3(center);
    let snapped = Vec3::new(
        (ls_center.x / texel).floor() * texel,
        (ls_center.y / texel).floor() * texel,
        ls_center.z,
    );
    let center = rotation.inverse().transform_point3(snapped);

    let eye = center - dir * (radius + near_plane_offset);
    let view = Mat4::look_at_rh(eye, center, up);
    let depth = 2.0 * radius + near_plane_offset;
    let projection = Mat4::orthographic_rh(-radius, radius, -radius, radius, 0.0, depth);
    (view, projection)
}

// ============================================================================
// Spot & Point Lights
// ============================================================================

/// Perspective view and projection of a spot light.
#[must_use]
pub fn spot_view_projection(
    position: Vec3,
    direction: Vec3,
    outer_angle_degrees: f32,
    range: f32,
) -> (Mat4, Mat4) {
    let dir = direction.try_normalize().unwrap_or(Vec3::NEG_Z);
    let view = Mat4::look_at_rh(position, position + dir, safe_up(dir));
    let fov = outer_angle_degrees
        .to_radians()
        .clamp(0.01, std::f32::consts::PI - 0.01);
    let far = range.max(LOCAL_SHADOW_NEAR * 2.0);
    let projection = Mat4::perspective_rh(fov, 1.0, LOCAL_SHADOW_NEAR, far);
    (view, projection)
}

/// Forward and up vectors of a cube face.
#[must_use]
pub const fn cube_face_basis(face: CubemapFace) -> (Vec3, Vec3) {
    match face {
        CubemapFace::PositiveX => (Vec3::X, Vec3::NEG_Y),
        CubemapFace::NegativeX => (Vec3::NEG_X, Vec3::NEG_Y),
        CubemapFace::PositiveY => (Vec3::Y, Vec3::Z),
        CubemapFace::NegativeY => (Vec3::NEG_Y, Vec3::NEG_Z),
        CubemapFace::PositiveZ => (Vec3::Z, Vec3::NEG_Y),
        CubemapFace::NegativeZ => (Vec3::NEG_Z, Vec3::NEG_Y),
    }
}

/// Perspective view and projection of one point-light cube face, widened by
/// `fov_bias_degrees` beyond 90°.
#[must_use]
pub fn point_face_view_projection(
    position: Vec3,
    face: CubemapFace,
    fov_bias_degrees: f32,
    range: f32,
) -> (Mat4, Mat4) {
    let (forward, up) = cube_face_basis(face);
    let view = Mat4::look_at_rh(position, position + forward, up);
    let fov = (90.0 + fov_bias_degrees)
        .to_radians()
        .clamp(0.01, std::f32::consts::PI - 0.01);
    let far = range.max(LOCAL_SHADOW_NEAR * 2.0);
    let projection = Mat4::perspective_rh(fov, 1.0, LOCAL_SHADOW_NEAR, far);
    (view, projection)
}
