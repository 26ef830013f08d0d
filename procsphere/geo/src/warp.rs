//! Cube-to-sphere warp. Mirrored by `shaders/cube_sphere.wgsl`; keep the
//! operation order identical so both devices round the same way.

use glam::Vec3;

/// Map a lattice point with coordinates in `[0, r]` onto the `[-1, 1]` cube.
#[inline]
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn to_unit_cube(p: Vec3, resolution: u32) -> Vec3 {
    p * 2.0 / resolution as f32 - Vec3::ONE
}

/// Warp a point on the surface of the `[-1, 1]` cube onto the unit sphere.
///
/// Unlike normalize-and-scale this spreads the lattice with near-uniform
/// angular density: each axis is scaled by
/// `sqrt(1 - a²/2 - b²/2 + a²b²/3)` of the other two components.
#[inline]
#[must_use]
pub fn cube_to_sphere(v: Vec3) -> Vec3 {
    let x2 = v.x * v.x;
    let y2 = v.y * v.y;
    let z2 = v.z * v.z;
    Vec3::new(
        v.x * (1.0 - y2 / 2.0 - z2 / 2.0 + y2 * z2 / 3.0).sqrt(),
        v.y * (1.0 - x2 / 2.0 - z2 / 2.0 + x2 * z2 / 3.0).sqrt(),
        v.z * (1.0 - x2 / 2.0 - y2 / 2.0 + x2 * y2 / 3.0).sqrt(),
    )
}

/// Position on the sphere of `radius` and the outward unit normal for one lattice point.
#[inline]
#[must_use]
pub fn project_lattice_point(p: Vec3, resolution: u32, radius: f32) -> (Vec3, Vec3) {
    let n = cube_to_sphere(to_unit_cube(p, resolution)).normalize_or_zero();
    (n * radius, n)
}
