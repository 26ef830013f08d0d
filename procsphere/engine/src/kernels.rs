//! Per-vertex kernels. Pure functions of one vertex plus shared uniforms,
//! so any backend may evaluate them in any order.

use glam::Vec3;
use sphere_geo::project_lattice_point;

use crate::batch::CompiledNoiseEntry;
use crate::noise::evaluate_elevation;

/// Threads per workgroup in both WGSL kernels; also the minimum rayon split.
pub const WORKGROUP_SIZE: u32 = 256;

/// Cube lattice point to sphere position and outward unit normal.
#[inline]
#[must_use]
pub fn project_vertex(cube_point: Vec3, resolution: u32, radius: f32) -> (Vec3, Vec3) {
    project_lattice_point(cube_point, resolution, radius)
}

/// Displace a sphere point along its direction by the layered noise.
/// Returns the displaced position and the raw elevation.
#[inline]
#[must_use]
pub fn displace_vertex(point: Vec3, entries: &[CompiledNoiseEntry], radius: f32) -> (Vec3, f32) {
    let unit = point.normalize_or_zero();
    let elevation = evaluate_elevation(entries, unit);
    (unit * radius * (1.0 + elevation), elevation)
}
