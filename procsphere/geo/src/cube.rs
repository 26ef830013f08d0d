//! Subdivided cube ("round cube") lattice with stitched walls and caps.
//!
//! Vertices are emitted ring by ring up the four walls, then the interior
//! of the top cap, then the interior of the bottom cap. Cap triangles walk
//! a spiral over that layout so every lattice edge is shared by exactly two
//! triangles and no seam vertex is duplicated.

use glam::Vec3;

/// Smallest supported subdivision count per cube edge.
pub const MIN_RESOLUTION: u32 = 2;
/// Largest supported subdivision count per cube edge (keeps indices 16-bit safe).
pub const MAX_RESOLUTION: u32 = 99;

/// Validated subdivision count per cube edge, in `[MIN_RESOLUTION, MAX_RESOLUTION]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Resolution(u32);

impl Resolution {
    /// Returns `None` when `r` is outside the supported range.
    #[must_use]
    pub fn new(r: u32) -> Option<Self> {
        (MIN_RESOLUTION..=MAX_RESOLUTION).contains(&r).then_some(Self(r))
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }

    /// Vertices in one horizontal wall ring.
    #[must_use]
    pub fn ring_len(self) -> u32 {
        self.0 * 4
    }

    /// Corner + edge + face vertices.
    #[must_use]
    pub fn vertex_count(self) -> usize {
        let r = self.0 as usize;
        let corners = 8;
        let edges = (r * 3 - 3) * 4;
        let faces = (r - 1) * (r - 1) * 6;
        corners + edges + faces
    }

    #[must_use]
    pub fn quad_count(self) -> usize {
        let r = self.0 as usize;
        r * r * 6
    }

    /// Triangle-list length: two triangles of three indices per quad.
    #[must_use]
    pub fn index_count(self) -> usize {
        self.quad_count() * 6
    }
}

/// Cube-space lattice (coordinates in `[0, r]`) plus its triangle list.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeTopology {
    pub resolution: Resolution,
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<u32>,
}

/// Build the lattice vertices and stitched triangle list for `resolution`.
#[must_use]
pub fn build_topology(resolution: Resolution) -> CubeTopology {
    let vertices = cube_vertices(resolution);
    let triangles = cube_triangles(resolution);
    debug_assert_eq!(vertices.len(), resolution.vertex_count());
    debug_assert_eq!(triangles.len(), resolution.index_count());
    CubeTopology { resolution, vertices, triangles }
}

#[allow(clippy::cast_precision_loss)]
fn cube_vertices(resolution: Resolution) -> Vec<Vec3> {
    let r = resolution.get();
    let rf = r as f32;
    let mut out = Vec::with_capacity(resolution.vertex_count());

    // Wall rings, bottom to top.
    for y in 0..=r {
        let yf = y as f32;
        for x in 0..=r {
            out.push(Vec3::new(x as f32, yf, 0.0));
        }
        for z in 1..=r {
            out.push(Vec3::new(rf, yf, z as f32));
        }
        for x in (0..r).rev() {
            out.push(Vec3::new(x as f32, yf, rf));
        }
        for z in (1..r).rev() {
            out.push(Vec3::new(0.0, yf, z as f32));
        }
    }
    // Top cap interior.
    for z in 1..r {
        for x in 1..r {
            out.push(Vec3::new(x as f32, rf, z as f32));
        }
    }
    // Bottom cap interior.
    for z in 1..r {
        for x in 1..r {
            out.push(Vec3::new(x as f32, 0.0, z as f32));
        }
    }
    out
}

/// Append one quad as two triangles sharing the `v01`-`v10` diagonal.
#[inline]
fn set_quad(tris: &mut Vec<u32>, v00: u32, v10: u32, v01: u32, v11: u32) {
    tris.extend_from_slice(&[v00, v01, v10, v10, v01, v11]);
}

fn cube_triangles(resolution: Resolution) -> Vec<u32> {
    let ring = resolution.ring_len();
    let mut tris = Vec::with_capacity(resolution.index_count());

    let mut v = 0u32;
    for _y in 0..resolution.get() {
        for _q in 0..ring - 1 {
            set_quad(&mut tris, v, v + 1, v + ring, v + ring + 1);
            v += 1;
        }
        // Close the ring back onto its first vertex.
        set_quad(&mut tris, v, v + 1 - ring, v + ring, v + 1);
        v += 1;
    }

    top_cap(&mut tris, resolution);
    bottom_cap(&mut tris, resolution);
    tris
}

fn top_cap(tris: &mut Vec<u32>, resolution: Resolution) {
    let r = resolution.get();
    let ring = resolution.ring_len();

    // First row: ring edge at z = 0 against the first interior row.
    let mut v = ring * r;
    for _x in 0..r - 1 {
        set_quad(tris, v, v + 1, v + ring - 1, v + ring);
        v += 1;
    }
    set_quad(tris, v, v + 1, v + ring - 1, v + 2);

    // Middle rows: v_min walks down the x = 0 ring edge, v_max up the x = r edge.
    let mut v_min = ring * (r + 1) - 1;
    let mut v_mid = v_min + 1;
    let mut v_max = v + 2;
    for _z in 1..r - 1 {
        set_quad(tris, v_min, v_mid, v_min - 1, v_mid + r - 1);
        for _x in 1..r - 1 {
            set_quad(tris, v_mid, v_mid + 1, v_mid + r - 1, v_mid + r);
            v_mid += 1;
        }
        set_quad(tris, v_mid, v_max, v_mid + r - 1, v_max + 1);
        v_min -= 1;
        v_mid += 1;
        v_max += 1;
    }

    // Last row: interior against the ring edge at z = r, walked backwards.
    let mut v_top = v_min - 2;
    set_quad(tris, v_min, v_mid, v_top + 1, v_top);
    for _x in 1..r - 1 {
        set_quad(tris, v_mid, v_mid + 1, v_top, v_top - 1);
        v_top -= 1;
        v_mid += 1;
    }
    set_quad(tris, v_mid, v_top - 2, v_top, v_top - 1);
}

fn bottom_cap(tris: &mut Vec<u32>, resolution: Resolution) {
    let r = resolution.get();
    let ring = resolution.ring_len();
    let inner = (r - 1) * (r - 1);
    let total = u32::try_from(resolution.vertex_count()).unwrap_or(u32::MAX);

    // First row, mirrored winding relative to the top cap.
    let mut v = 1;
    let mut v_mid = total - inner;
    set_quad(tris, ring - 1, v_mid, 0, 1);
    for _x in 1..r - 1 {
        set_quad(tris, v_mid, v_mid + 1, v, v + 1);
        v += 1;
        v_mid += 1;
    }
    set_quad(tris, v_mid, v + 2, v, v + 1);

    let mut v_min = ring - 2;
    v_mid -= r - 2;
    let mut v_max = v + 2;
    for _z in 1..r - 1 {
        set_quad(tris, v_min, v_mid + r - 1, v_min + 1, v_mid);
        for _x in 1..r - 1 {
            set_quad(tris, v_mid + r - 1, v_mid + r, v_mid, v_mid + 1);
            v_mid += 1;
        }
        set_quad(tris, v_mid + r - 1, v_max + 1, v_mid, v_max);
        v_min -= 1;
        v_mid += 1;
        v_max += 1;
    }

    let mut v_top = v_min - 1;
    set_quad(tris, v_top + 1, v_top, v_top + 2, v_mid);
    for _x in 1..r - 1 {
        set_quad(tris, v_top, v_top - 1, v_mid, v_mid + 1);
        v_top -= 1;
        v_mid += 1;
    }
    set_quad(tris, v_top, v_top - 1, v_mid, v_top - 2);
}
