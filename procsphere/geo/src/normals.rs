use glam::Vec3;

/// Area-weighted vertex normals from a triangle list.
///
/// Vertices not referenced by any triangle, or whose incident faces cancel
/// out, get a zero normal.
#[must_use]
pub fn recalculate_normals(vertices: &[Vec3], triangles: &[u32]) -> Vec<Vec3> {
    let mut acc = vec![Vec3::ZERO; vertices.len()];
    for tri in triangles.chunks_exact(3) {
        let (ia, ib, ic) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let (Some(&a), Some(&b), Some(&c)) = (vertices.get(ia), vertices.get(ib), vertices.get(ic))
        else {
            continue;
        };
        // Unnormalized cross product: magnitude is twice the face area.
        let n = (b - a).cross(c - a);
        acc[ia] += n;
        acc[ib] += n;
        acc[ic] += n;
    }
    for n in &mut acc {
        *n = n.normalize_or_zero();
    }
    acc
}
