//! Committed mesh buffers and the sink they are published to.

use glam::Vec3;

use crate::color::Rgba8;

/// Width of the index buffer a host should upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexFormat {
    /// 16-bit indices suffice.
    U16,
    /// More than 65 536 vertices.
    U32,
}

impl IndexFormat {
    /// Narrowest format addressing `vertex_count` vertices.
    #[must_use]
    pub fn for_vertex_count(vertex_count: usize) -> Self {
        if vertex_count <= usize::from(u16::MAX) + 1 {
            IndexFormat::U16
        } else {
            IndexFormat::U32
        }
    }
}

/// Vertex and index data of one generated sphere. Every per-vertex array
/// has the same length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffers {
    /// Displaced positions
    pub vertices: Vec<Vec3>,
    /// Unit normals
    pub normals: Vec<Vec3>,
    /// Raw elevation per vertex
    pub noise_values: Vec<f32>,
    /// Gradient color per vertex
    pub colors: Vec<Rgba8>,
    /// Triangle list
    pub triangles: Vec<u32>,
}

impl MeshBuffers {
    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Index width needed for this mesh.
    #[must_use]
    pub fn index_format(&self) -> IndexFormat {
        IndexFormat::for_vertex_count(self.vertices.len())
    }

    /// Triangle list narrowed to 16 bits, or `None` when an index does not fit.
    #[must_use]
    pub fn indices_u16(&self) -> Option<Vec<u16>> {
        self.triangles.iter().map(|&i| u16::try_from(i).ok()).collect()
    }

    /// Axis-aligned bounds of the vertices, `None` for an empty mesh.
    #[must_use]
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.vertices.first()?;
        Some(self.vertices.iter().fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))))
    }

    /// True when every per-vertex array matches the vertex count.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let n = self.vertices.len();
        self.normals.len() == n && self.noise_values.len() == n && self.colors.len() == n
    }
}

/// Receives each committed mesh. Stands in for the host's mesh object.
pub trait MeshSink {
    /// Called once per successful generation pass.
    fn publish(&mut self, mesh: &MeshBuffers);
}

impl<F: FnMut(&MeshBuffers)> MeshSink for F {
    fn publish(&mut self, mesh: &MeshBuffers) {
        self(mesh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_format_threshold() {
        assert_eq!(IndexFormat::for_vertex_count(58_808), IndexFormat::U16);
        assert_eq!(IndexFormat::for_vertex_count(65_536), IndexFormat::U16);
        assert_eq!(IndexFormat::for_vertex_count(65_537), IndexFormat::U32);
    }

    #[test]
    fn narrowing_fails_on_wide_index() {
        let mesh = MeshBuffers { triangles: vec![0, 1, 70_000], ..MeshBuffers::default() };
        assert_eq!(mesh.indices_u16(), None);
        let mesh = MeshBuffers { triangles: vec![0, 1, 2], ..MeshBuffers::default() };
        assert_eq!(mesh.indices_u16(), Some(vec![0, 1, 2]));
    }

    #[test]
    fn bounds_cover_all_vertices() {
        let mesh = MeshBuffers {
            vertices: vec![Vec3::new(1.0, -2.0, 0.5), Vec3::new(-1.0, 3.0, 0.0)],
            ..MeshBuffers::default()
        };
        assert_eq!(mesh.bounds(), Some((Vec3::new(-1.0, -2.0, 0.0), Vec3::new(1.0, 3.0, 0.5))));
        assert_eq!(MeshBuffers::default().bounds(), None);
    }
}
