//! Triangle mesh type.

use nalgebra::Vector3;

/// An indexed triangle mesh.
///
/// Produced by the external surface reconstruction step and published as an
/// immutable snapshot; see [`crate::mesh::MeshBuilder`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    /// Vertex positions in meters.
    pub vertices: Vec<Vector3<f64>>,
    /// Vertex index triples, counter-clockwise winding.
    pub triangles: Vec<[usize; 3]>,
}

impl TriangleMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of triangles.
    #[inline]
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Check if the mesh has no triangles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}
