//! Mesh geometry representation.
//!
//! This module provides a GPU-agnostic mesh representation that is populated
//! from model files (OBJ) and converted to GPU vertex buffers by the viewport.

use glint_math::{Aabb, Vec3};

/// A mesh consisting of vertex positions, optional normals and UVs, and
/// triangle indices.
///
/// Intentionally decoupled from GPU-specific vertex types to allow flexible
/// loading from model formats.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Vertex normals (optional - will be computed if not provided)
    pub normals: Option<Vec<Vec3>>,

    /// UV coordinates (optional - one [u, v] per vertex)
    pub uvs: Option<Vec<[f32; 2]>>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Axis-aligned bounding box
    pub bounds: Aabb,
}

impl Mesh {
    /// Create a new mesh from positions and indices, optionally with normals
    /// and UVs.
    ///
    /// If normals are not provided they are NOT automatically computed; call
    /// `ensure_normals()` before handing the mesh to the viewport.
    pub fn new(
        positions: Vec<Vec3>,
        indices: Vec<u32>,
        normals: Option<Vec<Vec3>>,
        uvs: Option<Vec<[f32; 2]>>,
    ) -> Self {
        let bounds = Aabb::from_points(&positions);
        Self {
            positions,
            normals,
            uvs,
            indices,
            bounds,
        }
    }

    /// Compute smooth vertex normals by averaging face normals.
    ///
    /// Replaces any existing normals. Each vertex normal is the normalized
    /// sum of the area-weighted face normals sharing that vertex.
    pub fn compute_normals(&mut self) {
        let vertex_count = self.positions.len();
        let mut normals = vec![Vec3::ZERO; vertex_count];

        // Accumulate face normals at each vertex
        for face in self.indices.chunks(3) {
            if face.len() < 3 {
                continue;
            }

            let i0 = face[0] as usize;
            let i1 = face[1] as usize;
            let i2 = face[2] as usize;

            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }

            let p0 = self.positions[i0];
            let p1 = self.positions[i1];
            let p2 = self.positions[i2];

            let edge1 = p1 - p0;
            let edge2 = p2 - p0;
            let face_normal = edge1.cross(edge2); // OBJ uses CCW winding

            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        // Normalize accumulated normals
        for normal in &mut normals {
            let len = normal.length();
            if len > 0.0 {
                *normal /= len;
            } else {
                *normal = Vec3::Y; // Default up normal for degenerate cases
            }
        }

        self.normals = Some(normals);
    }

    /// Check if the mesh has normals.
    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    /// Check if the mesh has UV coordinates.
    pub fn has_uvs(&self) -> bool {
        self.uvs.is_some()
    }

    /// Ensure the mesh has normals, computing them if necessary.
    /// Also recomputes if existing normals don't match the vertex count.
    pub fn ensure_normals(&mut self) {
        let should_compute = match &self.normals {
            None => true,
            Some(normals) => normals.len() != self.positions.len(),
        };

        if should_compute {
            if let Some(normals) = &self.normals {
                log::debug!(
                    "Normals array length ({}) doesn't match vertex count ({}), computing smooth normals",
                    normals.len(),
                    self.positions.len()
                );
            }
            self.compute_normals();
        }
    }

    /// Get the mesh center (center of bounding box).
    pub fn center(&self) -> Vec3 {
        self.bounds.center()
    }

    /// Get the mesh size (diagonal length of bounding box).
    pub fn size(&self) -> f32 {
        self.bounds.diagonal()
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_creation() {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let indices = vec![0, 1, 2];

        let mesh = Mesh::new(positions, indices, None, None);

        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(!mesh.has_normals());
        assert!(!mesh.has_uvs());
    }

    #[test]
    fn test_compute_normals() {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        // CCW winding: 0,1,2 viewed from +Z produces a normal pointing +Z
        let indices = vec![0, 1, 2];

        let mut mesh = Mesh::new(positions, indices, None, None);
        mesh.compute_normals();

        assert!(mesh.has_normals());
        let normals = mesh.normals.as_ref().unwrap();

        for normal in normals {
            assert!((normal.z - 1.0).abs() < 0.001);
        }
    }

    #[test]
    fn test_bounds_computation() {
        let positions = vec![
            Vec3::new(-1.0, -2.0, -3.0),
            Vec3::new(4.0, 5.0, 6.0),
            Vec3::new(0.0, 0.0, 0.0),
        ];
        let indices = vec![0, 1, 2];

        let mesh = Mesh::new(positions, indices, None, None);

        assert!((mesh.bounds.min.x - (-1.0)).abs() < 0.001);
        assert!((mesh.bounds.max.x - 4.0).abs() < 0.001);
        assert!((mesh.bounds.min.y - (-2.0)).abs() < 0.001);
        assert!((mesh.bounds.max.y - 5.0).abs() < 0.001);
        assert!((mesh.bounds.min.z - (-3.0)).abs() < 0.001);
        assert!((mesh.bounds.max.z - 6.0).abs() < 0.001);
    }

    #[test]
    fn test_ensure_normals_recomputes_on_mismatch() {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let indices = vec![0, 1, 2];

        // Wrong-length normals array, as from a face-varying source
        let mut mesh = Mesh::new(positions, indices, Some(vec![Vec3::Y]), None);
        mesh.ensure_normals();

        assert_eq!(mesh.normals.as_ref().unwrap().len(), mesh.vertex_count());
    }

    #[test]
    fn test_degenerate_triangle_gets_default_normal() {
        // All three vertices identical, face normal is zero length
        let positions = vec![Vec3::ZERO, Vec3::ZERO, Vec3::ZERO];
        let indices = vec![0, 1, 2];

        let mut mesh = Mesh::new(positions, indices, None, None);
        mesh.compute_normals();

        for normal in mesh.normals.as_ref().unwrap() {
            assert_eq!(*normal, Vec3::Y);
        }
    }
}
