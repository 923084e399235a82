//! Mesh buffers handed to the mesh engine

use crate::error::{Error, Result};
use crate::point::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A triangle mesh as a vertex buffer plus a face buffer.
///
/// Built once and immutable afterwards: construction validates every face, so
/// a `MeshGeometry` never holds an out-of-range index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshGeometry {
    vertices: Vec<Point3d>,
    faces: Vec<[usize; 3]>,
}

impl MeshGeometry {
    /// Create a mesh from vertices and faces, checking every face index
    pub fn from_vertices_and_faces(vertices: Vec<Point3d>, faces: Vec<[usize; 3]>) -> Result<Self> {
        let mesh = Self { vertices, faces };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Create an empty mesh
    pub fn empty() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    pub fn vertices(&self) -> &[Point3d] {
        &self.vertices
    }

    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Give up ownership of the buffers
    pub fn into_parts(self) -> (Vec<Point3d>, Vec<[usize; 3]>) {
        (self.vertices, self.faces)
    }

    /// Every face index must address a vertex, and a face must use three
    /// different vertices.
    pub fn validate(&self) -> Result<()> {
        let n = self.vertices.len();
        for (i, face) in self.faces.iter().enumerate() {
            if let Some(&bad) = face.iter().find(|&&v| v >= n) {
                return Err(Error::GeometryInvariant(format!(
                    "face {i} references vertex {bad} but the mesh has {n} vertices"
                )));
            }
            if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
                return Err(Error::GeometryInvariant(format!(
                    "face {i} repeats a vertex: {face:?}"
                )));
            }
        }
        Ok(())
    }

    /// Calculate unit face normals. Zero-area faces get a zero vector.
    pub fn calculate_face_normals(&self) -> Vec<Vector3d> {
        self.faces
            .iter()
            .map(|face| {
                let v0 = self.vertices[face[0]];
                let v1 = self.vertices[face[1]];
                let v2 = self.vertices[face[2]];

                let edge1 = v1 - v0;
                let edge2 = v2 - v0;

                edge1
                    .cross(&edge2)
                    .try_normalize(f64::EPSILON)
                    .unwrap_or_else(|| Vector3d::zeros())
            })
            .collect()
    }

    /// Area of every face
    pub fn face_areas(&self) -> Vec<f64> {
        self.faces
            .iter()
            .map(|face| {
                let v0 = self.vertices[face[0]];
                let edge1 = self.vertices[face[1]] - v0;
                let edge2 = self.vertices[face[2]] - v0;
                0.5 * edge1.cross(&edge2).norm()
            })
            .collect()
    }

    /// Axis-aligned bounds, `None` for a mesh without vertices
    pub fn bounding_box(&self) -> Option<(Point3d, Point3d)> {
        let first = *self.vertices.first()?;
        let mut min = first;
        let mut max = first;

        for vertex in &self.vertices {
            min.x = min.x.min(vertex.x);
            min.y = min.y.min(vertex.y);
            min.z = min.z.min(vertex.z);

            max.x = max.x.max(vertex.x);
            max.y = max.y.max(vertex.y);
            max.z = max.z.max(vertex.z);
        }

        Some((min, max))
    }

    /// Sorted distinct z values of the vertex buffer
    pub fn z_levels(&self) -> Vec<f64> {
        let mut levels: Vec<f64> = self.vertices.iter().map(|v| v.z).collect();
        levels.sort_by(f64::total_cmp);
        levels.dedup();
        levels
    }

    /// Signed volume enclosed by the faces. Positive when the winding makes
    /// normals point outwards.
    pub fn signed_volume(&self) -> f64 {
        self.faces
            .iter()
            .map(|face| {
                let a = self.vertices[face[0]].coords;
                let b = self.vertices[face[1]].coords;
                let c = self.vertices[face[2]].coords;
                a.dot(&b.cross(&c))
            })
            .sum::<f64>()
            / 6.0
    }

    /// True when every directed edge appears exactly once and is matched by
    /// its reverse: the surface is closed and consistently wound.
    pub fn is_closed(&self) -> bool {
        let mut edges: HashMap<(usize, usize), usize> = HashMap::new();
        for face in &self.faces {
            for (a, b) in [(face[0], face[1]), (face[1], face[2]), (face[2], face[0])] {
                *edges.entry((a, b)).or_insert(0) += 1;
            }
        }
        !edges.is_empty()
            && edges
                .iter()
                .all(|(&(a, b), &count)| count == 1 && edges.get(&(b, a)) == Some(&1))
    }
}

impl Default for MeshGeometry {
    fn default() -> Self {
        Self::empty()
    }
}
