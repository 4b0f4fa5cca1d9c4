//! Immutable triangulated surface the tree grows on.

use std::collections::HashMap;

use glam::Vec3;

use crate::{
    error::MeshError,
    geometry::{barycentric, closest_point_on_triangle, segment_distance},
    types::{TriangleId, VertexId},
};

/// Triangle mesh with precomputed normals and edge adjacency.
///
/// Edges of triangle `[v0, v1, v2]` are numbered `0 = (v0, v1)`,
/// `1 = (v1, v2)` and `2 = (v2, v0)`; `neighbors[t][e]` is the triangle on the
/// other side of edge `e`, or `None` on a boundary edge.
#[derive(Debug, Clone)]
pub struct Mesh {
    vertices: Vec<Vec3>,
    triangles: Vec<[VertexId; 3]>,
    normals: Vec<Vec3>,
    neighbors: Vec<[Option<TriangleId>; 3]>,
    vertex_triangles: Vec<Vec<TriangleId>>,
}

impl Mesh {
    /// Validates the raw buffers and builds normals and adjacency.
    ///
    /// ### Errors
    /// - [`MeshError::Empty`] / [`MeshError::NoTriangles`] for empty inputs.
    /// - [`MeshError::IndexOutOfRange`] if a triangle references a missing vertex.
    /// - [`MeshError::NonFiniteVertex`] for NaN or infinite coordinates.
    /// - [`MeshError::DegenerateTriangle`] for zero-area triangles.
    pub fn new(vertices: Vec<Vec3>, triangles: Vec<[VertexId; 3]>) -> Result<Self, MeshError> {
        if vertices.is_empty() {
            return Err(MeshError::Empty);
        }
        if triangles.is_empty() {
            return Err(MeshError::NoTriangles);
        }
        if let Some(vertex) = vertices.iter().position(|v| !v.is_finite()) {
            return Err(MeshError::NonFiniteVertex { vertex });
        }

        let vertex_count = vertices.len();
        let mut normals = Vec::with_capacity(triangles.len());
        let mut vertex_triangles = vec![Vec::new(); vertex_count];

        for (t, tri) in triangles.iter().enumerate() {
            if let Some(&index) = tri.iter().find(|&&i| i >= vertex_count) {
                return Err(MeshError::IndexOutOfRange {
                    triangle: t,
                    index,
                    vertex_count,
                });
            }
            let [a, b, c] = tri.map(|i| vertices[i]);
            let normal = (b - a)
                .cross(c - a)
                .try_normalize()
                .ok_or(MeshError::DegenerateTriangle { triangle: t })?;
            normals.push(normal);
            for &v in tri {
                vertex_triangles[v].push(t);
            }
        }

        let neighbors = build_neighbors(&triangles);

        Ok(Self {
            vertices,
            triangles,
            normals,
            neighbors,
            vertex_triangles,
        })
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[[VertexId; 3]] {
        &self.triangles
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Corner positions of triangle `t`.
    #[inline]
    pub fn corners(&self, t: TriangleId) -> [Vec3; 3] {
        self.triangles[t].map(|i| self.vertices[i])
    }

    /// Unit normal of triangle `t`, oriented by its winding.
    #[inline]
    pub fn normal(&self, t: TriangleId) -> Vec3 {
        self.normals[t]
    }

    pub fn centroid(&self, t: TriangleId) -> Vec3 {
        let [a, b, c] = self.corners(t);
        (a + b + c) / 3.0
    }

    /// Triangle across edge `edge` (0..3) of `t`, if any.
    #[inline]
    pub fn neighbor(&self, t: TriangleId, edge: usize) -> Option<TriangleId> {
        self.neighbors[t][edge]
    }

    /// Triangles incident to vertex `v`.
    pub fn vertex_triangles(&self, v: VertexId) -> &[TriangleId] {
        &self.vertex_triangles[v]
    }

    /// Unit surface normal at `p` on triangle `t`.
    ///
    /// A point within `tolerance` of a corner takes the mean normal of every
    /// triangle around that vertex, and a point on an interior edge the mean
    /// of the two triangles sharing it. Elsewhere this is the face normal.
    pub fn surface_normal(&self, t: TriangleId, p: Vec3, tolerance: f32) -> Vec3 {
        let face = self.normals[t];
        let tri = self.triangles[t];

        if let Some(&v) = tri
            .iter()
            .find(|&&v| self.vertices[v].distance(p) <= tolerance)
        {
            return self.mean_normal(&self.vertex_triangles[v]).unwrap_or(face);
        }
        for e in 0..3 {
            let Some(other) = self.neighbors[t][e] else {
                continue;
            };
            let a = self.vertices[tri[e]];
            let b = self.vertices[tri[(e + 1) % 3]];
            if segment_distance(p, p, a, b) <= tolerance {
                return self.mean_normal(&[t, other]).unwrap_or(face);
            }
        }
        face
    }

    /// Normalised sum of the normals of `ts`, `None` if they cancel out.
    fn mean_normal(&self, ts: &[TriangleId]) -> Option<Vec3> {
        ts.iter()
            .map(|&t| self.normals[t])
            .sum::<Vec3>()
            .try_normalize()
    }

    /// Closest point on triangle `t` to `p`.
    pub fn closest_point(&self, t: TriangleId, p: Vec3) -> Vec3 {
        let [a, b, c] = self.corners(t);
        closest_point_on_triangle(p, a, b, c)
    }

    /// Orthogonal projection of `p` onto the plane of triangle `t`.
    pub fn project_to_plane(&self, t: TriangleId, p: Vec3) -> Vec3 {
        let n = self.normals[t];
        let a = self.vertices[self.triangles[t][0]];
        p - n * (p - a).dot(n)
    }

    /// Edge of `t` through which the in-plane point `p` leaves the triangle.
    ///
    /// This is the edge opposite the corner with the most negative
    /// barycentric coordinate.
    pub fn exit_edge(&self, t: TriangleId, p: Vec3) -> usize {
        let [a, b, c] = self.corners(t);
        let bary = barycentric(p, a, b, c);
        let mut k = 0;
        for i in 1..3 {
            if bary[i] < bary[k] {
                k = i;
            }
        }
        (k + 1) % 3
    }

    /// Radius of the smallest centroid-centred sphere enclosing triangle `t`.
    pub fn centroid_radius(&self, t: TriangleId) -> f32 {
        let centroid = self.centroid(t);
        self.corners(t)
            .iter()
            .map(|v| v.distance(centroid))
            .fold(0.0, f32::max)
    }
}

fn build_neighbors(triangles: &[[VertexId; 3]]) -> Vec<[Option<TriangleId>; 3]> {
    let mut edges: HashMap<(VertexId, VertexId), Vec<TriangleId>> = HashMap::new();
    for (t, tri) in triangles.iter().enumerate() {
        for e in 0..3 {
            edges.entry(edge_key(tri, e)).or_default().push(t);
        }
    }

    triangles
        .iter()
        .enumerate()
        .map(|(t, tri)| {
            let mut adj = [None; 3];
            for (e, slot) in adj.iter_mut().enumerate() {
                *slot = edges
                    .get(&edge_key(tri, e))
                    .and_then(|shared| shared.iter().copied().find(|&other| other != t));
            }
            adj
        })
        .collect()
}

#[inline]
fn edge_key(tri: &[VertexId; 3], e: usize) -> (VertexId, VertexId) {
    let a = tri[e];
    let b = tri[(e + 1) % 3];
    (a.min(b), a.max(b))
}
