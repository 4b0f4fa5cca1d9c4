//! Nearest-vertex and nearest-triangle queries over a static mesh.
//!
//! Two kd-trees are built once: one over vertex positions and one over
//! triangle centroids. A nearest-triangle query first finds the closest
//! centroid at distance `d0`, then gathers every centroid within
//! `d0 + r_max`, where `r_max` is the largest centroid-to-corner radius in the
//! mesh. No triangle outside that ball can be closer than the triangle owning
//! the nearest centroid, so the answer is exact.
//!
//! Both trees are built in one pass from a slice, which tolerates any number
//! of elements sharing a coordinate (flat patches, axis-aligned faces).
//! Meshes at or below [`LINEAR_SCAN_LIMIT`] elements skip the trees and scan.

use glam::Vec3;
use kiddo::{ImmutableKdTree, SquaredEuclidean};

use crate::{
    error::MeshError,
    mesh::Mesh,
    types::{TriangleId, VertexId},
};

/// Element count at or below which queries fall back to a linear scan.
pub const LINEAR_SCAN_LIMIT: usize = 32;

/// Result of a nearest-triangle query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NearestTriangle {
    pub triangle: TriangleId,
    /// Closest point on `triangle` to the query.
    pub point: Vec3,
    pub distance: f32,
}

pub struct SpatialIndex<'m> {
    mesh: &'m Mesh,
    vertex_tree: Option<ImmutableKdTree<f32, 3>>,
    centroid_tree: Option<ImmutableKdTree<f32, 3>>,
    max_radius: f32,
}

impl std::fmt::Debug for SpatialIndex<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("vertices", &self.mesh.vertex_count())
            .field("triangles", &self.mesh.triangle_count())
            .field("vertex_tree", &self.vertex_tree.is_some())
            .field("centroid_tree", &self.centroid_tree.is_some())
            .field("max_radius", &self.max_radius)
            .finish()
    }
}

impl<'m> SpatialIndex<'m> {
    /// Builds the query structures for `mesh`.
    ///
    /// ### Errors
    /// [`MeshError::Empty`] or [`MeshError::NoTriangles`] if the mesh has no
    /// elements to index.
    pub fn new(mesh: &'m Mesh) -> Result<Self, MeshError> {
        if mesh.vertex_count() == 0 {
            return Err(MeshError::Empty);
        }
        if mesh.triangle_count() == 0 {
            return Err(MeshError::NoTriangles);
        }

        let vertex_tree = (mesh.vertex_count() > LINEAR_SCAN_LIMIT)
            .then(|| build_tree(mesh.vertices().iter().copied()));

        let centroid_tree = (mesh.triangle_count() > LINEAR_SCAN_LIMIT)
            .then(|| build_tree((0..mesh.triangle_count()).map(|t| mesh.centroid(t))));

        let max_radius = (0..mesh.triangle_count())
            .map(|t| mesh.centroid_radius(t))
            .fold(0.0, f32::max);

        Ok(Self {
            mesh,
            vertex_tree,
            centroid_tree,
            max_radius,
        })
    }

    pub fn mesh(&self) -> &'m Mesh {
        self.mesh
    }

    /// Index of the mesh vertex closest to `point`.
    ///
    /// Ties resolve to the lowest index on the linear path.
    pub fn nearest_vertex(&self, point: Vec3) -> VertexId {
        if let Some(tree) = &self.vertex_tree {
            let nearest = tree.nearest_one::<SquaredEuclidean>(&point.to_array());
            return nearest.item as VertexId;
        }

        let mut best = 0;
        let mut best_d2 = f32::MAX;
        for (i, v) in self.mesh.vertices().iter().enumerate() {
            let d2 = v.distance_squared(point);
            if d2 < best_d2 {
                best_d2 = d2;
                best = i;
            }
        }
        best
    }

    /// Triangle whose surface is closest to `point`, with the closest point on it.
    ///
    /// Ties resolve to the lowest triangle index so results are deterministic.
    pub fn nearest_triangle(&self, point: Vec3) -> NearestTriangle {
        match &self.centroid_tree {
            Some(tree) => {
                let query = point.to_array();
                let seed = tree.nearest_one::<SquaredEuclidean>(&query);
                let reach = seed.distance.sqrt() + self.max_radius;
                let candidates = tree.within_unsorted::<SquaredEuclidean>(&query, reach * reach);
                let seed_triangle = seed.item as TriangleId;
                self.closest_among(
                    point,
                    candidates
                        .iter()
                        .map(|n| n.item as TriangleId)
                        .chain(std::iter::once(seed_triangle)),
                )
            }
            None => self.closest_among(point, 0..self.mesh.triangle_count()),
        }
    }

    fn closest_among(
        &self,
        point: Vec3,
        triangles: impl Iterator<Item = TriangleId>,
    ) -> NearestTriangle {
        let mut best: Option<NearestTriangle> = None;
        for t in triangles {
            let q = self.mesh.closest_point(t, point);
            let d = q.distance(point);
            let better = match &best {
                None => true,
                Some(b) => d < b.distance || (d == b.distance && t < b.triangle),
            };
            if better {
                best = Some(NearestTriangle {
                    triangle: t,
                    point: q,
                    distance: d,
                });
            }
        }
        // The mesh is never empty here, so at least one candidate exists.
        best.unwrap_or_else(|| {
            let q = self.mesh.closest_point(0, point);
            NearestTriangle {
                triangle: 0,
                point: q,
                distance: q.distance(point),
            }
        })
    }
}

/// Item `i` of the returned tree is the `i`-th point.
fn build_tree(points: impl Iterator<Item = Vec3>) -> ImmutableKdTree<f32, 3> {
    let coords: Vec<[f32; 3]> = points.map(|p| p.to_array()).collect();
    ImmutableKdTree::new_from_slice(&coords)
}
