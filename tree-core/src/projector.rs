//! Keeps growth steps on the mesh surface.
//!
//! A step is first taken in a straight line, then pulled back onto the mesh:
//! the candidate is projected onto the plane of its nearest triangle and, if
//! that projection lands outside the triangle, the walk continues into the
//! neighbour across the exited edge. Walking (instead of a single closest-point
//! query) lets long steps follow a curved surface rather than collapse onto
//! the chord.

use glam::Vec3;

use crate::{
    error::ProjectionError,
    geometry::tangent_direction,
    mesh::Mesh,
    spatial_index::SpatialIndex,
    types::TriangleId,
};

/// A point on the surface and the triangle it lies on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub point: Vec3,
    pub triangle: TriangleId,
}

#[derive(Debug)]
pub struct SurfaceProjector<'m> {
    index: SpatialIndex<'m>,
    max_hops: usize,
    tolerance: f32,
}

impl<'m> SurfaceProjector<'m> {
    /// ### Parameters
    /// - `index` - Spatial index over the growth mesh.
    /// - `max_hops` - Maximum triangle hops per walk.
    /// - `tolerance` - Maximum distance between a result and the surface.
    pub fn new(index: SpatialIndex<'m>, max_hops: usize, tolerance: f32) -> Self {
        Self {
            index,
            max_hops,
            tolerance,
        }
    }

    pub fn mesh(&self) -> &'m Mesh {
        self.index.mesh()
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    /// Closest surface point to `point`. Never fails.
    pub fn snap(&self, point: Vec3) -> Projection {
        let hit = self.index.nearest_triangle(point);
        Projection {
            point: hit.point,
            triangle: hit.triangle,
        }
    }

    /// Surface normal used for steering at `point` on `triangle`.
    ///
    /// Averaged over neighbouring faces when `point` sits on a vertex or edge.
    pub fn normal_at(&self, triangle: TriangleId, point: Vec3) -> Vec3 {
        self.mesh().surface_normal(triangle, point, self.tolerance)
    }

    /// Steps `step` from `from` along `direction`, then walks back onto the surface.
    ///
    /// `direction` is first flattened into the tangent plane at `from`
    /// (see [`Self::normal_at`]).
    ///
    /// ### Errors
    /// - [`ProjectionError::DegenerateDirection`] if `direction` is normal to the surface.
    /// - [`ProjectionError::BoundaryReached`] if the walk exits an open edge.
    /// - [`ProjectionError::HopLimitExceeded`] if the walk does not settle.
    pub fn project(
        &self,
        from: Vec3,
        direction: Vec3,
        step: f32,
    ) -> Result<Projection, ProjectionError> {
        let here = self.index.nearest_triangle(from);
        let dir = tangent_direction(direction, self.normal_at(here.triangle, here.point))
            .ok_or(ProjectionError::DegenerateDirection)?;
        let candidate = from + dir * step;
        let start = self.index.nearest_triangle(candidate).triangle;
        self.walk(candidate, start)
    }

    fn walk(&self, candidate: Vec3, start: TriangleId) -> Result<Projection, ProjectionError> {
        let mesh = self.mesh();
        let mut triangle = start;
        let mut visited: Vec<TriangleId> = Vec::with_capacity(self.max_hops + 1);
        let mut fallback: Option<(f32, Projection)> = None;

        for _ in 0..=self.max_hops {
            let in_plane = mesh.project_to_plane(triangle, candidate);
            let clamped = mesh.closest_point(triangle, in_plane);
            let projection = Projection {
                point: clamped,
                triangle,
            };
            if in_plane.distance(clamped) <= self.tolerance {
                return Ok(projection);
            }

            let d = clamped.distance(candidate);
            if fallback.as_ref().is_none_or(|(best, _)| d < *best) {
                fallback = Some((d, projection));
            }
            visited.push(triangle);

            let edge = mesh.exit_edge(triangle, in_plane);
            match mesh.neighbor(triangle, edge) {
                None => return Err(ProjectionError::BoundaryReached { triangle }),
                // Folding back: the surface point sits on a ridge between
                // visited triangles, so keep the best clamped point.
                Some(next) if visited.contains(&next) => {
                    if let Some((_, best)) = fallback {
                        return Ok(best);
                    }
                }
                Some(next) => triangle = next,
            }
        }

        Err(ProjectionError::HopLimitExceeded {
            hops: self.max_hops,
        })
    }
}
