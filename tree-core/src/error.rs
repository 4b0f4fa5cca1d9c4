//! Error types for mesh validation, surface projection and tree growth.

use thiserror::Error;

use crate::types::{TriangleId, VertexId};

/// Result type for growth operations.
pub type TreeResult<T> = Result<T, GrowthError>;

/// Errors that make a mesh unusable as a growth surface.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    /// The mesh has no vertices.
    #[error("mesh has no vertices")]
    Empty,

    /// The mesh has vertices but no triangles.
    #[error("mesh has no triangles")]
    NoTriangles,

    /// A triangle references a vertex that does not exist.
    #[error("triangle {triangle} references vertex {index} (mesh has {vertex_count} vertices)")]
    IndexOutOfRange {
        /// The offending triangle.
        triangle: TriangleId,
        /// The invalid vertex index.
        index: VertexId,
        /// Total number of vertices in the mesh.
        vertex_count: usize,
    },

    /// A vertex has a NaN or infinite coordinate.
    #[error("vertex {vertex} has a non-finite coordinate")]
    NonFiniteVertex {
        /// The offending vertex.
        vertex: VertexId,
    },

    /// A triangle has zero area, so no normal can be computed.
    #[error("triangle {triangle} is degenerate (zero area)")]
    DegenerateTriangle {
        /// The offending triangle.
        triangle: TriangleId,
    },
}

/// Reasons the surface projector could not produce an on-surface point.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    /// The proposed direction has no component along the surface.
    #[error("direction is normal to the surface")]
    DegenerateDirection,

    /// The walk left the mesh through an edge with no neighbouring triangle.
    #[error("walked off the mesh boundary at triangle {triangle}")]
    BoundaryReached {
        /// Last triangle visited before the boundary edge.
        triangle: TriangleId,
    },

    /// The triangle walk did not settle within the hop bound.
    #[error("no stable surface point after {hops} triangle hops")]
    HopLimitExceeded {
        /// Number of hops performed.
        hops: usize,
    },

    /// The requested root lies too far from the surface to be snapped onto it.
    #[error("root is {distance} away from the surface (limit {limit})")]
    RootOffSurface {
        /// Distance between the requested root and the closest surface point.
        distance: f32,
        /// Maximum accepted snapping distance.
        limit: f32,
    },
}

/// Errors that abort a growth run before any growth happens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GrowthError {
    /// The mesh is empty or malformed.
    #[error("invalid mesh: {0}")]
    InvalidMesh(#[from] MeshError),

    /// The root could not be placed on the surface.
    #[error("surface projection failed: {0}")]
    SurfaceProjection(#[from] ProjectionError),

    /// A parameter is out of range.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_errors_convert_into_growth_errors() {
        let err: GrowthError = MeshError::Empty.into();
        assert_eq!(err, GrowthError::InvalidMesh(MeshError::Empty));
        assert_eq!(err.to_string(), "invalid mesh: mesh has no vertices");
    }

    #[test]
    fn projection_error_message_names_the_triangle() {
        let err: GrowthError = ProjectionError::BoundaryReached { triangle: 7 }.into();
        assert!(err.to_string().contains("triangle 7"));
    }
}
