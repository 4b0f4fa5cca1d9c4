//! Fractal tree growth constrained to a triangulated surface.
//!
//! Grows branching line networks (such as cardiac Purkinje fibres) over a
//! triangle mesh. Every new segment is kept on the surface and away from the
//! branches grown before it.
//!
//! Main components:
//! - [`mesh`] — the immutable triangle surface with normals and adjacency.
//! - [`spatial_index`] — kd-tree nearest-vertex / nearest-triangle queries.
//! - [`projector`] — walks straight-line steps back onto the surface.
//! - [`collision`] — self-avoidance and boundary checks for new segments,
//!   backed by the [`segment_grid`] neighbourhood index.
//! - [`growth`] — the generation-by-generation growth scheduler.
//! - [`tree`] — the append-only node/segment store handed to exporters.
//! - [`config`] — run parameters.
//! - [`geometry`] — point/triangle/segment kernels.
//! - [`error`] — error types.
//! - [`types`] — shared type aliases and IDs.
//!
//! ```
//! use glam::Vec3;
//! use tree_core::{Mesh, Parameters, grow};
//!
//! let mesh = Mesh::new(
//!     vec![
//!         Vec3::ZERO,
//!         Vec3::new(4.0, 0.0, 0.0),
//!         Vec3::new(4.0, 4.0, 0.0),
//!         Vec3::new(0.0, 4.0, 0.0),
//!     ],
//!     vec![[0, 1, 2], [0, 2, 3]],
//! )
//! .unwrap();
//!
//! let mut params = Parameters::default();
//! params.generations = 4;
//! params.random_seed = Some(1);
//!
//! let grown = grow(&mesh, Vec3::new(1.0, 2.0, 0.0), &params).unwrap();
//! assert!(grown.tree.segment_count() >= 1);
//! ```

pub mod collision;
pub mod config;
pub mod error;
pub mod geometry;
pub mod growth;
pub mod mesh;
pub mod projector;
pub mod segment_grid;
pub mod spatial_index;
pub mod tree;
pub mod types;

pub use config::Parameters;
pub use error::{GrowthError, MeshError, ProjectionError, TreeResult};
pub use growth::{GrowthReport, GrownTree, Termination, Tip, TipState, grow, grow_with_rng};
pub use mesh::Mesh;
pub use spatial_index::SpatialIndex;
pub use tree::{Branch, Segment, SegmentView, Tree, TreeNode};
