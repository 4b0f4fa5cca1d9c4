/// Identifier for a node in a [`crate::tree::Tree`].
///
/// This is an index into the tree's node arena, and is only meaningful within
/// the lifetime of a given `Tree` instance.
pub type NodeId = usize;

/// Identifier for a segment in a [`crate::tree::Tree`].
pub type SegmentId = usize;

/// Identifier grouping the segments created by one branching event.
pub type BranchId = usize;

/// Index of a triangle in a [`crate::mesh::Mesh`].
pub type TriangleId = usize;

/// Index of a vertex in a [`crate::mesh::Mesh`].
pub type VertexId = usize;
