//! Append-only store of the grown tree.
//!
//! Nodes live in an arena indexed by [`NodeId`]; each keeps its parent id and
//! its children. Segments are recorded in creation order alongside the branch
//! they belong to. Only the growth scheduler appends; everything public here
//! is read-only.

use glam::Vec3;

use crate::types::{BranchId, NodeId, SegmentId, TriangleId};

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub pos: Vec3,
    /// Generation that created this node. The root is generation 0.
    pub generation: u32,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Mesh triangle the node lies on.
    pub triangle: TriangleId,
}

/// Directed edge from `parent` to the newly created `child`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub parent: NodeId,
    pub child: NodeId,
    pub branch: BranchId,
}

/// Endpoints and depth of one segment, as handed to exporters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentView {
    pub id: SegmentId,
    pub start: Vec3,
    pub end: Vec3,
    /// Generation of the child node.
    pub generation: u32,
    pub branch: BranchId,
}

/// Ordered polyline of one branch: its start node, then every node it grew.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub id: BranchId,
    pub nodes: Vec<NodeId>,
    /// Triangle of each entry in `nodes`.
    pub triangles: Vec<TriangleId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<TreeNode>,
    segments: Vec<Segment>,
    branch_count: usize,
}

impl TreeNode {
    pub(crate) fn new_root(pos: Vec3, triangle: TriangleId) -> Self {
        Self {
            pos,
            generation: 0,
            parent: None,
            children: Vec::with_capacity(2),
            triangle,
        }
    }

    pub(crate) fn new_child(
        pos: Vec3,
        triangle: TriangleId,
        parent: NodeId,
        generation: u32,
    ) -> Self {
        Self {
            pos,
            generation,
            parent: Some(parent),
            children: Vec::with_capacity(2),
            triangle,
        }
    }
}

impl Tree {
    pub(crate) fn new(root_pos: Vec3, root_triangle: TriangleId) -> Self {
        Self {
            nodes: vec![TreeNode::new_root(root_pos, root_triangle)],
            segments: Vec::new(),
            branch_count: 0,
        }
    }

    /// Allocates a fresh branch id.
    pub(crate) fn start_branch(&mut self) -> BranchId {
        let id = self.branch_count;
        self.branch_count += 1;
        id
    }

    /// Appends a child node and the segment leading to it.
    ///
    /// ### Returns
    /// The id of the new node; its segment id is `segment_count() - 1`.
    pub(crate) fn add_child(
        &mut self,
        parent: NodeId,
        pos: Vec3,
        triangle: TriangleId,
        generation: u32,
        branch: BranchId,
    ) -> NodeId {
        let id: NodeId = self.nodes.len();
        self.nodes.push(TreeNode::new_child(pos, triangle, parent, generation));
        self.nodes[parent].children.push(id);
        self.segments.push(Segment {
            parent,
            child: id,
            branch,
        });
        id
    }

    pub const ROOT: NodeId = 0;

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id]
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn branch_count(&self) -> usize {
        self.branch_count
    }

    /// Endpoints of segment `id`.
    #[inline]
    pub fn segment_endpoints(&self, id: SegmentId) -> (Vec3, Vec3) {
        let s = self.segments[id];
        (self.nodes[s.parent].pos, self.nodes[s.child].pos)
    }

    /// Branch of the segment ending at `node`, or `None` for the root.
    pub fn incoming_branch(&self, node: NodeId) -> Option<BranchId> {
        // A node's incoming segment is created together with it, in order.
        node.checked_sub(1).map(|s| self.segments[s].branch)
    }

    /// Every segment with its endpoints, generation and branch, in creation order.
    pub fn segment_views(&self) -> impl Iterator<Item = SegmentView> + '_ {
        self.segments.iter().enumerate().map(|(id, s)| SegmentView {
            id,
            start: self.nodes[s.parent].pos,
            end: self.nodes[s.child].pos,
            generation: self.nodes[s.child].generation,
            branch: s.branch,
        })
    }

    /// Nodes without children.
    pub fn end_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| if n.children.is_empty() { Some(i) } else { None })
            .collect()
    }

    /// Groups segments into per-branch polylines, ordered by branch id.
    pub fn branches(&self) -> Vec<Branch> {
        let mut branches: Vec<Branch> = (0..self.branch_count)
            .map(|id| Branch {
                id,
                nodes: Vec::new(),
                triangles: Vec::new(),
            })
            .collect();

        for s in &self.segments {
            let b = &mut branches[s.branch];
            if b.nodes.is_empty() {
                b.nodes.push(s.parent);
                b.triangles.push(self.nodes[s.parent].triangle);
            }
            b.nodes.push(s.child);
            b.triangles.push(self.nodes[s.child].triangle);
        }
        branches
    }
}
