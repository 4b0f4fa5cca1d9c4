//! Validates candidate segments before they enter the tree.
//!
//! A candidate is checked for boundary containment (its end must sit on its
//! triangle) and self-avoidance (it must keep `avoidance_distance` from every
//! accepted segment that does not share its start node). Only segments found
//! in a [`SegmentGrid`] neighbourhood of the candidate are compared.

use glam::Vec3;
use tracing::trace;

use crate::{
    geometry::segment_distance,
    projector::{Projection, SurfaceProjector},
    segment_grid::SegmentGrid,
    tree::Tree,
    types::{NodeId, SegmentId},
};

const BISECTION_STEPS: usize = 24;
const TRUNCATION_MARGIN: f32 = 1e-3;

/// A proposed segment from an existing node to a projected surface point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub parent: NodeId,
    pub start: Vec3,
    pub end: Projection,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RejectReason {
    /// Closer than the avoidance distance to an accepted segment.
    TooClose { segment: SegmentId, distance: f32 },
    /// The end point is not on its triangle.
    OffSurface { distance: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CollisionOutcome {
    Accepted,
    Rejected(RejectReason),
    /// The candidate was shortened to end at `end`, touching another branch
    /// at the avoidance distance.
    Truncated { end: Projection },
}

#[derive(Debug, Clone)]
pub struct CollisionDetector {
    grid: SegmentGrid,
    avoidance: f32,
    allow_truncation: bool,
    min_fraction: f32,
}

impl CollisionDetector {
    /// ### Parameters
    /// - `avoidance` - Minimum separation between non-adjacent segments.
    /// - `cell` - Grid cell size; about one segment length works well.
    /// - `allow_truncation` - Shorten colliding candidates when possible.
    /// - `min_fraction` - Shortest truncated candidate kept, as a fraction.
    pub fn new(avoidance: f32, cell: f32, allow_truncation: bool, min_fraction: f32) -> Self {
        Self {
            grid: SegmentGrid::new(cell.max(avoidance)),
            avoidance,
            allow_truncation,
            min_fraction,
        }
    }

    /// Makes segment `id` of `tree` visible to later checks.
    pub fn register(&mut self, tree: &Tree, id: SegmentId) {
        let (a, b) = tree.segment_endpoints(id);
        self.grid.insert(id, a, b);
    }

    /// Validates `candidate` against the surface and the accepted segments of `tree`.
    pub fn check(
        &self,
        candidate: &Candidate,
        tree: &Tree,
        projector: &SurfaceProjector<'_>,
    ) -> CollisionOutcome {
        let end = candidate.end;
        let off = projector.mesh().closest_point(end.triangle, end.point).distance(end.point);
        if off > projector.tolerance() {
            return CollisionOutcome::Rejected(RejectReason::OffSurface { distance: off });
        }

        let neighbours = self.neighbours(candidate.parent, candidate.start, end.point, tree);
        let Some((segment, distance)) =
            self.closest(candidate.start, end.point, &neighbours, tree)
        else {
            return CollisionOutcome::Accepted;
        };
        if distance >= self.avoidance {
            return CollisionOutcome::Accepted;
        }

        let rejected = CollisionOutcome::Rejected(RejectReason::TooClose { segment, distance });
        if !self.allow_truncation {
            return rejected;
        }
        match self.truncate(candidate, &neighbours, tree, projector) {
            Some(end) => {
                trace!(parent = candidate.parent, segment, "candidate truncated");
                CollisionOutcome::Truncated { end }
            }
            None => rejected,
        }
    }

    /// Accepted segments near `start`..`end`, excluding those touching `parent`.
    fn neighbours(&self, parent: NodeId, start: Vec3, end: Vec3, tree: &Tree) -> Vec<SegmentId> {
        let mut ids = self.grid.near_segment(start, end, self.avoidance);
        ids.retain(|&id| {
            let s = tree.segments()[id];
            s.parent != parent && s.child != parent
        });
        ids
    }

    /// Closest of `ids` to the segment `a`..`b`, ties to the lowest id.
    fn closest(
        &self,
        a: Vec3,
        b: Vec3,
        ids: &[SegmentId],
        tree: &Tree,
    ) -> Option<(SegmentId, f32)> {
        let mut best: Option<(SegmentId, f32)> = None;
        for &id in ids {
            let (p, q) = tree.segment_endpoints(id);
            let d = segment_distance(a, b, p, q);
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((id, d));
            }
        }
        best
    }

    fn clear_of(&self, a: Vec3, b: Vec3, ids: &[SegmentId], tree: &Tree, threshold: f32) -> bool {
        self.closest(a, b, ids, tree)
            .is_none_or(|(_, d)| d >= threshold)
    }

    /// Longest clear prefix of `candidate`, re-snapped onto the surface.
    ///
    /// The distance from a growing prefix to a fixed segment can only shrink,
    /// so the clear prefixes form an interval `[0, t]` that bisection finds.
    fn truncate(
        &self,
        candidate: &Candidate,
        neighbours: &[SegmentId],
        tree: &Tree,
        projector: &SurfaceProjector<'_>,
    ) -> Option<Projection> {
        let start = candidate.start;
        let full = candidate.end.point - start;
        // Aim slightly wide so re-snapping cannot push the end back inside.
        let target = self.avoidance * (1.0 + TRUNCATION_MARGIN);
        let mut lo = 0.0_f32;
        let mut hi = 1.0_f32;
        if !self.clear_of(start, start, neighbours, tree, target) {
            return None;
        }
        for _ in 0..BISECTION_STEPS {
            let mid = 0.5 * (lo + hi);
            if self.clear_of(start, start + full * mid, neighbours, tree, target) {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        if lo < self.min_fraction {
            return None;
        }

        let end = projector.snap(start + full * lo);
        let resnapped = self.neighbours(candidate.parent, start, end.point, tree);
        self.clear_of(start, end.point, &resnapped, tree, self.avoidance)
            .then_some(end)
    }
}
