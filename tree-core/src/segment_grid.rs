//! Uniform grid over accepted segments.
//!
//! Each segment is registered in every cell its bounding box overlaps, so a
//! box query returns every segment whose bounding box overlaps the query box.
//! With a cell size on the order of a segment length, a segment touches at
//! most eight cells and a query inspects a constant number of buckets
//! regardless of how many segments the tree holds.

use std::collections::{BTreeSet, HashMap};

use glam::{IVec3, Vec3};

use crate::types::SegmentId;

#[derive(Debug, Clone)]
pub struct SegmentGrid {
    cell: f32,
    cells: HashMap<IVec3, Vec<SegmentId>>,
}

impl SegmentGrid {
    /// Creates an empty grid with cubic cells of edge `cell`.
    ///
    /// Non-positive sizes are clamped to a small positive value.
    pub fn new(cell: f32) -> Self {
        Self {
            cell: cell.max(1e-6),
            cells: HashMap::new(),
        }
    }

    #[inline]
    fn key(&self, p: Vec3) -> IVec3 {
        (p / self.cell).floor().as_ivec3()
    }

    /// Registers segment `id` spanning `a`..`b`.
    pub fn insert(&mut self, id: SegmentId, a: Vec3, b: Vec3) {
        let lo = self.key(a.min(b));
        let hi = self.key(a.max(b));
        for z in lo.z..=hi.z {
            for y in lo.y..=hi.y {
                for x in lo.x..=hi.x {
                    self.cells.entry(IVec3::new(x, y, z)).or_default().push(id);
                }
            }
        }
    }

    /// Ids of segments whose bounding box may overlap the box `min`..`max`,
    /// in ascending order and without duplicates.
    pub fn query(&self, min: Vec3, max: Vec3) -> Vec<SegmentId> {
        let lo = self.key(min);
        let hi = self.key(max);
        let mut found = BTreeSet::new();
        for z in lo.z..=hi.z {
            for y in lo.y..=hi.y {
                for x in lo.x..=hi.x {
                    if let Some(ids) = self.cells.get(&IVec3::new(x, y, z)) {
                        found.extend(ids.iter().copied());
                    }
                }
            }
        }
        found.into_iter().collect()
    }

    /// Segments near the segment `a`..`b`, within `radius` on every axis.
    pub fn near_segment(&self, a: Vec3, b: Vec3, radius: f32) -> Vec<SegmentId> {
        let pad = Vec3::splat(radius);
        self.query(a.min(b) - pad, a.max(b) + pad)
    }
}
