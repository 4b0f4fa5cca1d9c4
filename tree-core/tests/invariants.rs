//! Structural invariants of grown trees.

mod common;

use glam::Vec3;
use tree_core::{GrownTree, Mesh, Parameters, geometry::segment_distance, grow};

fn grow_on_sphere(seed: u64, avoidance: f32) -> (Mesh, GrownTree, Parameters) {
    let mesh = common::icosphere(3);
    let root = mesh.vertices()[17];

    let mut cfg = Parameters::default();
    cfg.random_seed = Some(seed);
    cfg.generations = 9;
    cfg.branching_probability = 0.7;
    cfg.initial_length = 0.08;
    cfg.branch_length = 0.06;
    cfg.avoidance_distance = avoidance;
    cfg.initial_direction = common::sphere_tangent(root);

    let grown = grow(&mesh, root, &cfg).unwrap();
    (mesh, grown, cfg)
}

#[test]
fn every_node_lies_on_the_surface() {
    let (mesh, grown, cfg) = grow_on_sphere(5, 0.02);
    for (i, node) in grown.tree.nodes().iter().enumerate() {
        let d = common::distance_to_surface(&mesh, node.pos);
        assert!(
            d <= cfg.surface_tolerance + 1e-5,
            "node {i} is {d} away from the surface"
        );
        let on_own = mesh.closest_point(node.triangle, node.pos).distance(node.pos);
        assert!(on_own <= cfg.surface_tolerance + 1e-5, "node {i} is off its triangle");
    }
}

#[test]
fn segments_without_shared_endpoints_keep_avoidance_distance() {
    let (_mesh, grown, cfg) = grow_on_sphere(8, 0.02);
    let tree = &grown.tree;
    let segs = tree.segments();
    for i in 0..segs.len() {
        for j in (i + 1)..segs.len() {
            let (a, b) = (segs[i], segs[j]);
            let shared = a.parent == b.parent
                || a.parent == b.child
                || a.child == b.parent
                || a.child == b.child;
            if shared {
                continue;
            }
            let (p1, q1) = tree.segment_endpoints(i);
            let (p2, q2) = tree.segment_endpoints(j);
            let d = segment_distance(p1, q1, p2, q2);
            assert!(
                d >= cfg.avoidance_distance - 1e-5,
                "segments {i} and {j} are only {d} apart"
            );
        }
    }
}

#[test]
fn generations_are_bounded_and_increase_along_edges() {
    let (_mesh, grown, cfg) = grow_on_sphere(13, 0.01);
    let tree = &grown.tree;
    assert!(tree.nodes().iter().all(|n| n.generation <= cfg.generations));
    for s in tree.segments() {
        assert_eq!(tree.node(s.child).generation, tree.node(s.parent).generation + 1);
        assert!(s.child > s.parent);
    }
    assert!(grown.report.generations <= cfg.generations);
}

#[test]
fn branches_partition_the_segments() {
    let (_mesh, grown, _cfg) = grow_on_sphere(21, 0.01);
    let tree = &grown.tree;
    let branches = tree.branches();
    let covered: usize = branches.iter().map(|b| b.nodes.len() - 1).sum();
    assert_eq!(covered, tree.segment_count());
    for b in &branches {
        assert_eq!(b.nodes.len(), b.triangles.len());
        for pair in b.nodes.windows(2) {
            assert_eq!(tree.node(pair[1]).parent, Some(pair[0]));
        }
    }
}

#[test]
fn report_counts_match_the_tree() {
    let (_mesh, grown, _cfg) = grow_on_sphere(34, 0.02);
    let report = grown.report;
    assert_eq!(
        report.accepted + report.truncated,
        grown.tree.segment_count()
    );
    assert_eq!(grown.tips.len(), report.active_tips + report.terminated_tips);
    assert!(grown.tree.node_count() > 1);
}

#[test]
fn different_seeds_give_different_trees() {
    let (_m, a, _) = grow_on_sphere(1, 0.02);
    let (_m, b, _) = grow_on_sphere(2, 0.02);
    let pa: Vec<Vec3> = a.tree.nodes().iter().map(|n| n.pos).collect();
    let pb: Vec<Vec3> = b.tree.nodes().iter().map(|n| n.pos).collect();
    assert_ne!(pa, pb);
}
