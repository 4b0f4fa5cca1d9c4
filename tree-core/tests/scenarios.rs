//! End-to-end growth scenarios on small reference meshes.

mod common;

use approx::assert_relative_eq;
use glam::Vec3;
use tree_core::{
    GrowthError, Mesh, MeshError, Parameters, SpatialIndex, Termination, TipState, grow,
};

fn seeded(seed: u64) -> Parameters {
    let mut cfg = Parameters::default();
    cfg.random_seed = Some(seed);
    cfg
}

#[test]
fn single_triangle_with_outward_direction_keeps_only_the_root() {
    let mesh = common::single_triangle();
    let centroid = Vec3::new(1.0 / 3.0, 1.0 / 3.0, 0.0);

    let mut cfg = seeded(3);
    cfg.initial_direction = Vec3::new(1.0, 1.0, 0.0);
    cfg.initial_length = 1.0;

    let grown = grow(&mesh, centroid, &cfg).unwrap();
    assert_eq!(grown.tree.node_count(), 1);
    assert_eq!(grown.tree.segment_count(), 0);
    assert_eq!(grown.report.terminated_tips, 1);
    assert_eq!(grown.report.blocked_tips, 1);
    assert_eq!(grown.report.active_tips, 0);
    assert_eq!(
        grown.report.projection_failures as u32,
        cfg.max_retries + 1,
        "every attempt should fail projection"
    );
    assert_eq!(
        grown.tips[0].state,
        TipState::Terminated(Termination::ExhaustedRetries)
    );
}

#[test]
fn single_triangle_with_normal_direction_keeps_only_the_root() {
    let mesh = common::single_triangle();
    let mut cfg = seeded(3);
    cfg.initial_direction = Vec3::Z;

    let grown = grow(&mesh, Vec3::new(1.0 / 3.0, 1.0 / 3.0, 0.0), &cfg).unwrap();
    assert_eq!(grown.tree.node_count(), 1);
    assert_eq!(grown.tree.segment_count(), 0);
}

#[test]
fn strip_without_branching_grows_one_straight_polyline() {
    let mesh = common::strip(1.0, 0.1);
    let mut cfg = seeded(11);
    cfg.generations = 5;
    cfg.branching_probability = 0.0;
    cfg.continuation_jitter = 0.0;
    cfg.initial_length = 0.1;
    cfg.branch_length = 0.2;
    cfg.initial_direction = Vec3::X;

    let grown = grow(&mesh, Vec3::new(0.05, 0.05, 0.0), &cfg).unwrap();
    let tree = &grown.tree;
    assert_eq!(tree.segment_count(), 5);
    assert_eq!(tree.node_count(), 6);
    assert_eq!(tree.branch_count(), 1);

    let lengths: Vec<f32> = tree
        .segment_views()
        .map(|s| s.start.distance(s.end))
        .collect();
    assert_relative_eq!(lengths[0], 0.1, epsilon = 1e-5);
    for len in &lengths[1..] {
        assert_relative_eq!(*len, 0.2, epsilon = 1e-5);
    }

    // One polyline: every node has at most one child and sits on the centre line.
    for node in tree.nodes() {
        assert!(node.children.len() <= 1);
        assert_relative_eq!(node.pos.y, 0.05, epsilon = 1e-5);
    }
    assert_relative_eq!(tree.node(5).pos.x, 0.95, epsilon = 1e-4);

    let branches = tree.branches();
    assert_eq!(branches.len(), 1);
    assert_eq!(branches[0].nodes, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(grown.report.active_tips, 1);
}

#[test]
fn sphere_with_full_branching_grows_a_complete_binary_tree() {
    let mesh = common::icosphere(3);
    let root = mesh.vertices()[0];

    let mut cfg = seeded(1234);
    cfg.generations = 10;
    cfg.branching_probability = 1.0;
    cfg.initial_length = 0.05;
    cfg.branch_length = 0.05;
    cfg.avoidance_distance = 0.0;
    cfg.initial_direction = common::sphere_tangent(root);

    let grown = grow(&mesh, root, &cfg).unwrap();
    let tree = &grown.tree;
    assert_eq!(tree.segment_count(), (1 << 10) - 1);
    assert_eq!(tree.node_count(), 1 << 10);
    assert_eq!(tree.end_nodes().len(), 1 << 9);
    assert_eq!(grown.report.active_tips, 1 << 9);
    assert_eq!(grown.report.terminated_tips, 0);

    // The root has the trunk; every other interior node has two children.
    assert_eq!(tree.node(0).children.len(), 1);
    for node in &tree.nodes()[1..] {
        assert!(node.children.is_empty() || node.children.len() == 2);
    }

    let rerun = grow(&mesh, root, &cfg).unwrap();
    assert_eq!(rerun.tree, grown.tree);
}

#[test]
fn sphere_with_avoidance_prunes_but_never_exceeds_binary_count() {
    let mesh = common::icosphere(3);
    let root = mesh.vertices()[0];

    let mut cfg = seeded(99);
    cfg.generations = 10;
    cfg.branching_probability = 1.0;
    cfg.initial_length = 0.05;
    cfg.branch_length = 0.05;
    cfg.avoidance_distance = 0.02;
    cfg.initial_direction = common::sphere_tangent(root);

    let grown = grow(&mesh, root, &cfg).unwrap();
    let count = grown.tree.segment_count();
    assert!(count <= (1 << 10) - 1);
    assert!(count > 1);

    let rerun = grow(&mesh, root, &cfg).unwrap();
    assert_eq!(rerun.tree.segment_count(), count);
    for (a, b) in rerun.tree.nodes().iter().zip(grown.tree.nodes()) {
        assert_eq!(a.pos, b.pos);
    }
}

#[test]
fn flat_grid_large_enough_for_kd_trees_grows_normally() {
    let mesh = common::flat_grid(20);
    assert_eq!(mesh.vertex_count(), 441);

    let index = SpatialIndex::new(&mesh).unwrap();
    let v = index.nearest_vertex(Vec3::new(0.49, 0.51, 0.3));
    assert_eq!(mesh.vertices()[v], Vec3::new(0.5, 0.5, 0.0));

    let grown = grow(&mesh, Vec3::new(0.2, 0.5, 0.0), &seeded(17)).unwrap();
    let tree = &grown.tree;
    assert!(tree.segment_count() > 10);
    for node in tree.nodes() {
        assert!(node.pos.z.abs() <= 1e-6);
        assert!((-1e-5..=1.0 + 1e-5).contains(&node.pos.x));
        assert!((-1e-5..=1.0 + 1e-5).contains(&node.pos.y));
    }
}

#[test]
fn empty_mesh_is_rejected_before_growth() {
    assert_eq!(Mesh::new(vec![], vec![]).unwrap_err(), MeshError::Empty);

    let err: GrowthError = Mesh::new(vec![Vec3::ZERO], vec![]).unwrap_err().into();
    assert!(matches!(err, GrowthError::InvalidMesh(MeshError::NoTriangles)));
}
