//! Mesh fixtures shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;

use glam::Vec3;
use tree_core::{Mesh, geometry::closest_point_on_triangle};

/// One flat triangle in the z = 0 plane.
pub fn single_triangle() -> Mesh {
    Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![[0, 1, 2]]).unwrap()
}

/// A `length x width` rectangle in the z = 0 plane split into two triangles.
pub fn strip(length: f32, width: f32) -> Mesh {
    Mesh::new(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(length, 0.0, 0.0),
            Vec3::new(length, width, 0.0),
            Vec3::new(0.0, width, 0.0),
        ],
        vec![[0, 1, 2], [0, 2, 3]],
    )
    .unwrap()
}

/// A flat unit square at z = 0 split into an `n x n` grid of cell pairs.
///
/// Rows and columns share exact coordinates, and every point shares z.
pub fn flat_grid(n: usize) -> Mesh {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            vertices.push(Vec3::new(i as f32 / n as f32, j as f32 / n as f32, 0.0));
        }
    }
    let row = n + 1;
    let mut triangles = Vec::with_capacity(2 * n * n);
    for j in 0..n {
        for i in 0..n {
            let v = j * row + i;
            triangles.push([v, v + 1, v + row + 1]);
            triangles.push([v, v + row + 1, v + row]);
        }
    }
    Mesh::new(vertices, triangles).unwrap()
}

/// Unit icosphere with `subdivisions` rounds of midpoint subdivision.
pub fn icosphere(subdivisions: u32) -> Mesh {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let mut vertices: Vec<Vec3> = [
        (-1.0, t, 0.0),
        (1.0, t, 0.0),
        (-1.0, -t, 0.0),
        (1.0, -t, 0.0),
        (0.0, -1.0, t),
        (0.0, 1.0, t),
        (0.0, -1.0, -t),
        (0.0, 1.0, -t),
        (t, 0.0, -1.0),
        (t, 0.0, 1.0),
        (-t, 0.0, -1.0),
        (-t, 0.0, 1.0),
    ]
    .iter()
    .map(|&(x, y, z)| Vec3::new(x, y, z).normalize())
    .collect();

    let mut faces: Vec<[usize; 3]> = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut midpoints: HashMap<(usize, usize), usize> = HashMap::new();
        let mut midpoint = |a: usize, b: usize, vertices: &mut Vec<Vec3>| -> usize {
            *midpoints.entry((a.min(b), a.max(b))).or_insert_with(|| {
                vertices.push(((vertices[a] + vertices[b]) * 0.5).normalize());
                vertices.len() - 1
            })
        };

        let mut next = Vec::with_capacity(faces.len() * 4);
        for [a, b, c] in faces {
            let ab = midpoint(a, b, &mut vertices);
            let bc = midpoint(b, c, &mut vertices);
            let ca = midpoint(c, a, &mut vertices);
            next.push([a, ab, ca]);
            next.push([b, bc, ab]);
            next.push([c, ca, bc]);
            next.push([ab, bc, ca]);
        }
        faces = next;
    }

    Mesh::new(vertices, faces).unwrap()
}

/// Brute-force distance from `p` to the mesh surface.
pub fn distance_to_surface(mesh: &Mesh, p: Vec3) -> f32 {
    (0..mesh.triangle_count())
        .map(|t| {
            let [a, b, c] = mesh.corners(t);
            closest_point_on_triangle(p, a, b, c).distance(p)
        })
        .fold(f32::MAX, f32::min)
}

/// A unit tangent to the unit sphere at `p`.
pub fn sphere_tangent(p: Vec3) -> Vec3 {
    p.any_orthonormal_vector()
}
