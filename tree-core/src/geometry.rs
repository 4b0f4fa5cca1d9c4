//! Small geometric kernels shared by the projector and the collision detector.

use glam::{Quat, Vec3};

const EPS: f32 = 1e-12;

/// Closest point on triangle `abc` to `p`.
///
/// Region-based method from Ericson, "Real-Time Collision Detection" (5.1.5).
pub fn closest_point_on_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    // Inside the face region.
    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

/// Barycentric coordinates `(u, v, w)` of `p` with respect to `abc`, so that
/// `p = u*a + v*b + w*c` when `p` lies in the triangle's plane.
///
/// Coordinates are negative on the far side of the edge opposite the
/// corresponding vertex.
pub fn barycentric(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> [f32; 3] {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;
    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);
    let denom = d00 * d11 - d01 * d01;
    if denom.abs() <= EPS {
        return [1.0, 0.0, 0.0];
    }
    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    [1.0 - v - w, v, w]
}

/// Minimum distance between segments `p1q1` and `p2q2` in 3-D.
///
/// Handles degenerate (zero-length) segments. Ericson (5.1.9).
pub fn segment_distance(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3) -> f32 {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.dot(d1);
    let e = d2.dot(d2);
    let f = d2.dot(r);

    if a <= EPS && e <= EPS {
        return r.length();
    }

    let (s, t) = if a <= EPS {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(r);
        if e <= EPS {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;
            let mut s = if denom > EPS {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };

    let c1 = p1 + d1 * s;
    let c2 = p2 + d2 * t;
    (c1 - c2).length()
}

/// Removes the component of `dir` along `normal` and renormalizes.
///
/// Returns `None` when `dir` is (nearly) parallel to `normal`.
pub fn tangent_direction(dir: Vec3, normal: Vec3) -> Option<Vec3> {
    let tangent = dir - normal * dir.dot(normal);
    tangent.try_normalize()
}

/// Rotates `dir` by `angle` radians about `normal`, keeping the result in the
/// tangent plane.
pub fn rotate_about_normal(dir: Vec3, normal: Vec3, angle: f32) -> Option<Vec3> {
    let rotated = Quat::from_axis_angle(normal, angle) * dir;
    tangent_direction(rotated, normal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tri() -> (Vec3, Vec3, Vec3) {
        (Vec3::ZERO, Vec3::X, Vec3::Y)
    }

    #[test]
    fn closest_point_inside_face_is_orthogonal_projection() {
        let (a, b, c) = tri();
        let p = Vec3::new(0.25, 0.25, 3.0);
        let q = closest_point_on_triangle(p, a, b, c);
        assert_relative_eq!(q.x, 0.25);
        assert_relative_eq!(q.y, 0.25);
        assert_relative_eq!(q.z, 0.0);
    }

    #[test]
    fn closest_point_outside_clamps_to_edge_and_vertex() {
        let (a, b, c) = tri();
        let on_edge = closest_point_on_triangle(Vec3::new(0.5, -1.0, 0.0), a, b, c);
        assert_relative_eq!(on_edge.x, 0.5);
        assert_relative_eq!(on_edge.y, 0.0);

        let at_vertex = closest_point_on_triangle(Vec3::new(2.0, -1.0, 0.0), a, b, c);
        assert_eq!(at_vertex, b);
    }

    #[test]
    fn barycentric_signs_identify_exited_edge() {
        let (a, b, c) = tri();
        let inside = barycentric(Vec3::new(0.2, 0.2, 0.0), a, b, c);
        assert!(inside.iter().all(|&x| x >= 0.0));
        assert_relative_eq!(inside.iter().sum::<f32>(), 1.0);

        // Beyond the hypotenuse: the coordinate of `a` goes negative.
        let beyond = barycentric(Vec3::new(0.8, 0.8, 0.0), a, b, c);
        assert!(beyond[0] < 0.0);
        assert!(beyond[1] > 0.0 && beyond[2] > 0.0);
    }

    #[test]
    fn segment_distance_of_crossing_and_parallel_segments() {
        // Skew segments crossing at height 1.
        let d = segment_distance(
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, -1.0, 1.0),
            Vec3::new(0.0, 1.0, 1.0),
        );
        assert_relative_eq!(d, 1.0);

        // Parallel, offset by 0.5.
        let offset = Vec3::new(0.0, 0.5, 0.0);
        let d = segment_distance(Vec3::ZERO, Vec3::X, offset, Vec3::X + offset);
        assert_relative_eq!(d, 0.5);

        // Collinear, separated by a gap of 1.
        let d = segment_distance(Vec3::ZERO, Vec3::X, Vec3::X * 2.0, Vec3::X * 3.0);
        assert_relative_eq!(d, 1.0);
    }

    #[test]
    fn segment_distance_handles_points() {
        let d = segment_distance(Vec3::Y, Vec3::Y, Vec3::ZERO, Vec3::X);
        assert_relative_eq!(d, 1.0);
        let d = segment_distance(Vec3::ZERO, Vec3::ZERO, Vec3::Z, Vec3::Z);
        assert_relative_eq!(d, 1.0);
    }

    #[test]
    fn rotation_stays_in_tangent_plane() {
        let r = rotate_about_normal(Vec3::X, Vec3::Z, std::f32::consts::FRAC_PI_2).unwrap();
        assert_relative_eq!(r.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(r.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(r.z, 0.0, epsilon = 1e-6);

        assert!(tangent_direction(Vec3::Z, Vec3::Z).is_none());
    }
}
