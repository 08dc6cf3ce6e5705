//! Triangle-level geometry: plane frames, barycentric coordinates,
//! closest-point and ray queries.
//!
//! Every 3D query is reduced to a 2D problem. A rigid transform moves the
//! first triangle corner to the origin and turns the triangle normal (or the
//! ray direction) onto the X axis, so the remaining `(y, z)` components are
//! planar coordinates. Results are lifted back to 3D through barycentric
//! coordinates.
//!
//! Degenerate input never divides by zero: a zero normal yields the identity
//! rotation, and a zero-area planar triangle makes the query return `None`.

use super::{Point3, Tolerance, Transform, UvPoint, Vec3};

/// Barycentric weights `(l1, l2, l3)` with `l1 + l2 + l3 == 1`.
pub type Barycentric = [f64; 3];

/// Closest point on a single triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrianglePoint {
    pub point: Point3,
    pub barycentric: Barycentric,
}

/// Intersection of a line with a single triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineHit {
    pub point: Point3,
    /// Signed distance from the line origin along the unit direction.
    pub t: f64,
    pub barycentric: Barycentric,
}

// ─────────────────────────────────────────────────────────────────────────────
// Frames
// ─────────────────────────────────────────────────────────────────────────────

/// Rotation taking `direction` onto the positive X axis.
///
/// Returns the identity when `direction` is zero or already parallel to X.
#[must_use]
pub fn rotation_onto_x(direction: Vec3) -> Transform {
    let Some(a) = direction.normalized() else {
        return Transform::identity();
    };
    let v = a.cross(Vec3::X);
    let v_len2 = v.length_squared();
    if v_len2 == 0.0 {
        return Transform::identity();
    }
    let c = a.dot(Vec3::X);
    let k = (1.0 - c) / v_len2;
    let vx = [[0.0, -v.z, v.y], [v.z, 0.0, -v.x], [-v.y, v.x, 0.0]];

    let mut r = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
    for (i, row) in r.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            let sq: f64 = (0..3).map(|m| vx[i][m] * vx[m][j]).sum();
            *cell += vx[i][j] + sq * k;
        }
    }
    Transform::from_linear(r)
}

/// Rigid transform into the triangle's plane frame: `t1` maps to the origin
/// and the normal `(t3 - t1) x (t2 - t1)` maps onto the X axis.
#[must_use]
pub fn plane_transform(t1: Point3, t2: Point3, t3: Point3) -> Transform {
    let normal = (t3 - t1).cross(t2 - t1);
    rotation_onto_x(normal).compose(Transform::translate(-t1.to_vec3()))
}

const fn planar(p: Point3) -> UvPoint {
    UvPoint::new(p.y, p.z)
}

// ─────────────────────────────────────────────────────────────────────────────
// Barycentric coordinates
// ─────────────────────────────────────────────────────────────────────────────

/// Barycentric coordinates of `p` relative to the 2D triangle `(a, b, c)`.
///
/// Returns `None` for a zero-area triangle.
#[must_use]
pub fn to_barycentric(p: UvPoint, a: UvPoint, b: UvPoint, c: UvPoint) -> Option<Barycentric> {
    let det = (b.v - c.v) * (a.u - c.u) + (c.u - b.u) * (a.v - c.v);
    let scale = (a.u - c.u)
        .hypot(a.v - c.v)
        .max((b.u - c.u).hypot(b.v - c.v))
        .powi(2);
    if !det.is_finite() || det.abs() <= Tolerance::ZERO_LENGTH.eps * scale {
        return None;
    }
    let l1 = ((b.v - c.v) * (p.u - c.u) + (c.u - b.u) * (p.v - c.v)) / det;
    let l2 = ((c.v - a.v) * (p.u - c.u) + (a.u - c.u) * (p.v - c.v)) / det;
    Some([l1, l2, 1.0 - l1 - l2])
}

#[must_use]
pub fn from_barycentric(l: Barycentric, t1: Point3, t2: Point3, t3: Point3) -> Point3 {
    Point3::weighted(l, [t1, t2, t3])
}

// ─────────────────────────────────────────────────────────────────────────────
// 2D predicates
// ─────────────────────────────────────────────────────────────────────────────

/// Signed side of `p` relative to the directed edge `a -> b`.
#[must_use]
pub fn edge_side(p: UvPoint, a: UvPoint, b: UvPoint) -> f64 {
    (p.u - a.u) * (b.v - a.v) - (p.v - a.v) * (b.u - a.u)
}

/// Inclusive point-in-triangle test, independent of winding order.
#[must_use]
pub fn point_in_triangle_2d(p: UvPoint, a: UvPoint, b: UvPoint, c: UvPoint, tol: Tolerance) -> bool {
    let s1 = edge_side(p, a, b);
    let s2 = edge_side(p, b, c);
    let s3 = edge_side(p, c, a);
    let eps = tol.eps;
    (s1 >= -eps && s2 >= -eps && s3 >= -eps) || (s1 <= eps && s2 <= eps && s3 <= eps)
}

fn closest_point_on_segment_2d(p: UvPoint, a: UvPoint, b: UvPoint) -> UvPoint {
    let du = b.u - a.u;
    let dv = b.v - a.v;
    let len2 = du * du + dv * dv;
    if len2 == 0.0 {
        return a;
    }
    let t = (((p.u - a.u) * du + (p.v - a.v) * dv) / len2).clamp(0.0, 1.0);
    UvPoint::new(a.u + du * t, a.v + dv * t)
}

/// Closest point to `p` inside the 2D triangle `(a, b, c)`: `p` itself when
/// inside, otherwise its projection onto the nearest edge or vertex.
#[must_use]
pub fn closest_point_in_triangle_2d(p: UvPoint, a: UvPoint, b: UvPoint, c: UvPoint) -> UvPoint {
    if point_in_triangle_2d(p, a, b, c, Tolerance::new(0.0)) {
        return p;
    }
    [(a, b), (b, c), (c, a)]
        .into_iter()
        .map(|(s, e)| closest_point_on_segment_2d(p, s, e))
        .min_by(|x, y| p.distance_to(*x).total_cmp(&p.distance_to(*y)))
        .unwrap_or(p)
}

// ─────────────────────────────────────────────────────────────────────────────
// 3D queries
// ─────────────────────────────────────────────────────────────────────────────

/// Closest point on triangle `tri` to `point`, using a precomputed plane frame.
///
/// `frame` must be `plane_transform(tri[0], tri[1], tri[2])`.
#[must_use]
pub fn closest_point_on_triangle_in_frame(
    point: Point3,
    tri: [Point3; 3],
    frame: &Transform,
) -> Option<TrianglePoint> {
    let [p1, p2, p3] = tri.map(|t| planar(frame.apply_point(t)));
    let q = planar(frame.apply_point(point));
    let nearest = closest_point_in_triangle_2d(q, p1, p2, p3);
    let barycentric = to_barycentric(nearest, p1, p2, p3)?;
    let lifted = from_barycentric(barycentric, tri[0], tri[1], tri[2]);
    lifted.is_finite().then_some(TrianglePoint { point: lifted, barycentric })
}

/// Closest point on triangle `(t1, t2, t3)` to `point`.
///
/// Returns `None` for degenerate (zero-area) triangles.
#[must_use]
pub fn closest_point_on_triangle(
    point: Point3,
    t1: Point3,
    t2: Point3,
    t3: Point3,
) -> Option<TrianglePoint> {
    closest_point_on_triangle_in_frame(point, [t1, t2, t3], &plane_transform(t1, t2, t3))
}

/// Intersection of the infinite line through `origin` along `direction` with
/// the triangle. Hits behind the origin are reported with negative `t`.
#[must_use]
pub fn line_triangle_intersect(
    origin: Point3,
    direction: Vec3,
    t1: Point3,
    t2: Point3,
    t3: Point3,
) -> Option<LineHit> {
    let dir = direction.normalized()?;
    let rot = rotation_onto_x(dir);
    let [p1, p2, p3] = [t1, t2, t3].map(|t| planar(rot.apply_point(t)));
    let q = planar(rot.apply_point(origin));
    if !point_in_triangle_2d(q, p1, p2, p3, Tolerance::ZERO_LENGTH) {
        return None;
    }
    let barycentric = to_barycentric(q, p1, p2, p3)?;
    let point = from_barycentric(barycentric, t1, t2, t3);
    let t = (point - origin).dot(dir);
    point.is_finite().then_some(LineHit { point, t, barycentric })
}

/// Unit normal `(t2 - t1) x (t3 - t1)`, or `None` for degenerate triangles.
#[must_use]
pub fn triangle_normal(t1: Point3, t2: Point3, t3: Point3) -> Option<Vec3> {
    (t2 - t1).cross(t3 - t1).normalized()
}

#[must_use]
pub fn triangle_area(t1: Point3, t2: Point3, t3: Point3) -> f64 {
    (t2 - t1).cross(t3 - t1).length() * 0.5
}
