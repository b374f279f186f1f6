use super::{Point3, Vector3, TOLERANCE};

/// Computes the unnormalized normal of a polygon using Newell's method.
///
/// The length of the result is twice the polygon area.
#[must_use]
pub fn newell_vector(points: &[Point3]) -> Vector3 {
    let n = points.len();
    let mut normal = Vector3::zeros();
    for i in 0..n {
        let curr = &points[i];
        let next = &points[(i + 1) % n];
        normal.x += (curr.y - next.y) * (curr.z + next.z);
        normal.y += (curr.z - next.z) * (curr.x + next.x);
        normal.z += (curr.x - next.x) * (curr.y + next.y);
    }
    normal
}

/// Computes the unit normal of a polygon using Newell's method.
///
/// Degenerate polygons yield the zero vector.
#[must_use]
pub fn newell_normal(points: &[Point3]) -> Vector3 {
    let normal = newell_vector(points);
    let len = normal.norm();
    if len < TOLERANCE {
        Vector3::zeros()
    } else {
        normal / len
    }
}
