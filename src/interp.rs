use crate::types::{Point, Value, Vector};

// Linear interpolation. Exact at both t = 0 and t = 1.
#[inline]
pub fn lerp(a: Value, b: Value, t: Value) -> Value {
    a * (1.0 - t) + b * t
}

// Component-wise linear interpolation of two vectors
#[inline]
pub fn lerp_vectors(a: &Vector, b: &Vector, t: Value) -> Vector {
    a * (1.0 - t) + b * t
}

// Linearly interpolate between two points by factor t
#[inline]
pub fn interpolate_points(p0: &Point, p1: &Point, t: Value) -> Point {
    Point::new(
        lerp(p0.x, p1.x, t),
        lerp(p0.y, p1.y, t),
        lerp(p0.z, p1.z, t),
    )
}

/// Splits a continuous coordinate along one grid axis into a cell index and
/// the fractional offset inside that cell.
///
/// The cell index is clamped to `[0, samples - 2]` so a position on the outer
/// face resolves to the last cell with offset `1`. The offset is clamped to
/// `[0, 1]`, which lets positions accepted through the containment tolerance
/// take the boundary value. Coordinates within rounding distance of a node
/// snap onto it, so node positions computed as `origin + i * spacing` resolve
/// to offset `0` or `1` exactly.
#[inline]
pub fn cell_coordinate(s: Value, origin: Value, spacing: Value, samples: usize) -> (usize, Value) {
    let mut u = (s - origin) / spacing;
    let node = u.round();
    if (u - node).abs() <= 4.0 * Value::EPSILON * node.abs().max(1.0) {
        u = node;
    }
    let last_cell = samples.saturating_sub(2);
    let cell = if u <= 0.0 {
        0
    } else {
        (u.floor() as usize).min(last_cell)
    };
    let t = (u - cell as Value).clamp(0.0, 1.0);
    (cell, t)
}

/// Blends the 8 corner samples of a cell.
///
/// `corners` follow the cell corner ordering of
/// [`GridField::cell_corner_indices`](crate::grid::GridField::cell_corner_indices)
/// and `t` holds the fractional offsets along X, Y and Z.
///
/// ```text
///  x-edges:  0-1  3-2  4-5  7-6
///  then y:   (01)-(32)  (45)-(76)
///  then z:   (0132)-(4576)
/// ```
#[inline]
pub fn trilinear(corners: &[Vector; 8], t: &Vector) -> Vector {
    let c00 = lerp_vectors(&corners[0], &corners[1], t.x);
    let c10 = lerp_vectors(&corners[3], &corners[2], t.x);
    let c01 = lerp_vectors(&corners[4], &corners[5], t.x);
    let c11 = lerp_vectors(&corners[7], &corners[6], t.x);

    let c0 = lerp_vectors(&c00, &c10, t.y);
    let c1 = lerp_vectors(&c01, &c11, t.y);

    lerp_vectors(&c0, &c1, t.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_hits_endpoints_exactly() {
        assert_eq!(lerp(0.1, 0.7, 0.0), 0.1);
        assert_eq!(lerp(0.1, 0.7, 1.0), 0.7);
        assert!((lerp(0.0, 2.0, 0.25) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn midpoint_of_points() {
        let p = interpolate_points(&Point::new(0.0, 0.0, 0.0), &Point::new(1.0, 2.0, -4.0), 0.5);
        assert_eq!(p, Point::new(0.5, 1.0, -2.0));
    }

    #[test]
    fn cell_coordinate_interior_and_faces() {
        assert_eq!(cell_coordinate(0.0, 0.0, 0.5, 5), (0, 0.0));
        assert_eq!(cell_coordinate(1.0, 0.0, 0.5, 5), (2, 0.0));

        let (cell, t) = cell_coordinate(1.25, 0.0, 0.5, 5);
        assert_eq!(cell, 2);
        assert!((t - 0.5).abs() < 1e-6);

        // Outer face belongs to the last cell.
        assert_eq!(cell_coordinate(2.0, 0.0, 0.5, 5), (3, 1.0));
        // Rounding noise around a node snaps onto it.
        let (cell, t) = cell_coordinate(0.3, 0.0, 0.1, 11);
        assert_eq!((cell, t), (3, 0.0));

        // Slightly outside is clamped.
        assert_eq!(cell_coordinate(-1e-6, 0.0, 0.5, 5), (0, 0.0));
        assert_eq!(cell_coordinate(2.000001, 0.0, 0.5, 5), (3, 1.0));
    }

    #[test]
    fn trilinear_corners_and_center() {
        let corners: [Vector; 8] = core::array::from_fn(|i| Vector::new(i as Value, 0.0, 0.0));

        let at = |x: Value, y: Value, z: Value| trilinear(&corners, &Vector::new(x, y, z)).x;
        assert_eq!(at(0.0, 0.0, 0.0), 0.0);
        assert_eq!(at(1.0, 0.0, 0.0), 1.0);
        assert_eq!(at(1.0, 1.0, 0.0), 2.0);
        assert_eq!(at(0.0, 1.0, 0.0), 3.0);
        assert_eq!(at(0.0, 0.0, 1.0), 4.0);
        assert_eq!(at(1.0, 1.0, 1.0), 6.0);
        assert!((at(0.5, 0.5, 0.5) - 3.5).abs() < 1e-6);
    }
}
