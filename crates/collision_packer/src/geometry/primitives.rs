//! Primitive shapes and intersection algorithms for the narrow phase

use crate::foundation::math::{constants::INTERSECTION_EPSILON, Vec3};

/// A bounded line segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Start point
    pub start: Vec3,
    /// End point
    pub end: Vec3,
}

impl Segment {
    /// Creates a new segment
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    /// Unit direction and length, or `None` for a zero-length segment
    pub fn direction_and_length(&self) -> Option<(Vec3, f32)> {
        let delta = self.end - self.start;
        let length = delta.magnitude();
        if length > 0.0 {
            Some((delta / length, length))
        } else {
            None
        }
    }
}

/// A triangle for segment intersection tests
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    /// Triangle vertices in world space
    pub v0: Vec3,
    /// Second vertex
    pub v1: Vec3,
    /// Third vertex
    pub v2: Vec3,
}

impl Triangle {
    /// Creates a new triangle
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    /// Möller-Trumbore test of a ray bounded to `[0, length]`.
    ///
    /// `direction` must be unit length. Near-parallel rays (scalar triple
    /// product within epsilon of zero) never hit. Returns the distance along
    /// the ray on a hit.
    pub fn intersect_bounded_ray(&self, origin: &Vec3, direction: &Vec3, length: f32) -> Option<f32> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = direction.cross(&edge2);
        let det = edge1.dot(&h);

        if det.abs() < INTERSECTION_EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = origin - self.v0;
        let u = inv_det * s.dot(&h);
        if u < 0.0 {
            return None;
        }

        let q = s.cross(&edge1);
        let v = inv_det * direction.dot(&q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = inv_det * edge2.dot(&q);
        if (0.0..=length).contains(&t) {
            Some(t)
        } else {
            None
        }
    }

    /// Does the segment cross this triangle? Zero-length segments never do.
    pub fn hit_by_segment(&self, segment: &Segment) -> bool {
        segment
            .direction_and_length()
            .and_then(|(direction, length)| self.intersect_bounded_ray(&segment.start, &direction, length))
            .is_some()
    }
}

/// Fan-triangulate a convex polygon from its first vertex
pub fn fan_triangles(polygon: &[Vec3]) -> impl Iterator<Item = Triangle> + '_ {
    (1..polygon.len().saturating_sub(1))
        .map(move |i| Triangle::new(polygon[0], polygon[i], polygon[i + 1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor_triangle() -> Triangle {
        Triangle::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 4.0),
        )
    }

    #[test]
    fn test_segment_through_triangle() {
        let seg = Segment::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(1.0, -1.0, 1.0));
        assert!(floor_triangle().hit_by_segment(&seg));
    }

    #[test]
    fn test_segment_stops_short() {
        let seg = Segment::new(Vec3::new(1.0, 2.0, 1.0), Vec3::new(1.0, 0.5, 1.0));
        assert!(!floor_triangle().hit_by_segment(&seg));
    }

    #[test]
    fn test_segment_pointing_away() {
        let seg = Segment::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(1.0, 3.0, 1.0));
        assert!(!floor_triangle().hit_by_segment(&seg));
    }

    #[test]
    fn test_segment_outside_triangle() {
        let seg = Segment::new(Vec3::new(3.0, 1.0, 3.0), Vec3::new(3.0, -1.0, 3.0));
        assert!(!floor_triangle().hit_by_segment(&seg));
    }

    #[test]
    fn test_parallel_segment_rejected() {
        let seg = Segment::new(Vec3::new(-1.0, 0.0, 1.0), Vec3::new(5.0, 0.0, 1.0));
        assert!(!floor_triangle().hit_by_segment(&seg));
    }

    #[test]
    fn test_zero_length_segment_rejected() {
        let p = Vec3::new(1.0, 0.0, 1.0);
        let seg = Segment::new(p, p);
        assert!(seg.direction_and_length().is_none());
        assert!(!floor_triangle().hit_by_segment(&seg));
    }

    #[test]
    fn test_hit_distance() {
        let t = floor_triangle()
            .intersect_bounded_ray(&Vec3::new(1.0, 3.0, 1.0), &Vec3::new(0.0, -1.0, 0.0), 10.0)
            .unwrap();
        approx::assert_relative_eq!(t, 3.0);
    }

    #[test]
    fn test_fan_triangulation() {
        let quad = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        let tris: Vec<_> = fan_triangles(&quad).collect();
        assert_eq!(tris.len(), 2);
        assert_eq!(tris[1].v1, quad[2]);
        assert_eq!(fan_triangles(&quad[..2]).count(), 0);
    }
}
