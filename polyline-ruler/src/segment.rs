//! Straight segments between two points: distances, projection of points and intersections.

use serde::{Deserialize, Serialize};

use crate::point::{Point3d, Vector3d};

/// A straight line segment between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment<'a>(pub &'a Point3d, pub &'a Point3d);

/// Point where two segments cross, with the parameters of that point on both of them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentIntersection {
    /// Intersection point. Its `z` is the average of both segments' heights at the crossing.
    pub point: Point3d,
    /// Parameter along the first segment, in `[0, 1]`.
    pub t: f64,
    /// Parameter along the second segment, in `[0, 1]`.
    pub s: f64,
}

impl Segment<'_> {
    /// Vector from the start to the end of the segment.
    pub fn vector(&self) -> Vector3d {
        self.1 - self.0
    }

    /// Squared length of the segment.
    pub fn length_sq(&self) -> f64 {
        self.vector().norm_squared()
    }

    /// Length of the segment.
    pub fn length(&self) -> f64 {
        self.vector().norm()
    }

    /// Returns true if both ends of the segment are the same point.
    pub fn is_degenerate(&self) -> bool {
        self.0 == self.1
    }

    /// Unit direction from start to end, or `None` for a degenerate segment.
    pub fn direction(&self) -> Option<Vector3d> {
        if self.is_degenerate() {
            None
        } else {
            self.vector().try_normalize(0.0)
        }
    }

    /// Point at parameter `t`: `start + (end - start) * t`. The parameter is not clamped.
    pub fn interpolate(&self, t: f64) -> Point3d {
        self.0 + self.vector() * t
    }

    /// Closest point of the segment to `point` and its parameter, clamped into `[0, 1]`.
    ///
    /// A degenerate segment always returns its start with parameter 0.
    pub fn project_point(&self, point: &Point3d) -> (Point3d, f64) {
        if self.is_degenerate() {
            return (*self.0, 0.0);
        }

        let ab = self.vector();
        let t = ab.dot(&(point - self.0)) / ab.norm_squared();
        if t <= 0.0 {
            (*self.0, 0.0)
        } else if t >= 1.0 {
            (*self.1, 1.0)
        } else {
            (self.0 + ab * t, t)
        }
    }

    /// Squared 3d distance from `point` to its closest point of the segment, as found by
    /// [`Segment::project_point`].
    pub fn distance_to_point_sq(&self, point: &Point3d) -> f64 {
        let (closest, _) = self.project_point(point);
        (point - closest).norm_squared()
    }

    /// Distance from `point` to the segment. See [`Segment::distance_to_point_sq`].
    pub fn distance_to_point(&self, point: &Point3d) -> f64 {
        self.distance_to_point_sq(point).sqrt()
    }

    /// Finds the crossing point of two segments in the XY plane.
    ///
    /// Parallel (including collinear and degenerate) segments are never reported as intersecting.
    pub fn intersects(&self, other: &Segment) -> Option<SegmentIntersection> {
        let s1 = self.vector();
        let s2 = other.vector();

        let div = s1.x * s2.y - s2.x * s1.y;
        if div == 0.0 {
            return None;
        }

        let dx = self.0.x - other.0.x;
        let dy = self.0.y - other.0.y;

        let s = (-s1.y * dx + s1.x * dy) / div;
        if !(0.0..=1.0).contains(&s) {
            return None;
        }

        let t = (s2.x * dy - s2.y * dx) / div;
        if !(0.0..=1.0).contains(&t) {
            return None;
        }

        let on_self = self.interpolate(t);
        let on_other = other.interpolate(s);
        Some(SegmentIntersection {
            point: Point3d::new(on_self.x, on_self.y, (on_self.z + on_other.z) / 2.0),
            t,
            s,
        })
    }
}

/// Intersection of segments `a1-a2` and `b1-b2` in the XY plane. See [`Segment::intersects`].
pub fn intersect_segments(
    a1: &Point3d,
    a2: &Point3d,
    b1: &Point3d,
    b2: &Point3d,
) -> Option<SegmentIntersection> {
    Segment(a1, a2).intersects(&Segment(b1, b2))
}
