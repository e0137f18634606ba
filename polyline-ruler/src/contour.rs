//! Contour is a sequence of points connected by straight segments.
//!
//! Contours handled by this crate are always open: the last point is not connected back to the first one. A point
//! sequence is a contour with `N - 1` segments, so empty and single point sequences have no segments at all.

use crate::point::Point3d;
use crate::segment::Segment;

/// Sequence of points. See module level documentation for details.
pub trait Contour {
    /// Points of the contour in order.
    fn points(&self) -> &[Point3d];

    /// Iterate over the points of the contour.
    fn iter_points(&self) -> impl Iterator<Item = &'_ Point3d> {
        self.points().iter()
    }

    /// Iterates over segments of the contour.
    fn iter_segments(&self) -> impl Iterator<Item = Segment<'_>> {
        self.points()
            .windows(2)
            .map(|pair| Segment(&pair[0], &pair[1]))
    }

    /// Number of segments in the contour.
    fn segment_count(&self) -> usize {
        self.points().len().saturating_sub(1)
    }
}

impl Contour for [Point3d] {
    fn points(&self) -> &[Point3d] {
        self
    }
}

impl Contour for Vec<Point3d> {
    fn points(&self) -> &[Point3d] {
        self
    }
}
