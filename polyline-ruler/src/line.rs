//! Measurements along polylines.
//!
//! Every function here takes the line explicitly together with its coordinate mode, so they are stateless and can
//! be called from anywhere. [`PolylineRuler`](crate::PolylineRuler) exposes the same operations as methods and
//! reuses the derived tables between calls.
//!
//! Geodetic lines (`is_geodetic = true`) have `(longitude, latitude, altitude)` points. They are projected into
//! a local east-north-up frame anchored at their first point, measured there in meters, and the resulting points
//! are converted back, so a geodetic line always produces geodetic points. Directions and frame axes are unit
//! vectors of the local frame.

use std::borrow::Cow;

use approx::AbsDiffEq;
use nalgebra::{Matrix3, Matrix4};
use serde::{Deserialize, Serialize};

use crate::contour::Contour;
use crate::geo::{GeodeticApproximation, Projection, WorkingFrame};
use crate::point::{Point3d, Vector3d};
use crate::segment::Segment;

/// Result of projecting a point onto a line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointOnLine {
    /// Closest point of the line.
    pub point: Point3d,
    /// Index of the segment the point lies on. `None` when the line has no segments.
    pub segment_index: Option<usize>,
    /// Position of the point on the segment, in `[0, 1]`.
    pub t: f64,
}

impl AbsDiffEq for PointOnLine {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.segment_index == other.segment_index
            && self.point.abs_diff_eq(&other.point, epsilon)
            && self.t.abs_diff_eq(&other.t, epsilon)
    }
}

/// Squared distance between two points.
pub fn squared_distance(a: &Point3d, b: &Point3d, is_geodetic: bool) -> f64 {
    let frame = WorkingFrame::new(a, is_geodetic, GeodeticApproximation::default());
    (frame.project(b) - frame.project(a)).norm_squared()
}

/// Distance between two points.
pub fn distance(a: &Point3d, b: &Point3d, is_geodetic: bool) -> f64 {
    squared_distance(a, b, is_geodetic).sqrt()
}

/// Total length of the line. Lines with less than 2 points have zero length.
pub fn line_distance(line: &[Point3d], is_geodetic: bool) -> f64 {
    LineView::new(line, is_geodetic).length()
}

/// Cumulative length of the line at each of its points.
pub fn ranges(line: &[Point3d], is_geodetic: bool) -> Vec<f64> {
    let frame = WorkingFrame::for_line(line, is_geodetic, GeodeticApproximation::default());
    planar_ranges(&frame.project_line(line))
}

/// Unit direction of each segment of the line.
///
/// A zero-length segment gets the direction of the nearest segment that has a length (the preceding one if both
/// neighbours are equally far). If the whole line has zero length, all segments point along `+X`.
pub fn dirs(line: &[Point3d], is_geodetic: bool) -> Vec<Vector3d> {
    let frame = WorkingFrame::for_line(line, is_geodetic, GeodeticApproximation::default());
    planar_dirs(&frame.project_line(line))
}

/// Segment containing the given distance from the start of the line and the position on that segment.
///
/// See [`PolylineRuler::segment_index_t`](crate::PolylineRuler::segment_index_t).
pub fn segment_index_t(line: &[Point3d], range: f64, is_geodetic: bool) -> Option<(usize, f64)> {
    LineView::new(line, is_geodetic).segment_index_t(range)
}

/// Direction of travel at the given distance from the start of the line.
///
/// See [`PolylineRuler::dir`](crate::PolylineRuler::dir).
pub fn dir(line: &[Point3d], range: f64, smooth: bool, is_geodetic: bool) -> Vector3d {
    LineView::new(line, is_geodetic).dir(range, smooth)
}

/// Point at the given distance from the start of the line.
///
/// Returns `None` for an empty line, the first point for `range <= 0` and the last point for ranges beyond the
/// length of the line.
pub fn along(line: &[Point3d], range: f64, is_geodetic: bool) -> Option<Point3d> {
    LineView::new(line, is_geodetic).along(range)
}

/// Same as [`along`], but ranges outside of the line are extrapolated along the first or the last segment.
pub fn extended_along(line: &[Point3d], range: f64, is_geodetic: bool) -> Option<Point3d> {
    LineView::new(line, is_geodetic).extended_along(range)
}

/// Distance from the point `p` to the segment `a-b`.
pub fn point_to_segment_distance(p: &Point3d, a: &Point3d, b: &Point3d, is_geodetic: bool) -> f64 {
    let frame = WorkingFrame::new(p, is_geodetic, GeodeticApproximation::default());
    let (p, a, b) = (frame.project(p), frame.project(a), frame.project(b));
    Segment(&a, &b).distance_to_point(&p)
}

/// Closest point of the line to the given point.
///
/// See [`PolylineRuler::point_on_line`](crate::PolylineRuler::point_on_line).
pub fn point_on_line(line: &[Point3d], point: &Point3d, is_geodetic: bool) -> PointOnLine {
    LineView::new(line, is_geodetic).point_on_line(point)
}

/// Part of the line between the projections of two points.
///
/// See [`PolylineRuler::line_slice`](crate::PolylineRuler::line_slice).
pub fn line_slice(line: &[Point3d], start: &Point3d, stop: &Point3d, is_geodetic: bool) -> Vec<Point3d> {
    LineView::new(line, is_geodetic).line_slice(start, stop)
}

/// Part of the line between two distances from its start.
///
/// See [`PolylineRuler::line_slice_along`](crate::PolylineRuler::line_slice_along).
pub fn line_slice_along(line: &[Point3d], start: f64, stop: f64, is_geodetic: bool) -> Vec<Point3d> {
    LineView::new(line, is_geodetic).line_slice_along(start, stop)
}

/// Segment perpendicular to the line at the given distance from its start.
///
/// See [`PolylineRuler::scanline`](crate::PolylineRuler::scanline).
pub fn scanline(
    line: &[Point3d],
    range: f64,
    min: f64,
    max: f64,
    is_geodetic: bool,
) -> Option<[Point3d; 2]> {
    LineView::new(line, is_geodetic).scanline(range, min, max)
}

/// Coordinate frame attached to the line at the given distance from its start.
///
/// See [`PolylineRuler::local_frame`](crate::PolylineRuler::local_frame).
pub fn local_frame(line: &[Point3d], range: f64, smooth: bool, is_geodetic: bool) -> Option<Matrix4<f64>> {
    LineView::new(line, is_geodetic).local_frame(range, smooth)
}

/// Point at parameter `t` between `a` (`t = 0`) and `b` (`t = 1`).
///
/// Geodetic points are interpolated in the local frame at `a`.
pub fn interpolate(a: &Point3d, b: &Point3d, t: f64, is_geodetic: bool) -> Point3d {
    let frame = WorkingFrame::new(a, is_geodetic, GeodeticApproximation::default());
    let (la, lb) = (frame.project(a), frame.project(b));
    frame.unproject(&Segment(&la, &lb).interpolate(t))
}

/// Douglas-Peucker simplification: removes points that deviate less than `epsilon` from the simplified line.
///
/// The first and the last points are always kept, and the kept points are returned unchanged.
pub fn simplify(line: &[Point3d], epsilon: f64, is_geodetic: bool) -> Vec<Point3d> {
    LineView::new(line, is_geodetic).simplify(epsilon)
}

/// Cumulative lengths of a line that is already in a planar frame.
pub(crate) fn planar_ranges(points: &[Point3d]) -> Vec<f64> {
    let mut ranges = Vec::with_capacity(points.len());
    if points.is_empty() {
        return ranges;
    }

    let mut total = 0.0;
    ranges.push(total);
    for segment in points.iter_segments() {
        total += segment.length();
        ranges.push(total);
    }

    ranges
}

/// Segment directions of a line that is already in a planar frame, with zero-length segments resolved.
pub(crate) fn planar_dirs(points: &[Point3d]) -> Vec<Vector3d> {
    let raw: Vec<Option<Vector3d>> = points.iter_segments().map(|s| s.direction()).collect();
    let valid: Vec<(usize, Vector3d)> = raw
        .iter()
        .enumerate()
        .filter_map(|(index, dir)| dir.map(|dir| (index, dir)))
        .collect();

    if valid.len() < raw.len() {
        if valid.is_empty() {
            log::debug!(
                "Line of {} points has zero length, all segments use the default direction",
                points.len()
            );
        } else {
            log::debug!(
                "Substituting neighbour directions for {} zero-length segments",
                raw.len() - valid.len()
            );
        }
    }

    raw.iter()
        .enumerate()
        .map(|(index, dir)| dir.unwrap_or_else(|| nearest_direction(&valid, index)))
        .collect()
}

fn nearest_direction(valid: &[(usize, Vector3d)], index: usize) -> Vector3d {
    let pos = valid.partition_point(|(i, _)| *i < index);
    let before = pos.checked_sub(1).and_then(|p| valid.get(p));
    let after = valid.get(pos);

    match (before, after) {
        (Some(&(b, dir_before)), Some(&(a, dir_after))) => {
            if index - b <= a - index {
                dir_before
            } else {
                dir_after
            }
        }
        (Some(&(_, dir)), None) | (None, Some(&(_, dir))) => dir,
        (None, None) => Vector3d::x(),
    }
}

/// Axes of a frame moving along `forward`: x is forward, y points left and z completes a right-handed frame.
///
/// Left is taken horizontal (`up × forward`); for a vertical direction the projection of `+Y` is used instead. A zero
/// direction gives the identity.
fn frame_axes(forward: &Vector3d) -> Matrix3<f64> {
    let Some(x) = forward.try_normalize(f64::EPSILON) else {
        return Matrix3::identity();
    };

    let y = match Vector3d::z().cross(&x).try_normalize(1e-9) {
        Some(left) => left,
        None => {
            let reference = Vector3d::y();
            (reference - x * x.dot(&reference)).normalize()
        }
    };
    let z = x.cross(&y);

    Matrix3::from_columns(&[x, y, z])
}

fn finite_extent(extent: f64, half_width: f64) -> f64 {
    if extent.is_finite() {
        extent
    } else {
        extent.clamp(-half_width, half_width)
    }
}

/// Position on a line: either one of its vertices or a point strictly inside a segment (in the working frame).
#[derive(Debug, Clone, Copy)]
enum Located {
    Vertex(usize),
    Between(Point3d),
}

/// A line prepared for measurement: its original points, the same points in the working frame and the derived
/// tables.
///
/// Free functions build a view with freshly computed tables, the ruler builds it from its caches. All measurement
/// logic lives here.
pub(crate) struct LineView<'a> {
    line: &'a [Point3d],
    frame: WorkingFrame,
    local: Cow<'a, [Point3d]>,
    ranges: Cow<'a, [f64]>,
    dirs: Cow<'a, [Vector3d]>,
}

impl<'a> LineView<'a> {
    pub(crate) fn new(line: &'a [Point3d], is_geodetic: bool) -> Self {
        let frame = WorkingFrame::for_line(line, is_geodetic, GeodeticApproximation::default());
        let local = frame.project_line(line);
        let ranges = Cow::Owned(planar_ranges(&local));
        let dirs = Cow::Owned(planar_dirs(&local));

        Self {
            line,
            frame,
            local,
            ranges,
            dirs,
        }
    }

    pub(crate) fn from_parts(
        line: &'a [Point3d],
        frame: WorkingFrame,
        local: &'a [Point3d],
        ranges: &'a [f64],
        dirs: &'a [Vector3d],
    ) -> Self {
        Self {
            line,
            frame,
            local: Cow::Borrowed(local),
            ranges: Cow::Borrowed(ranges),
            dirs: Cow::Borrowed(dirs),
        }
    }

    fn len(&self) -> usize {
        self.line.len()
    }

    fn segment(&self, index: usize) -> Segment<'_> {
        Segment(&self.local[index], &self.local[index + 1])
    }

    fn resolve(&self, located: Located) -> Point3d {
        match located {
            Located::Vertex(index) => self.line[index],
            Located::Between(point) => self.frame.unproject(&point),
        }
    }

    fn local_point(&self, located: Located) -> Point3d {
        match located {
            Located::Vertex(index) => self.local[index],
            Located::Between(point) => point,
        }
    }

    fn locate_on_segment(&self, index: usize, t: f64) -> Located {
        if t <= 0.0 {
            Located::Vertex(index)
        } else if t >= 1.0 {
            Located::Vertex(index + 1)
        } else {
            Located::Between(self.segment(index).interpolate(t))
        }
    }

    fn locate(&self, range: f64) -> Option<Located> {
        let n = self.len();
        if n == 0 {
            return None;
        }

        if range <= 0.0 {
            return Some(Located::Vertex(0));
        }

        if range >= self.length() {
            return Some(Located::Vertex(n - 1));
        }

        let (index, t) = self.segment_index_t(range)?;
        Some(self.locate_on_segment(index, t))
    }

    pub(crate) fn length(&self) -> f64 {
        self.ranges.last().copied().unwrap_or(0.0)
    }

    pub(crate) fn segment_index_t(&self, range: f64) -> Option<(usize, f64)> {
        let n = self.len();
        if n < 2 {
            return None;
        }

        let index = self
            .ranges
            .partition_point(|&r| r <= range)
            .saturating_sub(1)
            .min(n - 2);
        let length = self.ranges[index + 1] - self.ranges[index];
        let t = if length > 0.0 {
            (range - self.ranges[index]) / length
        } else {
            0.0
        };

        Some((index, t))
    }

    pub(crate) fn range_at(&self, segment_index: usize, t: f64) -> Option<f64> {
        let start = *self.ranges.get(segment_index)?;
        let end = *self.ranges.get(segment_index + 1)?;
        Some(start + (end - start) * t)
    }

    /// Segment that gives the direction at `range`. Requires at least 2 points.
    fn heading_segment(&self, range: f64) -> usize {
        // The incoming segment wins at a vertex, so look for the first range that is not before the query.
        self.ranges
            .partition_point(|&r| r < range)
            .saturating_sub(1)
            .min(self.len() - 2)
    }

    pub(crate) fn dir(&self, range: f64, smooth: bool) -> Vector3d {
        let n = self.len();
        if n < 2 {
            return Vector3d::zeros();
        }

        let index = self.heading_segment(range);
        let raw = if smooth {
            None
        } else {
            self.segment(index).direction()
        };
        raw.unwrap_or(self.dirs[index])
    }

    pub(crate) fn along(&self, range: f64) -> Option<Point3d> {
        self.locate(range).map(|located| self.resolve(located))
    }

    pub(crate) fn extended_along(&self, range: f64) -> Option<Point3d> {
        let n = self.len();
        if n >= 2 {
            let length = self.length();
            if range < 0.0 {
                let extended = self.local[0] + self.dirs[0] * range;
                return Some(self.frame.unproject(&extended));
            }
            if range > length {
                let extended = self.local[n - 1] + self.dirs[n - 2] * (range - length);
                return Some(self.frame.unproject(&extended));
            }
        }

        self.along(range)
    }

    pub(crate) fn point_on_line(&self, point: &Point3d) -> PointOnLine {
        match self.line {
            [] => {
                return PointOnLine {
                    point: *point,
                    segment_index: None,
                    t: 0.0,
                }
            }
            [single] => {
                return PointOnLine {
                    point: *single,
                    segment_index: None,
                    t: 0.0,
                }
            }
            _ => {}
        }

        let query = self.frame.project(point);
        let mut min_distance = f64::INFINITY;
        let mut best = (0, 0.0);
        for (index, segment) in self.local.iter_segments().enumerate() {
            let (closest, t) = segment.project_point(&query);
            let distance = (query - closest).norm_squared();
            if distance < min_distance {
                min_distance = distance;
                best = (index, t);
            }
        }

        let (index, t) = best;
        PointOnLine {
            point: self.resolve(self.locate_on_segment(index, t)),
            segment_index: Some(index),
            t,
        }
    }

    pub(crate) fn line_slice(&self, start: &Point3d, stop: &Point3d) -> Vec<Point3d> {
        if self.len() < 2 {
            return self.line.to_vec();
        }

        let range_of = |projected: PointOnLine| {
            projected
                .segment_index
                .and_then(|index| self.range_at(index, projected.t))
                .unwrap_or(0.0)
        };

        let start = range_of(self.point_on_line(start));
        let stop = range_of(self.point_on_line(stop));
        self.line_slice_along(start, stop)
    }

    pub(crate) fn line_slice_along(&self, start: f64, stop: f64) -> Vec<Point3d> {
        if self.len() < 2 {
            return self.line.to_vec();
        }

        let (start, stop) = if start <= stop {
            (start, stop)
        } else {
            (stop, start)
        };
        let length = self.length();
        let start = start.clamp(0.0, length);
        let stop = stop.clamp(0.0, length);

        // Vertices strictly between the two positions. A vertex exactly at `start` or `stop` is the endpoint itself.
        let first = self.ranges.partition_point(|&r| r <= start);
        let last = self.ranges.partition_point(|&r| r < stop).max(first);

        let mut slice = Vec::with_capacity(last - first + 2);
        slice.extend(self.along(start));
        slice.extend_from_slice(&self.line[first..last]);
        slice.extend(self.along(stop));
        slice
    }

    pub(crate) fn scanline(&self, range: f64, min: f64, max: f64) -> Option<[Point3d; 2]> {
        match self.line {
            [] => return None,
            [single] => return Some([*single, *single]),
            _ => {}
        }

        let origin = self.local_point(self.locate(range)?);
        let left = frame_axes(&self.dir(range, true)).column(1).into_owned();

        // Infinite extents reach half of the segment the direction is taken from.
        let index = self.heading_segment(range);
        let half_width = (self.ranges[index + 1] - self.ranges[index]) / 2.0;
        let min = finite_extent(min, half_width);
        let max = finite_extent(max, half_width);

        Some([
            self.frame.unproject(&(origin + left * min)),
            self.frame.unproject(&(origin + left * max)),
        ])
    }

    pub(crate) fn local_frame(&self, range: f64, smooth: bool) -> Option<Matrix4<f64>> {
        let origin = self.along(range)?;
        let axes = frame_axes(&self.dir(range, smooth));
        Some(self.frame.frame_at(&origin, &axes))
    }

    pub(crate) fn simplify(&self, epsilon: f64) -> Vec<Point3d> {
        let n = self.len();
        if n <= 2 {
            return self.line.to_vec();
        }

        let threshold = epsilon * epsilon;
        let mut keep = vec![false; n];
        keep[0] = true;
        keep[n - 1] = true;

        let mut stack = vec![(0, n - 1)];
        while let Some((first, last)) = stack.pop() {
            if last <= first + 1 {
                continue;
            }

            let chord = Segment(&self.local[first], &self.local[last]);
            let (index, max_distance) = (first + 1..last)
                .map(|index| (index, chord.distance_to_point_sq(&self.local[index])))
                .fold((first + 1, f64::NEG_INFINITY), |best, candidate| {
                    if candidate.1 > best.1 {
                        candidate
                    } else {
                        best
                    }
                });

            if max_distance >= threshold {
                keep[index] = true;
                stack.push((first, index));
                stack.push((index, last));
            }
        }

        self.line
            .iter()
            .zip(keep)
            .filter_map(|(point, keep)| keep.then_some(*point))
            .collect()
    }
}
