use std::sync::OnceLock;

use nalgebra::Matrix4;

use crate::contour::Contour;
use crate::error::RulerError;
use crate::geo::{GeodeticApproximation, Projection, WorkingFrame};
use crate::line::{planar_dirs, planar_ranges, LineView, PointOnLine};
use crate::point::{points_from_rows, Point3d, Vector3d};

/// A polyline prepared for repeated measurements.
///
/// The ruler owns its points and derives the cumulative length and direction tables the first time they are
/// needed. The tables are kept in [`OnceLock`]s, so a ruler can be shared between threads and queried concurrently.
///
/// All operations return points in the coordinate mode the ruler was created with: geodetic rulers take and return
/// `(longitude, latitude, altitude)` points, while lengths and directions are always measured in meters of the local
/// east-north-up frame anchored at the first point.
///
/// ```
/// use polyline_ruler::{Point3d, PolylineRuler};
///
/// let ruler = PolylineRuler::new(
///     vec![
///         Point3d::new(0.0, 0.0, 0.0),
///         Point3d::new(10.0, 0.0, 0.0),
///         Point3d::new(10.0, 10.0, 0.0),
///     ],
///     false,
/// );
///
/// assert_eq!(ruler.length(), 20.0);
/// assert_eq!(ruler.along(15.0), Some(Point3d::new(10.0, 5.0, 0.0)));
/// ```
#[derive(Debug, Clone)]
pub struct PolylineRuler {
    points: Vec<Point3d>,
    is_geodetic: bool,
    approximation: GeodeticApproximation,
    frame: WorkingFrame,
    local_points: OnceLock<Vec<Point3d>>,
    ranges: OnceLock<Vec<f64>>,
    dirs: OnceLock<Vec<Vector3d>>,
}

impl PolylineRuler {
    /// Creates a new ruler over the given points.
    pub fn new(points: Vec<Point3d>, is_geodetic: bool) -> Self {
        Self::with_frame(points, is_geodetic, GeodeticApproximation::default())
    }

    /// Creates a new ruler from rows of 2 or 3 coordinates. Rows with 2 coordinates get zero `z`.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R], is_geodetic: bool) -> Result<Self, RulerError> {
        Ok(Self::new(points_from_rows(rows)?, is_geodetic))
    }

    /// Changes the way geodetic points are converted into the measurement frame. Has no effect on planar rulers.
    pub fn with_approximation(self, approximation: GeodeticApproximation) -> Self {
        Self::with_frame(self.points, self.is_geodetic, approximation)
    }

    fn with_frame(points: Vec<Point3d>, is_geodetic: bool, approximation: GeodeticApproximation) -> Self {
        let frame = WorkingFrame::for_line(&points, is_geodetic, approximation);
        Self {
            points,
            is_geodetic,
            approximation,
            frame,
            local_points: OnceLock::new(),
            ranges: OnceLock::new(),
            dirs: OnceLock::new(),
        }
    }

    /// Points of the line.
    pub fn points(&self) -> &[Point3d] {
        &self.points
    }

    /// Returns true if the points are `(longitude, latitude, altitude)` triplets.
    pub fn is_geodetic(&self) -> bool {
        self.is_geodetic
    }

    /// Conversion used for geodetic points.
    pub fn approximation(&self) -> GeodeticApproximation {
        self.approximation
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the ruler has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn local_points(&self) -> &[Point3d] {
        if self.frame.is_planar() {
            return &self.points;
        }

        self.local_points.get_or_init(|| {
            log::trace!("Projecting {} points into the working frame", self.points.len());
            self.frame.project_all(&self.points)
        })
    }

    fn view(&self) -> LineView<'_> {
        LineView::from_parts(
            &self.points,
            self.frame,
            self.local_points(),
            self.ranges(),
            self.dirs(),
        )
    }

    /// Cumulative length of the line at each point. The first value is always 0.
    pub fn ranges(&self) -> &[f64] {
        self.ranges.get_or_init(|| {
            log::trace!("Computing ranges of {} points", self.points.len());
            planar_ranges(self.local_points())
        })
    }

    /// Unit direction of each segment. Zero-length segments take the direction of the nearest segment with non-zero
    /// length.
    pub fn dirs(&self) -> &[Vector3d] {
        self.dirs.get_or_init(|| {
            log::trace!("Computing directions of {} segments", self.segment_count());
            planar_dirs(self.local_points())
        })
    }

    /// Total length of the line. 0 for lines with less than 2 points.
    pub fn length(&self) -> f64 {
        self.ranges().last().copied().unwrap_or(0.0)
    }

    /// Segment containing the point at `range` from the start, and the position of that point on the segment.
    ///
    /// At a vertex the outgoing segment is returned with `t = 0`, except for the last vertex. Ranges outside of the
    /// line give the first or the last segment with `t` outside of `[0, 1]`. Returns `None` if the line has no
    /// segments.
    pub fn segment_index_t(&self, range: f64) -> Option<(usize, f64)> {
        self.view().segment_index_t(range)
    }

    /// Distance from the start of the line to the point at parameter `t` of the given segment.
    ///
    /// Returns `None` if there is no such segment.
    pub fn range_at(&self, segment_index: usize, t: f64) -> Option<f64> {
        self.view().range_at(segment_index, t)
    }

    /// Length of the given segment.
    pub fn segment_length(&self, segment_index: usize) -> Option<f64> {
        let ranges = self.ranges();
        Some(ranges.get(segment_index + 1)? - ranges.get(segment_index)?)
    }

    /// Direction of the line at `range` from its start.
    ///
    /// At a vertex the direction of the incoming segment is returned. Ranges outside of the line give the direction
    /// of the first or the last segment.
    ///
    /// With `smooth` the direction table is used. Otherwise the raw direction of the segment is returned. In both
    /// cases a zero-length segment gets the direction of the nearest segment with non-zero length.
    ///
    /// Lines with less than 2 points have no direction and return a zero vector.
    pub fn dir(&self, range: f64, smooth: bool) -> Vector3d {
        self.view().dir(range, smooth)
    }

    /// Point at `range` from the start of the line.
    ///
    /// Ranges outside of the line are clamped to the first and the last point. Returns `None` for an empty line.
    pub fn along(&self, range: f64) -> Option<Point3d> {
        self.view().along(range)
    }

    /// Same as [`PolylineRuler::along`], but ranges outside of the line are extrapolated along the first or the last
    /// segment.
    pub fn extended_along(&self, range: f64) -> Option<Point3d> {
        self.view().extended_along(range)
    }

    /// Point at `range` together with the direction of the line there.
    pub fn arrow(&self, range: f64, smooth: bool) -> Option<(Point3d, Vector3d)> {
        let view = self.view();
        Some((view.along(range)?, view.dir(range, smooth)))
    }

    /// Same as [`PolylineRuler::arrow`] for a number of ranges.
    pub fn arrows(&self, ranges: &[f64], smooth: bool) -> Vec<(Point3d, Vector3d)> {
        let view = self.view();
        ranges
            .iter()
            .filter_map(|&range| Some((view.along(range)?, view.dir(range, smooth))))
            .collect()
    }

    /// Closest point of the line to the given one.
    ///
    /// If several segments are equally close, the first of them is returned. For an empty line the query point
    /// itself is returned, for a single point line that point. In both cases `segment_index` is `None`.
    pub fn point_on_line(&self, point: &Point3d) -> PointOnLine {
        self.view().point_on_line(point)
    }

    /// Part of the line between the projections of `start` and `stop` onto it.
    ///
    /// See [`PolylineRuler::line_slice_along`].
    pub fn line_slice(&self, start: &Point3d, stop: &Point3d) -> Vec<Point3d> {
        self.view().line_slice(start, stop)
    }

    /// Part of the line between `start` and `stop` distances from its start.
    ///
    /// The result starts and ends with the points at these distances and contains all vertices strictly between
    /// them. The order of the arguments does not matter, and both are clamped into the line. If both distances are
    /// the same, the result contains that point twice.
    pub fn line_slice_along(&self, start: f64, stop: f64) -> Vec<Point3d> {
        self.view().line_slice_along(start, stop)
    }

    /// Segment perpendicular to the line at `range` from its start.
    ///
    /// The segment lies along the horizontal left-hand direction of the line, from `min` to `max` distance. An
    /// infinite extent reaches half the length of the segment the direction is taken from, so
    /// `scanline(range, f64::NEG_INFINITY, f64::INFINITY)` is as wide as that segment is long.
    ///
    /// A single point line gives that point twice. Returns `None` for an empty line.
    pub fn scanline(&self, range: f64, min: f64, max: f64) -> Option<[Point3d; 2]> {
        self.view().scanline(range, min, max)
    }

    /// Rigid transform from a frame moving along the line into the coordinates of the line.
    ///
    /// The frame is placed at `range` from the start. Its x axis looks forward, y axis to the left and z axis up.
    /// For a geodetic line the transform maps into ECEF coordinates. Returns `None` for an empty line.
    pub fn local_frame(&self, range: f64, smooth: bool) -> Option<Matrix4<f64>> {
        self.view().local_frame(range, smooth)
    }

    /// Simplified line with points deviating less than `epsilon` from it removed.
    pub fn simplify(&self, epsilon: f64) -> Vec<Point3d> {
        self.view().simplify(epsilon)
    }
}

impl Contour for PolylineRuler {
    fn points(&self) -> &[Point3d] {
        &self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::ecef::{ecef_to_lla_all, lla_to_ecef_all};
    use crate::geo::CheapRuler;
    use crate::line;
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn geodetic_points() -> Vec<Point3d> {
        vec![
            Point3d::new(120.0, 31.0, 0.0),
            Point3d::new(120.001, 31.0, 0.0),
            Point3d::new(120.001, 31.001, 1.0),
            Point3d::new(120.002, 31.0015, 1.5),
            Point3d::new(120.003, 31.001, 2.0),
        ]
    }

    #[test]
    fn planar_length() {
        let ruler = PolylineRuler::new(
            vec![
                Point3d::new(0.0, 0.0, 0.0),
                Point3d::new(3.0, 4.0, 0.0),
                Point3d::new(3.0, 4.0, 12.0),
            ],
            false,
        );

        assert_eq!(ruler.length(), 17.0);
        assert_eq!(ruler.ranges(), &[0.0, 5.0, 17.0]);
        assert_eq!(ruler.ranges()[ruler.len() - 1], ruler.length());
        assert_eq!(ruler.segment_length(1), Some(12.0));
        assert_eq!(ruler.segment_length(2), None);
        assert_eq!(ruler.segment_count(), 2);
    }

    #[test]
    fn empty_and_single_point() {
        let empty = PolylineRuler::new(vec![], false);
        assert!(empty.is_empty());
        assert_eq!(empty.length(), 0.0);
        assert_eq!(empty.along(1.0), None);
        assert_eq!(empty.dir(1.0, true), Vector3d::zeros());
        assert!(empty.line_slice_along(0.0, 1.0).is_empty());
        assert_eq!(empty.scanline(0.0, -1.0, 1.0), None);
        assert_eq!(empty.local_frame(0.0, true), None);

        let point = Point3d::new(1.0, 2.0, 3.0);
        let single = PolylineRuler::new(vec![point], true);
        assert_eq!(single.length(), 0.0);
        assert_eq!(single.ranges(), &[0.0]);
        assert!(single.dirs().is_empty());
        assert_eq!(single.along(5.0), Some(point));
        assert_eq!(single.point_on_line(&Point3d::new(0.0, 0.0, 0.0)).point, point);
        assert_eq!(single.line_slice_along(0.0, 1.0), vec![point]);
        assert_eq!(single.scanline(0.0, -5.0, 5.0), Some([point, point]));
    }

    #[test]
    fn from_rows() {
        let ruler = PolylineRuler::from_rows(&[vec![0.0, 0.0], vec![0.0, 10.0, 5.0]], false).unwrap();
        assert_eq!(ruler.points()[0], Point3d::new(0.0, 0.0, 0.0));
        assert_abs_diff_eq!(ruler.length(), 125f64.sqrt());

        assert_matches!(
            PolylineRuler::from_rows(&[vec![0.0, 0.0], vec![1.0]], false),
            Err(RulerError::Dimension { row: 1, len: 1 })
        );
    }

    #[test]
    fn methods_match_free_functions() {
        let points = geodetic_points();
        let ruler = PolylineRuler::new(points.clone(), true);

        assert_eq!(ruler.length(), line::line_distance(&points, true));
        assert_eq!(ruler.ranges(), line::ranges(&points, true).as_slice());
        assert_eq!(ruler.dirs(), line::dirs(&points, true).as_slice());

        for range in [-10.0, 0.0, 50.0, 111.0, 200.0, 1000.0] {
            assert_eq!(ruler.along(range), line::along(&points, range, true));
            assert_eq!(ruler.extended_along(range), line::extended_along(&points, range, true));
            assert_eq!(ruler.dir(range, false), line::dir(&points, range, false, true));
            assert_eq!(ruler.local_frame(range, true), line::local_frame(&points, range, true, true));
        }

        let query = Point3d::new(120.0015, 31.0006, 0.0);
        assert_eq!(ruler.point_on_line(&query), line::point_on_line(&points, &query, true));
    }

    #[test]
    fn geodetic_round_trip_through_ecef() {
        let points = geodetic_points();
        let restored = ecef_to_lla_all(&lla_to_ecef_all(&points));

        for (restored, original) in restored.iter().zip(&points) {
            assert_abs_diff_eq!(restored.x, original.x, epsilon = 1e-7);
            assert_abs_diff_eq!(restored.y, original.y, epsilon = 1e-7);
            assert_abs_diff_eq!(restored.z, original.z, epsilon = 1e-6);
        }
    }

    #[test]
    fn geodetic_ruler() {
        init_logger();

        let points = geodetic_points();
        let ruler = PolylineRuler::new(points.clone(), true);

        // Segments are short, so the cheap ruler at the anchor latitude should agree within centimeters.
        let cheap = CheapRuler::new(points[0].y);
        let expected: f64 = points
            .windows(2)
            .map(|pair| cheap.distance(&pair[0], &pair[1]))
            .sum();
        assert_abs_diff_eq!(ruler.length(), expected, epsilon = 0.05);
        assert_abs_diff_eq!(ruler.ranges()[1], 95.4, epsilon = 0.5);

        assert_eq!(ruler.along(0.0), Some(points[0]));
        assert_eq!(ruler.along(ruler.length()), Some(points[4]));

        let range = ruler.ranges()[1] + 30.0;
        let point = ruler.along(range).unwrap();
        let projected = ruler.point_on_line(&point);
        assert_eq!(projected.segment_index, Some(1));
        assert_abs_diff_eq!(projected.point, point, epsilon = 1e-9);
        assert_abs_diff_eq!(ruler.range_at(1, projected.t).unwrap(), range, epsilon = 1e-6);

        // Directions are measured in the local east-north-up frame.
        assert_abs_diff_eq!(ruler.dir(10.0, true), Vector3d::new(1.0, 0.0, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn exact_approximation_is_close_to_cheap() {
        let points = geodetic_points();
        let cheap = PolylineRuler::new(points.clone(), true);
        let exact = PolylineRuler::new(points, true).with_approximation(GeodeticApproximation::Exact);
        assert_eq!(exact.approximation(), GeodeticApproximation::Exact);

        assert_abs_diff_eq!(cheap.length(), exact.length(), epsilon = 0.05);

        let cheap_point = cheap.along(150.0).unwrap();
        let exact_point = exact.along(150.0).unwrap();
        assert_abs_diff_eq!(cheap_point, exact_point, epsilon = 1e-6);
    }

    #[test]
    fn geodetic_scanline_and_slice() {
        let points = geodetic_points();
        let ruler = PolylineRuler::new(points.clone(), true);

        let [left, right] = ruler.scanline(50.0, -10.0, 10.0).unwrap();
        let center = ruler.along(50.0).unwrap();
        assert_abs_diff_eq!(line::distance(&left, &right, true), 20.0, epsilon = 1e-3);
        assert_abs_diff_eq!(line::distance(&center, &left, true), 10.0, epsilon = 1e-3);
        // First segment goes east, so the scanline goes north-south.
        assert_abs_diff_eq!(left.x, center.x, epsilon = 1e-9);
        assert!(left.y < center.y && right.y > center.y);

        let slice = ruler.line_slice_along(50.0, ruler.ranges()[3]);
        assert_eq!(slice.len(), 4);
        assert_eq!(&slice[1..], &points[1..4]);
    }

    #[test]
    fn geodetic_local_frame_maps_into_ecef() {
        let points = geodetic_points();
        let ruler = PolylineRuler::new(points.clone(), true);

        let frame = ruler.local_frame(0.0, true).unwrap();
        let origin = frame.transform_point(&Point3d::origin());
        let expected = lla_to_ecef_all(&points[..1])[0];
        assert_abs_diff_eq!(origin, expected, epsilon = 1e-6);

        let rotation = frame.fixed_view::<3, 3>(0, 0).into_owned();
        assert_abs_diff_eq!(rotation.determinant(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn arrows_along_the_line() {
        let ruler = PolylineRuler::new(
            vec![
                Point3d::new(0.0, 0.0, 0.0),
                Point3d::new(10.0, 0.0, 0.0),
                Point3d::new(10.0, 10.0, 0.0),
            ],
            false,
        );

        let arrows = ruler.arrows(&[5.0, 15.0], true);
        assert_eq!(
            arrows,
            vec![
                (Point3d::new(5.0, 0.0, 0.0), Vector3d::new(1.0, 0.0, 0.0)),
                (Point3d::new(10.0, 5.0, 0.0), Vector3d::new(0.0, 1.0, 0.0)),
            ]
        );
        assert_eq!(ruler.arrow(5.0, false), Some(arrows[0]));
        assert!(PolylineRuler::new(vec![], false).arrows(&[1.0], true).is_empty());
    }

    #[test]
    fn shared_between_threads() {
        let ruler = PolylineRuler::new(geodetic_points(), true);
        let expected = line::line_distance(ruler.points(), true);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| assert_eq!(ruler.length(), expected));
            }
        });
    }
}
