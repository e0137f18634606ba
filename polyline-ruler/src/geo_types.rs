//! Conversions from [`geo_types`] geometries. Enabled by the `geo-types` feature.
//!
//! `geo_types` coordinates are two-dimensional, so the resulting points always have zero `z`. For geodetic lines
//! `x` is the longitude and `y` is the latitude.

use ::geo_types::{Coord, LineString, Point};

use crate::point::Point3d;
use crate::ruler::PolylineRuler;

/// Converts a coordinate into a point with zero `z`.
pub fn point_from_coord(coord: Coord<f64>) -> Point3d {
    Point3d::new(coord.x, coord.y, 0.0)
}

/// Converts all coordinates of the line string into points with zero `z`.
pub fn points_from_line_string(line: &LineString<f64>) -> Vec<Point3d> {
    line.coords().copied().map(point_from_coord).collect()
}

impl PolylineRuler {
    /// Creates a ruler over the coordinates of a line string.
    pub fn from_line_string(line: &LineString<f64>, is_geodetic: bool) -> Self {
        Self::new(points_from_line_string(line), is_geodetic)
    }

    /// Closest point of the line to a `geo_types` point. See [`PolylineRuler::point_on_line`].
    pub fn project_point(&self, point: &Point<f64>) -> Point3d {
        self.point_on_line(&point_from_coord(point.0)).point
    }
}

impl From<&LineString<f64>> for PolylineRuler {
    fn from(line: &LineString<f64>) -> Self {
        Self::from_line_string(line, false)
    }
}
