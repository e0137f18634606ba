//! Measurements along 3d polylines.
//!
//! A polyline is an ordered sequence of [`Point3d`] connected by straight segments. Points are either planar
//! `(x, y, z)` coordinates or geodetic `(longitude, latitude, altitude)` triplets with angles in degrees. Geodetic
//! lines are measured in meters in a local east-north-up frame anchored at their first point, and the results are
//! converted back, so every operation returns points in the same convention it was given.
//!
//! The operations are available in two forms:
//! * free functions in the [`line`] module, taking the line and its coordinate mode explicitly;
//! * methods of [`PolylineRuler`], which owns the points and caches cumulative lengths and segment directions
//!   between calls.
//!
//! ```
//! use polyline_ruler::{line, Point3d, PolylineRuler};
//!
//! let points = vec![
//!     Point3d::new(0.0, 0.0, 0.0),
//!     Point3d::new(10.0, 0.0, 0.0),
//!     Point3d::new(10.0, 10.0, 0.0),
//! ];
//!
//! let ruler = PolylineRuler::new(points.clone(), false);
//! let slice = ruler.line_slice_along(5.0, 15.0);
//! assert_eq!(
//!     slice,
//!     vec![Point3d::new(5.0, 0.0, 0.0), Point3d::new(10.0, 0.0, 0.0), Point3d::new(10.0, 5.0, 0.0)]
//! );
//! assert_eq!(line::line_slice_along(&points, 5.0, 15.0, false), slice);
//! ```
//!
//! The [`geo`] module contains the coordinate conversions the ruler is built on: geodetic to ECEF and back, ECEF to
//! ENU frames and the approximate [`CheapRuler`](geo::CheapRuler).

pub mod contour;
pub mod error;
pub mod geo;
pub mod line;
pub mod point;
mod ruler;
pub mod segment;

#[cfg(feature = "geo-types")]
pub mod geo_types;

pub use contour::Contour;
pub use error::RulerError;
pub use geo::GeodeticApproximation;
pub use line::PointOnLine;
pub use point::{Point3d, Vector3d};
pub use ruler::PolylineRuler;
pub use segment::{intersect_segments, Segment, SegmentIntersection};
