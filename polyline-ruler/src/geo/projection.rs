use std::borrow::Cow;

use nalgebra::{Isometry3, IsometryMatrix3, Matrix3, Matrix4, Rotation3, Translation3};
use serde::{Deserialize, Serialize};

use crate::geo::cheap_ruler::CheapRuler;
use crate::geo::ecef::{ecef_to_geodetic, lla_to_ecef};
use crate::geo::enu::{ecef_frame_at, enu_isometry, enu_to_lla, lla_to_enu};
use crate::point::{Point3d, Vector3d};

/// Conversion between the coordinates of a line and a planar frame in which all measurements are done.
pub trait Projection {
    /// Converts a point into the planar frame.
    fn project(&self, point: &Point3d) -> Point3d;

    /// Converts a point from the planar frame back.
    fn unproject(&self, point: &Point3d) -> Point3d;

    /// Projects every point of the sequence.
    fn project_all(&self, points: &[Point3d]) -> Vec<Point3d> {
        points.iter().map(|p| self.project(p)).collect()
    }

    /// Unprojects every point of the sequence.
    fn unproject_all(&self, points: &[Point3d]) -> Vec<Point3d> {
        points.iter().map(|p| self.unproject(p)).collect()
    }
}

/// Projection that leaves points as they are. Used for lines that are already planar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityProjection;

impl Projection for IdentityProjection {
    fn project(&self, point: &Point3d) -> Point3d {
        *point
    }

    fn unproject(&self, point: &Point3d) -> Point3d {
        *point
    }
}

/// Approximate ENU projection: offsets from the anchor scaled by the [`CheapRuler`] factors of the anchor latitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheapEnuProjection {
    anchor: Point3d,
    k: Vector3d,
}

impl CheapEnuProjection {
    /// Creates a projection centered at the given `(lon, lat, alt)` point.
    pub fn new(anchor: Point3d) -> Self {
        Self {
            anchor,
            k: CheapRuler::new(anchor.y).k(),
        }
    }
}

impl Projection for CheapEnuProjection {
    fn project(&self, point: &Point3d) -> Point3d {
        Point3d::from((point - self.anchor).component_mul(&self.k))
    }

    fn unproject(&self, point: &Point3d) -> Point3d {
        self.anchor + point.coords.component_div(&self.k)
    }
}

/// Exact ENU projection through ECEF coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExactEnuProjection {
    anchor: Point3d,
    enu_to_ecef: Isometry3<f64>,
}

impl ExactEnuProjection {
    /// Creates a projection with the tangent plane at the given `(lon, lat, alt)` point.
    pub fn new(anchor: Point3d) -> Self {
        Self {
            anchor,
            enu_to_ecef: enu_isometry(anchor.x, anchor.y, anchor.z),
        }
    }
}

impl Projection for ExactEnuProjection {
    fn project(&self, point: &Point3d) -> Point3d {
        self.enu_to_ecef.inverse_transform_point(&lla_to_ecef(point))
    }

    fn unproject(&self, point: &Point3d) -> Point3d {
        ecef_to_geodetic(&self.enu_to_ecef.transform_point(point))
    }

    fn project_all(&self, points: &[Point3d]) -> Vec<Point3d> {
        lla_to_enu(points, &self.anchor)
    }

    fn unproject_all(&self, points: &[Point3d]) -> Vec<Point3d> {
        enu_to_lla(points, &self.anchor)
    }
}

/// How geodetic lines are mapped into the planar working frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeodeticApproximation {
    /// Per-latitude scale factors of [`CheapRuler`]. Fast and accurate for lines spanning up to a few hundred
    /// kilometers.
    #[default]
    Cheap,
    /// Exact conversion into the tangent plane through ECEF.
    Exact,
}

/// Planar frame in which a line is measured.
///
/// Planar lines are measured as they are. Geodetic lines are projected into an east-north-up frame anchored at
/// their first point, measured there, and the results are projected back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkingFrame {
    /// Coordinates are already planar.
    Planar,
    /// Approximate ENU frame.
    Cheap(CheapEnuProjection),
    /// Exact ENU frame.
    Exact(ExactEnuProjection),
}

impl WorkingFrame {
    /// Creates a frame anchored at the given point. For planar lines the anchor is ignored.
    pub fn new(anchor: &Point3d, is_geodetic: bool, approximation: GeodeticApproximation) -> Self {
        match (is_geodetic, approximation) {
            (false, _) => Self::Planar,
            (true, GeodeticApproximation::Cheap) => Self::Cheap(CheapEnuProjection::new(*anchor)),
            (true, GeodeticApproximation::Exact) => Self::Exact(ExactEnuProjection::new(*anchor)),
        }
    }

    /// Creates a frame anchored at the first point of the line. An empty line is always measured as planar.
    pub fn for_line(line: &[Point3d], is_geodetic: bool, approximation: GeodeticApproximation) -> Self {
        match line.first() {
            Some(anchor) => Self::new(anchor, is_geodetic, approximation),
            None => Self::Planar,
        }
    }

    /// Returns true if the frame does not change coordinates.
    pub fn is_planar(&self) -> bool {
        matches!(self, Self::Planar)
    }

    /// Projects the whole line, borrowing it when no conversion is needed.
    pub fn project_line<'a>(&self, line: &'a [Point3d]) -> Cow<'a, [Point3d]> {
        match self {
            Self::Planar => Cow::Borrowed(line),
            _ => Cow::Owned(self.project_all(line)),
        }
    }

    /// Builds a rigid transform from a local frame attached to the line into the global frame of the line.
    ///
    /// `origin` is given in the line coordinates, `axes` are unit vectors in the working frame. For planar lines the
    /// result places the axes at the origin directly. For geodetic lines the axes are interpreted in the ENU frame
    /// at the origin and the transform maps into ECEF.
    pub fn frame_at(&self, origin: &Point3d, axes: &Matrix3<f64>) -> Matrix4<f64> {
        let rotation = Rotation3::from_matrix_unchecked(*axes);
        match self {
            Self::Planar => {
                IsometryMatrix3::from_parts(Translation3::from(origin.coords), rotation)
                    .to_homogeneous()
            }
            Self::Cheap(_) | Self::Exact(_) => {
                ecef_frame_at(origin.x, origin.y, origin.z) * rotation.to_homogeneous()
            }
        }
    }
}

impl Projection for WorkingFrame {
    fn project(&self, point: &Point3d) -> Point3d {
        match self {
            Self::Planar => IdentityProjection.project(point),
            Self::Cheap(projection) => projection.project(point),
            Self::Exact(projection) => projection.project(point),
        }
    }

    fn unproject(&self, point: &Point3d) -> Point3d {
        match self {
            Self::Planar => IdentityProjection.unproject(point),
            Self::Cheap(projection) => projection.unproject(point),
            Self::Exact(projection) => projection.unproject(point),
        }
    }

    fn project_all(&self, points: &[Point3d]) -> Vec<Point3d> {
        match self {
            Self::Planar => IdentityProjection.project_all(points),
            Self::Cheap(projection) => projection.project_all(points),
            Self::Exact(projection) => projection.project_all(points),
        }
    }

    fn unproject_all(&self, points: &[Point3d]) -> Vec<Point3d> {
        match self {
            Self::Planar => IdentityProjection.unproject_all(points),
            Self::Cheap(projection) => projection.unproject_all(points),
            Self::Exact(projection) => projection.unproject_all(points),
        }
    }
}
