//! Fast approximate conversion between geodetic coordinates and a local planar frame.
//!
//! Near a reference latitude, one degree of longitude and one degree of latitude correspond to an almost constant
//! number of meters. [`CheapRuler`] computes these scale factors with the flattening-aware formulas of Mapbox's
//! cheap-ruler, which stay accurate within a fraction of a percent over distances of a few hundred kilometers.

use serde::{Deserialize, Serialize};

use crate::geo::projection::{CheapEnuProjection, Projection};
use crate::geo::Datum;
use crate::point::{Point3d, Vector3d};

/// Per-latitude scale factors between geodetic degrees and meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheapRuler {
    kx: f64,
    ky: f64,
}

impl CheapRuler {
    /// Creates a ruler for the given latitude (degrees) on the WGS84 ellipsoid.
    pub fn new(latitude: f64) -> Self {
        Self::with_datum(latitude, &Datum::WGS84)
    }

    /// Creates a ruler for the given latitude (degrees) on an arbitrary ellipsoid.
    pub fn with_datum(latitude: f64, datum: &Datum) -> Self {
        let e2 = datum.e2();
        let meters_per_degree = datum.semimajor().to_radians();

        let cos = latitude.to_radians().cos();
        let w2 = 1.0 / (1.0 - e2 * (1.0 - cos * cos));
        let w = w2.sqrt();

        Self {
            // Normal radius of curvature.
            kx: meters_per_degree * w * cos,
            // Meridional radius of curvature.
            ky: meters_per_degree * w * w2 * (1.0 - e2),
        }
    }

    /// Scale factors `(meters per degree of longitude, meters per degree of latitude, 1.0)`.
    pub fn k(&self) -> Vector3d {
        Vector3d::new(self.kx, self.ky, 1.0)
    }

    /// Approximate distance in meters between two geodetic points, altitude included.
    pub fn distance(&self, a: &Point3d, b: &Point3d) -> f64 {
        (b - a).component_mul(&self.k()).norm()
    }
}

/// Scale factors of [`CheapRuler`] at the given latitude.
pub fn scale_factors(latitude: f64) -> Vector3d {
    CheapRuler::new(latitude).k()
}

/// Converts geodetic points into the local planar frame centered at `anchor`.
pub fn lla_to_enu_cheap(llas: &[Point3d], anchor: &Point3d) -> Vec<Point3d> {
    CheapEnuProjection::new(*anchor).project_all(llas)
}

/// Inverse of [`lla_to_enu_cheap`].
pub fn enu_to_lla_cheap(enus: &[Point3d], anchor: &Point3d) -> Vec<Point3d> {
    CheapEnuProjection::new(*anchor).unproject_all(enus)
}
