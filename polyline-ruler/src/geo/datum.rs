use serde::{Deserialize, Serialize};

/// Reference ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Datum {
    semimajor: f64,
    inv_flattening: f64,
}

impl Datum {
    /// World Geodetic System 1984 ellipsoid.
    pub const WGS84: Self = Datum {
        semimajor: 6_378_137.0,
        inv_flattening: 298.257223563,
    };

    /// Creates a new ellipsoid from its semi-major axis (meters) and inverse flattening.
    pub const fn new(semimajor: f64, inv_flattening: f64) -> Self {
        Self {
            semimajor,
            inv_flattening,
        }
    }

    /// Equatorial radius in meters.
    pub fn semimajor(&self) -> f64 {
        self.semimajor
    }

    /// Polar radius in meters.
    pub fn semiminor(&self) -> f64 {
        self.semimajor * (1.0 - self.flattening())
    }

    /// Inverse flattening `1/f`.
    pub fn inv_flattening(&self) -> f64 {
        self.inv_flattening
    }

    /// Flattening `f`.
    pub fn flattening(&self) -> f64 {
        1.0 / self.inv_flattening
    }

    /// First eccentricity squared, `e² = f(2 - f)`.
    pub fn e2(&self) -> f64 {
        let f = self.flattening();
        f * (2.0 - f)
    }
}

impl Default for Datum {
    fn default() -> Self {
        Self::WGS84
    }
}
