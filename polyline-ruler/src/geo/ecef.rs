//! Exact conversion between geodetic coordinates and Earth-Centered-Earth-Fixed cartesian coordinates.
//!
//! Geodetic points are `(longitude, latitude, altitude)` triplets, angles in degrees, altitude in meters above the
//! WGS84 ellipsoid.

use crate::geo::Datum;
use crate::point::Point3d;

/// Converts a geodetic position into ECEF coordinates (meters).
pub fn geodetic_to_ecef(lon: f64, lat: f64, alt: f64) -> Point3d {
    let (x, y, z) = geodetic_to_ecef_rad(&Datum::WGS84, lon.to_radians(), lat.to_radians(), alt);
    Point3d::new(x, y, z)
}

/// Converts an ECEF position into `(longitude, latitude, altitude)`.
pub fn ecef_to_geodetic(ecef: &Point3d) -> Point3d {
    let (lon, lat, alt) = ecef_to_geodetic_rad(&Datum::WGS84, ecef.x, ecef.y, ecef.z);
    Point3d::new(lon.to_degrees(), lat.to_degrees(), alt)
}

/// Same as [`geodetic_to_ecef`] but takes the geodetic position as a point.
pub fn lla_to_ecef(lla: &Point3d) -> Point3d {
    geodetic_to_ecef(lla.x, lla.y, lla.z)
}

/// Converts every point of the sequence with [`geodetic_to_ecef`].
pub fn lla_to_ecef_all(llas: &[Point3d]) -> Vec<Point3d> {
    llas.iter().map(lla_to_ecef).collect()
}

/// Converts every point of the sequence with [`ecef_to_geodetic`].
pub fn ecef_to_lla_all(ecefs: &[Point3d]) -> Vec<Point3d> {
    ecefs.iter().map(ecef_to_geodetic).collect()
}

fn geodetic_to_ecef_rad(datum: &Datum, lon: f64, lat: f64, alt: f64) -> (f64, f64, f64) {
    let a = datum.semimajor();
    let e2 = datum.e2();

    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();

    // Prime vertical radius of curvature.
    let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();

    (
        (n + alt) * cos_lat * cos_lon,
        (n + alt) * cos_lat * sin_lon,
        (n * (1.0 - e2) + alt) * sin_lat,
    )
}

/// Olson's closed form inverse (D. K. Olson, "Converting Earth-Centered, Earth-Fixed Coordinates to Geodetic
/// Coordinates", IEEE Transactions on Aerospace and Electronic Systems, 1996).
fn ecef_to_geodetic_rad(datum: &Datum, x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    let a = datum.semimajor();
    let e2 = datum.e2();

    let a1 = a * e2;
    let a2 = a1 * a1;
    let a3 = a1 * e2 / 2.0;
    let a4 = 2.5 * a2;
    let a5 = a1 + a3;

    let w2 = x * x + y * y;
    let w = w2.sqrt();
    let z2 = z * z;
    let lon = y.atan2(x);

    let r2 = w2 + z2;
    let r = r2.sqrt();

    let s2 = z2 / r2;
    let c2 = w2 / r2;
    let mut u = a2 / r;
    let mut v = a3 - a4 / r;

    let mut lat;
    let s;
    let c;
    let ss;

    // cos(45°)² == 0.5
    if c2 > 0.5 {
        s = (z / r) * (1.0 + c2 * (a1 + u + s2 * v) / r);
        lat = s.asin();
        ss = s * s;
        c = (1.0 - ss).sqrt();
    } else {
        c = (w / r) * (1.0 - s2 * (a5 - u - c2 * v) / r);
        lat = c.acos();
        ss = 1.0 - c * c;
        if z < 0.0 {
            lat = -lat;
            s = -ss.sqrt();
        } else {
            s = ss.sqrt();
        }
    }

    let d2 = 1.0 - e2 * ss;
    let rn = a / d2.sqrt();
    let rm = (1.0 - e2) * rn / d2;
    let rf = (1.0 - e2) * rn;
    u = w - rn * c;
    v = z - rf * s;
    let f = c * u + s * v;
    let m = c * v - s * u;
    let p = m / (rm + f);

    lat += p;
    let alt = f + m * p / 2.0;

    (lon, lat, alt)
}
