//! East-North-Up local tangent frames and application of rigid transforms to point sequences.

use std::f64::consts::FRAC_PI_2;

use nalgebra::{Isometry3, Matrix3, Matrix3xX, Matrix4, Translation3, UnitQuaternion, Vector3};

use crate::geo::ecef::{ecef_to_lla_all, geodetic_to_ecef, lla_to_ecef_all};
use crate::point::Point3d;

/// Number of points [`apply_transform`] processes at once.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Rotation whose columns are the east, north and up unit vectors (in ECEF) at the given longitude and latitude
/// (degrees).
pub fn enu_rotation(lon: f64, lat: f64) -> Matrix3<f64> {
    enu_orientation(lon, lat).to_rotation_matrix().into_inner()
}

/// Rigid transform from the ENU frame at the given geodetic position into ECEF.
///
/// The columns of the rotation part are the east, north and up axes, the translation is the ECEF position of the
/// frame origin.
pub fn ecef_frame_at(lon: f64, lat: f64, alt: f64) -> Matrix4<f64> {
    enu_isometry(lon, lat, alt).to_homogeneous()
}

/// Rigid transform from ECEF into the ENU frame at the given geodetic position. Inverse of [`ecef_frame_at`].
pub fn enu_frame_at(lon: f64, lat: f64, alt: f64) -> Matrix4<f64> {
    enu_isometry(lon, lat, alt).inverse().to_homogeneous()
}

fn enu_orientation(lon: f64, lat: f64) -> UnitQuaternion<f64> {
    let about_z = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), lon.to_radians() + FRAC_PI_2);
    let about_x = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2 - lat.to_radians());
    about_z * about_x
}

pub(crate) fn enu_isometry(lon: f64, lat: f64, alt: f64) -> Isometry3<f64> {
    let origin = geodetic_to_ecef(lon, lat, alt);
    Isometry3::from_parts(Translation3::from(origin.coords), enu_orientation(lon, lat))
}

/// Applies a rigid transform to every point and returns the transformed copy.
pub fn apply_transform(transform: &Matrix4<f64>, points: &[Point3d]) -> Vec<Point3d> {
    let mut transformed = points.to_vec();
    apply_transform_inplace(transform, &mut transformed, DEFAULT_BATCH_SIZE);
    transformed
}

/// Applies a rigid transform to every point in place.
///
/// Points are processed `batch_size` at a time, so the temporary coordinate matrix never holds more than
/// `batch_size` columns. A `batch_size` of 0 processes the whole slice at once.
pub fn apply_transform_inplace(transform: &Matrix4<f64>, points: &mut [Point3d], batch_size: usize) {
    if points.is_empty() {
        return;
    }

    let batch_size = if batch_size == 0 {
        points.len()
    } else {
        batch_size
    };

    let rotation = transform.fixed_view::<3, 3>(0, 0);
    let translation = Vector3::new(transform[(0, 3)], transform[(1, 3)], transform[(2, 3)]);

    for batch in points.chunks_mut(batch_size) {
        let coords = Matrix3xX::from_iterator(batch.len(), batch.iter().flat_map(|p| [p.x, p.y, p.z]));
        let rotated = rotation * coords;
        for (point, column) in batch.iter_mut().zip(rotated.column_iter()) {
            *point = Point3d::from(column + translation);
        }
    }
}

/// Converts geodetic points into the exact ENU frame anchored at `anchor` (`(lon, lat, alt)`).
pub fn lla_to_enu(llas: &[Point3d], anchor: &Point3d) -> Vec<Point3d> {
    let mut points = lla_to_ecef_all(llas);
    apply_transform_inplace(
        &enu_frame_at(anchor.x, anchor.y, anchor.z),
        &mut points,
        DEFAULT_BATCH_SIZE,
    );
    points
}

/// Converts points from the exact ENU frame anchored at `anchor` back into geodetic coordinates.
pub fn enu_to_lla(enus: &[Point3d], anchor: &Point3d) -> Vec<Point3d> {
    let ecefs = apply_transform(&ecef_frame_at(anchor.x, anchor.y, anchor.z), enus);
    ecef_to_lla_all(&ecefs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::ecef::ecef_to_geodetic;
    use approx::assert_abs_diff_eq;

    #[test]
    fn enu_axes_at_equator() {
        let r = enu_rotation(0.0, 0.0);
        assert_abs_diff_eq!(r.column(0).into_owned(), Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(r.column(1).into_owned(), Vector3::new(0.0, 0.0, 1.0), epsilon = 1e-12);
        assert_abs_diff_eq!(r.column(2).into_owned(), Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn enu_axes_match_closed_form() {
        let (lon, lat) = (120.1_f64, 35.2_f64);
        let r = enu_rotation(lon, lat);
        let (sin_lon, cos_lon) = lon.to_radians().sin_cos();
        let (sin_lat, cos_lat) = lat.to_radians().sin_cos();

        let east = Vector3::new(-sin_lon, cos_lon, 0.0);
        let north = Vector3::new(-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat);
        let up = Vector3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat);

        assert_abs_diff_eq!(r.column(0).into_owned(), east, epsilon = 1e-12);
        assert_abs_diff_eq!(r.column(1).into_owned(), north, epsilon = 1e-12);
        assert_abs_diff_eq!(r.column(2).into_owned(), up, epsilon = 1e-12);
        assert_abs_diff_eq!(r.determinant(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn enu_axes_at_north_pole() {
        let r = enu_rotation(0.0, 90.0);
        assert_abs_diff_eq!(r.column(2).into_owned(), Vector3::new(0.0, 0.0, 1.0), epsilon = 1e-12);
        assert_abs_diff_eq!(r.column(0).into_owned(), Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn ecef_frame_translation_and_inverse() {
        let frame = ecef_frame_at(120.1, 35.2, 2.1);
        let origin = geodetic_to_ecef(120.1, 35.2, 2.1);
        assert_abs_diff_eq!(frame[(0, 3)], origin.x, epsilon = 1e-9);
        assert_abs_diff_eq!(frame[(1, 3)], origin.y, epsilon = 1e-9);
        assert_abs_diff_eq!(frame[(2, 3)], origin.z, epsilon = 1e-9);
        assert_abs_diff_eq!(frame[(3, 3)], 1.0);

        let product = frame * enu_frame_at(120.1, 35.2, 2.1);
        assert_abs_diff_eq!(product, Matrix4::identity(), epsilon = 1e-6);
    }

    #[test]
    fn up_offset_raises_altitude() {
        let frame = ecef_frame_at(120.1, 35.2, 2.1);
        let moved = apply_transform(&frame, &[Point3d::new(0.0, 0.0, 10.0)]);
        let lla = ecef_to_geodetic(&moved[0]);
        assert_abs_diff_eq!(lla, Point3d::new(120.1, 35.2, 12.1), epsilon = 1e-7);
    }

    #[test]
    fn batches_do_not_change_result() {
        let transform = ecef_frame_at(10.0, 50.0, 0.0);
        let points: Vec<Point3d> = (0..2500)
            .map(|i| Point3d::new(i as f64, -(i as f64) * 0.5, (i % 7) as f64))
            .collect();

        let copied = apply_transform(&transform, &points);
        for batch_size in [0, 1, 7, 1000, 5000] {
            let mut inplace = points.clone();
            apply_transform_inplace(&transform, &mut inplace, batch_size);
            assert_eq!(inplace.len(), copied.len());
            for (a, b) in inplace.iter().zip(&copied) {
                assert_abs_diff_eq!(a, b, epsilon = 1e-6);
            }
        }

        let mut empty: Vec<Point3d> = vec![];
        apply_transform_inplace(&transform, &mut empty, 10);
        assert!(empty.is_empty());
    }

    #[test]
    fn enu_round_trip() {
        let anchor = Point3d::new(120.1, 35.2, 2.1);
        let llas = vec![
            anchor,
            Point3d::new(120.101, 35.2, 5.0),
            Point3d::new(120.1, 35.201, -3.0),
        ];

        let enus = lla_to_enu(&llas, &anchor);
        assert_abs_diff_eq!(enus[0], Point3d::origin(), epsilon = 1e-6);
        assert!(enus[1].x > 90.0 && enus[1].x < 92.0);
        assert!(enus[2].y > 110.0 && enus[2].y < 112.0);

        for (restored, original) in enu_to_lla(&enus, &anchor).iter().zip(&llas) {
            assert_abs_diff_eq!(restored.x, original.x, epsilon = 1e-9);
            assert_abs_diff_eq!(restored.y, original.y, epsilon = 1e-9);
            assert_abs_diff_eq!(restored.z, original.z, epsilon = 1e-6);
        }
    }
}
