//! Point and vector types used throughout the crate, and constructors that validate raw coordinate input.
//!
//! A point is a triplet of `f64` values. Its meaning depends on the coordinate mode of the line it belongs to:
//! * planar lines use `(x, y, z)` in arbitrary cartesian units;
//! * geodetic lines use `(longitude, latitude, altitude)` with angles in degrees and altitude in meters.

use crate::error::RulerError;

pub use nalgebra::{Point3, Vector3};

/// 3d point with `f64` coordinates.
pub type Point3d = Point3<f64>;

/// 3d vector with `f64` coordinates.
pub type Vector3d = Vector3<f64>;

/// Converts rows of coordinates into points.
///
/// Every row must have either 2 or 3 values. Rows with 2 values get `z = 0`.
///
/// ```
/// use polyline_ruler::point::points_from_rows;
///
/// let points = points_from_rows(&[[0.0, 0.0], [10.0, 0.0]]).unwrap();
/// assert_eq!(points[1].x, 10.0);
/// assert_eq!(points[1].z, 0.0);
/// ```
pub fn points_from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Vec<Point3d>, RulerError> {
    rows.iter()
        .enumerate()
        .map(|(row, coords)| match *coords.as_ref() {
            [x, y] => Ok(Point3d::new(x, y, 0.0)),
            [x, y, z] => Ok(Point3d::new(x, y, z)),
            ref other => Err(RulerError::Dimension {
                row,
                len: other.len(),
            }),
        })
        .collect()
}

/// Converts a flat row-major buffer of coordinates into points.
///
/// `dims` is the number of coordinates per point, and must be 2 or 3.
pub fn points_from_flat(coords: &[f64], dims: usize) -> Result<Vec<Point3d>, RulerError> {
    if dims != 2 && dims != 3 {
        return Err(RulerError::UnsupportedDimensions(dims));
    }

    if coords.len() % dims != 0 {
        return Err(RulerError::FlatLength {
            len: coords.len(),
            dims,
        });
    }

    Ok(coords
        .chunks_exact(dims)
        .map(|c| Point3d::new(c[0], c[1], if dims == 3 { c[2] } else { 0.0 }))
        .collect())
}

/// Flattens points back into a row-major buffer of `[x, y, z]` triplets.
pub fn points_to_flat(points: &[Point3d]) -> Vec<f64> {
    points.iter().flat_map(|p| [p.x, p.y, p.z]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn rows_of_mixed_width() {
        let rows: Vec<Vec<f64>> = vec![vec![1.0, 2.0], vec![3.0, 4.0, 5.0]];
        let points = points_from_rows(&rows).unwrap();
        assert_eq!(points, vec![Point3d::new(1.0, 2.0, 0.0), Point3d::new(3.0, 4.0, 5.0)]);
    }

    #[test]
    fn rows_with_wrong_width() {
        let rows: Vec<Vec<f64>> = vec![vec![1.0, 2.0, 3.0], vec![1.0], vec![1.0, 2.0]];
        assert_matches!(
            points_from_rows(&rows),
            Err(RulerError::Dimension { row: 1, len: 1 })
        );

        let rows: Vec<Vec<f64>> = vec![vec![1.0, 2.0, 3.0, 4.0]];
        assert_matches!(
            points_from_rows(&rows),
            Err(RulerError::Dimension { row: 0, len: 4 })
        );
    }

    #[test]
    fn flat_buffers() {
        let points = points_from_flat(&[0.0, 1.0, 2.0, 3.0], 2).unwrap();
        assert_eq!(points, vec![Point3d::new(0.0, 1.0, 0.0), Point3d::new(2.0, 3.0, 0.0)]);

        let points = points_from_flat(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0], 3).unwrap();
        assert_eq!(points_to_flat(&points), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);

        assert_matches!(
            points_from_flat(&[0.0, 1.0, 2.0, 3.0], 3),
            Err(RulerError::FlatLength { len: 4, dims: 3 })
        );
        assert_matches!(
            points_from_flat(&[0.0; 4], 4),
            Err(RulerError::UnsupportedDimensions(4))
        );
    }

    #[test]
    fn empty_input() {
        let rows: Vec<[f64; 3]> = vec![];
        assert!(points_from_rows(&rows).unwrap().is_empty());
        assert!(points_from_flat(&[], 3).unwrap().is_empty());
    }
}
