//! Error type used by the crate.

use thiserror::Error;

/// Error enum.
///
/// Geometric edge cases (empty lines, zero-length segments, out of range distances) are never reported as errors.
/// Only malformed input that cannot be interpreted as a sequence of 3d points ends up here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RulerError {
    /// A row of coordinates has a number of components other than 2 or 3.
    #[error("row {row} has {len} coordinates, expected 2 or 3")]
    Dimension {
        /// Index of the offending row.
        row: usize,
        /// Number of coordinates in that row.
        len: usize,
    },
    /// A flat coordinate buffer cannot be split into whole points.
    #[error("flat buffer of {len} values cannot be split into points of {dims} coordinates")]
    FlatLength {
        /// Length of the buffer.
        len: usize,
        /// Requested number of coordinates per point.
        dims: usize,
    },
    /// Points can only have 2 or 3 coordinates.
    #[error("unsupported number of dimensions: {0}")]
    UnsupportedDimensions(usize),
}
