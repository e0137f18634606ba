//! Geodetic collaborators of the ruler: the reference ellipsoid, exact ECEF and ENU conversions, the approximate
//! [`CheapRuler`] and the [`WorkingFrame`] that maps lines into a planar frame for measurement.

pub mod cheap_ruler;
mod datum;
pub mod ecef;
pub mod enu;
mod projection;

pub use cheap_ruler::CheapRuler;
pub use datum::Datum;
pub use projection::{
    CheapEnuProjection, ExactEnuProjection, GeodeticApproximation, IdentityProjection, Projection,
    WorkingFrame,
};
