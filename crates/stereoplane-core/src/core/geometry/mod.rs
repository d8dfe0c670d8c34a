//! Geometry primitives for plane fitting.
//!
//! [`covariance::Covariance`] holds the scatter matrix of a point set and the
//! fixed-iteration eigenvector approximations the fitter draws candidate normals from.
//! [`plane::Plane`] is a point-normal plane with signed distances and segment crossings.

pub mod covariance;
pub mod plane;
