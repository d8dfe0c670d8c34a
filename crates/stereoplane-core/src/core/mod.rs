//! # Core Module
//!
//! This module provides the stateless building blocks used by the alignment engine.
//!
//! ## Overview
//!
//! Everything here is a pure function of its inputs: molecules are plain values,
//! geometry helpers never hold state, and the molfile reader produces a fresh
//! [`models::molecule::Molecule`] per call.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, bonds, bond orders and stereo labels
//! - **Geometry** ([`geometry`]) - Covariance matrices, eigenvector approximation, planes
//! - **Chemistry Data** ([`elements`]) - Static element table with display radii and colors
//! - **File I/O** ([`io`]) - Reading and writing MDL molfiles (SDF, V2000)
//! - **Utilities** ([`utils`]) - Rigid-motion helpers shared by the engine

pub mod elements;
pub mod geometry;
pub mod io;
pub mod models;
pub mod utils;
