//! # Stereoplane Core Library
//!
//! Fits a single viewing plane to a small molecule, keeps that plane fixed in world
//! space while the molecule turns, and labels every bond as in-plane, wedge (toward
//! the viewer) or dash (away from the viewer) frame by frame.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture so that the numerical core stays
//! testable on its own and the stateful pieces stay small.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Molecule`, `Atom`, `Bond`),
//!   the element table, geometry primitives (covariance matrix with power-iteration
//!   eigenvector approximation, planes) and molfile I/O.
//!
//! - **[`engine`]: The Logic Core.** The plane fitter, the bond stereo classifier,
//!   the registry of hand-authored plane rules for textbook molecules, and the
//!   `AlignmentController` state machine that fixes the plane and drives rotation.
//!
//! - **[`workflows`]: The Public API.** One-call entry points that align a molecule
//!   or simulate its rotation and return plain reports.

pub mod core;
pub mod engine;
pub mod workflows;
