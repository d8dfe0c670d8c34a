//! # Engine Module
//!
//! Stateful logic on top of the [`core`](crate::core) foundation: fitting a viewing
//! plane, labelling bonds against it and running the rotation state machine.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Plane and rotation parameters with a validating builder
//! - **Plane Fitter** ([`fitting`]) - Candidate normals scored by atoms and bonds in the plane
//! - **Stereo Classifier** ([`classify`]) - Wedge / dash / plain labels from signed depths
//! - **Plane Rules** ([`rules`]) - Hand-authored planes for named textbook molecules
//! - **Pose** ([`pose`]) - Rigid-body placement of the molecule in world space
//! - **Scene** ([`scene`]) - Renderer and viewer interfaces the controller talks to
//! - **Controller** ([`controller`]) - The state machine that owns the fixed plane
//! - **Library** ([`library`]) - Cache, recent list and load gate for named molecules
//! - **Progress** ([`progress`]) and **Errors** ([`error`])

pub mod classify;
pub mod config;
pub mod controller;
pub mod error;
pub mod fitting;
pub mod library;
pub mod pose;
pub mod progress;
pub mod rules;
pub mod scene;
