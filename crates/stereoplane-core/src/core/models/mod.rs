//! # Core Models Module
//!
//! This module contains the data structures used to represent a small molecule.
//!
//! ## Overview
//!
//! A [`molecule::Molecule`] owns an ordered list of atoms and bonds. Atom ids are
//! dense indices into that list, and bonds refer to atoms through those ids. The
//! stereo classifier looks atoms up by bond-stored id directly in the world position
//! array, so the molecule API is the only way to add atoms and it assigns ids itself.
//!
//! ## Key Components
//!
//! - [`atom`] - Individual atom with element symbol and coordinates
//! - [`topology`] - Bonds, bond orders and stereo labels
//! - [`molecule`] - The complete molecule with its metadata
//! - [`ids`] - Index type aliases shared by the models
//!
//! ## Usage
//!
//! ```ignore
//! use stereoplane::core::models::molecule::Molecule;
//! use stereoplane::core::models::topology::{BondOrder, BondStereo};
//!
//! let mut water = Molecule::new("water");
//! let o = water.add_atom("O", Point3::origin());
//! let h1 = water.add_atom("H", Point3::new(0.96, 0.0, 0.0));
//! water.add_bond(o, h1, BondOrder::Single, BondStereo::None)?;
//! ```

pub mod atom;
pub mod ids;
pub mod molecule;
pub mod topology;
