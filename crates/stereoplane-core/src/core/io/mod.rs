//! Reading and writing molecule files.
//!
//! The [`traits::MolecularFile`] trait gives every format the same reader/writer API
//! plus path helpers. [`sdf::SdfFile`] implements it for MDL molfiles (V2000 connection
//! tables, optionally followed by SD data items), which is what PubChem serves.

pub mod sdf;
pub mod traits;
