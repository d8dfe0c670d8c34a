//! # Workflows Module
//!
//! One-call entry points over the [`AlignmentController`](crate::engine::controller::AlignmentController).
//!
//! - **Alignment** ([`align`]) - Fix the viewing plane for a molecule and report it with
//!   the bond labels at rest.
//! - **Spin** ([`spin`]) - Drive auto rotation frame by frame and record the label
//!   timeline at every bond refresh.

pub mod align;
pub mod spin;
