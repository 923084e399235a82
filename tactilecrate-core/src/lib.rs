//! Core data structures and traits for tactilecrate
//!
//! This crate provides the value types shared by every stage of the
//! photograph-to-relief pipeline: colors, cluster labels, per-pixel label maps,
//! mesh buffers, progress reporting and the common error type.

pub mod color;
pub mod label;
pub mod mesh;
pub mod point;
pub mod progress;
pub mod error;

pub use color::*;
pub use label::*;
pub use mesh::*;
pub use point::*;
pub use progress::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};
