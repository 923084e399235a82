//! Heightmap and relief mesh generation
//!
//! This crate turns a flat label map into a printable relief:
//! - Height image from per-color height definitions
//! - Grid mesh with a top surface, a skirt under its perimeter and a flat base
//! - Simplification and weld heuristics for a downstream mesh engine

pub mod dimensions;
pub mod heightmap;
pub mod geometry;
pub mod heuristics;
pub mod post_process;

pub use dimensions::*;
pub use heightmap::*;
pub use geometry::*;
pub use heuristics::*;
pub use post_process::*;

use std::path::PathBuf;
use tactilecrate_core::{MeshGeometry, Progress, Result};

/// A mesh engine that applies a modifier plan and writes the result.
pub trait MeshPostProcessor {
    /// Process `mesh` with `plan` and return the paths of the written files.
    fn process(
        &self,
        mesh: &MeshGeometry,
        plan: &PostProcessPlan,
        options: &ExportOptions,
        progress: &Progress,
    ) -> Result<Vec<PathBuf>>;
}
