//! Color clustering and flat region reconstruction
//!
//! This crate reduces a photograph to a small palette of flat colors:
//! - Ward hierarchical clustering of the distinct colors, cut at a fixed distance
//! - Prevalence filtering into a ranked palette of relevant colors
//! - Region consolidation: isolated-pixel pruning followed by a color flood fill
//!   so that every pixel ends up with a palette label

pub mod config;
pub mod ward;
pub mod clustering;
pub mod palette;
pub mod definitions;
pub mod regions;

pub use config::*;
pub use ward::*;
pub use clustering::*;
pub use palette::*;
pub use definitions::*;
pub use regions::*;

use tactilecrate_core::{ClusterLabel, Result};

/// Flat clustering of a weighted color sample.
///
/// Implementations return one label per sample entry. Labels must be
/// deterministic for identical input.
pub trait Clusterer {
    fn cluster(&self, sample: &WeightedSample) -> Result<Vec<ClusterLabel>>;
}
