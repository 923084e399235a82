//! # tactilecrate
//!
//! Turn a photograph into a 3D-printable tactile relief.
//!
//! This is the umbrella crate that wires the stages together. The individual
//! crates can be used on their own for finer control over dependencies.
//!
//! ## Stages
//!
//! - **Color**: Ward clustering of the image colors, a ranked palette of the
//!   relevant ones, and a flat image where every pixel carries one of them
//! - **Mesh**: a height image from per-color heights, a closed relief mesh
//!   over it, and the simplification heuristics for a mesh engine
//! - **I/O**: image decoding, PNG output, STL and PLY export
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tactilecrate::prelude::*;
//!
//! # fn main() -> tactilecrate::Result<()> {
//! let pipeline = ReliefPipeline::new(PipelineConfig::default());
//! let output = pipeline.run_file("photo.png", &ExportOptions::new("relief"), &TracingProgress)?;
//! println!("wrote {:?}", output.files);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables io
//! - `io`: Image decoding and mesh file export

pub mod pipeline;

// Re-export core functionality
pub use tactilecrate_core::*;

// Re-export sub-crates
pub use tactilecrate_color as color;
pub use tactilecrate_mesh as mesh;

#[cfg(feature = "io")]
pub use tactilecrate_io as io;

pub use pipeline::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use tactilecrate_core::{
        ClusterLabel, Color, Error, LabelMap, MeshGeometry, Progress, ProgressSink, Result,
        TracingProgress,
    };

    pub use tactilecrate_color::{
        ClusteringConfig, ColorClusterer, ColorDefinitions, Palette, RegionConfig,
        RegionConsolidator,
    };

    pub use tactilecrate_mesh::{
        ExportOptions, HeightMapper, MeshConfig, MeshDimensions, MeshGeometryBuilder,
        MeshHeuristics, MeshPostProcessor, PostProcessPlan, StlFormat,
    };

    #[cfg(feature = "io")]
    pub use tactilecrate_io::{load_rgb_image, save_png, DirectExport};

    pub use crate::pipeline::{ColorReduction, MeshArtifacts, PipelineConfig, ReliefPipeline};

    #[cfg(feature = "io")]
    pub use crate::pipeline::RunOutput;
}
