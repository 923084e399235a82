//! Image input and mesh output
//!
//! This crate reads photographs and writes the generated artifacts:
//! - Image decoding into RGB buffers and PNG output of flat and height images
//! - STL (binary and ASCII) and PLY mesh writers
//! - A direct-export mesh engine

pub mod error;
pub mod raster;
pub mod stl;
pub mod ply;
pub mod export;

pub use error::*;
pub use raster::{load_rgb_image, save_png};
pub use stl::{AsciiStlWriter, StlWriter};
pub use ply::PlyWriter;
pub use export::DirectExport;

use std::path::Path;
use tactilecrate_core::{Error, MeshGeometry, Result};

/// Trait for writing meshes to files
pub trait MeshWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &MeshGeometry, path: P) -> Result<()>;
}

/// Pick the writer from the file extension
pub fn write_mesh<P: AsRef<Path>>(mesh: &MeshGeometry, path: P) -> Result<()> {
    let path = path.as_ref();
    match path.extension().and_then(|s| s.to_str()) {
        Some("stl") => StlWriter::write_mesh(mesh, path),
        Some("ply") => PlyWriter::write_mesh(mesh, path),
        _ => Err(Error::UnsupportedFormat(format!(
            "Unsupported mesh format: {:?}",
            path.extension()
        ))),
    }
}
