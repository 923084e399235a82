//! Mesh engine that writes the geometry as built

use crate::{AsciiStlWriter, MeshWriter, PlyWriter, StlWriter};
use std::path::PathBuf;
use tactilecrate_core::{MeshGeometry, Progress, Result};
use tactilecrate_mesh::{
    ExportOptions, MeshPostProcessor, PostProcessPlan, StlFormat, VertexGroup, VertexGroups,
};
use tracing::{debug, info};

/// Writes STL and PLY files without applying the modifier plan.
///
/// The plan is logged so a run can be reproduced in a full mesh engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectExport;

impl MeshPostProcessor for DirectExport {
    fn process(
        &self,
        mesh: &MeshGeometry,
        plan: &PostProcessPlan,
        options: &ExportOptions,
        progress: &Progress,
    ) -> Result<Vec<PathBuf>> {
        options.validate()?;

        progress.update(0.0, "Creation of the mesh object");
        let groups = VertexGroups::from_geometry(mesh);
        debug!(
            face = groups.group(VertexGroup::Face).len(),
            sides = groups.group(VertexGroup::Sides).len(),
            "vertex groups"
        );
        for modifier in &plan.modifiers {
            info!(?modifier, "modifier recorded, not applied");
        }

        if let Some(parent) = options.output_stem.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        progress.update(50.0, "Exporting");
        let mut written = Vec::new();
        if options.save_stl {
            let path = options.stl_path();
            match options.stl_format {
                StlFormat::Binary => StlWriter::write_mesh(mesh, &path)?,
                StlFormat::Ascii => AsciiStlWriter::write_mesh(mesh, &path)?,
            }
            written.push(path);
        }
        if options.save_ply {
            let path = options.ply_path();
            PlyWriter::write_mesh(mesh, &path)?;
            written.push(path);
        }

        progress.update(100.0, "Export finished");
        info!(files = ?written, "mesh exported");
        Ok(written)
    }
}
