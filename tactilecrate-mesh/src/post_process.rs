//! Modifier plan handed to a [`crate::MeshPostProcessor`]

use crate::MeshHeuristics;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tactilecrate_core::{Error, MeshGeometry, Result};

/// Planar decimation angle limit, in degrees.
pub const PLANAR_ANGLE_LIMIT_DEG: f64 = 5.0;

/// Named vertex subsets a modifier can be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VertexGroup {
    /// Vertices strictly inside the XY footprint.
    Face,
    /// Vertices on the boundary of the XY footprint.
    Sides,
}

/// One mesh engine operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Modifier {
    Smooth {
        iterations: u32,
        factor: f64,
        border_factor: f64,
    },
    Decimate {
        ratio: f64,
    },
    PlanarDecimate {
        angle_limit_deg: f64,
    },
    /// Merge vertices closer than `threshold`, only inside `vertex_group`
    /// or, with `invert`, only outside it.
    Weld {
        threshold: f64,
        vertex_group: VertexGroup,
        invert: bool,
    },
    Triangulate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothingOptions {
    pub iterations: u32,
    pub factor: f64,
    pub border_factor: f64,
}

impl Default for SmoothingOptions {
    fn default() -> Self {
        Self {
            iterations: 1,
            factor: 0.1,
            border_factor: 1.0,
        }
    }
}

/// Ordered modifiers to apply before export.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PostProcessPlan {
    pub modifiers: Vec<Modifier>,
}

impl PostProcessPlan {
    /// Optional smoothing, decimation, planar decimation, a weld that leaves
    /// the sides alone, then triangulation.
    pub fn from_heuristics(heuristics: &MeshHeuristics, smoothing: Option<SmoothingOptions>) -> Self {
        let smooth = smoothing.map(|s| Modifier::Smooth {
            iterations: s.iterations,
            factor: s.factor,
            border_factor: s.border_factor,
        });
        let modifiers = smooth
            .into_iter()
            .chain([
                Modifier::Decimate {
                    ratio: heuristics.decimate_ratio,
                },
                Modifier::PlanarDecimate {
                    angle_limit_deg: PLANAR_ANGLE_LIMIT_DEG,
                },
                Modifier::Weld {
                    threshold: heuristics.weld_threshold,
                    vertex_group: VertexGroup::Sides,
                    invert: true,
                },
                Modifier::Triangulate,
            ])
            .collect();
        Self { modifiers }
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }
}

/// Vertex indices split by position on the XY footprint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VertexGroups {
    pub face: Vec<usize>,
    pub sides: Vec<usize>,
}

impl VertexGroups {
    pub fn from_geometry(mesh: &MeshGeometry) -> Self {
        let Some((min, max)) = mesh.bounding_box() else {
            return Self::default();
        };
        let (face, sides) = mesh
            .vertices()
            .iter()
            .enumerate()
            .map(|(i, v)| (i, v.x == min.x || v.y == min.y || v.x == max.x || v.y == max.y))
            .fold((Vec::new(), Vec::new()), |(mut face, mut sides), (i, on_side)| {
                if on_side {
                    sides.push(i);
                } else {
                    face.push(i);
                }
                (face, sides)
            });
        Self { face, sides }
    }

    pub fn group(&self, group: VertexGroup) -> &[usize] {
        match group {
            VertexGroup::Face => &self.face,
            VertexGroup::Sides => &self.sides,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StlFormat {
    #[default]
    Binary,
    Ascii,
}

/// Where and how the mesh engine writes its results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Output path without extension.
    pub output_stem: PathBuf,
    pub save_stl: bool,
    pub save_ply: bool,
    pub stl_format: StlFormat,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            output_stem: PathBuf::from("relief"),
            save_stl: true,
            save_ply: false,
            stl_format: StlFormat::Binary,
        }
    }
}

impl ExportOptions {
    pub fn new(output_stem: impl Into<PathBuf>) -> Self {
        Self {
            output_stem: output_stem.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_stl(mut self, save: bool) -> Self {
        self.save_stl = save;
        self
    }

    #[must_use]
    pub fn with_ply(mut self, save: bool) -> Self {
        self.save_ply = save;
        self
    }

    #[must_use]
    pub fn with_stl_format(mut self, format: StlFormat) -> Self {
        self.stl_format = format;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.save_stl && !self.save_ply {
            return Err(Error::Configuration(
                "select at least one export format".to_string(),
            ));
        }
        Ok(())
    }

    pub fn stl_path(&self) -> PathBuf {
        self.output_stem.with_extension("stl")
    }

    pub fn ply_path(&self) -> PathBuf {
        self.output_stem.with_extension("ply")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MeshDimensions, MeshGeometryBuilder};
    use image::{GrayImage, Luma};

    fn heuristics() -> MeshHeuristics {
        MeshHeuristics {
            decimate_ratio: 0.2,
            weld_threshold: 0.5,
        }
    }

    #[test]
    fn test_plan_order() {
        let plan = PostProcessPlan::from_heuristics(&heuristics(), None);
        assert_eq!(
            plan.modifiers,
            vec![
                Modifier::Decimate { ratio: 0.2 },
                Modifier::PlanarDecimate { angle_limit_deg: 5.0 },
                Modifier::Weld {
                    threshold: 0.5,
                    vertex_group: VertexGroup::Sides,
                    invert: true,
                },
                Modifier::Triangulate,
            ]
        );

        let smoothed = PostProcessPlan::from_heuristics(&heuristics(), Some(SmoothingOptions::default()));
        assert_eq!(smoothed.len(), 5);
        assert!(matches!(smoothed.modifiers[0], Modifier::Smooth { iterations: 1, .. }));
    }

    #[test]
    fn test_vertex_groups() {
        let image = GrayImage::from_pixel(3, 3, Luma([200]));
        let mesh = MeshGeometryBuilder::new(MeshDimensions::default(), 1)
            .build(&image)
            .unwrap();
        let groups = VertexGroups::from_geometry(&mesh.geometry);
        // Only the centre of the top surface is inside the footprint.
        assert_eq!(groups.face, vec![mesh.layout.top_index(1, 1)]);
        assert_eq!(groups.sides.len(), mesh.geometry.vertex_count() - 1);
        assert_eq!(groups.group(VertexGroup::Face).len(), 1);
    }

    #[test]
    fn test_export_options() {
        let options = ExportOptions::new("out/relief");
        assert_eq!(options.stl_path(), PathBuf::from("out/relief.stl"));
        assert_eq!(options.ply_path(), PathBuf::from("out/relief.ply"));
        assert!(options.validate().is_ok());
        assert!(options.with_stl(false).validate().is_err());
    }
}
