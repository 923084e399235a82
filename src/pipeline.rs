//! Photograph to relief pipeline
//!
//! [`ReliefPipeline`] runs the stages in order and reports progress on a
//! [`Progress`] handle. Each stage returns an owned result, so a failing
//! export leaves the color and mesh artifacts usable.

use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tactilecrate_color::{
    ClusteringConfig, ColorClusterer, ColorDefinitions, Palette, RegionConfig, RegionConsolidator,
};
use tactilecrate_core::{Error, LabelMap, Progress, Result};
use tactilecrate_mesh::{
    ExportOptions, HeightMapper, MeshConfig, MeshDimensions, MeshGeometryBuilder, MeshHeuristics,
    MeshPostProcessor, PostProcessPlan, ReliefMesh, SmoothingOptions,
};
use tracing::{error, info};

/// Settings for every stage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub clustering: ClusteringConfig,
    pub regions: RegionConfig,
    pub mesh: MeshConfig,
    /// Prepend a smoothing modifier to the plan.
    pub smoothing: Option<SmoothingOptions>,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        self.clustering.validate()?;
        self.regions.validate()?;
        self.mesh.validate()
    }
}

/// Result of the color stage.
#[derive(Debug, Clone)]
pub struct ColorReduction {
    pub palette: Palette,
    pub label_map: LabelMap,
    pub flat_image: RgbImage,
    /// Fill passes the region consolidation needed.
    pub passes: usize,
}

impl ColorReduction {
    /// Palette colors as `#rrggbb`, most common first.
    pub fn hexes(&self) -> Vec<String> {
        self.palette.hexes()
    }

    /// Heights defaulting to each color's rank.
    pub fn default_definitions(&self) -> ColorDefinitions {
        ColorDefinitions::for_palette(&self.palette)
    }
}

/// Result of the mesh stage.
#[derive(Debug, Clone)]
pub struct MeshArtifacts {
    pub height_image: GrayImage,
    pub mesh: ReliefMesh,
    pub heuristics: MeshHeuristics,
    pub plan: PostProcessPlan,
    pub dimensions: MeshDimensions,
}

#[derive(Debug, Clone, Default)]
pub struct ReliefPipeline {
    config: PipelineConfig,
}

impl ReliefPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Cluster the image colors and rebuild it with the relevant ones only.
    pub fn reduce_colors(&self, image: &RgbImage, progress: &Progress) -> Result<ColorReduction> {
        self.config.validate()?;
        let analysis = ColorClusterer::new(self.config.clustering.clone()).analyze(image, progress)?;
        let regions =
            RegionConsolidator::new(self.config.regions.clone()).consolidate(&analysis, progress)?;

        Ok(ColorReduction {
            palette: analysis.palette().clone(),
            label_map: regions.label_map,
            flat_image: regions.flat_image,
            passes: regions.fill_passes,
        })
    }

    /// Height image, relief mesh and modifier plan for `reduction`.
    pub fn build_mesh(
        &self,
        reduction: &ColorReduction,
        definitions: &ColorDefinitions,
        progress: &Progress,
    ) -> Result<MeshArtifacts> {
        self.config.validate()?;
        if let Some(missing) = reduction
            .palette
            .iter()
            .find(|c| definitions.height_of(c.label).is_none())
        {
            return Err(Error::InvalidData(format!(
                "color {} has no height definition",
                missing.mean
            )));
        }

        progress.update(0.0, "Generating height map");
        let height_image = HeightMapper::new(definitions)?.map(&reduction.label_map)?;

        progress.update(50.0, "Generating mesh");
        let mesh_config = &self.config.mesh;
        let dimensions =
            mesh_config.resolve_dimensions(height_image.width(), height_image.height())?;
        let mesh = MeshGeometryBuilder::new(dimensions, mesh_config.vertices_per_pixel)
            .build(&height_image)?;

        progress.update(90.0, "Computing heuristics");
        let heuristics = MeshHeuristics::compute(&mesh, mesh_config.merge_radius);
        let plan = PostProcessPlan::from_heuristics(&heuristics, self.config.smoothing);

        info!(
            width_mm = dimensions.width_mm,
            height_mm = dimensions.height_mm,
            modifiers = plan.len(),
            "mesh stage finished"
        );

        Ok(MeshArtifacts {
            height_image,
            mesh,
            heuristics,
            plan,
            dimensions,
        })
    }

    /// Hand the mesh to `processor`, reporting into 50..100 of `progress`.
    ///
    /// A failure is reported on the sink as "generation unsuccessful" and
    /// returned as [`Error::PostProcess`].
    pub fn export(
        &self,
        artifacts: &MeshArtifacts,
        processor: &dyn MeshPostProcessor,
        options: &ExportOptions,
        progress: &Progress,
    ) -> Result<Vec<PathBuf>> {
        let engine_progress = progress.child(50.0, 100.0);
        match processor.process(&artifacts.mesh.geometry, &artifacts.plan, options, &engine_progress) {
            Ok(files) => {
                progress.update(100.0, "Generation successful");
                Ok(files)
            }
            Err(err) => {
                let message = format!("generation unsuccessful: {err}");
                error!("{message}");
                progress.fatal_error(&message);
                Err(Error::PostProcess(err.to_string()))
            }
        }
    }
}

/// Everything a file run produced.
#[cfg(feature = "io")]
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub reduction: ColorReduction,
    pub artifacts: MeshArtifacts,
    /// Mesh files followed by the flat and height PNGs.
    pub files: Vec<PathBuf>,
}

#[cfg(feature = "io")]
impl ReliefPipeline {
    /// Full run on an image file with rank heights and direct export.
    ///
    /// Also writes `<stem>_flat.png` and `<stem>_height.png`. Every failure is
    /// reported on `sink` through `fatal_error` before it is returned.
    pub fn run_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
        options: &ExportOptions,
        sink: &dyn tactilecrate_core::ProgressSink,
    ) -> Result<RunOutput> {
        let progress = Progress::new(sink);
        let mesh_progress = progress.child(50.0, 100.0);

        let (reduction, artifacts) = self
            .prepare_file(path.as_ref(), &progress, &mesh_progress)
            .map_err(|err| report_fatal(&progress, err))?;
        // Export failures are reported by `export` itself.
        let mut files = self.export(
            &artifacts,
            &tactilecrate_io::DirectExport,
            options,
            &mesh_progress,
        )?;

        let stem = options.output_stem.to_string_lossy().into_owned();
        let flat_path = PathBuf::from(format!("{stem}_flat.png"));
        let height_path = PathBuf::from(format!("{stem}_height.png"));
        tactilecrate_io::save_png(&reduction.flat_image, &flat_path)
            .and_then(|()| tactilecrate_io::save_png(&artifacts.height_image, &height_path))
            .map_err(|err| report_fatal(&progress, err))?;
        files.extend([flat_path, height_path]);

        Ok(RunOutput {
            reduction,
            artifacts,
            files,
        })
    }

    /// Load, reduce and mesh, with the mesh stage in the first half of
    /// `mesh_progress` so the engine keeps the second.
    fn prepare_file(
        &self,
        path: &std::path::Path,
        progress: &Progress,
        mesh_progress: &Progress,
    ) -> Result<(ColorReduction, MeshArtifacts)> {
        let image = tactilecrate_io::load_rgb_image(path)?;
        let reduction = self.reduce_colors(&image, &progress.child(0.0, 50.0))?;
        let definitions = reduction.default_definitions();
        let artifacts =
            self.build_mesh(&reduction, &definitions, &mesh_progress.child(0.0, 50.0))?;
        Ok((reduction, artifacts))
    }
}

#[cfg(feature = "io")]
fn report_fatal(progress: &Progress, err: Error) -> Error {
    error!("{err}");
    progress.fatal_error(&err.to_string());
    err
}
