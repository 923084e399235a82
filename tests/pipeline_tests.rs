//! Integration tests for the tactilecrate pipeline
//!
//! These tests run the color and mesh stages together on synthetic images and
//! check the properties the stages promise each other.

use approx::assert_relative_eq;
use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use tactilecrate::color::ClusterStats;
use tactilecrate::mesh::{decimate_ratio, min_z_gap, GridLayout, Modifier};
use tactilecrate::prelude::*;
use tactilecrate::NullProgress;

/// Records every progress update and fatal error.
#[derive(Default)]
struct Recorder {
    updates: Mutex<Vec<(f64, String)>>,
    errors: Mutex<Vec<String>>,
}

impl ProgressSink for Recorder {
    fn update(&self, percent: f64, message: &str) {
        self.updates.lock().unwrap().push((percent, message.to_string()));
    }

    fn fatal_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

/// Keeps decoded colors, for images whose exact colors are asserted.
fn exact_pipeline() -> ReliefPipeline {
    ReliefPipeline::new(PipelineConfig {
        clustering: ClusteringConfig::exact(),
        ..Default::default()
    })
}

/// Three horizontal bands and two stray black pixels, too few to be kept.
fn create_banded_image(width: u32, height: u32, rng: &mut StdRng) -> RgbImage {
    let bands = [Rgb([220, 30, 30]), Rgb([30, 160, 60]), Rgb([240, 240, 240])];
    let mut image = RgbImage::from_fn(width, height, |_, y| bands[(y * 3 / height) as usize]);
    for _ in 0..2 {
        let (x, y) = (rng.gen_range(0..width), rng.gen_range(0..height));
        image.put_pixel(x, y, Rgb([0, 0, 0]));
    }
    image
}

#[test]
fn test_uniform_scenario() -> anyhow::Result<()> {
    let pipeline = exact_pipeline();
    let progress = Progress::new(&NullProgress);
    let image = RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]));

    let reduction = pipeline.reduce_colors(&image, &progress)?;
    assert_eq!(reduction.hexes(), vec!["#ff0000"]);
    assert_eq!(reduction.label_map.labels(), &[0, 0, 0, 0]);

    let artifacts = pipeline.build_mesh(&reduction, &reduction.default_definitions(), &progress)?;
    let first = artifacts.height_image.get_pixel(0, 0);
    assert!(artifacts.height_image.pixels().all(|p| p == first));
    Ok(())
}

#[test]
fn test_banded_image_end_to_end() -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(7);
    let image = create_banded_image(40, 30, &mut rng);
    let pipeline = ReliefPipeline::default();
    let progress = Progress::new(&NullProgress);

    let reduction = pipeline.reduce_colors(&image, &progress)?;
    assert_eq!(reduction.palette.len(), 3);
    let counts: Vec<u64> = reduction.palette.iter().map(|c| c.pixel_count).collect();
    assert!(counts.windows(2).all(|w| w[0] >= w[1]));

    // Every pixel is painted with a palette color.
    let means: Vec<Color> = reduction.palette.iter().map(|c| c.mean).collect();
    assert!(reduction
        .flat_image
        .pixels()
        .all(|p| means.contains(&Color::from(p.0))));

    let definitions = ColorDefinitions::with_heights(&reduction.palette, &[0, 50, 100])?;
    let artifacts = pipeline.build_mesh(&reduction, &definitions, &progress)?;
    let geometry = &artifacts.mesh.geometry;
    let layout = GridLayout::for_image(30, 40, 1)?;
    assert_eq!(geometry.vertex_count(), 30 * 40 + 2 * (30 + 40) - 4 + 4);
    assert_eq!(geometry.face_count(), layout.face_count());
    assert!(geometry.is_closed());
    assert!(geometry.signed_volume() > 0.0);

    let heuristics = artifacts.heuristics;
    assert_relative_eq!(heuristics.decimate_ratio, decimate_ratio(geometry.vertex_count()));
    assert!(heuristics.decimate_ratio > 0.0 && heuristics.decimate_ratio <= 1.0);
    assert!(heuristics.weld_threshold <= 0.99 * min_z_gap(geometry).unwrap() + 1e-12);
    assert!(matches!(
        artifacts.plan.modifiers.last(),
        Some(Modifier::Triangulate)
    ));
    Ok(())
}

#[test]
fn test_pixel_counts_are_conserved() -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(11);
    let image = RgbImage::from_fn(25, 25, |_, _| {
        Rgb([rng.gen_range(0..4) * 60, rng.gen_range(0..3) * 100, 90])
    });
    let analysis = ColorClusterer::default().analyze(&image, &Progress::new(&NullProgress))?;
    let total: u64 = analysis.clusters().iter().map(|c: &ClusterStats| c.count).sum();
    assert_eq!(total, 625);
    for stats in analysis.clusters() {
        let mean = stats.mean().channels();
        for (channel, sum) in mean.iter().zip(stats.sum) {
            assert_eq!(*channel as u64, (sum as f64 / stats.count as f64).round() as u64);
        }
    }
    Ok(())
}

#[test]
fn test_random_images_are_fully_labelled() -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(2024);
    let pipeline = ReliefPipeline::default();
    let progress = Progress::new(&NullProgress);
    for _ in 0..8 {
        let width = rng.gen_range(1..30);
        let height = rng.gen_range(1..30);
        let seeds = [rng.gen::<[u8; 3]>(), rng.gen::<[u8; 3]>()];
        let image = RgbImage::from_fn(width, height, |x, y| {
            Rgb(seeds[((x / 4 + y / 4) % 2) as usize])
        });
        let reduction = pipeline.reduce_colors(&image, &progress)?;
        assert_eq!(reduction.label_map.len(), (width * height) as usize);
        assert!(reduction
            .label_map
            .iter()
            .all(|label| reduction.palette.contains(label)));
    }
    Ok(())
}

#[test]
fn test_progress_checkpoints() -> anyhow::Result<()> {
    let pipeline = ReliefPipeline::default();
    let recorder = Recorder::default();
    let progress = Progress::new(&recorder);
    let image = RgbImage::from_pixel(3, 3, Rgb([10, 20, 30]));

    let reduction = pipeline.reduce_colors(&image, &progress.child(0.0, 50.0))?;
    pipeline.build_mesh(&reduction, &reduction.default_definitions(), &progress.child(50.0, 100.0))?;

    let updates = recorder.updates.lock().unwrap();
    let percents: Vec<f64> = updates.iter().map(|(p, _)| *p).collect();
    assert_eq!(percents, vec![0.0, 2.5, 22.5, 25.0, 50.0, 50.0, 75.0, 95.0]);
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(updates[0].1, "Listing the different colors");
    assert_eq!(updates[5].1, "Generating height map");
    assert_eq!(updates[6].1, "Generating mesh");
    assert_eq!(updates[7].1, "Computing heuristics");
    Ok(())
}

#[test]
fn test_default_pipeline_reduces_gradient() -> anyhow::Result<()> {
    // Every pixel has its own color, well past the clustering limit.
    let image = RgbImage::from_fn(256, 256, |x, y| Rgb([x as u8, y as u8, (x ^ y) as u8]));
    let progress = Progress::new(&NullProgress);
    let reduction = ReliefPipeline::default().reduce_colors(&image, &progress)?;
    assert!(!reduction.palette.is_empty());
    assert_eq!(reduction.label_map.len(), 256 * 256);
    assert!(reduction
        .label_map
        .iter()
        .all(|label| reduction.palette.contains(label)));

    let err = exact_pipeline().reduce_colors(&image, &progress).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
    Ok(())
}

#[test]
fn test_single_pixel_image() -> anyhow::Result<()> {
    let pipeline = exact_pipeline();
    let progress = Progress::new(&NullProgress);
    let image = RgbImage::from_pixel(1, 1, Rgb([18, 52, 86]));

    let reduction = pipeline.reduce_colors(&image, &progress)?;
    assert_eq!(reduction.hexes(), vec!["#123456"]);

    let artifacts = pipeline.build_mesh(&reduction, &reduction.default_definitions(), &progress)?;
    assert_eq!(artifacts.mesh.layout.top_count(), 1);
    assert_eq!(artifacts.mesh.geometry.vertex_count(), 6);
    assert!(artifacts.mesh.geometry.is_closed());
    Ok(())
}

#[test]
fn test_file_run() -> anyhow::Result<()> {
    let dir = std::env::temp_dir().join("tactilecrate_pipeline_test");
    std::fs::create_dir_all(&dir)?;
    let input = dir.join("input.png");
    let image = RgbImage::from_fn(8, 8, |x, _| {
        if x < 4 {
            Rgb([200, 40, 40])
        } else {
            Rgb([40, 40, 200])
        }
    });
    save_png(&image, &input)?;

    let options = ExportOptions::new(dir.join("relief")).with_ply(true);
    let recorder = Recorder::default();
    let output = exact_pipeline().run_file(&input, &options, &recorder)?;
    assert_eq!(output.files.len(), 4);
    for path in &output.files {
        assert!(path.exists(), "{} was not written", path.display());
    }
    assert_eq!(load_rgb_image(&output.files[2])?, image);

    let updates = recorder.updates.lock().unwrap();
    let percents: Vec<f64> = updates.iter().map(|(p, _)| *p).collect();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");
    assert_eq!(percents.last(), Some(&100.0));
    assert!(recorder.errors.lock().unwrap().is_empty());

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn test_file_run_reports_missing_input() {
    let input = std::env::temp_dir().join("tactilecrate_missing_input/photo.png");
    let options = ExportOptions::new(std::env::temp_dir().join("tactilecrate_missing_relief"));
    let recorder = Recorder::default();

    let err = ReliefPipeline::default()
        .run_file(&input, &options, &recorder)
        .unwrap_err();
    assert!(matches!(err, Error::Input(_)));
    assert_eq!(*recorder.errors.lock().unwrap(), vec![err.to_string()]);
    assert!(!options.stl_path().exists());
}
