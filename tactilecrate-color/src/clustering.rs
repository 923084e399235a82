//! Distinct color enumeration, clustering and per-cluster statistics

use crate::{ClusteringConfig, Clusterer, Palette, WardClusterer, WeightedSample};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tactilecrate_core::{ClusterLabel, Color, Error, Progress, Result};
use tracing::{debug, info};

/// A color present in the image and how many pixels use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistinctColor {
    pub color: Color,
    pub count: u64,
}

/// Running channel sums and pixel count of one cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStats {
    pub label: ClusterLabel,
    pub sum: [u64; 3],
    pub count: u64,
}

impl ClusterStats {
    pub fn new(label: ClusterLabel) -> Self {
        Self {
            label,
            sum: [0; 3],
            count: 0,
        }
    }

    /// Stats after adding `count` pixels of `color`.
    #[must_use]
    pub fn absorb(self, color: Color, count: u64) -> Self {
        let [r, g, b] = color.channels();
        Self {
            label: self.label,
            sum: [
                self.sum[0] + r as u64 * count,
                self.sum[1] + g as u64 * count,
                self.sum[2] + b as u64 * count,
            ],
            count: self.count + count,
        }
    }

    /// Per-channel `round(sum / count)`.
    pub fn mean(&self) -> Color {
        if self.count == 0 {
            return Color::default();
        }
        let channel = |s: u64| (s as f64 / self.count as f64).round().clamp(0.0, 255.0) as u8;
        Color::new(channel(self.sum[0]), channel(self.sum[1]), channel(self.sum[2]))
    }
}

/// Everything the clustering stage learned about an image.
#[derive(Debug, Clone)]
pub struct ColorAnalysis {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
    distinct: Vec<DistinctColor>,
    color_labels: HashMap<Color, ClusterLabel>,
    clusters: Vec<ClusterStats>,
    palette: Palette,
}

impl ColorAnalysis {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn total_pixels(&self) -> u64 {
        self.pixels.len() as u64
    }

    /// Pixel colors after grouping, row-major.
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Distinct colors in ascending `(r, g, b)` order.
    pub fn distinct_colors(&self) -> &[DistinctColor] {
        &self.distinct
    }

    /// Cluster label of a distinct color.
    pub fn label_of(&self, color: Color) -> Option<ClusterLabel> {
        self.color_labels.get(&color).copied()
    }

    /// Statistics of every cluster, relevant or not, ordered by label.
    pub fn clusters(&self) -> &[ClusterStats] {
        &self.clusters
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }
}

/// Finds the dominant flat colors of an image.
#[derive(Debug, Clone)]
pub struct ColorClusterer<C = WardClusterer> {
    config: ClusteringConfig,
    clusterer: C,
}

impl ColorClusterer<WardClusterer> {
    /// Ward clustering cut at `config.cut_distance`.
    pub fn new(config: ClusteringConfig) -> Self {
        let clusterer = WardClusterer::new(config.cut_distance);
        Self { config, clusterer }
    }
}

impl Default for ColorClusterer<WardClusterer> {
    fn default() -> Self {
        Self::new(ClusteringConfig::default())
    }
}

impl<C: Clusterer> ColorClusterer<C> {
    /// Use another flat clustering backend.
    pub fn with_clusterer(config: ClusteringConfig, clusterer: C) -> Self {
        Self { config, clusterer }
    }

    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    /// Enumerate, cluster and rank the colors of `image`.
    ///
    /// Reports 0, 5 and 45 on `progress`, the share this stage takes in the
    /// color reduction.
    pub fn analyze(&self, image: &RgbImage, progress: &Progress) -> Result<ColorAnalysis> {
        self.config.validate()?;
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::Input("image has no pixels".to_string()));
        }

        progress.update(0.0, "Listing the different colors");

        let pixels: Vec<Color> = image
            .pixels()
            .map(|p| {
                let color = Color::from(p.0);
                match self.config.grouping_radius {
                    Some(radius) => color.grouped(radius),
                    None => color,
                }
            })
            .collect();
        let total = pixels.len() as u64;

        let distinct: Vec<DistinctColor> = pixels
            .iter()
            .fold(BTreeMap::new(), |mut counts, &color| {
                *counts.entry(color).or_insert(0u64) += 1;
                counts
            })
            .into_iter()
            .map(|(color, count)| DistinctColor { color, count })
            .collect();

        if distinct.len() > self.config.max_distinct_colors {
            return Err(Error::Configuration(format!(
                "image has {} distinct colors, more than the {} hierarchical clustering accepts; \
                 set a grouping radius",
                distinct.len(),
                self.config.max_distinct_colors
            )));
        }
        debug!(distinct = distinct.len(), pixels = total, "enumerated colors");

        let counts: Vec<(Color, u64)> = distinct.iter().map(|d| (d.color, d.count)).collect();
        let sample = WeightedSample::from_counts(&counts, total, self.config.sample_scale);
        let labels = self.clusterer.cluster(&sample)?;
        if labels.len() != distinct.len() {
            return Err(Error::InvalidData(format!(
                "clusterer returned {} labels for {} colors",
                labels.len(),
                distinct.len()
            )));
        }

        progress.update(5.0, "");

        let color_labels: HashMap<Color, ClusterLabel> = distinct
            .iter()
            .zip(&labels)
            .map(|(d, &label)| (d.color, label))
            .collect();

        let clusters: Vec<ClusterStats> = distinct
            .iter()
            .zip(&labels)
            .fold(BTreeMap::new(), |mut stats, (d, &label)| {
                let current = stats.remove(&label).unwrap_or_else(|| ClusterStats::new(label));
                stats.insert(label, current.absorb(d.color, d.count));
                stats
            })
            .into_values()
            .collect();

        progress.update(45.0, "");

        let palette = Palette::from_clusters(&clusters, total, self.config.prevalence_threshold);
        info!(
            distinct = distinct.len(),
            clusters = clusters.len(),
            relevant = palette.len(),
            "color clustering finished"
        );

        Ok(ColorAnalysis {
            width,
            height,
            pixels,
            distinct,
            color_labels,
            clusters,
            palette,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tactilecrate_core::NullProgress;

    fn analyze(image: &RgbImage) -> ColorAnalysis {
        ColorClusterer::new(ClusteringConfig::exact())
            .analyze(image, &Progress::new(&NullProgress))
            .unwrap()
    }

    #[test]
    fn test_cluster_stats_mean_rounds() {
        let stats = ClusterStats::new(0)
            .absorb(Color::new(10, 0, 255), 1)
            .absorb(Color::new(11, 1, 254), 1);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.sum, [21, 1, 509]);
        // 10.5 -> 11, 0.5 -> 1, 254.5 -> 255
        assert_eq!(stats.mean(), Color::new(11, 1, 255));
    }

    #[test]
    fn test_uniform_image() {
        let image = RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]));
        let analysis = analyze(&image);
        assert_eq!(analysis.clusters().len(), 1);
        assert_eq!(analysis.palette().len(), 1);
        assert_eq!(analysis.palette().hexes(), vec!["#ff0000".to_string()]);
        assert_eq!(analysis.palette().colors()[0].pixel_count, 4);
    }

    #[test]
    fn test_checkerboard_has_two_relevant_colors() {
        let image = RgbImage::from_fn(4, 4, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 255, 0])
            }
        });
        let analysis = analyze(&image);
        assert_eq!(analysis.palette().len(), 2);
        // Equal counts: the lower label (green sorts first) ranks first.
        assert_eq!(analysis.palette().hexes(), vec!["#00ff00", "#ff0000"]);
    }

    #[test]
    fn test_counts_are_conserved() {
        let image = RgbImage::from_fn(17, 9, |x, y| Rgb([(x * 15) as u8, (y * 28) as u8, 40]));
        let analysis = analyze(&image);
        let clustered: u64 = analysis.clusters().iter().map(|c| c.count).sum();
        let distinct: u64 = analysis.distinct_colors().iter().map(|d| d.count).sum();
        assert_eq!(clustered, 17 * 9);
        assert_eq!(distinct, 17 * 9);
    }

    #[test]
    fn test_similar_shades_share_a_cluster() {
        let image = RgbImage::from_fn(10, 10, |x, _| {
            if x < 5 {
                Rgb([200, 10, 10 + x as u8])
            } else {
                Rgb([10, 10, 200 + x as u8])
            }
        });
        let analysis = analyze(&image);
        assert_eq!(analysis.palette().len(), 2);
        assert_eq!(
            analysis.label_of(Color::new(200, 10, 10)),
            analysis.label_of(Color::new(200, 10, 14))
        );
        assert_ne!(
            analysis.label_of(Color::new(200, 10, 10)),
            analysis.label_of(Color::new(10, 10, 205))
        );
    }

    #[test]
    fn test_grouping_radius_applies_before_counting() {
        let image = RgbImage::from_fn(4, 1, |x, _| Rgb([x as u8, 0, 0]));
        let analysis = ColorClusterer::default()
            .analyze(&image, &Progress::new(&NullProgress))
            .unwrap();
        assert_eq!(analysis.distinct_colors().len(), 1);
        assert_eq!(analysis.distinct_colors()[0].color, Color::new(8, 8, 8));
    }

    #[test]
    fn test_default_config_accepts_gradients() {
        // 65536 distinct colors, four times the clustering limit.
        let image = RgbImage::from_fn(256, 256, |x, y| Rgb([x as u8, y as u8, 128]));
        let analysis = ColorClusterer::default()
            .analyze(&image, &Progress::new(&NullProgress))
            .unwrap();
        assert_eq!(analysis.distinct_colors().len(), 256);
        assert!(!analysis.palette().is_empty());

        let err = ColorClusterer::new(ClusteringConfig::exact())
            .analyze(&image, &Progress::new(&NullProgress))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_rare_colors_are_filtered() {
        // One stray pixel in 1000 is below the 0.3% threshold.
        let image = RgbImage::from_fn(100, 10, |x, y| {
            if x == 0 && y == 0 {
                Rgb([0, 0, 255])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let analysis = analyze(&image);
        assert_eq!(analysis.clusters().len(), 2);
        assert_eq!(analysis.palette().len(), 1);
        assert_eq!(analysis.palette().colors()[0].mean, Color::new(255, 255, 255));
    }

    #[test]
    fn test_too_many_colors_is_a_configuration_error() {
        let image = RgbImage::from_fn(8, 8, |x, y| Rgb([(x * 8 + y) as u8, 0, 0]));
        let config = ClusteringConfig {
            max_distinct_colors: 10,
            ..ClusteringConfig::exact()
        };
        let err = ColorClusterer::new(config)
            .analyze(&image, &Progress::new(&NullProgress))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let image = RgbImage::new(0, 0);
        let err = ColorClusterer::default()
            .analyze(&image, &Progress::new(&NullProgress))
            .unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }
}
