//! Region consolidation: isolated-pixel pruning and color flood fill

use crate::{ColorAnalysis, Palette, RegionConfig};
use image::RgbImage;
use rayon::prelude::*;
use std::collections::HashMap;
use tactilecrate_core::{ClusterLabel, Color, Error, LabelMap, PartialLabelMap, Progress, Result};
use tracing::{debug, info, warn};

/// Index of the pixel itself in a 3x3 window.
const CENTER: usize = 4;

/// The flat image rebuilt from relevant colors only.
#[derive(Debug, Clone)]
pub struct Regions {
    pub label_map: LabelMap,
    pub flat_image: RgbImage,
    /// Fill passes needed to label every pixel.
    pub fill_passes: usize,
    /// Whether pruning was skipped because it would have removed every seed.
    pub pruning_skipped: bool,
}

impl Regions {
    /// Color index of every pixel, row-major.
    pub fn color_indices(&self, palette: &Palette) -> Result<Vec<usize>> {
        let index = palette.label_to_index();
        self.label_map
            .iter()
            .map(|label| {
                index.get(&label).copied().ok_or_else(|| {
                    Error::InvalidData(format!("label {label} is not in the palette"))
                })
            })
            .collect()
    }
}

/// Turns a clustered image into contiguous flat-colored regions.
#[derive(Debug, Clone, Default)]
pub struct RegionConsolidator {
    config: RegionConfig,
}

impl RegionConsolidator {
    pub fn new(config: RegionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RegionConfig {
        &self.config
    }

    /// Label every pixel with a relevant cluster and rebuild the flat image.
    ///
    /// Reports 50 on `progress` before the first fill pass, then
    /// `100 - 50 / 2^pass` after each one and 100 once done.
    pub fn consolidate(&self, analysis: &ColorAnalysis, progress: &Progress) -> Result<Regions> {
        self.config.validate()?;
        let palette = analysis.palette();
        if palette.is_empty() {
            return Err(Error::Configuration(
                "no color covers enough of the image to be kept; lower the prevalence threshold"
                    .to_string(),
            ));
        }

        progress.update(50.0, "Generating flat colored image");

        let initial = initial_assignment(analysis)?;
        let pruned = prune_isolated(&initial, self.config.min_same_neighbours)?;
        let (mut current, pruning_skipped) = if pruned.assigned_count() == 0 {
            warn!(
                pixels = initial.len(),
                "pruning removed every labelled pixel, keeping the unpruned assignment"
            );
            (initial, true)
        } else {
            debug!(
                kept = pruned.assigned_count(),
                removed = initial.assigned_count() - pruned.assigned_count(),
                "pruned isolated pixels"
            );
            (pruned, false)
        };

        let means = palette.means();
        let mut fill_passes = 0;
        while !current.is_complete() {
            let before = current.unassigned_count();
            current = fill_pass(&current, analysis.pixels(), &means)?;
            fill_passes += 1;

            let remaining = current.unassigned_count();
            if remaining == before {
                return Err(Error::Configuration(format!(
                    "region fill stalled with {remaining} unassigned pixels"
                )));
            }
            debug!(pass = fill_passes, remaining, "fill pass");
            let exponent = fill_passes.min(64) as i32;
            progress.update(100.0 - 50.0 * 0.5f64.powi(exponent), "");
        }

        let label_map = current.into_complete()?;
        let flat_image = reconstruct(&label_map, &means)?;
        progress.update(100.0, "");
        info!(
            colors = palette.len(),
            fill_passes,
            "flat image reconstructed"
        );

        Ok(Regions {
            label_map,
            flat_image,
            fill_passes,
            pruning_skipped,
        })
    }
}

/// Label each pixel with its cluster if that cluster is relevant.
pub fn initial_assignment(analysis: &ColorAnalysis) -> Result<PartialLabelMap> {
    let palette = analysis.palette();
    let labels = analysis
        .pixels()
        .iter()
        .map(|&color| analysis.label_of(color).filter(|&label| palette.contains(label)))
        .collect();
    PartialLabelMap::new(analysis.width(), analysis.height(), labels)
}

/// Unassign every labelled pixel whose 3x3 window, itself included, holds
/// fewer than `min_same` pixels of its label. Pixels outside the image count
/// as unassigned.
pub fn prune_isolated(map: &PartialLabelMap, min_same: usize) -> Result<PartialLabelMap> {
    let labels = (0..map.len())
        .into_par_iter()
        .map(|index| {
            let label = map.labels()[index]?;
            let same = map
                .window(index)
                .iter()
                .filter(|&&l| l == Some(label))
                .count();
            (same >= min_same).then_some(label)
        })
        .collect();
    PartialLabelMap::new(map.width(), map.height(), labels)
}

/// One ring of the flood fill.
///
/// Every unassigned pixel with at least one labelled neighbour takes the
/// neighbour label whose mean is closest to the pixel color, the lowest label
/// on ties. Neighbours are read from `map` only, so the result does not depend
/// on visiting order.
pub fn fill_pass(
    map: &PartialLabelMap,
    pixels: &[Color],
    means: &HashMap<ClusterLabel, Color>,
) -> Result<PartialLabelMap> {
    if pixels.len() != map.len() {
        return Err(Error::InvalidData(format!(
            "{} pixel colors for a label map of {} pixels",
            pixels.len(),
            map.len()
        )));
    }

    let labels = (0..map.len())
        .into_par_iter()
        .map(|index| {
            if let Some(label) = map.labels()[index] {
                return Some(label);
            }
            let color = pixels[index];
            map.window(index)
                .iter()
                .enumerate()
                .filter(|&(slot, _)| slot != CENTER)
                .filter_map(|(_, &label)| label)
                .filter_map(|label| {
                    means
                        .get(&label)
                        .map(|mean| (mean.distance_squared(color), label))
                })
                .min()
                .map(|(_, label)| label)
        })
        .collect();
    PartialLabelMap::new(map.width(), map.height(), labels)
}

/// Paint every pixel with the mean color of its label.
pub fn reconstruct(map: &LabelMap, means: &HashMap<ClusterLabel, Color>) -> Result<RgbImage> {
    let mut buffer = Vec::with_capacity(map.len() * 3);
    for label in map.iter() {
        let mean = means
            .get(&label)
            .ok_or_else(|| Error::InvalidData(format!("label {label} has no mean color")))?;
        buffer.extend_from_slice(&mean.channels());
    }
    RgbImage::from_raw(map.width(), map.height(), buffer)
        .ok_or_else(|| Error::InvalidData("flat image buffer has the wrong size".to_string()))
}
