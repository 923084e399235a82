//! Ranked palette of relevant colors

use crate::ClusterStats;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tactilecrate_core::{ClusterLabel, Color};

/// A cluster that covers enough of the image to be kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevantColor {
    pub label: ClusterLabel,
    pub mean: Color,
    pub pixel_count: u64,
}

/// Relevant colors sorted by descending pixel count, ties by ascending label.
///
/// The position of a color in this list is its color index: index 0 is the
/// most common color.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Palette {
    colors: Vec<RelevantColor>,
}

impl Palette {
    pub fn new(colors: Vec<RelevantColor>) -> Self {
        let colors = colors
            .into_iter()
            .sorted_by(|a, b| {
                b.pixel_count
                    .cmp(&a.pixel_count)
                    .then(a.label.cmp(&b.label))
            })
            .collect();
        Self { colors }
    }

    /// Keep the clusters holding strictly more than `threshold * total_pixels`
    /// pixels.
    pub fn from_clusters(clusters: &[ClusterStats], total_pixels: u64, threshold: f64) -> Self {
        let minimum = threshold * total_pixels as f64;
        Self::new(
            clusters
                .iter()
                .filter(|c| c.count as f64 > minimum)
                .map(|c| RelevantColor {
                    label: c.label,
                    mean: c.mean(),
                    pixel_count: c.count,
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[RelevantColor] {
        &self.colors
    }

    pub fn iter(&self) -> impl Iterator<Item = &RelevantColor> {
        self.colors.iter()
    }

    pub fn get(&self, index: usize) -> Option<&RelevantColor> {
        self.colors.get(index)
    }

    pub fn contains(&self, label: ClusterLabel) -> bool {
        self.index_of(label).is_some()
    }

    /// Color index of a label.
    pub fn index_of(&self, label: ClusterLabel) -> Option<usize> {
        self.colors.iter().position(|c| c.label == label)
    }

    pub fn mean_of(&self, label: ClusterLabel) -> Option<Color> {
        self.colors.iter().find(|c| c.label == label).map(|c| c.mean)
    }

    /// Color index of the entry displayed as `hex`.
    pub fn index_of_hex(&self, hex: &str) -> Option<usize> {
        let color = Color::from_hex(hex).ok()?;
        self.colors.iter().position(|c| c.mean == color)
    }

    /// `#rrggbb` strings in color index order.
    pub fn hexes(&self) -> Vec<String> {
        self.colors.iter().map(|c| c.mean.to_hex()).collect()
    }

    /// Label to color index.
    pub fn label_to_index(&self) -> HashMap<ClusterLabel, usize> {
        self.colors
            .iter()
            .enumerate()
            .map(|(i, c)| (c.label, i))
            .collect()
    }

    /// Label to mean color.
    pub fn means(&self) -> HashMap<ClusterLabel, Color> {
        self.colors.iter().map(|c| (c.label, c.mean)).collect()
    }
}
