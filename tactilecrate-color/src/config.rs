//! Parameters for color clustering and region consolidation

use serde::{Deserialize, Serialize};
use tactilecrate_core::{Error, Result};

/// Parameters for [`crate::ColorClusterer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Bucket width applied to every channel before enumerating colors.
    /// `None` keeps the colors as decoded. Default: Some(16)
    pub grouping_radius: Option<u8>,

    /// Dendrogram cut height, in Ward distance over RGB units. Default: 100.0
    pub cut_distance: f64,

    /// Minimum share of the image a cluster needs to enter the palette
    /// (strictly greater than). Default: 0.003
    pub prevalence_threshold: f64,

    /// Each distinct color is replicated `max(1, floor(sample_scale * count / total))`
    /// extra times in the clustering sample. Default: 100
    pub sample_scale: usize,

    /// Upper bound on distinct colors fed to the hierarchical clustering.
    /// Default: 16384
    pub max_distinct_colors: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            grouping_radius: Some(16),
            cut_distance: 100.0,
            prevalence_threshold: 0.003,
            sample_scale: 100,
            max_distinct_colors: 16_384,
        }
    }
}

impl ClusteringConfig {
    /// Keep every decoded color as is. Only suited to images with few
    /// distinct colors, such as drawings or synthetic inputs.
    #[must_use]
    pub fn exact() -> Self {
        Self {
            grouping_radius: None,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_grouping_radius(mut self, radius: Option<u8>) -> Self {
        self.grouping_radius = radius;
        self
    }

    #[must_use]
    pub fn with_cut_distance(mut self, distance: f64) -> Self {
        self.cut_distance = distance;
        self
    }

    #[must_use]
    pub fn with_prevalence_threshold(mut self, threshold: f64) -> Self {
        self.prevalence_threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.cut_distance.is_finite() || self.cut_distance < 0.0 {
            return Err(Error::Configuration(format!(
                "cut distance must be a non-negative number, got {}",
                self.cut_distance
            )));
        }
        if !(0.0..1.0).contains(&self.prevalence_threshold) {
            return Err(Error::Configuration(format!(
                "prevalence threshold must be in [0, 1), got {}",
                self.prevalence_threshold
            )));
        }
        if self.max_distinct_colors == 0 {
            return Err(Error::Configuration(
                "max_distinct_colors must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameters for [`crate::RegionConsolidator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionConfig {
    /// A labelled pixel keeps its label only if at least this many pixels of
    /// its 3x3 window, itself included, share it. Default: 4
    pub min_same_neighbours: usize,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            min_same_neighbours: 4,
        }
    }
}

impl RegionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_same_neighbours > 9 {
            return Err(Error::Configuration(format!(
                "min_same_neighbours cannot exceed the 9 pixels of a 3x3 window, got {}",
                self.min_same_neighbours
            )));
        }
        Ok(())
    }
}
