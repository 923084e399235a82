//! Height image generation from color definitions

use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tactilecrate_color::ColorDefinitions;
use tactilecrate_core::{ClusterLabel, Error, LabelMap, Result};
use tracing::debug;

/// Grey level used when every color has the same height.
pub const FLAT_GREY: u8 = 128;

/// How a height definition becomes a grey level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HeightScale {
    /// `grey = floor(height * 255 / span)`, `span = max - min`.
    Linear { span: i64 },
    /// All heights are equal.
    Flat,
}

impl HeightScale {
    pub fn from_range(min: i32, max: i32) -> Self {
        if max == min {
            HeightScale::Flat
        } else {
            HeightScale::Linear {
                span: max as i64 - min as i64,
            }
        }
    }

    /// Grey levels per unit of height, `None` when flat.
    pub fn step(&self) -> Option<f64> {
        match self {
            HeightScale::Linear { span } => Some(255.0 / *span as f64),
            HeightScale::Flat => None,
        }
    }

    pub fn grey(&self, height: i32) -> u8 {
        match self {
            // Integer floor division keeps the top height at exactly 255.
            HeightScale::Linear { span } => (height as i64 * 255).div_euclid(*span).clamp(0, 255) as u8,
            HeightScale::Flat => FLAT_GREY,
        }
    }
}

/// Paints a label map with the grey level of each label's height.
#[derive(Debug, Clone)]
pub struct HeightMapper {
    heights: HashMap<ClusterLabel, i32>,
    scale: HeightScale,
}

impl HeightMapper {
    pub fn new(definitions: &ColorDefinitions) -> Result<Self> {
        let (min, max) = definitions.range().ok_or_else(|| {
            Error::InvalidData("no color definitions to build a height map from".to_string())
        })?;
        let heights = definitions.iter().map(|d| (d.label, d.height)).collect();
        let scale = HeightScale::from_range(min, max);
        debug!(min, max, ?scale, "height scale");
        Ok(Self { heights, scale })
    }

    pub fn scale(&self) -> HeightScale {
        self.scale
    }

    pub fn grey_of(&self, label: ClusterLabel) -> Option<u8> {
        self.heights.get(&label).map(|&h| self.scale.grey(h))
    }

    /// Single channel image, same size as `labels`.
    pub fn map(&self, labels: &LabelMap) -> Result<GrayImage> {
        let buffer = labels
            .iter()
            .map(|label| {
                self.grey_of(label).ok_or_else(|| {
                    Error::InvalidData(format!("label {label} has no height definition"))
                })
            })
            .collect::<Result<Vec<u8>>>()?;
        GrayImage::from_raw(labels.width(), labels.height(), buffer)
            .ok_or_else(|| Error::InvalidData("height image buffer has the wrong size".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactilecrate_color::{Palette, RelevantColor};
    use tactilecrate_core::Color;

    fn palette() -> Palette {
        Palette::new(vec![
            RelevantColor { label: 0, mean: Color::new(255, 255, 255), pixel_count: 3 },
            RelevantColor { label: 1, mean: Color::new(0, 0, 0), pixel_count: 1 },
        ])
    }

    #[test]
    fn test_linear_scale() {
        let definitions = ColorDefinitions::with_heights(&palette(), &[0, 100]).unwrap();
        let mapper = HeightMapper::new(&definitions).unwrap();
        let labels = LabelMap::new(2, 2, vec![0, 1, 1, 0]).unwrap();
        let image = mapper.map(&labels).unwrap();
        assert_eq!(image.as_raw(), &vec![0, 255, 255, 0]);
    }

    #[test]
    fn test_grey_floors_and_clamps() {
        let scale = HeightScale::from_range(0, 3);
        assert_eq!(scale.grey(1), 85);
        assert_eq!(scale.grey(2), 170);
        assert_eq!(scale.grey(-1), 0);
        assert_eq!(scale.grey(4), 255);
        assert_eq!(HeightScale::from_range(0, 100).grey(100), 255);
        assert_eq!(HeightScale::from_range(0, 100).grey(33), 84);
    }

    #[test]
    fn test_equal_heights_give_flat_mid_grey() {
        let definitions = ColorDefinitions::with_heights(&palette(), &[7, 7]).unwrap();
        let mapper = HeightMapper::new(&definitions).unwrap();
        assert_eq!(mapper.scale(), HeightScale::Flat);
        let image = mapper.map(&LabelMap::new(2, 1, vec![0, 1]).unwrap()).unwrap();
        assert!(image.pixels().all(|p| p.0[0] == FLAT_GREY));
    }

    #[test]
    fn test_unknown_label_is_rejected() {
        let definitions = ColorDefinitions::for_palette(&palette());
        let mapper = HeightMapper::new(&definitions).unwrap();
        let labels = LabelMap::new(1, 1, vec![9]).unwrap();
        assert!(matches!(mapper.map(&labels), Err(Error::InvalidData(_))));
    }
}
