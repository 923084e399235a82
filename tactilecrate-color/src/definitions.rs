//! User-supplied heights for palette colors

use crate::Palette;
use serde::{Deserialize, Serialize};
use tactilecrate_core::{ClusterLabel, Color, Error, Result};

/// The relief height chosen for one palette color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorDefinition {
    pub label: ClusterLabel,
    pub color: Color,
    pub height: i32,
}

/// One height per palette color, in color index order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorDefinitions {
    definitions: Vec<ColorDefinition>,
}

impl ColorDefinitions {
    /// Every color gets its color index as height: the most common color is
    /// the lowest.
    pub fn for_palette(palette: &Palette) -> Self {
        let definitions = palette
            .iter()
            .enumerate()
            .map(|(index, c)| ColorDefinition {
                label: c.label,
                color: c.mean,
                height: index as i32,
            })
            .collect();
        Self { definitions }
    }

    /// Heights given in color index order.
    pub fn with_heights(palette: &Palette, heights: &[i32]) -> Result<Self> {
        if heights.len() != palette.len() {
            return Err(Error::InvalidData(format!(
                "{} heights given for a palette of {} colors",
                heights.len(),
                palette.len()
            )));
        }
        let mut definitions = Self::for_palette(palette);
        for (definition, &height) in definitions.definitions.iter_mut().zip(heights) {
            definition.height = height;
        }
        Ok(definitions)
    }

    pub fn set_height(&mut self, label: ClusterLabel, height: i32) -> Result<()> {
        let definition = self
            .definitions
            .iter_mut()
            .find(|d| d.label == label)
            .ok_or_else(|| Error::InvalidData(format!("label {label} is not in the palette")))?;
        definition.height = height;
        Ok(())
    }

    /// Set the height of the color displayed as `hex`.
    pub fn set_height_for_hex(&mut self, hex: &str, height: i32) -> Result<()> {
        let color = Color::from_hex(hex)?;
        let definition = self
            .definitions
            .iter_mut()
            .find(|d| d.color == color)
            .ok_or_else(|| Error::InvalidData(format!("{hex} is not in the palette")))?;
        definition.height = height;
        Ok(())
    }

    pub fn height_of(&self, label: ClusterLabel) -> Option<i32> {
        self.definitions
            .iter()
            .find(|d| d.label == label)
            .map(|d| d.height)
    }

    /// Lowest and highest height, `None` when empty.
    pub fn range(&self) -> Option<(i32, i32)> {
        let min = self.definitions.iter().map(|d| d.height).min()?;
        let max = self.definitions.iter().map(|d| d.height).max()?;
        Some((min, max))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColorDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
