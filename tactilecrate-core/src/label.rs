//! Cluster labels and per-pixel label maps

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Identifier of a color cluster. Unique within one clustering run only.
pub type ClusterLabel = u32;

/// Offsets `(row, col)` of the 3x3 window, in row-major order. Index 4 is the
/// pixel itself.
pub const WINDOW_OFFSETS: [(i64, i64); 9] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 0),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// A complete per-pixel label map, row-major. Every pixel carries a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMap {
    width: u32,
    height: u32,
    labels: Vec<ClusterLabel>,
}

impl LabelMap {
    pub fn new(width: u32, height: u32, labels: Vec<ClusterLabel>) -> Result<Self> {
        check_len(width, height, labels.len())?;
        Ok(Self { width, height, labels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[ClusterLabel] {
        &self.labels
    }

    /// Label of the pixel at column `x`, row `y`.
    pub fn get(&self, x: u32, y: u32) -> Option<ClusterLabel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.labels.get(y as usize * self.width as usize + x as usize).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = ClusterLabel> + '_ {
        self.labels.iter().copied()
    }
}

/// A label map under construction. `None` marks an unassigned pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialLabelMap {
    width: u32,
    height: u32,
    labels: Vec<Option<ClusterLabel>>,
}

impl PartialLabelMap {
    pub fn new(width: u32, height: u32, labels: Vec<Option<ClusterLabel>>) -> Result<Self> {
        check_len(width, height, labels.len())?;
        Ok(Self { width, height, labels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn labels(&self) -> &[Option<ClusterLabel>] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn assigned_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_some()).count()
    }

    pub fn unassigned_count(&self) -> usize {
        self.labels.len() - self.assigned_count()
    }

    pub fn is_complete(&self) -> bool {
        self.labels.iter().all(Option::is_some)
    }

    /// The 3x3 window around the pixel at row-major `index`, in
    /// [`WINDOW_OFFSETS`] order. Positions outside the image are `None`.
    pub fn window(&self, index: usize) -> [Option<ClusterLabel>; 9] {
        let width = self.width as i64;
        let height = self.height as i64;
        let row = index as i64 / width;
        let col = index as i64 % width;

        let mut window = [None; 9];
        for (slot, (dr, dc)) in window.iter_mut().zip(WINDOW_OFFSETS) {
            let (r, c) = (row + dr, col + dc);
            if r >= 0 && r < height && c >= 0 && c < width {
                *slot = self.labels[(r * width + c) as usize];
            }
        }
        window
    }

    /// Convert into a complete map; fails if any pixel is still unassigned.
    pub fn into_complete(self) -> Result<LabelMap> {
        let missing = self.unassigned_count();
        if missing > 0 {
            return Err(Error::InvalidData(format!(
                "{missing} pixels are still unassigned"
            )));
        }
        let labels = self.labels.into_iter().flatten().collect();
        LabelMap::new(self.width, self.height, labels)
    }
}

fn check_len(width: u32, height: u32, len: usize) -> Result<()> {
    let expected = width as usize * height as usize;
    if len != expected {
        return Err(Error::InvalidData(format!(
            "label buffer has {len} entries, expected {width}x{height} = {expected}"
        )));
    }
    Ok(())
}
