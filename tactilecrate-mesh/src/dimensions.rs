//! Physical size of the printed relief

use serde::{Deserialize, Serialize};
use tactilecrate_core::{Error, Result};

/// Size of the relief in millimetres.
///
/// `height_mm` runs along image rows and `width_mm` along image columns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshDimensions {
    pub width_mm: f64,
    pub height_mm: f64,
    /// Thickness of the plate under the relief.
    pub base_thickness_mm: f64,
    /// Relief amplitude between grey 0 and grey 255.
    pub top_thickness_mm: f64,
}

impl Default for MeshDimensions {
    fn default() -> Self {
        Self {
            width_mm: 100.0,
            height_mm: 100.0,
            base_thickness_mm: 5.0,
            top_thickness_mm: 3.0,
        }
    }
}

/// Largest plate the printer accepts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionLimits {
    pub max_width_mm: f64,
    pub max_height_mm: f64,
}

impl Default for DimensionLimits {
    fn default() -> Self {
        Self {
            max_width_mm: 1000.0,
            max_height_mm: 1000.0,
        }
    }
}

impl MeshDimensions {
    pub fn new(width_mm: f64, height_mm: f64, base_thickness_mm: f64, top_thickness_mm: f64) -> Self {
        Self {
            width_mm,
            height_mm,
            base_thickness_mm,
            top_thickness_mm,
        }
    }

    /// Keep `width_mm` and derive `height_mm` from the image aspect ratio.
    ///
    /// If the derived height exceeds the limit it is clamped and the width is
    /// recomputed from it once. Both sides are floored to whole millimetres
    /// and kept at 1 mm or more.
    pub fn preserve_aspect_ratio(
        self,
        image_width: u32,
        image_height: u32,
        limits: &DimensionLimits,
    ) -> Result<Self> {
        if image_width == 0 || image_height == 0 {
            return Err(Error::Input("image has no pixels".to_string()));
        }
        let ratio = image_height as f64 / image_width as f64;

        let mut width = self.width_mm.min(limits.max_width_mm).floor().max(1.0);
        let mut height = (width * ratio).floor().max(1.0);
        if height > limits.max_height_mm {
            height = limits.max_height_mm.floor().max(1.0);
            width = (height / ratio).floor().clamp(1.0, limits.max_width_mm.max(1.0));
        }

        Ok(Self {
            width_mm: width,
            height_mm: height,
            ..self
        })
    }

    pub fn validate(&self) -> Result<()> {
        let sides = [
            ("width", self.width_mm),
            ("height", self.height_mm),
            ("base thickness", self.base_thickness_mm),
            ("top thickness", self.top_thickness_mm),
        ];
        for (name, value) in sides {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::Configuration(format!(
                    "{name} must be a positive number of millimetres, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Parameters for building the relief mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshConfig {
    /// Grid vertices per image pixel along each axis. Default: 1
    pub vertices_per_pixel: u32,
    pub dimensions: MeshDimensions,
    /// Weld reach, in grid steps. Default: 3.0
    pub merge_radius: f64,
    /// Derive the height from the width and the image. Default: true
    pub preserve_aspect_ratio: bool,
    pub limits: DimensionLimits,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            vertices_per_pixel: 1,
            dimensions: MeshDimensions::default(),
            merge_radius: 3.0,
            preserve_aspect_ratio: true,
            limits: DimensionLimits::default(),
        }
    }
}

impl MeshConfig {
    #[must_use]
    pub fn with_dimensions(mut self, dimensions: MeshDimensions) -> Self {
        self.dimensions = dimensions;
        self
    }

    #[must_use]
    pub fn with_vertices_per_pixel(mut self, vertices_per_pixel: u32) -> Self {
        self.vertices_per_pixel = vertices_per_pixel;
        self
    }

    #[must_use]
    pub fn with_preserve_aspect_ratio(mut self, preserve: bool) -> Self {
        self.preserve_aspect_ratio = preserve;
        self
    }

    #[must_use]
    pub fn with_merge_radius(mut self, merge_radius: f64) -> Self {
        self.merge_radius = merge_radius;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.vertices_per_pixel == 0 {
            return Err(Error::Configuration(
                "vertices_per_pixel must be at least 1".to_string(),
            ));
        }
        if !self.merge_radius.is_finite() || self.merge_radius < 0.0 {
            return Err(Error::Configuration(format!(
                "merge radius must be a non-negative number, got {}",
                self.merge_radius
            )));
        }
        self.dimensions.validate()
    }

    /// Final dimensions for an image of `image_width` x `image_height` pixels.
    pub fn resolve_dimensions(&self, image_width: u32, image_height: u32) -> Result<MeshDimensions> {
        let dimensions = if self.preserve_aspect_ratio {
            self.dimensions
                .preserve_aspect_ratio(image_width, image_height, &self.limits)?
        } else {
            self.dimensions
        };
        dimensions.validate()?;
        Ok(dimensions)
    }
}
