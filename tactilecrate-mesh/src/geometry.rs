//! Relief mesh construction over a regular grid
//!
//! The grid has `nx` positions along image rows and `ny` along image columns.
//! Vertex buffer layout:
//!
//! ```text
//! [ top surface: nx * ny ][ skirt: perimeter ][ base corners: 4 ]
//! ```
//!
//! Top vertex `(x, y)` sits at `x + nx * y`. Skirt vertices follow the top
//! block in row-major order over the perimeter positions, at half the base
//! depth. The four base corners close the bottom.

use crate::MeshDimensions;
use image::GrayImage;
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tactilecrate_core::{Error, MeshGeometry, Point3d, Result, Vector3d};
use tracing::{debug, info};

/// Index arithmetic of the relief mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    nx: usize,
    ny: usize,
}

impl GridLayout {
    pub fn new(nx: usize, ny: usize) -> Result<Self> {
        if nx == 0 || ny == 0 {
            return Err(Error::GeometryInvariant(format!(
                "grid must have at least one position per axis, got {nx}x{ny}"
            )));
        }
        Ok(Self { nx, ny })
    }

    /// Grid for an image of `rows` x `cols` pixels at `k` vertices per pixel.
    pub fn for_image(rows: u32, cols: u32, k: u32) -> Result<Self> {
        Self::new(rows as usize * k as usize, cols as usize * k as usize)
    }

    /// Positions along image rows.
    pub fn nx(&self) -> usize {
        self.nx
    }

    /// Positions along image columns.
    pub fn ny(&self) -> usize {
        self.ny
    }

    /// A single row or column: every position lies on the perimeter.
    pub fn is_strip(&self) -> bool {
        self.nx == 1 || self.ny == 1
    }

    pub fn top_count(&self) -> usize {
        self.nx * self.ny
    }

    pub fn perimeter_count(&self) -> usize {
        if self.is_strip() {
            self.top_count()
        } else {
            2 * (self.nx + self.ny) - 4
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.top_count() + self.perimeter_count() + 4
    }

    /// Faces of a grid of at least 2x2, where nothing is dropped.
    pub fn face_count(&self) -> usize {
        2 * (self.nx - 1) * (self.ny - 1) + 6 * (self.nx + self.ny - 2) + 6
    }

    pub fn top_index(&self, x: usize, y: usize) -> usize {
        x + self.nx * y
    }

    pub fn is_perimeter(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x == self.nx - 1 || y == self.ny - 1
    }

    /// Index of the skirt vertex under perimeter position `(x, y)`.
    pub fn skirt_index(&self, x: usize, y: usize) -> Option<usize> {
        let top = self.top_count();
        if self.is_strip() {
            return Some(top + x + self.nx * y);
        }
        if y == 0 {
            Some(top + x)
        } else if y == self.ny - 1 {
            Some(top + self.perimeter_count() - (self.nx - x))
        } else if x == 0 {
            Some(top + self.nx + 2 * (y - 1))
        } else if x == self.nx - 1 {
            Some(top + self.nx + 2 * (y - 1) + 1)
        } else {
            None
        }
    }

    /// Base corner under `(0, 0)`.
    pub fn base_00(&self) -> usize {
        self.vertex_count() - 4
    }

    /// Base corner under `(nx - 1, 0)`.
    pub fn base_n0(&self) -> usize {
        self.vertex_count() - 3
    }

    /// Base corner under `(0, ny - 1)`.
    pub fn base_0n(&self) -> usize {
        self.vertex_count() - 2
    }

    /// Base corner under `(nx - 1, ny - 1)`.
    pub fn base_nn(&self) -> usize {
        self.vertex_count() - 1
    }

    /// Grid position in `[0, 1]`; a single-position axis maps to 0.
    pub fn normalized(&self, x: usize, y: usize) -> (f64, f64) {
        let along = |i: usize, n: usize| if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
        (along(x, self.nx), along(y, self.ny))
    }

    /// Physical spacing between neighbouring grid positions: along rows if
    /// there are several, else along columns, else 0.
    pub fn step_size(&self, dimensions: &MeshDimensions) -> f64 {
        if self.nx > 1 {
            dimensions.height_mm / (self.nx - 1) as f64
        } else if self.ny > 1 {
            dimensions.width_mm / (self.ny - 1) as f64
        } else {
            0.0
        }
    }
}

/// A generated relief and the layout its buffers follow.
#[derive(Debug, Clone)]
pub struct ReliefMesh {
    pub geometry: MeshGeometry,
    pub layout: GridLayout,
    pub dimensions: MeshDimensions,
}

/// Builds the printable relief of a height image.
#[derive(Debug, Clone)]
pub struct MeshGeometryBuilder {
    dimensions: MeshDimensions,
    vertices_per_pixel: u32,
}

impl MeshGeometryBuilder {
    pub fn new(dimensions: MeshDimensions, vertices_per_pixel: u32) -> Self {
        Self {
            dimensions,
            vertices_per_pixel,
        }
    }

    pub fn dimensions(&self) -> &MeshDimensions {
        &self.dimensions
    }

    pub fn build(&self, height_image: &GrayImage) -> Result<ReliefMesh> {
        self.dimensions.validate()?;
        if self.vertices_per_pixel == 0 {
            return Err(Error::Configuration(
                "vertices_per_pixel must be at least 1".to_string(),
            ));
        }
        let (cols, rows) = height_image.dimensions();
        let layout = GridLayout::for_image(rows, cols, self.vertices_per_pixel)?;

        let vertices = self.vertices(&layout, height_image);
        let faces = faces(&layout)?;
        if vertices.len() != layout.vertex_count() {
            return Err(Error::GeometryInvariant(format!(
                "built {} vertices, layout expects {}",
                vertices.len(),
                layout.vertex_count()
            )));
        }
        let geometry = MeshGeometry::from_vertices_and_faces(vertices, faces)?;

        info!(
            grid_x = layout.nx(),
            grid_y = layout.ny(),
            vertices = geometry.vertex_count(),
            faces = geometry.face_count(),
            "relief mesh built"
        );

        Ok(ReliefMesh {
            geometry,
            layout,
            dimensions: self.dimensions,
        })
    }

    /// Image rows run along x and scale to `height_mm`; columns run along y
    /// and scale to `width_mm`.
    fn scale(&self) -> Vector3d {
        Vector3d::new(
            self.dimensions.height_mm,
            self.dimensions.width_mm,
            self.dimensions.top_thickness_mm,
        )
    }

    fn vertices(&self, layout: &GridLayout, height_image: &GrayImage) -> Vec<Point3d> {
        let scale = self.scale();
        let k = self.vertices_per_pixel as usize;
        let place = |x: usize, y: usize, z: f64| {
            let (u, v) = layout.normalized(x, y);
            Point3d::from(Vector3d::new(u, v, z).component_mul(&scale))
        };

        let mut vertices: Vec<Point3d> = (0..layout.top_count())
            .into_par_iter()
            .map(|i| {
                let (x, y) = (i % layout.nx(), i / layout.nx());
                let grey = height_image.get_pixel((y / k) as u32, (x / k) as u32).0[0];
                place(x, y, grey as f64 / 255.0)
            })
            .collect();

        let skirt_z = -self.dimensions.base_thickness_mm / 2.0;
        vertices.extend(
            (0..layout.ny())
                .cartesian_product(0..layout.nx())
                .filter(|&(y, x)| layout.is_perimeter(x, y))
                .map(|(y, x)| {
                    let mut p = place(x, y, 0.0);
                    p.z = skirt_z;
                    p
                }),
        );

        let base_z = -self.dimensions.base_thickness_mm;
        let (h, w) = (self.dimensions.height_mm, self.dimensions.width_mm);
        vertices.extend([
            Point3d::new(0.0, 0.0, base_z),
            Point3d::new(h, 0.0, base_z),
            Point3d::new(0.0, w, base_z),
            Point3d::new(h, w, base_z),
        ]);
        vertices
    }
}

/// Faces of the relief in emission order: top surface, upper borders, side
/// walls, bottom. Faces with a repeated vertex and repeated faces, which only
/// single row or column grids produce, are dropped.
pub fn faces(layout: &GridLayout) -> Result<Vec<[usize; 3]>> {
    let (nx, ny) = (layout.nx(), layout.ny());
    let (last_x, last_y) = (nx - 1, ny - 1);
    let idx = |x: usize, y: usize| layout.top_index(x, y);
    // Skirt vertices of the four sides, x_min and x_max indexed by y.
    let x_min = skirt_indices(layout, (0..ny).map(|y| (0, y)))?;
    let x_max = skirt_indices(layout, (0..ny).map(|y| (last_x, y)))?;
    let y_min = skirt_indices(layout, (0..nx).map(|x| (x, 0)))?;
    let y_max = skirt_indices(layout, (0..nx).map(|x| (x, last_y)))?;
    let (b00, bn0, b0n, bnn) = (
        layout.base_00(),
        layout.base_n0(),
        layout.base_0n(),
        layout.base_nn(),
    );

    let quads = || (0..nx.saturating_sub(1)).cartesian_product(0..ny.saturating_sub(1));
    let mut faces: Vec<[usize; 3]> = Vec::with_capacity(layout.face_count());

    faces.extend(quads().map(|(x, y)| {
        let i = idx(x, y);
        [i, i + 1, i + nx]
    }));
    faces.extend(quads().map(|(x, y)| {
        let i = idx(x, y);
        [i + 1, i + 1 + nx, i + nx]
    }));

    faces.extend((1..ny).map(|y| [idx(0, y - 1), idx(0, y), x_min[y]]));
    faces.extend((0..last_y).map(|y| [idx(0, y), x_min[y + 1], x_min[y]]));
    faces.extend((1..ny).map(|y| [idx(last_x, y), idx(last_x, y - 1), x_max[y]]));
    faces.extend((0..last_y).map(|y| [x_max[y + 1], idx(last_x, y), x_max[y]]));
    faces.extend((1..nx).map(|x| [idx(x, 0), idx(x - 1, 0), y_min[x]]));
    faces.extend((0..last_x).map(|x| [y_min[x + 1], idx(x, 0), y_min[x]]));
    faces.extend((1..nx).map(|x| [idx(x - 1, last_y), idx(x, last_y), y_max[x]]));
    faces.extend((0..last_x).map(|x| [idx(x, last_y), y_max[x + 1], y_max[x]]));

    faces.extend((0..last_x).map(|x| [b00, y_min[x + 1], y_min[x]]));
    faces.push([bn0, x_max[0], b00]);
    faces.extend((0..last_y).map(|y| [b00, x_min[y], x_min[y + 1]]));
    faces.push([b0n, b00, x_min[last_y]]);
    faces.extend((0..last_x).map(|x| [bnn, y_max[x], y_max[x + 1]]));
    faces.push([bnn, b0n, x_min[last_y]]);
    faces.extend((0..last_y).map(|y| [bnn, x_max[y + 1], x_max[y]]));
    faces.push([bnn, x_max[0], bn0]);

    faces.push([b00, b0n, bn0]);
    faces.push([bnn, bn0, b0n]);

    if layout.is_strip() {
        let before = faces.len();
        let mut seen = HashSet::new();
        faces.retain(|f| {
            let distinct = f[0] != f[1] && f[1] != f[2] && f[0] != f[2];
            let mut key = *f;
            key.sort_unstable();
            distinct && seen.insert(key)
        });
        debug!(dropped = before - faces.len(), "dropped degenerate strip faces");
    }
    Ok(faces)
}

fn skirt_indices(
    layout: &GridLayout,
    positions: impl Iterator<Item = (usize, usize)>,
) -> Result<Vec<usize>> {
    positions
        .map(|(x, y)| {
            layout.skirt_index(x, y).ok_or_else(|| {
                Error::GeometryInvariant(format!("({x}, {y}) is not on the grid perimeter"))
            })
        })
        .collect()
}
