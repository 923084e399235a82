//! Simplification and weld parameters for the mesh engine

use crate::ReliefMesh;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tactilecrate_core::MeshGeometry;
use tracing::debug;

/// Share of the smallest gap between height levels the weld may reach.
pub const Z_GAP_MARGIN: f64 = 0.99;

/// Scalars handed to the mesh engine with the geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshHeuristics {
    pub decimate_ratio: f64,
    pub weld_threshold: f64,
}

impl MeshHeuristics {
    pub fn compute(mesh: &ReliefMesh, merge_radius: f64) -> Self {
        let step = mesh.layout.step_size(&mesh.dimensions);
        let heuristics = Self {
            decimate_ratio: decimate_ratio(mesh.geometry.vertex_count()),
            weld_threshold: weld_threshold(&mesh.geometry, merge_radius, step),
        };
        debug!(
            decimate_ratio = heuristics.decimate_ratio,
            weld_threshold = heuristics.weld_threshold,
            "mesh heuristics"
        );
        heuristics
    }
}

/// `4 * sqrt(n) / n`: on a square grid this keeps about the perimeter's
/// worth of vertices. Clamped to `(0, 1]`.
pub fn decimate_ratio(vertex_count: usize) -> f64 {
    if vertex_count == 0 {
        return 1.0;
    }
    let n = vertex_count as f64;
    (4.0 * n.sqrt() / n).clamp(f64::MIN_POSITIVE, 1.0)
}

/// Smallest difference between consecutive distinct z values, `None` with
/// fewer than two levels.
pub fn min_z_gap(mesh: &MeshGeometry) -> Option<f64> {
    mesh.z_levels()
        .into_iter()
        .tuple_windows()
        .map(|(a, b)| b - a)
        .min_by(f64::total_cmp)
}

/// `min(1.5 * merge_radius * step, 0.99 * min z gap)`.
///
/// The 1.5 factor reaches diagonal neighbours. The cap keeps vertices of
/// different height planes apart.
pub fn weld_threshold(mesh: &MeshGeometry, merge_radius: f64, step: f64) -> f64 {
    let desired = 1.5 * merge_radius * step;
    match min_z_gap(mesh) {
        Some(gap) => desired.min(Z_GAP_MARGIN * gap),
        None => desired,
    }
}
