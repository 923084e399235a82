//! Ward hierarchical clustering over weighted color samples
//!
//! Merges are found with the nearest-neighbour-chain algorithm, which is exact
//! for Ward's linkage because the linkage is reducible. Distances use the
//! centroid form of Ward's criterion,
//!
//! `d(A, B) = sqrt(2 |A| |B| / (|A| + |B|)) * |cA - cB|`,
//!
//! which matches the Lance-Williams update used by classic implementations and
//! reduces to the Euclidean distance for two single points. A sample entry of
//! weight `w` behaves exactly like `w` identical points merged at height 0.

use crate::Clusterer;
use std::collections::HashMap;
use tactilecrate_core::{ClusterLabel, Color, Error, Result};

/// Distinct colors with replication weights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedSample {
    colors: Vec<Color>,
    weights: Vec<usize>,
}

impl WeightedSample {
    pub fn new(colors: Vec<Color>, weights: Vec<usize>) -> Result<Self> {
        if colors.len() != weights.len() {
            return Err(Error::InvalidData(format!(
                "{} colors but {} weights",
                colors.len(),
                weights.len()
            )));
        }
        if weights.contains(&0) {
            return Err(Error::InvalidData("sample weights must be positive".to_string()));
        }
        Ok(Self { colors, weights })
    }

    /// Build the prevalence-weighted sample from distinct colors and their
    /// pixel counts. Every color appears once, then `max(1, floor(scale * count / total))`
    /// more times.
    pub fn from_counts(counts: &[(Color, u64)], total_pixels: u64, scale: usize) -> Self {
        let total = total_pixels.max(1);
        let (colors, weights) = counts
            .iter()
            .map(|&(color, count)| {
                let copies = (scale as u64 * count / total).max(1) as usize;
                (color, 1 + copies)
            })
            .unzip();
        Self { colors, weights }
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn weights(&self) -> &[usize] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn total_weight(&self) -> usize {
        self.weights.iter().sum()
    }

    /// The literal replicated sample: every color once, in order, followed by
    /// the extra copies of each color in the same order.
    pub fn expand(&self) -> Vec<Color> {
        let mut expanded = self.colors.clone();
        for (&color, &weight) in self.colors.iter().zip(&self.weights) {
            expanded.extend(std::iter::repeat(color).take(weight - 1));
        }
        expanded
    }
}

/// One step of the dendrogram. `left` and `right` are the smallest sample
/// indices of the two merged clusters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    pub left: usize,
    pub right: usize,
    pub height: f64,
    pub size: usize,
}

/// Ward linkage cut at a fixed height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WardClusterer {
    cut_distance: f64,
}

#[derive(Debug, Clone, Copy)]
struct Node {
    centroid: [f64; 3],
    size: usize,
    element: usize,
}

impl Node {
    /// Squared Ward distance
    fn ward_squared(&self, other: &Node) -> f64 {
        let d2: f64 = (0..3)
            .map(|i| {
                let d = self.centroid[i] - other.centroid[i];
                d * d
            })
            .sum();
        let (wa, wb) = (self.size as f64, other.size as f64);
        2.0 * wa * wb / (wa + wb) * d2
    }

    fn merge(&self, other: &Node) -> Node {
        let size = self.size + other.size;
        let (wa, wb) = (self.size as f64, other.size as f64);
        let mut centroid = [0.0; 3];
        for (i, c) in centroid.iter_mut().enumerate() {
            *c = (self.centroid[i] * wa + other.centroid[i] * wb) / (wa + wb);
        }
        Node {
            centroid,
            size,
            element: self.element.min(other.element),
        }
    }
}

impl WardClusterer {
    pub fn new(cut_distance: f64) -> Self {
        Self { cut_distance }
    }

    pub fn cut_distance(&self) -> f64 {
        self.cut_distance
    }

    /// All `n - 1` merges, sorted by height (ties keep discovery order).
    pub fn dendrogram(&self, sample: &WeightedSample) -> Vec<Merge> {
        let mut nodes: Vec<Option<Node>> = sample
            .colors()
            .iter()
            .zip(sample.weights())
            .enumerate()
            .map(|(element, (color, &size))| {
                Some(Node {
                    centroid: color.to_f64(),
                    size,
                    element,
                })
            })
            .collect();

        let mut merges = Vec::with_capacity(nodes.len().saturating_sub(1));
        let mut chain: Vec<usize> = Vec::new();
        let mut active = nodes.len();

        while active > 1 {
            if chain.is_empty() {
                match nodes.iter().position(Option::is_some) {
                    Some(first) => chain.push(first),
                    None => break,
                }
            }

            // Grow the chain until its last two entries are reciprocal nearest
            // neighbours. On equal distances the previous chain entry wins,
            // then the lowest slot.
            loop {
                let tip = chain[chain.len() - 1];
                let previous = chain.len().checked_sub(2).map(|i| chain[i]);
                let Some(tip_node) = nodes[tip] else { break };

                let mut best: Option<(usize, f64)> = previous
                    .and_then(|p| nodes[p].map(|node| (p, tip_node.ward_squared(&node))));
                for (slot, node) in nodes.iter().enumerate() {
                    let Some(node) = node else { continue };
                    if slot == tip {
                        continue;
                    }
                    let d = tip_node.ward_squared(node);
                    if best.map_or(true, |(_, best_d)| d < best_d) {
                        best = Some((slot, d));
                    }
                }

                match best {
                    Some((nearest, _)) if Some(nearest) != previous => chain.push(nearest),
                    _ => break,
                }
            }

            if chain.len() < 2 {
                break;
            }
            let b = chain[chain.len() - 1];
            let a = chain[chain.len() - 2];
            chain.truncate(chain.len() - 2);

            let (Some(node_a), Some(node_b)) = (nodes[a].take(), nodes[b].take()) else {
                break;
            };
            let merged = node_a.merge(&node_b);
            merges.push(Merge {
                left: node_a.element.min(node_b.element),
                right: node_a.element.max(node_b.element),
                height: node_a.ward_squared(&node_b).sqrt(),
                size: merged.size,
            });
            nodes[a.min(b)] = Some(merged);
            active -= 1;
        }

        merges.sort_by(|x, y| x.height.total_cmp(&y.height));
        merges
    }
}

impl Default for WardClusterer {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Clusterer for WardClusterer {
    /// Flat clusters whose cophenetic distance is at most the cut distance,
    /// labelled from 0 in order of first appearance in the sample.
    fn cluster(&self, sample: &WeightedSample) -> Result<Vec<ClusterLabel>> {
        let merges = self.dendrogram(sample);

        // Ward heights are monotone, so joining every merge under the cut
        // yields exactly the flat clusters of the cut tree.
        let mut sets = DisjointSet::new(sample.len());
        for merge in merges.iter().filter(|m| m.height <= self.cut_distance) {
            sets.union(merge.left, merge.right);
        }

        let mut ids: HashMap<usize, ClusterLabel> = HashMap::new();
        let labels = (0..sample.len())
            .map(|i| {
                let root = sets.find(i);
                let next = ids.len() as ClusterLabel;
                *ids.entry(root).or_insert(next)
            })
            .collect();
        Ok(labels)
    }
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        while self.parent[x] != root {
            let next = self.parent[x];
            self.parent[x] = root;
            x = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_sample(colors: &[Color]) -> WeightedSample {
        WeightedSample::new(colors.to_vec(), vec![1; colors.len()]).unwrap()
    }

    #[test]
    fn test_sample_weights_from_counts() {
        let counts = [(Color::new(0, 0, 0), 990), (Color::new(255, 255, 255), 10)];
        let sample = WeightedSample::from_counts(&counts, 1000, 100);
        // 990 pixels -> 99 copies, 10 pixels -> max(1, 1) copies
        assert_eq!(sample.weights(), &[100, 2]);
        assert_eq!(sample.total_weight(), 102);
    }

    #[test]
    fn test_expand_keeps_original_prefix() {
        let a = Color::new(1, 2, 3);
        let b = Color::new(4, 5, 6);
        let sample = WeightedSample::new(vec![a, b], vec![3, 2]).unwrap();
        assert_eq!(sample.expand(), vec![a, b, a, a, b]);
    }

    #[test]
    fn test_rejects_bad_samples() {
        assert!(WeightedSample::new(vec![Color::new(0, 0, 0)], vec![]).is_err());
        assert!(WeightedSample::new(vec![Color::new(0, 0, 0)], vec![0]).is_err());
    }

    #[test]
    fn test_two_points_merge_at_euclidean_distance() {
        let sample = unit_sample(&[Color::new(0, 0, 0), Color::new(3, 4, 0)]);
        let merges = WardClusterer::default().dendrogram(&sample);
        assert_eq!(merges.len(), 1);
        assert_relative_eq!(merges[0].height, 5.0, epsilon = 1e-12);
        assert_eq!(merges[0].size, 2);
    }

    #[test]
    fn test_weighted_entry_matches_replicated_points() {
        // Three copies of a and one of b: the expanded sample merges the copies
        // at height 0, then joins b at sqrt(2 * 3 * 1 / 4) * |a - b|.
        let a = Color::new(0, 0, 0);
        let b = Color::new(0, 0, 10);
        let weighted = WeightedSample::new(vec![a, b], vec![3, 1]).unwrap();
        let expanded = unit_sample(&weighted.expand());

        let clusterer = WardClusterer::default();
        let weighted_top = clusterer.dendrogram(&weighted).last().unwrap().height;
        let expanded_top = clusterer.dendrogram(&expanded).last().unwrap().height;
        assert_relative_eq!(weighted_top, expanded_top, epsilon = 1e-9);
        assert_relative_eq!(weighted_top, (1.5f64).sqrt() * 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_known_ward_heights() {
        // Points 0, 1 and 10 on one axis: {0,1} merge at 1, then the Ward
        // distance to {10} is sqrt(2*2*1/3) * 9.5.
        let sample = unit_sample(&[Color::new(0, 0, 0), Color::new(1, 0, 0), Color::new(10, 0, 0)]);
        let merges = WardClusterer::default().dendrogram(&sample);
        assert_eq!(merges.len(), 2);
        assert_relative_eq!(merges[0].height, 1.0, epsilon = 1e-12);
        assert_relative_eq!(merges[1].height, (4.0f64 / 3.0).sqrt() * 9.5, epsilon = 1e-9);
        assert_eq!((merges[0].left, merges[0].right), (0, 1));
    }

    #[test]
    fn test_cut_separates_far_groups() {
        let sample = unit_sample(&[
            Color::new(250, 0, 0),
            Color::new(0, 0, 250),
            Color::new(255, 5, 0),
            Color::new(0, 5, 255),
            Color::new(252, 2, 2),
        ]);
        let labels = WardClusterer::new(100.0).cluster(&sample).unwrap();
        assert_eq!(labels, vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn test_cut_height_is_inclusive() {
        let sample = unit_sample(&[Color::new(0, 0, 0), Color::new(3, 4, 0)]);
        assert_eq!(WardClusterer::new(5.0).cluster(&sample).unwrap(), vec![0, 0]);
        assert_eq!(WardClusterer::new(4.99).cluster(&sample).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_single_and_empty_samples() {
        let clusterer = WardClusterer::default();
        let single = unit_sample(&[Color::new(9, 9, 9)]);
        assert!(clusterer.dendrogram(&single).is_empty());
        assert_eq!(clusterer.cluster(&single).unwrap(), vec![0]);

        let empty = unit_sample(&[]);
        assert!(clusterer.cluster(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_deterministic() {
        let colors: Vec<Color> = (0..40u8)
            .map(|i| Color::new(i.wrapping_mul(37), i.wrapping_mul(11), 255 - i * 3))
            .collect();
        let sample = unit_sample(&colors);
        let clusterer = WardClusterer::new(60.0);
        assert_eq!(clusterer.cluster(&sample).unwrap(), clusterer.cluster(&sample).unwrap());
        assert_eq!(clusterer.dendrogram(&sample).len(), colors.len() - 1);
    }
}
