//! DBSCAN: Density-Based Spatial Clustering of Applications with Noise.
//!
//! # The Algorithm (Ester et al., 1996)
//!
//! DBSCAN groups points by neighborhood density. It discovers the number of
//! clusters itself and leaves sparse points unassigned as noise.
//!
//! ## Core Concepts
//!
//! - **Epsilon (ε)**: Maximum distance between two points to be neighbors.
//! - **MinPts**: Minimum neighbors within ε (the point itself included) for a
//!   point to be "core".
//! - **Core point**: Has at least MinPts neighbors within ε.
//! - **Border point**: Within ε of a core point but not core itself.
//! - **Noise point**: Neither core nor border.
//!
//! Here the input is a precomputed distance matrix, so any dissimilarity
//! works, including the inverted document similarities of this crate.
//!
//! ## Complexity
//!
//! - **Time**: O(n²) region queries over the matrix.
//! - **Space**: O(n) for labels.
//!
//! ## References
//!
//! Ester et al. (1996). "A Density-Based Algorithm for Discovering Clusters
//! in Large Spatial Databases with Noise." KDD-96.

use std::collections::BTreeSet;

use super::traits::Clustering;
use crate::error::{Error, Result};
use crate::matrix::SquareMatrix;

/// A cluster: the set of member point (document) indices.
pub type Cluster = BTreeSet<usize>;

/// DBSCAN clustering over precomputed distances.
#[derive(Debug, Clone)]
pub struct Dbscan {
    /// Epsilon: maximum distance for neighborhood.
    epsilon: f64,
    /// Minimum points for core point classification.
    min_pts: usize,
}

// Internal label encoding.
// - UNCLASSIFIED: never assigned yet
// - NOISE_LABEL: visited, but not density-reachable from any core point (may be promoted later)
const UNCLASSIFIED: i32 = -2;
const NOISE_LABEL: i32 = -1;

impl Dbscan {
    /// Create a new DBSCAN clusterer.
    ///
    /// # Arguments
    ///
    /// * `epsilon` - Maximum distance between two points to be neighbors.
    /// * `min_pts` - Minimum number of points (self included) to form a dense region.
    pub fn new(epsilon: f64, min_pts: usize) -> Self {
        Self { epsilon, min_pts }
    }

    /// Set epsilon (neighborhood radius).
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set minimum points for core classification.
    pub fn with_min_pts(mut self, min_pts: usize) -> Self {
        self.min_pts = min_pts;
        self
    }

    /// Neighborhood radius.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Find all neighbors within epsilon.
    fn region_query(&self, distances: &SquareMatrix, point_idx: usize) -> Vec<usize> {
        distances
            .row(point_idx)
            .iter()
            .enumerate()
            .filter(|&(idx, &d)| idx != point_idx && d <= self.epsilon)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Expand cluster from a core point.
    fn expand_cluster(
        &self,
        distances: &SquareMatrix,
        point_idx: usize,
        neighbors: &[usize],
        labels: &mut [i32],
        cluster_id: i32,
        visited: &mut [bool],
    ) {
        labels[point_idx] = cluster_id;

        let mut to_process: Vec<usize> = neighbors.to_vec();

        while let Some(neighbor_idx) = to_process.pop() {
            // A point previously labeled noise can still become a border point,
            // so the label is assigned before the `visited` check.
            if labels[neighbor_idx] == UNCLASSIFIED || labels[neighbor_idx] == NOISE_LABEL {
                labels[neighbor_idx] = cluster_id;
            }

            if visited[neighbor_idx] {
                continue;
            }
            visited[neighbor_idx] = true;

            let neighbor_neighbors = self.region_query(distances, neighbor_idx);

            // MinPts includes the point itself
            if neighbor_neighbors.len() + 1 >= self.min_pts {
                for nn in neighbor_neighbors {
                    if !visited[nn] {
                        to_process.push(nn);
                    }
                }
            }
        }
    }

    fn validate(&self, distances: &SquareMatrix) -> Result<()> {
        if distances.is_empty() {
            return Err(Error::EmptyInput);
        }

        if !(self.epsilon > 0.0 && self.epsilon.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "epsilon",
                message: "must be positive and finite",
            });
        }

        if self.min_pts == 0 {
            return Err(Error::InvalidParameter {
                name: "min_pts",
                message: "must be at least 1",
            });
        }
        Ok(())
    }
}

impl Default for Dbscan {
    fn default() -> Self {
        Self::new(0.5, 3)
    }
}

impl Clustering for Dbscan {
    fn fit_predict(&self, distances: &SquareMatrix) -> Result<Vec<Option<usize>>> {
        self.validate(distances)?;
        let n = distances.len();

        let mut labels = vec![UNCLASSIFIED; n];
        let mut visited = vec![false; n];
        let mut cluster_id: i32 = 0;

        for point_idx in 0..n {
            if visited[point_idx] {
                continue;
            }
            visited[point_idx] = true;

            let neighbors = self.region_query(distances, point_idx);

            if neighbors.len() + 1 < self.min_pts {
                // Not enough neighbors: mark as noise (might be border later)
                labels[point_idx] = NOISE_LABEL;
                continue;
            }

            self.expand_cluster(
                distances,
                point_idx,
                &neighbors,
                &mut labels,
                cluster_id,
                &mut visited,
            );
            cluster_id += 1;
        }

        Ok(labels
            .into_iter()
            .map(|l| if l >= 0 { Some(l as usize) } else { None })
            .collect())
    }
}

/// Group point indices by label, dropping noise. Clusters come out in label order.
pub fn clusters_from_labels(labels: &[Option<usize>]) -> Vec<Cluster> {
    let n_clusters = labels.iter().flatten().max().map_or(0, |&m| m + 1);
    let mut clusters = vec![Cluster::new(); n_clusters];
    for (idx, label) in labels.iter().enumerate() {
        if let Some(l) = label {
            clusters[*l].insert(idx);
        }
    }
    clusters.retain(|c| !c.is_empty());
    clusters
}

#[cfg(test)]
#[allow(clippy::needless_range_loop)]
mod tests {
    use super::*;

    /// Euclidean distances of 1-D points.
    fn line(points: &[f64]) -> SquareMatrix {
        let rows: Vec<Vec<f64>> = points
            .iter()
            .map(|a| points.iter().map(|b| (a - b).abs()).collect())
            .collect();
        SquareMatrix::from_rows(&rows).unwrap()
    }

    #[test]
    fn test_dbscan_two_clusters() {
        let d = line(&[0.0, 0.1, 0.2, 0.15, 0.05, 5.0, 5.1, 5.2, 5.15, 5.05]);
        let labels = Dbscan::new(0.3, 3).fit_predict(&d).unwrap();

        assert_eq!(labels.len(), 10);
        let cluster1 = labels[0];
        assert!(cluster1.is_some());
        for label in &labels[1..5] {
            assert_eq!(*label, cluster1);
        }
        let cluster2 = labels[5];
        for label in &labels[6..10] {
            assert_eq!(*label, cluster2);
        }
        assert_ne!(cluster1, cluster2);
    }

    #[test]
    fn test_dbscan_with_noise() {
        let d = line(&[0.0, 0.1, 0.2, 0.15, 100.0, 5.0, 5.1, 5.2, 5.15]);
        let labels = Dbscan::new(0.3, 3).fit_predict(&d).unwrap();

        assert!(labels[4].is_none());
        for (i, label) in labels.iter().enumerate() {
            if i != 4 {
                assert!(label.is_some());
            }
        }
    }

    #[test]
    fn test_dbscan_all_noise() {
        let d = line(&[0.0, 10.0, 20.0, 30.0]);
        let labels = Dbscan::new(0.5, 3).fit_predict(&d).unwrap();
        assert!(labels.iter().all(Option::is_none));
        assert!(clusters_from_labels(&labels).is_empty());
    }

    #[test]
    fn test_dbscan_empty() {
        let d = SquareMatrix::zeros(0);
        assert!(matches!(
            Dbscan::new(0.5, 3).fit_predict(&d),
            Err(Error::EmptyInput)
        ));
    }

    #[test]
    fn test_dbscan_invalid_params() {
        let d = line(&[0.0]);
        assert!(Dbscan::new(0.0, 3).fit_predict(&d).is_err());
        assert!(Dbscan::new(-1.0, 3).fit_predict(&d).is_err());
        assert!(Dbscan::new(f64::NAN, 3).fit_predict(&d).is_err());
        assert!(Dbscan::new(0.5, 0).fit_predict(&d).is_err());
    }

    #[test]
    fn test_dbscan_chain() {
        // Chain of points - DBSCAN should connect them
        let points: Vec<f64> = (0..10).map(|i| i as f64 * 0.3).collect();
        let labels = Dbscan::new(0.5, 2).fit_predict(&line(&points)).unwrap();
        let cluster = labels[0];
        assert!(cluster.is_some());
        for label in labels {
            assert_eq!(label, cluster);
        }
    }

    #[test]
    fn test_min_pts_counts_the_point_itself() {
        // Three points within eps of each other: core with min_pts = 3.
        let d = line(&[0.0, 0.1, 0.2]);
        let labels = Dbscan::new(0.25, 3).fit_predict(&d).unwrap();
        assert!(labels.iter().all(|l| *l == Some(0)));
        let labels = Dbscan::new(0.25, 4).fit_predict(&d).unwrap();
        assert!(labels.iter().all(Option::is_none));
    }

    #[test]
    fn test_builders_override_defaults() {
        let d = line(&[0.0, 0.4, 0.8]);
        let base = Dbscan::default();
        assert_eq!(base.epsilon(), 0.5);
        assert!(base.fit_predict(&d).unwrap().iter().all(|l| *l == Some(0)));

        let tight = base.clone().with_epsilon(0.3);
        assert_eq!(tight.epsilon(), 0.3);
        assert!(tight.fit_predict(&d).unwrap().iter().all(Option::is_none));

        let strict = tight.with_epsilon(0.5).with_min_pts(4);
        assert!(strict.fit_predict(&d).unwrap().iter().all(Option::is_none));
    }

    #[test]
    fn test_clusters_from_labels() {
        let labels = vec![Some(1), None, Some(0), Some(1), Some(0)];
        let clusters = clusters_from_labels(&labels);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0], Cluster::from([2, 4]));
        assert_eq!(clusters[1], Cluster::from([0, 3]));
    }
}
