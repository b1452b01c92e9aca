//! Eps search for the density primitive.
//!
//! DBSCAN's eps is hard to pick up front and the right value depends on the
//! corpus. The search runs the primitive over the caller's eps candidates,
//! scores each partition, zooms in around the best candidate, and keeps every
//! cluster produced by a positively-scoring run. Redundant clusters from
//! neighbouring eps values are merged at the end.

use std::collections::HashSet;

use tracing::{debug, info};

use super::dbscan::{clusters_from_labels, Cluster, Dbscan};
use super::merge::{merge_redundant, REDUNDANT_CUTOFF};
use super::traits::Clustering;
use crate::error::{Error, Result};
use crate::matrix::SquareMatrix;

/// Quality of a partition of `n` documents.
///
/// ```text
/// coverage = Σ sizes / n
/// gravity  = ln(Σ sizes / max size)
/// avg_size = (Σ sizes − max size) / k
/// score    = coverage · √(gravity · avg_size) · k
/// ```
///
/// Favors partitions that cover many documents with several evenly sized
/// clusters: `[20, 14, 18, 21, 8]` scores well, `[300]`, `[298, 2]` and a
/// scatter of pairs do not. No clusters (or `n == 0`) scores 0.
pub fn score_clusters(clusters: &[Cluster], n: usize) -> f64 {
    let sizes: Vec<usize> = clusters.iter().map(Cluster::len).collect();
    score_sizes(&sizes, n)
}

/// [`score_clusters`] on cluster sizes alone.
pub fn score_sizes(sizes: &[usize], n: usize) -> f64 {
    let total: usize = sizes.iter().sum();
    let Some(&largest) = sizes.iter().max() else {
        return 0.0;
    };
    if n == 0 || largest == 0 {
        return 0.0;
    }
    let k = sizes.len() as f64;
    let total_f = total as f64;
    let largest_f = largest as f64;

    let coverage = total_f / n as f64;
    let gravity = (total_f / largest_f).ln();
    let avg_size = (total_f - largest_f) / k;

    coverage * (gravity * avg_size).sqrt() * k
}

/// One run of the density primitive.
#[derive(Debug, Clone)]
pub struct SweepRun {
    /// Neighborhood radius used.
    pub eps: f64,
    /// Clusters found, noise excluded.
    pub clusters: Vec<Cluster>,
    /// Partition quality from [`score_clusters`].
    pub score: f64,
}

/// Result of a [`ClusterSearch`].
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Every run that produced at least one cluster, coarse sweep first.
    pub runs: Vec<SweepRun>,
    /// Eps of the best coarse run, if any run produced clusters.
    pub best_eps: Option<f64>,
    /// Final clusters after aggregation and merging.
    pub clusters: Vec<Cluster>,
}

/// Multi-eps density clustering with refinement and merging.
#[derive(Debug, Clone)]
pub struct ClusterSearch {
    min_samples: usize,
    refine_radius: f64,
    refine_step: f64,
    redundant_cutoff: f64,
}

impl Default for ClusterSearch {
    fn default() -> Self {
        Self {
            min_samples: 3,
            refine_radius: 0.1,
            refine_step: 0.025,
            redundant_cutoff: REDUNDANT_CUTOFF,
        }
    }
}

impl ClusterSearch {
    /// Create a search with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum neighbourhood size passed to the primitive.
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    /// Set the refinement window `[best − radius, best + radius)` and its step.
    pub fn with_refinement(mut self, radius: f64, step: f64) -> Self {
        self.refine_radius = radius;
        self.refine_step = step;
        self
    }

    /// Set the Jaccard cutoff used to merge redundant clusters.
    pub fn with_redundant_cutoff(mut self, cutoff: f64) -> Self {
        self.redundant_cutoff = cutoff;
        self
    }

    /// Run the search with DBSCAN as the density primitive.
    pub fn run(&self, distances: &SquareMatrix, eps: &[f64]) -> Result<SearchOutcome> {
        self.run_with(distances, eps, |e, min_samples| Dbscan::new(e, min_samples))
    }

    /// Run the search with a caller-supplied primitive built per eps.
    pub fn run_with<C, F>(
        &self,
        distances: &SquareMatrix,
        eps: &[f64],
        make: F,
    ) -> Result<SearchOutcome>
    where
        C: Clustering,
        F: Fn(f64, usize) -> C,
    {
        if distances.is_empty() || eps.is_empty() {
            return Err(Error::EmptyInput);
        }
        if eps.iter().any(|e| !(*e > 0.0 && e.is_finite())) {
            return Err(Error::InvalidParameter {
                name: "eps",
                message: "must be positive and finite",
            });
        }
        if !(self.refine_step > 0.0 && self.refine_step.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "refine_step",
                message: "must be positive and finite",
            });
        }

        let n = distances.len();
        let mut runs = Vec::new();

        for &e in eps {
            if let Some(run) = self.run_once(distances, e, n, &make)? {
                runs.push(run);
            }
        }

        // First maximum wins, in sweep order.
        let best_eps = runs
            .iter()
            .fold(None::<&SweepRun>, |best, r| match best {
                Some(b) if b.score >= r.score => Some(b),
                _ => Some(r),
            })
            .map(|r| r.eps);

        let Some(best) = best_eps else {
            info!(eps = eps.len(), "no eps produced clusters");
            return Ok(SearchOutcome::default());
        };
        debug!(best_eps = best, "refining around best eps");

        for e in refinement_window(best, self.refine_radius, self.refine_step) {
            if let Some(run) = self.run_once(distances, e, n, &make)? {
                runs.push(run);
            }
        }

        let mut aggregated: Vec<Cluster> = Vec::new();
        let mut seen: HashSet<Cluster> = HashSet::new();
        for run in runs.iter().filter(|r| r.score > 0.0) {
            for c in &run.clusters {
                if seen.insert(c.clone()) {
                    aggregated.push(c.clone());
                }
            }
        }

        let clusters = merge_redundant(aggregated, self.redundant_cutoff);
        info!(
            runs = runs.len(),
            best_eps = best,
            clusters = clusters.len(),
            "cluster search finished"
        );

        Ok(SearchOutcome {
            runs,
            best_eps,
            clusters,
        })
    }

    fn run_once<C, F>(
        &self,
        distances: &SquareMatrix,
        eps: f64,
        n: usize,
        make: &F,
    ) -> Result<Option<SweepRun>>
    where
        C: Clustering,
        F: Fn(f64, usize) -> C,
    {
        let labels = make(eps, self.min_samples).fit_predict(distances)?;
        let clusters = clusters_from_labels(&labels);
        if clusters.is_empty() {
            debug!(eps, "no clusters");
            return Ok(None);
        }
        let score = score_clusters(&clusters, n);
        debug!(eps, clusters = clusters.len(), score, "sweep run");
        Ok(Some(SweepRun {
            eps,
            clusters,
            score,
        }))
    }
}

/// Eps values `best − radius + k·step` below `best + radius`, positive only.
fn refinement_window(best: f64, radius: f64, step: f64) -> Vec<f64> {
    let start = best - radius;
    // Tolerance keeps `2r / step` from gaining a step to rounding.
    let count = ((2.0 * radius) / step - 1e-9).ceil().max(0.0) as usize;
    (0..count)
        .map(|k| start + k as f64 * step)
        .filter(|e| *e > 0.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized(sizes: &[usize]) -> Vec<Cluster> {
        let mut next = 0;
        sizes
            .iter()
            .map(|&s| {
                let c: Cluster = (next..next + s).collect();
                next += s;
                c
            })
            .collect()
    }

    /// Distance matrix with tight groups (distance 0.1 inside, 50 across).
    fn groups(sizes: &[usize]) -> SquareMatrix {
        let spec: Vec<(usize, f64)> = sizes.iter().map(|&s| (s, 0.1)).collect();
        groups_with(&spec)
    }

    /// Groups of `(size, inner distance)`, 50 across groups.
    fn groups_with(spec: &[(usize, f64)]) -> SquareMatrix {
        let group_of: Vec<usize> = spec
            .iter()
            .enumerate()
            .flat_map(|(g, &(s, _))| std::iter::repeat(g).take(s))
            .collect();
        let n = group_of.len();
        let mut m = SquareMatrix::zeros(n);
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let d = if group_of[i] == group_of[j] {
                        spec[group_of[i]].1
                    } else {
                        50.0
                    };
                    m.set(i, j, d);
                }
            }
        }
        m
    }

    #[test]
    fn balanced_partitions_score_highest() {
        let good = score_sizes(&[20, 14, 18, 21, 8], 81);
        assert!(good > score_sizes(&[298, 2], 300));
        assert!(good > score_sizes(&[300], 300));
        assert!(good > score_sizes(&[2; 17], 300));
        assert_eq!(score_sizes(&[300], 300), 0.0);
    }

    #[test]
    fn score_is_order_invariant() {
        let a = score_sizes(&[20, 14, 18, 21, 8], 81);
        let b = score_sizes(&[8, 21, 18, 14, 20], 81);
        assert!((a - b).abs() < 1e-12);
        assert!((score_clusters(&sized(&[3, 5]), 10) - score_sizes(&[5, 3], 10)).abs() < 1e-12);
    }

    #[test]
    fn empty_partition_scores_zero() {
        assert_eq!(score_sizes(&[], 10), 0.0);
        assert_eq!(score_sizes(&[3], 0), 0.0);
    }

    #[test]
    fn refinement_window_matches_step_grid() {
        let w = refinement_window(0.5, 0.1, 0.025);
        assert_eq!(w.len(), 8);
        assert!((w[0] - 0.4).abs() < 1e-12);
        assert!((w[7] - 0.575).abs() < 1e-12);
        // Non-positive values are dropped.
        let w = refinement_window(0.06, 0.1, 0.025);
        assert!(w.iter().all(|e| *e > 0.0));
        assert_eq!(w.len(), 6);
    }

    #[test]
    fn finds_separated_groups() {
        let d = groups(&[4, 5, 3]);
        let outcome = ClusterSearch::new().run(&d, &[0.05, 0.5, 1.0]).unwrap();
        assert_eq!(outcome.best_eps, Some(0.5));
        let expected: Vec<Cluster> = vec![(4..9).collect(), (0..4).collect(), (9..12).collect()];
        assert_eq!(outcome.clusters, expected);
    }

    #[test]
    fn refinement_finds_clusters_the_coarse_sweep_missed() {
        // At eps 0.15 only the tight group forms, a single cluster scoring 0.
        let d = groups_with(&[(3, 0.1), (3, 0.18)]);

        let coarse_only = ClusterSearch::new()
            .with_refinement(0.0, 0.025)
            .run(&d, &[0.15])
            .unwrap();
        assert_eq!(coarse_only.runs.len(), 1);
        assert_eq!(coarse_only.runs[0].score, 0.0);
        assert!(coarse_only.clusters.is_empty());

        let outcome = ClusterSearch::new().run(&d, &[0.15]).unwrap();
        assert_eq!(outcome.best_eps, Some(0.15));
        assert!(outcome.runs.len() > 1);
        assert!(outcome
            .runs
            .iter()
            .any(|r| r.eps > 0.2 && r.score > 0.0 && r.clusters.len() == 2));
        let expected: Vec<Cluster> = vec![(0..3).collect(), (3..6).collect()];
        assert_eq!(outcome.clusters, expected);
    }

    #[test]
    fn no_clusters_is_an_empty_result() {
        let d = groups(&[1, 1, 1, 1]);
        let outcome = ClusterSearch::new().run(&d, &[0.5, 1.0]).unwrap();
        assert!(outcome.clusters.is_empty());
        assert!(outcome.runs.is_empty());
        assert_eq!(outcome.best_eps, None);
    }

    #[test]
    fn single_cluster_scores_zero_and_is_dropped() {
        let d = groups(&[6]);
        let outcome = ClusterSearch::new().run(&d, &[0.5]).unwrap();
        assert!(!outcome.runs.is_empty());
        assert!(outcome.runs.iter().all(|r| r.score == 0.0));
        assert!(outcome.clusters.is_empty());
    }

    #[test]
    fn rejects_bad_eps() {
        let d = groups(&[3, 3]);
        assert!(ClusterSearch::new().run(&d, &[]).is_err());
        assert!(ClusterSearch::new().run(&d, &[0.5, -0.1]).is_err());
        assert!(ClusterSearch::new().run(&d, &[f64::INFINITY]).is_err());
    }
}
