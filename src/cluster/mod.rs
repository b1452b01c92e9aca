//! Density clustering over document distances.
//!
//! ## Pipeline
//!
//! 1. [`distance_matrix`] turns document similarities into distances
//!    (`1/s − 1`, zero similarities floored so distances stay finite).
//! 2. [`ClusterSearch`] runs [`Dbscan`] over a sweep of eps values, scores
//!    each partition with [`score_clusters`], refines around the best eps and
//!    aggregates the clusters of every positively-scoring run.
//! 3. [`merge_redundant`] unions clusters whose Jaccard index reaches a cutoff.
//!
//! ## Usage
//!
//! ```rust
//! use semsim::cluster::{distance_matrix, ClusterSearch};
//! use semsim::SquareMatrix;
//!
//! // Two groups of three near-identical documents.
//! let mut sim = SquareMatrix::zeros(6);
//! for i in 0..6 {
//!     for j in 0..6 {
//!         let same = (i < 3) == (j < 3);
//!         sim.set(i, j, if i == j { 1.0 } else if same { 0.9 } else { 0.0 });
//!     }
//! }
//!
//! let dist = distance_matrix(&sim, 1e-6);
//! let outcome = ClusterSearch::new().run(&dist, &[0.2, 0.5, 1.0]).unwrap();
//! assert_eq!(outcome.clusters.len(), 2);
//! ```

mod dbscan;
mod distance;
mod merge;
mod search;
mod traits;

pub use dbscan::{clusters_from_labels, Cluster, Dbscan};
pub use distance::{distance_matrix, mean_nearest_distance, ZERO_SIMILARITY_EPSILON};
pub use merge::{jaccard, merge_redundant, REDUNDANT_CUTOFF};
pub use search::{score_clusters, score_sizes, ClusterSearch, SearchOutcome, SweepRun};
pub use traits::Clustering;
