use crate::error::Result;
use crate::matrix::SquareMatrix;

/// Common interface for density clustering over precomputed distances.
pub trait Clustering {
    /// Return one label per point; `None` marks noise.
    ///
    /// `distances` is a symmetric matrix of pairwise distances.
    fn fit_predict(&self, distances: &SquareMatrix) -> Result<Vec<Option<usize>>>;
}
