//! Similarity to distance conversion.

use crate::matrix::SquareMatrix;

/// Default floor for zero similarities before inversion.
pub const ZERO_SIMILARITY_EPSILON: f64 = 1e-6;

/// Convert similarities in `[0, 1]` to distances `1/s − 1`.
///
/// Zero similarities are raised to `epsilon` first, so the largest distance is
/// `1/epsilon − 1` instead of infinity. A similarity of 1 maps to distance 0.
pub fn distance_matrix(similarity: &SquareMatrix, epsilon: f64) -> SquareMatrix {
    similarity.map(|s| {
        let s = if s == 0.0 { epsilon } else { s };
        (1.0 / s - 1.0).max(0.0)
    })
}

/// Mean over rows of the smallest non-zero distance.
///
/// `None` when some row has no non-zero entry (e.g. all documents identical)
/// or the matrix is empty.
pub fn mean_nearest_distance(distances: &SquareMatrix) -> Option<f64> {
    if distances.is_empty() {
        return None;
    }
    let mut total = 0.0;
    for row in distances.rows() {
        let nearest = row
            .iter()
            .copied()
            .filter(|&d| d != 0.0)
            .min_by(f64::total_cmp)?;
        total += nearest;
    }
    Some(total / distances.len() as f64)
}
