//! The exact reference KDE (spec section 4.C.4): direct `O(n)` evaluation
//! per query, used both as a correctness oracle for [`super::CknsKde`] and
//! directly for small `n`.

use crate::error::{Result, SpectralError};
use rayon::prelude::*;

/// Stores all `n` data points and evaluates the Gaussian kernel sum exactly.
pub struct ExactGaussianKde {
    points: Vec<Vec<f64>>,
    dim: usize,
    a: f64,
}

impl ExactGaussianKde {
    pub fn new(points: Vec<Vec<f64>>, a: f64) -> Result<Self> {
        if points.is_empty() {
            return Err(SpectralError::invalid_argument(
                "ExactGaussianKde requires at least one point",
            ));
        }
        let dim = points[0].len();
        if points.iter().any(|p| p.len() != dim) {
            return Err(SpectralError::invalid_argument(
                "all points must share the same dimension",
            ));
        }
        Ok(Self { points, dim, a })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn n(&self) -> usize {
        self.points.len()
    }

    /// `F(q) = (1/n) Σᵢ exp(−a · ‖q − xᵢ‖²)`.
    pub fn query(&self, q: &[f64]) -> Result<f64> {
        if q.len() != self.dim {
            return Err(SpectralError::invalid_argument(format!(
                "query has dimension {}, expected {}",
                q.len(),
                self.dim
            )));
        }
        let sum: f64 = self
            .points
            .iter()
            .map(|p| (-self.a * squared_distance(q, p)).exp())
            .sum();
        Ok(sum / self.points.len() as f64)
    }

    /// Evaluates [`ExactGaussianKde::query`] over every point in `queries`.
    ///
    /// Partitions the batch into roughly equal chunks across worker threads
    /// once `queries.len()` exceeds the available hardware concurrency;
    /// below that threshold the batch runs on the caller's thread, matching
    /// spec section 4.C.4's dispatch rule. A single malformed query fails
    /// the whole batch (spec section 7's "a batched query is atomic").
    pub fn query_batch(&self, queries: &[Vec<f64>]) -> Result<Vec<f64>> {
        let concurrency = rayon::current_num_threads();
        if queries.len() <= concurrency {
            return queries.iter().map(|q| self.query(q)).collect();
        }
        queries.par_iter().map(|q| self.query(q)).collect()
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_distance_contributes_exactly_one() {
        let kde = ExactGaussianKde::new(vec![vec![0.0, 0.0]], 1.0).unwrap();
        let v = kde.query(&[0.0, 0.0]).unwrap();
        assert!((v - 1.0).abs() < 1e-12);
    }

    #[test]
    fn farther_points_contribute_less() {
        let kde = ExactGaussianKde::new(vec![vec![0.0], vec![100.0]], 1.0).unwrap();
        let near = kde.query(&[0.0]).unwrap();
        let far = kde.query(&[50.0]).unwrap();
        assert!(near > far);
    }

    #[test]
    fn dimension_mismatch_is_invalid_argument() {
        let kde = ExactGaussianKde::new(vec![vec![0.0, 0.0]], 1.0).unwrap();
        assert!(kde.query(&[0.0]).is_err());
    }

    #[test]
    fn batch_matches_sequential() {
        let kde = ExactGaussianKde::new(vec![vec![0.0], vec![1.0], vec![2.0]], 0.5).unwrap();
        let queries: Vec<Vec<f64>> = (0..16).map(|i| vec![i as f64 * 0.1]).collect();
        let batch = kde.query_batch(&queries).unwrap();
        let sequential: Vec<f64> = queries.iter().map(|q| kde.query(q).unwrap()).collect();
        for (a, b) in batch.iter().zip(sequential.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
