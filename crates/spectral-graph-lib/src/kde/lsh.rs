//! Euclidean LSH (E2LSH), the "external Euclidean LSH implementation"
//! boundary spec section 6 requires: construction with `(K, L)` parameters
//! and a point set, near-neighbor recall for a query, and a
//! `collision_probability(r)` function.
//!
//! Uses the standard p-stable-distribution hash family: each of the `K`
//! hash functions per table projects onto a random Gaussian direction and
//! quantises into a bucket of width `w`; `L` independent tables are
//! OR-combined at query time, `K` hash functions within a table are
//! AND-combined via bucket-key concatenation.

use crate::rng::RngHandle;
use nalgebra::DVector;
use rand::Rng;
use rand_distr::StandardNormal;
use std::collections::HashMap;

/// Bucket width shared by every hash function in every table this crate
/// constructs. Fixed rather than derived per radius, so
/// [`collision_probability`] is a pure function of `r` alone — the
/// parameter schedule (spec section 4.C.1) treats `p_j` as a function only
/// of the shell radius `r_j`.
pub const BUCKET_WIDTH: f64 = 4.0;

/// A single `(a, b)` hash function: `h(x) = floor((a . x + b) / w)`.
struct HashFn {
    a: DVector<f64>,
    b: f64,
}

impl HashFn {
    fn hash(&self, x: &DVector<f64>, w: f64) -> i64 {
        ((self.a.dot(x) + self.b) / w).floor() as i64
    }
}

/// An E2LSH index over a fixed point set.
pub struct EuclideanLsh {
    k: usize,
    l: usize,
    width: f64,
    tables: Vec<HashMap<Vec<i64>, Vec<usize>>>,
    functions: Vec<Vec<HashFn>>,
}

impl EuclideanLsh {
    /// Builds an index over `points` (each a `dim`-length vector) with `k`
    /// hash functions per table and `l` tables.
    pub fn build(points: &[Vec<f64>], dim: usize, k: usize, l: usize, rng: &mut RngHandle) -> Self {
        let mut functions: Vec<Vec<HashFn>> = Vec::with_capacity(l);
        let mut tables: Vec<HashMap<Vec<i64>, Vec<usize>>> = Vec::with_capacity(l);

        for _ in 0..l {
            let mut table_fns = Vec::with_capacity(k);
            for _ in 0..k {
                let a = DVector::from_iterator(dim, (0..dim).map(|_| rng.sample(StandardNormal)));
                let b: f64 = rng.gen_range(0.0..BUCKET_WIDTH);
                table_fns.push(HashFn { a, b });
            }
            let mut table: HashMap<Vec<i64>, Vec<usize>> = HashMap::new();
            for (idx, p) in points.iter().enumerate() {
                let v = DVector::from_row_slice(p);
                let key: Vec<i64> = table_fns.iter().map(|f| f.hash(&v, BUCKET_WIDTH)).collect();
                table.entry(key).or_default().push(idx);
            }
            functions.push(table_fns);
            tables.push(table);
        }

        Self {
            k,
            l,
            width: BUCKET_WIDTH,
            tables,
            functions,
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn l(&self) -> usize {
        self.l
    }

    /// Returns every point index sharing a bucket with `q` in at least one
    /// table (the OR-combination of the `L` tables), deduplicated.
    pub fn query_candidates(&self, q: &[f64]) -> Vec<usize> {
        let v = DVector::from_row_slice(q);
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for (table, fns) in self.tables.iter().zip(self.functions.iter()) {
            let key: Vec<i64> = fns.iter().map(|f| f.hash(&v, self.width)).collect();
            if let Some(bucket) = table.get(&key) {
                for &idx in bucket {
                    if seen.insert(idx) {
                        out.push(idx);
                    }
                }
            }
        }
        out
    }
}

/// The single-hash-function collision probability at Euclidean distance `r`
/// under the p-stable family with bucket width [`BUCKET_WIDTH`]:
///
/// `p(r) = 1 - 2*Phi(-w/r) - (2 / (sqrt(2*pi)*(w/r))) * (1 - exp(-(w/r)^2/2))`
///
/// the standard closed form for the collision probability of a 2-stable
/// (Gaussian) projection hash (Datar et al.), with `Phi` the standard normal
/// CDF. At `r = 0` collision probability is defined to be 1.
pub fn collision_probability(r: f64) -> f64 {
    if r <= 0.0 {
        return 1.0;
    }
    let c = BUCKET_WIDTH / r;
    let phi = |x: f64| 0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2));
    1.0 - 2.0 * phi(-c) - (2.0 / (std::f64::consts::TAU.sqrt() * c)) * (1.0 - (-c * c / 2.0).exp())
}

/// Abramowitz & Stegun 7.1.26 rational approximation to the error function
/// (max absolute error ~1.5e-7), avoiding a dependency on a special-functions
/// crate for this one use site.
fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-x * x).exp();
    sign * y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collision_probability_decreases_with_distance() {
        let p_near = collision_probability(0.5);
        let p_far = collision_probability(5.0);
        assert!(p_near > p_far);
        assert!(p_near <= 1.0 && p_far >= 0.0);
    }

    #[test]
    fn collision_probability_at_zero_is_one() {
        assert_eq!(collision_probability(0.0), 1.0);
    }

    #[test]
    fn recovers_exact_duplicate_point() {
        let mut rng = RngHandle::from_seed(1);
        let points = vec![vec![0.0, 0.0], vec![10.0, 10.0], vec![0.01, -0.01]];
        let lsh = EuclideanLsh::build(&points, 2, 4, 8, &mut rng);
        let candidates = lsh.query_candidates(&[0.0, 0.0]);
        assert!(candidates.contains(&0) || candidates.contains(&2));
    }
}
