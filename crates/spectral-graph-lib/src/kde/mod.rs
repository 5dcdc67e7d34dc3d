//! Component C: CKNS sublinear-time Gaussian kernel density estimator.
//!
//! Builds a 3-D lattice of `HashUnit`s — one per `(log_nmu_iter, iter, j)`
//! triple — each either a raw stored point subset or an [`lsh::EuclideanLsh`]
//! index, and answers queries by a descending scan over `log_nmu` guesses
//! with a median-of-`k1`-estimates variance reduction at each guess.

pub mod exact;
pub mod lsh;

use crate::error::{Result, SpectralError};
use crate::rng::RngHandle;
use rand::Rng;
use rayon::prelude::*;
use std::sync::OnceLock;

pub use exact::ExactGaussianKde;

/// `C₁` in the outer-repetition-count formula `k1 = ⌈C₁ · log n / ε²⌉`.
pub const C1: f64 = 0.2;
/// `C₂` in the table-count formula `L = ⌈C₂ · log₂ n · 2^φ⌉`.
pub const C2: f64 = 1.0;
/// Subsets at or below this size are stored directly; above it, an LSH
/// index is built.
pub const HASH_UNIT_CUTOFF: usize = 1000;

enum HashUnit {
    Raw(Vec<usize>),
    Lsh {
        index: lsh::EuclideanLsh,
        subset: Vec<usize>,
    },
}

impl HashUnit {
    fn candidates(&self, q: &[f64]) -> Vec<usize> {
        match self {
            HashUnit::Raw(idxs) => idxs.clone(),
            HashUnit::Lsh { index, subset } => index
                .query_candidates(q)
                .into_iter()
                .map(|local| subset[local])
                .collect(),
        }
    }
}

/// One `log_nmu` level of the lattice: `k1` repetitions, each holding `J`
/// shell cells.
struct Level {
    log_nmu: usize,
    j_max: usize,
    cells: Vec<Vec<OnceLock<HashUnit>>>,
}

/// A CKNS sublinear-time `(ε, δ)`-approximate Gaussian KDE.
pub struct CknsKde {
    points: Vec<Vec<f64>>,
    dim: usize,
    a: f64,
    eps: f64,
    seed: u64,
    log_nmu_max: usize,
    num_log_nmu_iterations: usize,
    k1: usize,
    levels: Vec<Option<Level>>,
}

impl CknsKde {
    /// Builds the lattice over `points` for Gaussian scale `a` and relative
    /// error target `eps`.
    ///
    /// `seed` is the master RNG seed (spec section 9's "Global RNG" note):
    /// every sampling decision in construction derives from a substream of
    /// `seed` keyed by the cell's `(log_nmu_iter, iter, j)` coordinates, so
    /// two calls with the same seed and points produce byte-identical
    /// lattices regardless of the order worker threads touch cells in
    /// (spec section 8's median-of-estimates idempotence property).
    pub fn build(points: Vec<Vec<f64>>, a: f64, eps: f64, seed: u64) -> Result<Self> {
        if points.is_empty() {
            return Err(SpectralError::invalid_argument(
                "CknsKde requires at least one point",
            ));
        }
        if !(eps > 0.0 && eps <= 1.0) {
            return Err(SpectralError::invalid_argument(
                "eps must lie in (0, 1]",
            ));
        }
        let dim = points[0].len();
        if points.iter().any(|p| p.len() != dim) {
            return Err(SpectralError::invalid_argument(
                "all points must share the same dimension",
            ));
        }

        let n = points.len();
        let log_nmu_max = (n as f64).log2().ceil() as usize;
        let num_log_nmu_iterations = ((log_nmu_max as f64) / 2.0).ceil() as usize;
        let k1 = ((C1 * (n as f64).ln()) / (eps * eps)).ceil().max(1.0) as usize;
        log::info!(
            "CknsKde::build: n={n} dim={dim} eps={eps} log_nmu_max={log_nmu_max} levels={num_log_nmu_iterations} k1={k1}"
        );

        let mut level_meta: Vec<Option<(usize, usize)>> = Vec::with_capacity(num_log_nmu_iterations);
        for log_nmu_iter in 0..num_log_nmu_iterations {
            let log_nmu = 2 * log_nmu_iter;
            // Resolves spec section 9's open question: cells are only built
            // for log_nmu strictly below log_nmu_max.
            if log_nmu < log_nmu_max {
                let j_max = log_nmu_max - log_nmu;
                level_meta.push(Some((log_nmu, j_max)));
            } else {
                level_meta.push(None);
            }
        }

        let mut levels: Vec<Option<Level>> = level_meta
            .iter()
            .map(|meta| {
                meta.map(|(log_nmu, j_max)| Level {
                    log_nmu,
                    j_max,
                    cells: (0..k1)
                        .map(|_| (0..j_max).map(|_| OnceLock::new()).collect())
                        .collect(),
                })
            })
            .collect();

        let tasks: Vec<(usize, usize, usize, usize, usize)> = levels
            .iter()
            .enumerate()
            .filter_map(|(level_idx, level)| level.as_ref().map(|l| (level_idx, l.log_nmu, l.j_max)))
            .flat_map(|(level_idx, log_nmu, j_max)| {
                (0..k1).flat_map(move |iter| {
                    (1..=j_max).map(move |j| (level_idx, log_nmu, j_max, iter, j))
                })
            })
            .collect();

        log::debug!("CknsKde::build: dispatching {} lattice cells across rayon", tasks.len());
        tasks
            .par_iter()
            .for_each(|&(level_idx, log_nmu, j_max, iter, j)| {
                let unit = build_hash_unit(&points, dim, a, log_nmu, j, j_max, seed, level_idx, iter);
                let cell = &levels[level_idx].as_ref().unwrap().cells[iter][j - 1];
                let _ = cell.set(unit);
            });
        log::trace!("CknsKde::build: lattice fully populated");

        Ok(Self {
            points,
            dim,
            a,
            eps,
            seed,
            log_nmu_max,
            num_log_nmu_iterations,
            k1,
            levels,
        })
    }

    pub fn n(&self) -> usize {
        self.points.len()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Answers a single query, per spec section 4.C.3's descending scan
    /// over `log_nmu` guesses.
    pub fn query(&self, q: &[f64]) -> Result<f64> {
        if q.len() != self.dim {
            return Err(SpectralError::invalid_argument(format!(
                "query has dimension {}, expected {}",
                q.len(),
                self.dim
            )));
        }
        let n = self.points.len() as f64;

        for level_idx in (0..self.num_log_nmu_iterations).rev() {
            let Some(level) = &self.levels[level_idx] else {
                continue;
            };
            let mut estimates = Vec::with_capacity(self.k1);
            for iter in 0..self.k1 {
                let mut e = 0.0;
                for j in 1..=level.j_max {
                    let cell = level.cells[iter][j - 1]
                        .get()
                        .expect("lattice cell populated during build");
                    let p = shell_probability(j, level.log_nmu);
                    let r_j2 = shell_radius_squared(j, self.a);
                    let r_jm1_2 = if j == 1 { 0.0 } else { shell_radius_squared(j - 1, self.a) };
                    for idx in cell.candidates(q) {
                        let d2 = squared_distance(q, &self.points[idx]);
                        if d2 > r_jm1_2 && d2 <= r_j2 {
                            e += (-self.a * d2).exp() / p;
                        }
                    }
                }
                estimates.push(e);
            }
            let this_mu_estimate = median(&mut estimates);
            log::trace!(
                "CknsKde::query: level log_nmu={} estimate={this_mu_estimate}",
                level.log_nmu
            );
            if this_mu_estimate > 0.0
                && this_mu_estimate.ln() >= level.log_nmu as f64 * std::f64::consts::LN_2
            {
                return Ok(this_mu_estimate / n);
            }
        }
        log::debug!("CknsKde::query: no level accepted, returning floor estimate 1/n");
        Ok(1.0 / n)
    }

    /// Evaluates [`CknsKde::query`] over every point in `queries`, on the
    /// caller's thread (construction already parallelises the expensive
    /// work; query itself is cheap per point).
    pub fn query_batch(&self, queries: &[Vec<f64>]) -> Result<Vec<f64>> {
        queries.iter().map(|q| self.query(q)).collect()
    }
}

fn build_hash_unit(
    points: &[Vec<f64>],
    dim: usize,
    a: f64,
    log_nmu: usize,
    j: usize,
    j_max: usize,
    seed: u64,
    level_idx: usize,
    iter: usize,
) -> HashUnit {
    let cell_id = ((level_idx as u64) << 40) | ((iter as u64) << 20) | (j as u64);
    let mut rng = RngHandle::from_seed(seed).substream(cell_id);

    let p = shell_probability(j, log_nmu);
    let subset: Vec<usize> = (0..points.len()).filter(|_| rng.gen_bool(p.min(1.0))).collect();

    if subset.len() <= HASH_UNIT_CUTOFF {
        HashUnit::Raw(subset)
    } else {
        let r_j = shell_radius_squared(j, a).sqrt();
        let p_j = lsh::collision_probability(r_j);
        let phi_j = (((j as f64) / (j_max as f64)) * ((j_max - j + 1) as f64)).ceil().max(0.0) as i64;
        let k = ((-phi_j as f64) / p_j.max(1e-300).log2()).floor().max(1.0) as usize;
        let l = (C2 * (points.len() as f64).log2() * 2f64.powi(phi_j as i32)).ceil().max(1.0) as usize;

        let subset_points: Vec<Vec<f64>> = subset.iter().map(|&i| points[i].clone()).collect();
        let index = lsh::EuclideanLsh::build(&subset_points, dim, k, l, &mut rng);
        HashUnit::Lsh { index, subset }
    }
}

fn shell_probability(j: usize, log_nmu: usize) -> f64 {
    2f64.powi(-(j as i32)) * 2f64.powi(-(log_nmu as i32))
}

fn shell_radius_squared(j: usize, a: f64) -> f64 {
    (j as f64) * std::f64::consts::LN_2 / a
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}
