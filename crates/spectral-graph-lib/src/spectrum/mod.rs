//! Component B: Spectrum Engine.
//!
//! Sits above [`crate::graph::Graph`] and [`lanczos`], translating a matrix
//! selection and a `k` into eigenpairs, and exposing the two smaller
//! primitives (`rayleigh_quotient`, `power_method`) the teacher's spectral
//! module also builds its eigengap heuristic and clustering pipeline on top
//! of (`graph/spectral.rs`'s `spectral_decomposition`).

pub mod lanczos;

use crate::error::{Result, SpectralError};
use crate::graph::Graph;
use lanczos::{EigenResult, Order};
use nalgebra::{DMatrix, DVector};

/// Which derived matrix an eigensystem/eigenvalue request should act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixSelector {
    Adjacency,
    Laplacian,
    SignlessLaplacian,
    NormalisedLaplacian,
    NormalisedSignlessLaplacian,
    LazyRandomWalk,
}

/// Which end of the spectrum a request wants, mirroring [`lanczos::Order`]
/// at the public API boundary so callers outside `spectrum` never need to
/// import the `lanczos` submodule directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortRule {
    Smallest,
    Largest,
}

impl From<SortRule> for Order {
    fn from(rule: SortRule) -> Self {
        match rule {
            SortRule::Smallest => Order::Smallest,
            SortRule::Largest => Order::Largest,
        }
    }
}

/// Computes the `k` eigenpairs of `graph`'s selected matrix nearest the
/// requested end of the spectrum.
///
/// `iterations` is the Lanczos subspace depth; pass `None` to use
/// [`lanczos::default_iterations`]. `seed` controls the deterministic
/// starting vector (spec section 9's resolution of "Global RNG": the
/// spectrum engine never touches shared RNG state).
pub fn compute_eigensystem(
    graph: &Graph,
    selector: MatrixSelector,
    k: usize,
    sort_rule: SortRule,
    iterations: Option<usize>,
    seed: u64,
) -> Result<EigenResult> {
    let n = graph.number_of_vertices();
    // Spec section 4.B: 1 <= k <= n - 1, strictly; k = n is rejected because
    // the underlying iterative solver cannot extract the full spectrum of an
    // n x n sparse operator (it degenerates to a dense eigensolver at that
    // point, outside this engine's contract).
    if k == 0 || k >= n {
        return Err(SpectralError::invalid_argument(format!(
            "k must satisfy 1 <= k <= n - 1 ({}), got {k}",
            n.saturating_sub(1)
        )));
    }
    let m = iterations.unwrap_or_else(|| lanczos::default_iterations(n, k));
    match selector {
        MatrixSelector::Adjacency => {
            lanczos::eigsh(graph.adjacency(), k, sort_rule.into(), m, seed)
        }
        MatrixSelector::Laplacian => lanczos::eigsh(graph.laplacian(), k, sort_rule.into(), m, seed),
        MatrixSelector::SignlessLaplacian => {
            lanczos::eigsh(graph.signless_laplacian(), k, sort_rule.into(), m, seed)
        }
        MatrixSelector::NormalisedLaplacian => {
            lanczos::eigsh(graph.normalised_laplacian()?, k, sort_rule.into(), m, seed)
        }
        MatrixSelector::NormalisedSignlessLaplacian => lanczos::eigsh(
            graph.normalised_signless_laplacian()?,
            k,
            sort_rule.into(),
            m,
            seed,
        ),
        MatrixSelector::LazyRandomWalk => {
            lanczos::eigsh(graph.lazy_random_walk_matrix()?, k, sort_rule.into(), m, seed)
        }
    }
}

/// Like [`compute_eigensystem`] but discards the eigenvectors, for callers
/// that only need the eigenvalues (e.g. the eigengap heuristic, or a
/// connected-components count via the multiplicity of eigenvalue 0).
pub fn compute_eigenvalues(
    graph: &Graph,
    selector: MatrixSelector,
    k: usize,
    sort_rule: SortRule,
    iterations: Option<usize>,
    seed: u64,
) -> Result<DVector<f64>> {
    Ok(compute_eigensystem(graph, selector, k, sort_rule, iterations, seed)?.eigenvalues)
}

/// The Rayleigh quotient `x^T M x / x^T x` of a dense symmetric matrix at a
/// given vector.
///
/// Rejects a zero input vector, since the quotient is undefined there (spec
/// section 4.B's edge case for this operation).
pub fn rayleigh_quotient(m: &DMatrix<f64>, x: &DVector<f64>) -> Result<f64> {
    let denom = x.dot(x);
    if denom == 0.0 {
        return Err(SpectralError::invalid_argument(
            "rayleigh_quotient is undefined for the zero vector",
        ));
    }
    let numer = x.dot(&(m * x));
    Ok(numer / denom)
}

/// Plain (unnormalised) power iteration: `x_{t+1} = M x_t`, `iterations`
/// times.
///
/// With zero iterations the initial vector is returned unchanged, matching
/// the fixed-point behaviour spec section 8 tests directly
/// (`power_method(m, 0, x) == x`). When `initial` is `None`, a fixed
/// deterministic vector with varying components is used instead of an
/// all-ones vector: `M`'s dominant eigenvalue is frequently sought on a
/// Laplacian or signless Laplacian, and the all-ones vector lies exactly in
/// the combinatorial Laplacian's null space (`L * 1 = 0` always), which
/// would collapse power iteration to zero on its very first step.
pub fn power_method(
    m: &DMatrix<f64>,
    iterations: usize,
    initial: Option<DVector<f64>>,
) -> Result<DVector<f64>> {
    if m.nrows() != m.ncols() {
        return Err(SpectralError::invalid_argument("power_method requires a square matrix"));
    }
    let mut x = match initial {
        Some(v) => {
            if v.len() != m.nrows() {
                return Err(SpectralError::invalid_argument(format!(
                    "initial vector has length {}, expected {}",
                    v.len(),
                    m.nrows()
                )));
            }
            v
        }
        None => default_initial_vector(m.nrows()),
    };
    for _ in 0..iterations {
        x = m * &x;
        let norm = x.norm();
        if norm > 0.0 {
            x /= norm;
        }
    }
    Ok(x)
}

/// A fixed, deterministic starting vector for [`power_method`] when the
/// caller doesn't supply one: components vary linearly so the vector is not
/// an eigenvector of any of the symmetric, highly structured matrices this
/// crate's own test graphs produce (complete graphs, cycles), unlike an
/// all-ones or alternating-sign vector.
fn default_initial_vector(n: usize) -> DVector<f64> {
    DVector::from_iterator(n, (0..n).map(|i| 1.0 + i as f64))
}

/// The default iteration count for [`power_method_default`]: enough power
/// iterations that the Rayleigh quotient of the result is within a loose
/// tolerance of the true dominant eigenvalue for the matrix sizes this crate
/// targets (spec section 9's open question on the undocumented default
/// iteration count of the source's no-`iterations` overload). Chosen as a
/// fixed count rather than one scaled by `n`: power iteration's convergence
/// rate depends on the dominant eigengap, not on matrix dimension, and a
/// fixed budget keeps this overload's cost independent of `n`.
pub const POWER_METHOD_DEFAULT_ITERATIONS: usize = 100;

/// [`power_method`] with the default iteration budget
/// ([`POWER_METHOD_DEFAULT_ITERATIONS`]), mirroring the source's
/// no-`iterations` overload (spec section 4.B).
pub fn power_method_default(m: &DMatrix<f64>, initial: Option<DVector<f64>>) -> Result<DVector<f64>> {
    power_method(m, POWER_METHOD_DEFAULT_ITERATIONS, initial)
}
