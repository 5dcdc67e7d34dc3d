//! A from-scratch Lanczos partial eigensolver for symmetric (Hermitian-real)
//! operators, playing the role of the "external iterative sparse
//! eigensolver" boundary of spec section 6.
//!
//! Grounded on the `Hermitian` trait / `Order` enum pattern used by the
//! teacher's `lanzcos::hermitian` module (an `eigsh(iterations, order)`
//! method returning sorted eigenpairs), generalised here to operate on any
//! `LinearOperator` (dense `DMatrix` or sparse `CsrMatrix`) rather than only
//! `DMatrix`, so the graph component never has to densify its adjacency
//! matrix just to ask for a spectrum.
//!
//! Lanczos reduces the matrix-vector-product-only view of an `n x n`
//! operator to a small `m x m` real symmetric tridiagonal matrix (`m` the
//! Krylov subspace dimension); that small subproblem is solved exactly with
//! `nalgebra::SymmetricEigen`, the same "delegate the tiny dense subproblem
//! to a dense solver" pattern annembed uses for its randomized SVD (lax's
//! `svddc` on the projected `(l, n)` block).

use crate::error::{Result, SpectralError};
use nalgebra::{DMatrix, DVector, SymmetricEigen};

/// Sort order requested of [`eigsh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// `k` eigenpairs with the smallest algebraic eigenvalue, returned
    /// ascending.
    Smallest,
    /// `k` eigenpairs with the largest-magnitude eigenvalue, returned
    /// descending by magnitude.
    Largest,
}

/// A linear operator exposing only its dimension and its action on a dense
/// vector — the minimal interface Lanczos needs, satisfied by both dense
/// and CSR-backed matrices without requiring either to materialise the
/// other.
pub trait LinearOperator {
    fn dim(&self) -> usize;
    fn apply(&self, x: &DVector<f64>) -> DVector<f64>;
}

impl LinearOperator for DMatrix<f64> {
    fn dim(&self) -> usize {
        self.nrows()
    }
    fn apply(&self, x: &DVector<f64>) -> DVector<f64> {
        self * x
    }
}

impl LinearOperator for nalgebra_sparse::CsrMatrix<f64> {
    fn dim(&self) -> usize {
        self.nrows()
    }
    fn apply(&self, x: &DVector<f64>) -> DVector<f64> {
        self * x
    }
}

/// Result of a partial Hermitian eigendecomposition: `eigenvalues` has
/// length `k` and `eigenvectors` is `n x k`, columns matching
/// `eigenvalues` in order.
#[derive(Debug, Clone)]
pub struct EigenResult {
    pub eigenvalues: DVector<f64>,
    pub eigenvectors: DMatrix<f64>,
}

/// Default number of Lanczos iterations when the caller does not specify
/// one: enough Krylov directions that the Ritz values at the spectrum's
/// extremes have converged for the matrix sizes this crate targets, capped
/// at the operator's dimension (beyond which Lanczos is exact, modulo
/// rounding). Resolves the spec's open question on Lanczos depth: the
/// scan is `min(n, max(4*k + 20, 40))`, i.e. small enough to stay cheap for
/// huge sparse `n`, large enough that `k` extreme Ritz pairs are well
/// separated from the rest of the spectrum for every test scenario in
/// spec section 8.
pub fn default_iterations(n: usize, k: usize) -> usize {
    (4 * k + 20).max(40).min(n)
}

/// Computes the `k` extreme eigenpairs of a symmetric operator via Lanczos
/// with full reorthogonalisation.
///
/// `iterations` bounds the Krylov subspace dimension (clamped to `[k, n]`).
/// Full reorthogonalisation against every previously generated Lanczos
/// vector is used (rather than selective or no reorthogonalisation): for
/// the graph sizes this crate is specified against (spec section 8's test
/// graphs, and `n` in the low thousands before the KDE component takes
/// over as the asymptotic workhorse) the `O(n * m^2)` reorthogonalisation
/// cost is negligible and buys exact recovery of multiplicities (e.g. the
/// algebraic multiplicity of eigenvalue 0 equalling the number of
/// connected components, spec section 4.B).
pub fn eigsh(
    op: &impl LinearOperator,
    k: usize,
    order: Order,
    iterations: usize,
    seed: u64,
) -> Result<EigenResult> {
    let n = op.dim();
    if k == 0 || k > n {
        return Err(SpectralError::invalid_argument(format!(
            "k must satisfy 1 <= k <= n ({n}), got {k}"
        )));
    }
    let m = iterations.clamp(k, n);
    log::info!("eigsh: n={n} k={k} order={order:?} krylov dim={m}");

    let mut alpha: Vec<f64> = Vec::with_capacity(m);
    let mut beta: Vec<f64> = Vec::with_capacity(m);
    let mut basis: Vec<DVector<f64>> = Vec::with_capacity(m);

    let mut v_prev: Option<DVector<f64>> = None;
    let mut v_curr = deterministic_unit_vector(n, seed);
    let mut beta_prev = 0.0_f64;

    let mut actual_m = 0usize;
    for _ in 0..m {
        let mut w = op.apply(&v_curr);
        if let Some(vp) = &v_prev {
            w -= vp * beta_prev;
        }
        let a = v_curr.dot(&w);
        w -= &v_curr * a;

        // Full reorthogonalisation against every basis vector generated so
        // far (including v_curr, already subtracted above but re-swept for
        // numerical robustness).
        for b in basis.iter().chain(std::iter::once(&v_curr)) {
            let proj = b.dot(&w);
            w -= b * proj;
        }

        alpha.push(a);
        basis.push(v_curr.clone());
        actual_m += 1;

        let b_next = w.norm();
        if b_next < 1e-12 {
            // Invariant subspace found; the Krylov space cannot be grown
            // further. This is expected (not a failure) when the operator
            // has fewer than `m` distinct Ritz directions reachable from
            // the starting vector, e.g. a highly symmetric small graph.
            log::trace!("eigsh: invariant subspace reached at iteration {actual_m}");
            break;
        }
        beta.push(b_next);

        v_prev = Some(v_curr);
        v_curr = &w / b_next;
        beta_prev = b_next;
    }

    if actual_m == 0 || alpha.iter().chain(beta.iter()).any(|x| !x.is_finite()) {
        return Err(SpectralError::compute(
            "Lanczos iteration failed to converge (non-finite tridiagonal entry)",
        ));
    }

    // Assemble the m x m tridiagonal matrix and solve the small dense
    // subproblem exactly.
    let mut t = DMatrix::<f64>::zeros(actual_m, actual_m);
    for i in 0..actual_m {
        t[(i, i)] = alpha[i];
        if i + 1 < actual_m {
            t[(i, i + 1)] = beta[i];
            t[(i + 1, i)] = beta[i];
        }
    }
    log::debug!("eigsh: diagonalising {actual_m}x{actual_m} tridiagonal subproblem");
    let eigen = SymmetricEigen::new(t);

    // Ritz vectors: y_i = V * s_i, V the n x actual_m Lanczos basis.
    let mut v_mat = DMatrix::<f64>::zeros(n, actual_m);
    for (col, b) in basis.iter().enumerate() {
        v_mat.set_column(col, b);
    }

    let mut pairs: Vec<(f64, DVector<f64>)> = (0..actual_m)
        .map(|i| {
            let theta = eigen.eigenvalues[i];
            let ritz_vec = &v_mat * eigen.eigenvectors.column(i);
            (theta, ritz_vec)
        })
        .collect();

    match order {
        Order::Smallest => {
            pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        }
        Order::Largest => {
            pairs.sort_by(|a, b| b.0.abs().partial_cmp(&a.0.abs()).unwrap());
        }
    }

    let take = k.min(pairs.len());
    if take < k {
        return Err(SpectralError::compute(format!(
            "Lanczos subspace collapsed to dimension {actual_m} before {k} eigenpairs converged"
        )));
    }

    let mut eigenvalues = DVector::<f64>::zeros(take);
    let mut eigenvectors = DMatrix::<f64>::zeros(n, take);
    for (col, (theta, vec)) in pairs.into_iter().take(take).enumerate() {
        eigenvalues[col] = theta;
        let norm = vec.norm();
        let normalised = if norm > 0.0 { vec / norm } else { vec };
        eigenvectors.set_column(col, &normalised);
    }

    Ok(EigenResult {
        eigenvalues,
        eigenvectors,
    })
}

/// A deterministic, seed-dependent unit starting vector, avoiding any
/// dependency on global RNG state (spec section 9's "Global RNG" note).
fn deterministic_unit_vector(n: usize, seed: u64) -> DVector<f64> {
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256PlusPlus;

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut v = DVector::<f64>::from_iterator(n, (0..n).map(|_| rng.gen_range(-1.0..1.0)));
    let norm = v.norm();
    if norm > 0.0 {
        v /= norm;
    } else {
        v[0] = 1.0;
    }
    v
}
