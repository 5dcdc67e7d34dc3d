//! CSR sparse matrix boundary (spec section 6): row-start vector of length
//! `n+1`, column-index vector, value vector. This module wraps
//! `nalgebra_sparse::CsrMatrix<f64>` with the handful of helpers the graph
//! and spectrum components need (triplet assembly, symmetry checking,
//! element lookup) instead of hand-rolling a parallel-array CSR type: the
//! nalgebra ecosystem is already the crate's linear-algebra stack (see
//! `spectrum::lanczos`), and `nalgebra_sparse` interoperates directly with
//! `DVector`/`DMatrix` for matrix-vector products.

use nalgebra_sparse::coo::CooMatrix;
use nalgebra_sparse::csr::CsrMatrix;
use std::collections::HashMap;

/// The CSR matrix type used throughout the crate.
pub type Csr = CsrMatrix<f64>;

/// Builds a CSR matrix from (possibly unsorted, possibly duplicated) index
/// triplets; duplicate `(row, col)` entries are summed, matching the
/// COO-to-CSR assembly convention.
pub fn from_triplets(n: usize, m: usize, rows: &[usize], cols: &[usize], vals: &[f64]) -> Csr {
    let mut coo = CooMatrix::new(n, m);
    for ((&r, &c), &v) in rows.iter().zip(cols.iter()).zip(vals.iter()) {
        coo.push(r, c, v);
    }
    CsrMatrix::from(&coo)
}

/// A square CSR matrix of all zeros.
pub fn zeros(n: usize) -> Csr {
    from_triplets(n, n, &[], &[], &[])
}

/// Returns the value at `(i, j)`, or 0.0 if the entry is not stored.
pub fn get(m: &Csr, i: usize, j: usize) -> f64 {
    let row = m.row(i);
    for (&c, &v) in row.col_indices().iter().zip(row.values().iter()) {
        if c == j {
            return v;
        }
    }
    0.0
}

/// Collects the off-diagonal `(col, value)` pairs stored in row `i`.
pub fn row_off_diagonal(m: &Csr, i: usize) -> Vec<(usize, f64)> {
    let row = m.row(i);
    row.col_indices()
        .iter()
        .zip(row.values().iter())
        .filter(|(&c, _)| c != i)
        .map(|(&c, &v)| (c, v))
        .collect()
}

/// Returns `true` if `m[i, i]` is a stored, non-zero entry.
pub fn has_diagonal_entry(m: &Csr, i: usize) -> bool {
    get(m, i, i) != 0.0
}

/// Checks `m == mᵀ` within `tol` (absolute difference per entry).
///
/// Builds a dense lookup of every stored entry once (`O(nnz)`) rather than
/// repeatedly scanning rows, since this check runs once at `Graph`
/// construction over the whole matrix.
pub fn is_symmetric(m: &Csr, tol: f64) -> bool {
    if m.nrows() != m.ncols() {
        return false;
    }
    let mut entries: HashMap<(usize, usize), f64> = HashMap::with_capacity(m.nnz());
    for i in 0..m.nrows() {
        let row = m.row(i);
        for (&j, &v) in row.col_indices().iter().zip(row.values().iter()) {
            entries.insert((i, j), v);
        }
    }
    for (&(i, j), &v) in entries.iter() {
        let vt = entries.get(&(j, i)).copied().unwrap_or(0.0);
        if (v - vt).abs() > tol {
            return false;
        }
    }
    true
}

/// Checks that every stored entry is `>= -tol` (non-negativity invariant,
/// allowing for floating point noise at the boundary).
pub fn is_non_negative(m: &Csr, tol: f64) -> bool {
    m.triplet_iter().all(|(_, _, &v)| v >= -tol)
}

/// Number of non-zero entries lying strictly off the diagonal.
pub fn count_off_diagonal_nnz(m: &Csr) -> usize {
    m.triplet_iter().filter(|&(i, j, _)| i != j).count()
}

/// Number of rows `i` for which `m[i, i]` is a stored non-zero entry.
pub fn count_diagonal_nnz(m: &Csr) -> usize {
    (0..m.nrows()).filter(|&i| has_diagonal_entry(m, i)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_matrix_detected() {
        let m = from_triplets(2, 2, &[0, 1], &[1, 0], &[2.0, 2.0]);
        assert!(is_symmetric(&m, 1e-12));
    }

    #[test]
    fn asymmetric_matrix_rejected() {
        let m = from_triplets(2, 2, &[0, 1], &[1, 0], &[2.0, 3.0]);
        assert!(!is_symmetric(&m, 1e-12));
    }

    #[test]
    fn duplicate_triplets_are_summed() {
        let m = from_triplets(1, 1, &[0, 0], &[0, 0], &[1.0, 2.0]);
        assert_eq!(get(&m, 0, 0), 3.0);
    }

    #[test]
    fn get_missing_entry_is_zero() {
        let m = from_triplets(2, 2, &[0], &[1], &[1.0]);
        assert_eq!(get(&m, 1, 1), 0.0);
    }
}
