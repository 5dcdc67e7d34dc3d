//! Component A: Graph Representation.
//!
//! Owns one sparse adjacency matrix and lazily synthesises the derived
//! matrices of spec section 3/4.A, caching each behind a `std::sync::OnceLock`
//! — the "once-initialised optional slot" strategy spec section 9 recommends
//! for lazy cached matrices. Lazy initialisation of those slots is *not*
//! internally synchronised beyond `OnceLock`'s own single-writer guarantee
//! for the slot contents; per spec section 5, callers sharing a `Graph`
//! across threads must externally synchronise (or pre-warm) the first access
//! to a derived matrix.

pub mod local;

use crate::error::{Result, SpectralError};
use crate::sparse::{self, Csr};
use std::sync::OnceLock;

/// Floating-point pruning epsilon used when reconstructing an adjacency
/// matrix from a Laplacian (spec section 6).
pub const PRUNE_EPSILON: f64 = 1e-10;

/// One edge of the graph, as returned by [`Graph::neighbors`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub u: usize,
    pub v: usize,
    pub weight: f64,
}

/// A weighted, undirected graph backed by one CSR adjacency matrix, with the
/// derived matrices of spec section 3 synthesised on demand.
pub struct Graph {
    adjacency: Csr,
    n: usize,
    has_self_loops: bool,
    has_isolated_vertex: bool,

    degree: OnceLock<Csr>,
    inverse_degree: OnceLock<Csr>,
    laplacian: OnceLock<Csr>,
    signless_laplacian: OnceLock<Csr>,
    normalised_laplacian: OnceLock<Csr>,
    normalised_signless_laplacian: OnceLock<Csr>,
    lazy_random_walk: OnceLock<Csr>,
}

impl Graph {
    /// Constructs a `Graph` from CSR arrays.
    ///
    /// Disambiguation rule (spec section 3): if any off-diagonal entry is
    /// strictly negative, `data` is interpreted as a Laplacian and the
    /// adjacency is reconstructed as `A = D - L` with `D[i,i] = sum_j
    /// L[i,j]`, pruning entries whose magnitude is below
    /// [`PRUNE_EPSILON`]. Otherwise `data` is taken as the adjacency matrix
    /// directly.
    pub fn from_csr(
        n: usize,
        row_offsets: &[usize],
        col_indices: &[usize],
        values: &[f64],
    ) -> Result<Self> {
        if row_offsets.len() != n + 1 {
            return Err(SpectralError::invalid_argument(format!(
                "row_offsets must have length n+1 = {}, got {}",
                n + 1,
                row_offsets.len()
            )));
        }
        let mut rows = Vec::with_capacity(values.len());
        for i in 0..n {
            for _ in row_offsets[i]..row_offsets[i + 1] {
                rows.push(i);
            }
        }
        let data = sparse::from_triplets(n, n, &rows, col_indices, values);
        Self::from_matrix(data)
    }

    /// Constructs a `Graph` from a pre-built CSR matrix, applying the same
    /// adjacency/Laplacian disambiguation rule as [`Graph::from_csr`].
    pub fn from_matrix(data: Csr) -> Result<Self> {
        if data.nrows() != data.ncols() {
            return Err(SpectralError::invalid_argument(
                "input matrix must be square",
            ));
        }
        let n = data.nrows();

        let looks_like_laplacian =
            (0..n).any(|i| sparse::row_off_diagonal(&data, i).iter().any(|&(_, v)| v < 0.0));

        let adjacency = if looks_like_laplacian {
            log::debug!("Graph::from_matrix: negative off-diagonal entry found, treating input as a Laplacian");
            reconstruct_adjacency_from_laplacian(&data, n)
        } else {
            data
        };

        if !sparse::is_symmetric(&adjacency, 1e-6) {
            return Err(SpectralError::domain("adjacency matrix is not symmetric"));
        }
        if !sparse::is_non_negative(&adjacency, PRUNE_EPSILON) {
            return Err(SpectralError::domain(
                "adjacency matrix has negative entries",
            ));
        }

        let has_self_loops = (0..n).any(|i| sparse::get(&adjacency, i, i) > 0.0);
        let has_isolated_vertex = (0..n).any(|i| weighted_degree(&adjacency, i) == 0.0);
        log::info!(
            "Graph::from_matrix: n={n} self_loops={has_self_loops} isolated_vertex={has_isolated_vertex}"
        );

        Ok(Self {
            adjacency,
            n,
            has_self_loops,
            has_isolated_vertex,
            degree: OnceLock::new(),
            inverse_degree: OnceLock::new(),
            laplacian: OnceLock::new(),
            signless_laplacian: OnceLock::new(),
            normalised_laplacian: OnceLock::new(),
            normalised_signless_laplacian: OnceLock::new(),
            lazy_random_walk: OnceLock::new(),
        })
    }

    pub fn number_of_vertices(&self) -> usize {
        self.n
    }

    /// Non-zeros in `A`, halved (each edge stored twice, once per endpoint)
    /// and adjusted so each self-loop counts as a single edge.
    pub fn number_of_edges(&self) -> usize {
        let off_diag = sparse::count_off_diagonal_nnz(&self.adjacency);
        let self_loops = sparse::count_diagonal_nnz(&self.adjacency);
        off_diag / 2 + self_loops
    }

    pub fn has_self_loops(&self) -> bool {
        self.has_self_loops
    }

    pub fn vertex_exists(&self, v: usize) -> bool {
        v < self.n
    }

    fn check_vertex(&self, v: usize) -> Result<()> {
        if self.vertex_exists(v) {
            Ok(())
        } else {
            Err(SpectralError::invalid_argument(format!(
                "vertex {v} out of range [0, {})",
                self.n
            )))
        }
    }

    fn check_no_isolated_vertex(&self, op: &str) -> Result<()> {
        if self.has_isolated_vertex {
            Err(SpectralError::invalid_argument(format!(
                "{op} is undefined on a graph with an isolated vertex (degree 0)"
            )))
        } else {
            Ok(())
        }
    }

    pub fn adjacency(&self) -> &Csr {
        &self.adjacency
    }

    pub fn degree_matrix(&self) -> &Csr {
        self.degree.get_or_init(|| {
            let rows: Vec<usize> = (0..self.n).collect();
            let vals: Vec<f64> = (0..self.n)
                .map(|i| weighted_degree(&self.adjacency, i))
                .collect();
            sparse::from_triplets(self.n, self.n, &rows, &rows, &vals)
        })
    }

    pub fn inverse_degree_matrix(&self) -> Result<&Csr> {
        self.check_no_isolated_vertex("inverse_degree_matrix")?;
        Ok(self.inverse_degree.get_or_init(|| {
            let rows: Vec<usize> = (0..self.n).collect();
            let vals: Vec<f64> = (0..self.n)
                .map(|i| 1.0 / weighted_degree(&self.adjacency, i))
                .collect();
            sparse::from_triplets(self.n, self.n, &rows, &rows, &vals)
        }))
    }

    pub fn laplacian(&self) -> &Csr {
        self.laplacian.get_or_init(|| {
            log::trace!("Graph: synthesising combinatorial laplacian");
            let d = self.degree_matrix();
            subtract(d, &self.adjacency)
        })
    }

    pub fn signless_laplacian(&self) -> &Csr {
        self.signless_laplacian.get_or_init(|| {
            log::trace!("Graph: synthesising signless laplacian");
            let d = self.degree_matrix();
            add(d, &self.adjacency)
        })
    }

    pub fn normalised_laplacian(&self) -> Result<&Csr> {
        self.check_no_isolated_vertex("normalised_laplacian")?;
        Ok(self.normalised_laplacian.get_or_init(|| {
            log::trace!("Graph: synthesising normalised laplacian");
            normalised_form(&self.adjacency, self.n, -1.0)
        }))
    }

    pub fn normalised_signless_laplacian(&self) -> Result<&Csr> {
        self.check_no_isolated_vertex("normalised_signless_laplacian")?;
        Ok(self
            .normalised_signless_laplacian
            .get_or_init(|| normalised_form(&self.adjacency, self.n, 1.0)))
    }

    /// `W = 1/2 (I + A D^-1)`.
    ///
    /// `(A D^-1)[i,j] = A[i,j] / deg(j)`: each off-diagonal term is divided
    /// by the *column* (neighbor's) weighted degree, not the row's. A
    /// self-loop at `i` contributes to `(A D^-1)[i,i]` via `A[i,i] /
    /// deg(i)`, so the diagonal is `1/2 (1 + A[i,i] / deg(i))`, not a bare
    /// `1/2` — the self-loop's contribution to the walk is not discarded.
    pub fn lazy_random_walk_matrix(&self) -> Result<&Csr> {
        self.check_no_isolated_vertex("lazy_random_walk_matrix")?;
        Ok(self.lazy_random_walk.get_or_init(|| {
            let mut rows = Vec::new();
            let mut cols = Vec::new();
            let mut vals = Vec::new();
            for i in 0..self.n {
                let deg_i = weighted_degree(&self.adjacency, i);
                let self_loop_weight = sparse::get(&self.adjacency, i, i);
                rows.push(i);
                cols.push(i);
                vals.push(0.5 * (1.0 + self_loop_weight / deg_i));
                for (j, w) in sparse::row_off_diagonal(&self.adjacency, i) {
                    let deg_j = weighted_degree(&self.adjacency, j);
                    rows.push(i);
                    cols.push(j);
                    vals.push(0.5 * w / deg_j);
                }
            }
            sparse::from_triplets(self.n, self.n, &rows, &cols, &vals)
        }))
    }

    pub fn total_volume(&self) -> f64 {
        (0..self.n).map(|i| weighted_degree(&self.adjacency, i)).sum()
    }

    pub fn average_degree(&self) -> f64 {
        self.total_volume() / self.n as f64
    }

    pub fn degree(&self, v: usize) -> Result<f64> {
        self.check_vertex(v)?;
        Ok(weighted_degree(&self.adjacency, v))
    }

    /// Unweighted degree: number of incident edges, with a self-loop
    /// counted twice (spec section 3: "the self-loop contributes twice to
    /// degree"), matching [`Graph::degree`]'s weighted definition.
    pub fn degree_unweighted(&self, v: usize) -> Result<usize> {
        self.check_vertex(v)?;
        let neighbor_count = sparse::row_off_diagonal(&self.adjacency, v).len();
        let self_loop_contribution = if sparse::has_diagonal_entry(&self.adjacency, v) {
            2
        } else {
            0
        };
        Ok(neighbor_count + self_loop_contribution)
    }

    /// Batched [`Graph::degree`], one call's worth of overhead amortised
    /// across a whole vertex set.
    pub fn degrees_batch(&self, vertices: &[usize]) -> Result<Vec<f64>> {
        vertices.iter().map(|&v| self.degree(v)).collect()
    }

    /// Edges incident to `v`, excluding the self-loop entry (which is
    /// reflected in [`Graph::degree`] but not in this list, per spec
    /// section 4.A).
    pub fn neighbors(&self, v: usize) -> Result<Vec<Edge>> {
        self.check_vertex(v)?;
        Ok(sparse::row_off_diagonal(&self.adjacency, v)
            .into_iter()
            .map(|(u, w)| Edge { u: v, v: u, weight: w })
            .collect())
    }

    pub fn neighbors_unweighted(&self, v: usize) -> Result<Vec<usize>> {
        self.check_vertex(v)?;
        Ok(sparse::row_off_diagonal(&self.adjacency, v)
            .into_iter()
            .map(|(u, _)| u)
            .collect())
    }

    /// A new `Graph` on the induced vertex set `vertices`. Duplicates are
    /// ignored (first occurrence wins); vertex ids are remapped to the
    /// dense range `[0, m)` in the order they first appear.
    pub fn subgraph(&self, vertices: &[usize]) -> Result<Self> {
        for &v in vertices {
            self.check_vertex(v)?;
        }
        let mut seen = std::collections::HashSet::new();
        let mut order = Vec::new();
        for &v in vertices {
            if seen.insert(v) {
                order.push(v);
            }
        }
        let mut remap = std::collections::HashMap::new();
        for (new_id, &old_id) in order.iter().enumerate() {
            remap.insert(old_id, new_id);
        }
        let m = order.len();
        let mut rows = Vec::new();
        let mut cols = Vec::new();
        let mut vals = Vec::new();
        for (new_i, &old_i) in order.iter().enumerate() {
            let row = self.adjacency.row(old_i);
            for (&old_j, &w) in row.col_indices().iter().zip(row.values().iter()) {
                if let Some(&new_j) = remap.get(&old_j) {
                    rows.push(new_i);
                    cols.push(new_j);
                    vals.push(w);
                }
            }
        }
        Self::from_matrix(sparse::from_triplets(m, m, &rows, &cols, &vals))
    }

    /// A new `Graph` on `n + n'` vertices with block-diagonal adjacency:
    /// `self`'s vertices keep their ids, `other`'s are offset by `self.n`.
    pub fn disjoint_union(&self, other: &Graph) -> Result<Self> {
        let n1 = self.n;
        let n2 = other.n;
        let total = n1 + n2;
        let mut rows = Vec::new();
        let mut cols = Vec::new();
        let mut vals = Vec::new();
        for i in 0..n1 {
            let row = self.adjacency.row(i);
            for (&j, &w) in row.col_indices().iter().zip(row.values().iter()) {
                rows.push(i);
                cols.push(j);
                vals.push(w);
            }
        }
        for i in 0..n2 {
            let row = other.adjacency.row(i);
            for (&j, &w) in row.col_indices().iter().zip(row.values().iter()) {
                rows.push(n1 + i);
                cols.push(n1 + j);
                vals.push(w);
            }
        }
        Self::from_matrix(sparse::from_triplets(total, total, &rows, &cols, &vals))
    }
}

fn weighted_degree(m: &Csr, i: usize) -> f64 {
    let row = m.row(i);
    let mut sum = 0.0;
    for (&j, &v) in row.col_indices().iter().zip(row.values().iter()) {
        sum += v;
        if j == i {
            // self-loop weight contributes a second time to degree.
            sum += v;
        }
    }
    sum
}

fn add(a: &Csr, b: &Csr) -> Csr {
    combine(a, b, 1.0)
}

fn subtract(a: &Csr, b: &Csr) -> Csr {
    combine(a, b, -1.0)
}

/// Computes `a + sign * b` as a fresh CSR matrix.
fn combine(a: &Csr, b: &Csr, sign: f64) -> Csr {
    let n = a.nrows();
    let mut rows = Vec::new();
    let mut cols = Vec::new();
    let mut vals = Vec::new();
    for i in 0..n {
        let ra = a.row(i);
        for (&j, &v) in ra.col_indices().iter().zip(ra.values().iter()) {
            rows.push(i);
            cols.push(j);
            vals.push(v);
        }
        let rb = b.row(i);
        for (&j, &v) in rb.col_indices().iter().zip(rb.values().iter()) {
            rows.push(i);
            cols.push(j);
            vals.push(sign * v);
        }
    }
    sparse::from_triplets(n, n, &rows, &cols, &vals)
}

/// `sign = -1.0` for the normalised Laplacian `I - D^-1/2 A D^-1/2`,
/// `sign = 1.0` for the normalised signless Laplacian `I + D^-1/2 A D^-1/2`.
///
/// A self-loop at `i` contributes `sign * A[i,i] / deg(i)` to the diagonal
/// via `D^-1/2 A D^-1/2`'s own `(i,i)` entry (`d_inv_sqrt[i] * A[i,i] *
/// d_inv_sqrt[i] = A[i,i] / deg(i)`), so the diagonal is computed from that
/// term plus `1.0` rather than hard-coded to `1.0`.
fn normalised_form(a: &Csr, n: usize, sign: f64) -> Csr {
    let d_inv_sqrt: Vec<f64> = (0..n)
        .map(|i| {
            let d = weighted_degree(a, i);
            if d > 0.0 {
                1.0 / d.sqrt()
            } else {
                0.0
            }
        })
        .collect();

    let mut rows = Vec::new();
    let mut cols = Vec::new();
    let mut vals = Vec::new();
    for i in 0..n {
        let self_loop_weight = sparse::get(a, i, i);
        rows.push(i);
        cols.push(i);
        vals.push(1.0 + sign * d_inv_sqrt[i] * self_loop_weight * d_inv_sqrt[i]);
        let row = a.row(i);
        for (&j, &w) in row.col_indices().iter().zip(row.values().iter()) {
            if j == i {
                continue;
            }
            rows.push(i);
            cols.push(j);
            vals.push(sign * d_inv_sqrt[i] * w * d_inv_sqrt[j]);
        }
    }
    sparse::from_triplets(n, n, &rows, &cols, &vals)
}

/// `A = D - L` with `D[i,i] = sum_j L[i,j]`, pruning entries below
/// [`PRUNE_EPSILON`].
fn reconstruct_adjacency_from_laplacian(l: &Csr, n: usize) -> Csr {
    let row_sums: Vec<f64> = (0..n)
        .map(|i| {
            let row = l.row(i);
            row.values().iter().sum::<f64>()
        })
        .collect();

    let mut rows = Vec::new();
    let mut cols = Vec::new();
    let mut vals = Vec::new();
    for i in 0..n {
        let row = l.row(i);
        for (&j, &lij) in row.col_indices().iter().zip(row.values().iter()) {
            let d_ij = if i == j { row_sums[i] } else { 0.0 };
            let a_ij = d_ij - lij;
            if a_ij.abs() >= PRUNE_EPSILON {
                rows.push(i);
                cols.push(j);
                vals.push(a_ij);
            }
        }
        // If L had no stored diagonal entry, A still needs the diagonal
        // contribution from D when it is non-zero.
        if !sparse::has_diagonal_entry(l, i) && row_sums[i].abs() >= PRUNE_EPSILON {
            rows.push(i);
            cols.push(i);
            vals.push(row_sums[i]);
        }
    }
    sparse::from_triplets(n, n, &rows, &cols, &vals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_graph_3() -> Graph {
        // 0 - 1 - 2, unit weights
        Graph::from_matrix(sparse::from_triplets(
            3,
            3,
            &[0, 1, 1, 2],
            &[1, 0, 2, 1],
            &[1.0, 1.0, 1.0, 1.0],
        ))
        .unwrap()
    }

    #[test]
    fn symmetry_is_enforced() {
        let bad = sparse::from_triplets(2, 2, &[0, 1], &[1, 0], &[1.0, 2.0]);
        assert!(Graph::from_matrix(bad).is_err());
    }

    #[test]
    fn degree_counts_self_loop_twice() {
        let m = sparse::from_triplets(1, 1, &[0], &[0], &[3.0]);
        let g = Graph::from_matrix(m).unwrap();
        assert_eq!(g.degree(0).unwrap(), 6.0);
        assert!(g.has_self_loops());
    }

    #[test]
    fn neighbors_excludes_self_loop() {
        let m = sparse::from_triplets(2, 2, &[0, 0, 1], &[0, 1, 0], &[5.0, 1.0, 1.0]);
        let g = Graph::from_matrix(m).unwrap();
        let nbrs = g.neighbors(0).unwrap();
        assert_eq!(nbrs.len(), 1);
        assert_eq!(nbrs[0].v, 1);
    }

    #[test]
    fn vertex_out_of_range_is_invalid_argument() {
        let g = path_graph_3();
        assert!(matches!(g.degree(10), Err(SpectralError::InvalidArgument(_))));
    }

    #[test]
    fn laplacian_roundtrip_recovers_adjacency() {
        let g = path_graph_3();
        let l = g.laplacian().clone();
        let reconstructed = Graph::from_matrix(l).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert!(
                    (sparse::get(reconstructed.adjacency(), i, j)
                        - sparse::get(g.adjacency(), i, j))
                    .abs()
                        < 1e-8
                );
            }
        }
    }

    #[test]
    fn subgraph_remaps_to_dense_range() {
        let g = path_graph_3();
        let sub = g.subgraph(&[2, 0, 2]).unwrap();
        assert_eq!(sub.number_of_vertices(), 2);
        assert_eq!(sub.number_of_edges(), 0);
    }

    #[test]
    fn disjoint_union_is_block_diagonal() {
        let g1 = path_graph_3();
        let g2 = path_graph_3();
        let u = g1.disjoint_union(&g2).unwrap();
        assert_eq!(u.number_of_vertices(), 6);
        assert_eq!(sparse::get(u.adjacency(), 0, 3), 0.0);
    }

    #[test]
    fn isolated_vertex_rejects_normalised_laplacian() {
        let m = sparse::from_triplets(2, 2, &[], &[], &[]);
        let g = Graph::from_matrix(m).unwrap();
        assert!(g.normalised_laplacian().is_err());
    }

    /// Star graph: center 0, leaves 1, 2, 3, unit weights. Non-regular
    /// (deg(0) = 3, deg(leaf) = 1), so `A D^-1` and `D^-1 A` disagree
    /// off-diagonal — this distinguishes the spec's `A D^-1` convention
    /// from the (wrong) row-degree normalisation.
    fn star_graph_4() -> Graph {
        Graph::from_matrix(sparse::from_triplets(
            4,
            4,
            &[0, 1, 0, 2, 0, 3],
            &[1, 0, 2, 0, 3, 0],
            &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
        ))
        .unwrap()
    }

    #[test]
    fn lazy_random_walk_divides_by_neighbor_degree() {
        let g = star_graph_4();
        let w = g.lazy_random_walk_matrix().unwrap();
        // (A D^-1)[0,1] = A[0,1] / deg(1) = 1 / 1 = 1; W[0,1] = 0.5.
        assert!((sparse::get(w, 0, 1) - 0.5).abs() < 1e-12);
        // (A D^-1)[1,0] = A[1,0] / deg(0) = 1 / 3; W[1,0] = 1/6.
        assert!((sparse::get(w, 1, 0) - 1.0 / 6.0).abs() < 1e-12);
        // No self-loops: every diagonal entry is the bare 0.5.
        for i in 0..4 {
            assert!((sparse::get(w, i, i) - 0.5).abs() < 1e-12);
        }
    }

    /// A single self-looped vertex: `A = [[3.0]]`, so `deg(0) = 2*3 = 6`
    /// (self-loop counted twice), isolated by the rest of this vertex's
    /// zero off-diagonal entries.
    fn self_loop_graph() -> Graph {
        Graph::from_matrix(sparse::from_triplets(1, 1, &[0], &[0], &[3.0])).unwrap()
    }

    #[test]
    fn self_loop_contributes_to_normalised_laplacian_diagonal() {
        let g = self_loop_graph();
        // 1 - A[0,0]/deg(0) = 1 - 3/6 = 0.5, not the hard-coded 1.0.
        let l_n = g.normalised_laplacian().unwrap();
        assert!((sparse::get(l_n, 0, 0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn self_loop_contributes_to_normalised_signless_laplacian_diagonal() {
        let g = self_loop_graph();
        // 1 + A[0,0]/deg(0) = 1 + 3/6 = 1.5.
        let l_n = g.normalised_signless_laplacian().unwrap();
        assert!((sparse::get(l_n, 0, 0) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn self_loop_contributes_to_lazy_random_walk_diagonal() {
        let g = self_loop_graph();
        // 0.5 * (1 + A[0,0]/deg(0)) = 0.5 * (1 + 0.5) = 0.75.
        let w = g.lazy_random_walk_matrix().unwrap();
        assert!((sparse::get(w, 0, 0) - 0.75).abs() < 1e-12);
    }
}
