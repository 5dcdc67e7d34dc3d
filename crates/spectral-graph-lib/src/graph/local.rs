//! A narrow local-access trait, factored out of [`super::Graph`] so that
//! future local algorithms (personalised PageRank, local clustering) can be
//! written against vertex-local queries without depending on the derived
//! global matrices `Graph` also exposes.

use crate::error::Result;
use crate::graph::{Edge, Graph};

/// The subset of `Graph` that a purely local graph algorithm needs: degree
/// queries and neighbor enumeration, without pulling in any of the derived
/// spectral matrices.
pub trait LocalGraph {
    fn vertex_exists(&self, v: usize) -> bool;
    fn degree(&self, v: usize) -> Result<f64>;
    fn degree_unweighted(&self, v: usize) -> Result<usize>;
    fn neighbors(&self, v: usize) -> Result<Vec<Edge>>;
    fn neighbors_unweighted(&self, v: usize) -> Result<Vec<usize>>;
    fn degrees_batch(&self, vertices: &[usize]) -> Result<Vec<f64>>;
}

impl LocalGraph for Graph {
    fn vertex_exists(&self, v: usize) -> bool {
        Graph::vertex_exists(self, v)
    }
    fn degree(&self, v: usize) -> Result<f64> {
        Graph::degree(self, v)
    }
    fn degree_unweighted(&self, v: usize) -> Result<usize> {
        Graph::degree_unweighted(self, v)
    }
    fn neighbors(&self, v: usize) -> Result<Vec<Edge>> {
        Graph::neighbors(self, v)
    }
    fn neighbors_unweighted(&self, v: usize) -> Result<Vec<usize>> {
        Graph::neighbors_unweighted(self, v)
    }
    fn degrees_batch(&self, vertices: &[usize]) -> Result<Vec<f64>> {
        Graph::degrees_batch(self, vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse;

    #[test]
    fn local_graph_trait_delegates_to_graph() {
        let g = Graph::from_matrix(sparse::from_triplets(
            2,
            2,
            &[0, 1],
            &[1, 0],
            &[2.0, 2.0],
        ))
        .unwrap();
        let local: &dyn LocalGraph = &g;
        assert_eq!(local.degree(0).unwrap(), 2.0);
        assert_eq!(local.degrees_batch(&[0, 1]).unwrap(), vec![2.0, 2.0]);
    }
}
