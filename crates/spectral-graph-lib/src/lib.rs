//! Spectral toolkit for the analysis of massive graphs.
//!
//! Two independent components share one crate: a graph spectral engine
//! (adjacency/Laplacian algebra plus a partial Hermitian eigensolver) and a
//! sublinear-time CKNS Gaussian kernel density estimator. Both operate on
//! the same sparse/dense numeric substrate (`nalgebra`/`nalgebra-sparse`)
//! but have no structural dependency on one another.

pub mod error;
pub mod graph;
pub mod kde;
pub mod rng;
pub mod sparse;
pub mod spectrum;

pub use error::{Result, SpectralError};
pub use graph::Graph;
pub use kde::{CknsKde, ExactGaussianKde};
pub use rng::RngHandle;
pub use spectrum::{power_method, power_method_default, MatrixSelector, SortRule};
