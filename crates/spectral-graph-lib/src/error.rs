//! Structured error taxonomy for the spectral graph kit.
//!
//! Every public operation either succeeds or fails with one of the kinds
//! below; none of them are recovered internally (construction failure
//! leaves no partially-initialised entity observable to the caller).

use thiserror::Error;

/// The crate-wide error type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpectralError {
    /// A caller-supplied argument was out of its valid domain: an out of
    /// range vertex index, an invalid `k`, a dimension mismatch, a zero
    /// vector passed to `rayleigh_quotient`, or an `epsilon` outside
    /// `(0, 1]` passed to the KDE.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An input matrix violated a structural invariant the domain model
    /// requires, such as an asymmetric adjacency matrix at `Graph`
    /// construction.
    #[error("domain error: {0}")]
    Domain(String),

    /// A filesystem or I/O boundary failed: an adjacency-list file could
    /// not be read, was malformed, or a binary search for a vertex record
    /// did not find it.
    #[error("io error: {0}")]
    Io(String),

    /// A numerical backend failed to produce a result, e.g. the iterative
    /// eigensolver did not converge within its iteration budget.
    #[error("compute error: {0}")]
    Compute(String),
}

impl SpectralError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn domain(msg: impl Into<String>) -> Self {
        Self::Domain(msg.into())
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    pub fn compute(msg: impl Into<String>) -> Self {
        Self::Compute(msg.into())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SpectralError>;
