//! Error types for kirchhoff-solver.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// No non-zero pivot exists for an elimination column.
    #[error("singular system: no pivot for unknown {unknown}")]
    SingularSystem { unknown: String },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A coefficient in the solution is NaN or infinite.
    #[error("non-finite coefficient in solution for {unknown}")]
    NonFinite { unknown: String },
}

impl From<Error> for kirchhoff_core::Error {
    fn from(e: Error) -> Self {
        kirchhoff_core::Error::Solver(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
