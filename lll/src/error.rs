//! Errors returned by the reductions.

use thiserror::Error;

/// Everything that can go wrong when reducing a lattice.
///
/// Linearly dependent input is not an error, the dependencies show up in the
/// kernel of the result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LllError {
    #[error("row {row} has {found} entries but the first row has {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("a gram matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    #[error("{what}: expected {expected}, got {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("delta must satisfy 1/4 < delta < 1, got {num}/{den}")]
    InvalidDelta { num: String, den: String },

    #[error("{what} index {index} is out of range for {len} vectors")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("the gram matrix is not positive semidefinite (vector {index})")]
    NotPositiveDefinite { index: usize },

    #[error("kernel, image and dependency probes need exact input")]
    InexactKernel,

    #[error("entry ({row}, {col}) is not a finite number")]
    NonFinite { row: usize, col: usize },

    #[error("could not reduce at {precision} bits of precision after {retries} retries")]
    PrecisionExhausted { precision: u32, retries: u32 },
}

pub type Result<T> = std::result::Result<T, LllError>;
