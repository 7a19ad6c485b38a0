//! Error types for shared vector and matrix operations.

use crate::math::Orientation;

pub type Result<T> = std::result::Result<T, LinalgError>;

/// Coarse classification of a [`LinalgError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An element or vector index outside the valid range.
    Index,
    /// Operand lengths or orientations that do not fit the operation.
    DimensionMismatch,
    /// A lock wait that could not complete because its holder panicked.
    Interrupted,
    /// The worker pool could not be created.
    Engine,
}

/// Errors raised by [`SharedVector`](crate::math::SharedVector),
/// [`SharedMatrix`](crate::math::SharedMatrix) and the engine.
#[derive(Debug, thiserror::Error)]
pub enum LinalgError {
    #[error("index {index} is out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("{op}: length mismatch ({left} vs {right})")]
    LengthMismatch {
        op: &'static str,
        left: usize,
        right: usize,
    },

    #[error("{op}: expected {expected} orientation, found {found}")]
    OrientationMismatch {
        op: &'static str,
        expected: Orientation,
        found: Orientation,
    },

    /// Input rows for a matrix load are not all the same width.
    #[error("row {row} has {found} elements, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("lock on {what} was poisoned by a panicking holder")]
    Poisoned { what: &'static str },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl LinalgError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LinalgError::IndexOutOfBounds { .. } => ErrorKind::Index,
            LinalgError::LengthMismatch { .. }
            | LinalgError::OrientationMismatch { .. }
            | LinalgError::RaggedRows { .. } => ErrorKind::DimensionMismatch,
            LinalgError::Poisoned { .. } => ErrorKind::Interrupted,
            LinalgError::ThreadPool(_) => ErrorKind::Engine,
        }
    }

    pub fn is_dimension_mismatch(&self) -> bool {
        self.kind() == ErrorKind::DimensionMismatch
    }
}
