//! shared-linalg: vectors and matrices that many threads can read and mutate.
//!
//! Each [`SharedVector`](math::SharedVector) carries its own reader/writer
//! lock, and a [`SharedMatrix`](math::SharedMatrix) is a sequence of such
//! vectors with no coarse lock over their contents. Operations that need
//! several vector locks at once acquire them in a single global order (the
//! vectors' creation ids), so pairwise `add`/`dot` and whole-matrix snapshots
//! cannot deadlock against each other.
//!
//! The [`engine`] module runs whole-matrix operations as per-vector tasks on a
//! rayon pool. Logging goes through the `log` facade; the crate never installs
//! a logger itself.
pub mod config;
pub mod engine;
pub mod error;
pub mod math;

pub use config::EngineConfig;
pub use engine::LinearAlgebraEngine;
pub use error::{ErrorKind, LinalgError, Result};
pub use math::{MatrixSnapshot, Orientation, SharedMatrix, SharedVector, VectorId};
