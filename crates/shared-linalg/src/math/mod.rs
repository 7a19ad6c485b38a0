//! Shared vectors and matrices with per-vector reader/writer locking.
//!
//! [`SharedVector`] owns its buffer behind one `RwLock`. [`SharedMatrix`] is a
//! swappable sequence of such vectors with no lock of its own over their
//! contents. Whenever several vector locks are needed at once they are taken
//! through the `ordering` module, in ascending [`VectorId`] order.
pub mod matrix;
pub(crate) mod ordering;
pub mod orientation;
pub mod snapshot;
pub mod vector;

pub use matrix::SharedMatrix;
pub use orientation::Orientation;
pub use snapshot::MatrixSnapshot;
pub use vector::{SharedVector, VectorId};
