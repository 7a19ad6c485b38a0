use std::fmt;
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{LinalgError, Result};
use crate::math::ordering::lock_pair;
use crate::math::{MatrixSnapshot, Orientation, SharedMatrix};

static NEXT_VECTOR_ID: AtomicU64 = AtomicU64::new(0);

/// Creation sequence number of a [`SharedVector`].
///
/// Ids are unique for the life of the process and define the order in which
/// vector locks are acquired whenever more than one is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VectorId(u64);

impl VectorId {
    fn next() -> Self {
        VectorId(NEXT_VECTOR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for VectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Debug)]
pub(crate) struct VectorState {
    pub(crate) elements: Vec<f64>,
    pub(crate) orientation: Orientation,
}

/// A numeric vector guarded by its own reader/writer lock.
///
/// Every accessor takes the lock for the duration of the call. Operations
/// involving two vectors lock them in [`VectorId`] order, never in argument
/// order, so `a.add(&b)` racing `b.add(&a)` cannot deadlock.
#[derive(Debug)]
pub struct SharedVector {
    id: VectorId,
    state: RwLock<VectorState>,
}

impl SharedVector {
    /// Creates a vector holding a copy of `elements`.
    pub fn new(elements: &[f64], orientation: Orientation) -> Self {
        Self::from_vec(elements.to_vec(), orientation)
    }

    pub fn from_vec(elements: Vec<f64>, orientation: Orientation) -> Self {
        Self {
            id: VectorId::next(),
            state: RwLock::new(VectorState {
                elements,
                orientation,
            }),
        }
    }

    pub fn id(&self) -> VectorId {
        self.id
    }

    pub(crate) fn read_state(&self) -> Result<RwLockReadGuard<'_, VectorState>> {
        self.state
            .read()
            .map_err(|_| LinalgError::Poisoned { what: "vector" })
    }

    pub(crate) fn write_state(&self) -> Result<RwLockWriteGuard<'_, VectorState>> {
        self.state
            .write()
            .map_err(|_| LinalgError::Poisoned { what: "vector" })
    }

    pub fn get(&self, index: usize) -> Result<f64> {
        let state = self.read_state()?;
        state
            .elements
            .get(index)
            .copied()
            .ok_or(LinalgError::IndexOutOfBounds {
                index,
                len: state.elements.len(),
            })
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read_state()?.elements.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn orientation(&self) -> Result<Orientation> {
        Ok(self.read_state()?.orientation)
    }

    /// Copies the current elements out under the read lock.
    pub fn to_vec(&self) -> Result<Vec<f64>> {
        Ok(self.read_state()?.elements.clone())
    }

    /// Flips the orientation in place; elements are untouched.
    pub fn transpose(&self) -> Result<()> {
        let mut state = self.write_state()?;
        state.orientation = state.orientation.transposed();
        Ok(())
    }

    pub fn negate(&self) -> Result<()> {
        let mut state = self.write_state()?;
        state.elements.iter_mut().for_each(|x| *x = -*x);
        Ok(())
    }

    /// Adds `other` into `self` element-wise.
    ///
    /// Orientation is not checked; only lengths must agree. On a length
    /// mismatch neither operand is modified.
    pub fn add(&self, other: &SharedVector) -> Result<()> {
        if ptr::eq(self, other) {
            let mut state = self.write_state()?;
            state.elements.iter_mut().for_each(|x| *x += *x);
            return Ok(());
        }

        let mut pair = lock_pair(
            self.id,
            || self.write_state(),
            other.id,
            || other.read_state(),
        )?;
        let (this, that) = pair.split_mut();
        if this.elements.len() != that.elements.len() {
            return Err(LinalgError::LengthMismatch {
                op: "add",
                left: this.elements.len(),
                right: that.elements.len(),
            });
        }
        for (x, y) in this.elements.iter_mut().zip(that.elements.iter()) {
            *x += *y;
        }
        Ok(())
    }

    /// Row-by-column contraction: lengths must match and the orientations
    /// must differ.
    pub fn dot(&self, other: &SharedVector) -> Result<f64> {
        if ptr::eq(self, other) {
            let state = self.read_state()?;
            return Err(LinalgError::OrientationMismatch {
                op: "dot",
                expected: state.orientation.transposed(),
                found: state.orientation,
            });
        }

        let pair = lock_pair(
            self.id,
            || self.read_state(),
            other.id,
            || other.read_state(),
        )?;
        let (this, that) = (pair.left(), pair.right());
        if this.elements.len() != that.elements.len() {
            return Err(LinalgError::LengthMismatch {
                op: "dot",
                left: this.elements.len(),
                right: that.elements.len(),
            });
        }
        if this.orientation == that.orientation {
            return Err(LinalgError::OrientationMismatch {
                op: "dot",
                expected: this.orientation.transposed(),
                found: that.orientation,
            });
        }
        let product: f64 = this
            .elements
            .iter()
            .zip(that.elements.iter())
            .map(|(a, b)| a * b)
            .sum();
        Ok(product)
    }

    /// Replaces `self` with the row-vector product `self × matrix`.
    ///
    /// The matrix is snapshotted before `self` is write-locked, so `self` may
    /// itself be one of the matrix's vectors.
    pub fn vec_mat_mul(&self, matrix: &SharedMatrix) -> Result<()> {
        let snapshot = matrix.read_row_major()?;
        self.vec_mat_mul_snapshot(&snapshot)
    }

    /// Same as [`vec_mat_mul`](Self::vec_mat_mul) against an already
    /// materialized matrix. The buffer is only replaced once the product has
    /// been fully computed.
    pub fn vec_mat_mul_snapshot(&self, matrix: &MatrixSnapshot) -> Result<()> {
        let mut state = self.write_state()?;
        if !state.orientation.is_row() {
            return Err(LinalgError::OrientationMismatch {
                op: "vec_mat_mul",
                expected: Orientation::Row,
                found: state.orientation,
            });
        }
        if state.elements.len() != matrix.nrows() {
            return Err(LinalgError::LengthMismatch {
                op: "vec_mat_mul",
                left: state.elements.len(),
                right: matrix.nrows(),
            });
        }

        let mut result = vec![0.0; matrix.ncols()];
        for (row, &scalar) in state.elements.iter().enumerate() {
            for (acc, value) in result.iter_mut().zip(matrix.row(row)) {
                *acc += scalar * value;
            }
        }
        state.elements = result;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increase_with_creation() {
        let a = SharedVector::new(&[], Orientation::Row);
        let b = SharedVector::new(&[], Orientation::Row);
        assert!(a.id() < b.id());
    }

    #[test]
    fn constructor_copies_input() {
        let mut input = vec![1.0, 2.0];
        let v = SharedVector::new(&input, Orientation::Row);
        input[0] = 99.0;
        assert_eq!(v.get(0).unwrap(), 1.0);
    }

    #[test]
    fn self_add_doubles() {
        let v = SharedVector::new(&[1.0, -2.5], Orientation::Column);
        v.add(&v).unwrap();
        assert_eq!(v.to_vec().unwrap(), vec![2.0, -5.0]);
    }

    #[test]
    fn self_dot_is_rejected() {
        let v = SharedVector::new(&[1.0, 2.0], Orientation::Row);
        let err = v.dot(&v).unwrap_err();
        assert!(err.is_dimension_mismatch());
    }

    #[test]
    fn poisoned_lock_reports_interrupted() {
        use crate::error::ErrorKind;
        use std::sync::Arc;

        let v = Arc::new(SharedVector::new(&[1.0], Orientation::Row));
        let holder = Arc::clone(&v);
        let _ = std::thread::spawn(move || {
            let _guard = holder.write_state().unwrap();
            panic!("holder panics with the write lock held");
        })
        .join();

        let err = v.get(0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Interrupted);
    }
}
