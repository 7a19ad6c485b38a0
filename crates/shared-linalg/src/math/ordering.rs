//! Lock acquisition in identity order.
//!
//! Every place that holds more than one vector lock at a time goes through
//! this module. Locks are always taken in ascending [`VectorId`] order and
//! released in the exact reverse order, whether the caller returns normally,
//! bails out with `?`, or unwinds. Pairs (`add`, `dot`) and whole matrices
//! (snapshots, bulk transpose) share the same order, so no combination of
//! them can form a wait cycle.

use std::sync::{Arc, RwLockReadGuard, RwLockWriteGuard};

use crate::error::Result;
use crate::math::vector::{SharedVector, VectorId, VectorState};

/// Two guards held together. `left`/`right` name the caller's roles, not the
/// order in which the locks were taken.
pub(crate) struct PairGuard<L, R> {
    left: Option<L>,
    right: Option<R>,
    left_first: bool,
}

impl<L, R> PairGuard<L, R> {
    pub(crate) fn left(&self) -> &L {
        self.left.as_ref().expect("pair guard already released")
    }

    pub(crate) fn right(&self) -> &R {
        self.right.as_ref().expect("pair guard already released")
    }

    /// Mutable access to the left guard alongside shared access to the right.
    pub(crate) fn split_mut(&mut self) -> (&mut L, &R) {
        match (self.left.as_mut(), self.right.as_ref()) {
            (Some(left), Some(right)) => (left, right),
            _ => panic!("pair guard already released"),
        }
    }
}

impl<L, R> Drop for PairGuard<L, R> {
    fn drop(&mut self) {
        if self.left_first {
            drop(self.right.take());
            drop(self.left.take());
        } else {
            drop(self.left.take());
            drop(self.right.take());
        }
    }
}

/// Acquires two locks belonging to distinct vectors, lower id first.
///
/// If the second acquisition fails the first guard is dropped before the
/// error is returned.
pub(crate) fn lock_pair<L, R>(
    left_id: VectorId,
    acquire_left: impl FnOnce() -> Result<L>,
    right_id: VectorId,
    acquire_right: impl FnOnce() -> Result<R>,
) -> Result<PairGuard<L, R>> {
    debug_assert_ne!(left_id, right_id, "lock_pair needs two distinct vectors");
    if left_id < right_id {
        let left = acquire_left()?;
        let right = acquire_right()?;
        Ok(PairGuard {
            left: Some(left),
            right: Some(right),
            left_first: true,
        })
    } else {
        let right = acquire_right()?;
        let left = acquire_left()?;
        Ok(PairGuard {
            left: Some(left),
            right: Some(right),
            left_first: false,
        })
    }
}

/// One guard per vector of a sequence, addressable by the vector's position.
pub(crate) struct BulkGuard<G> {
    guards: Vec<Option<G>>,
    /// Positions in acquisition order.
    order: Vec<usize>,
}

impl<G> BulkGuard<G> {
    pub(crate) fn len(&self) -> usize {
        self.guards.len()
    }

    pub(crate) fn get(&self, index: usize) -> &G {
        self.guards[index]
            .as_ref()
            .expect("bulk guard slot not acquired")
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> &mut G {
        self.guards[index]
            .as_mut()
            .expect("bulk guard slot not acquired")
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &G> {
        self.guards.iter().flatten()
    }
}

impl<G> Drop for BulkGuard<G> {
    fn drop(&mut self) {
        while let Some(index) = self.order.pop() {
            drop(self.guards[index].take());
        }
    }
}

fn acquire_all<'a, G>(
    vectors: &'a [Arc<SharedVector>],
    acquire: impl Fn(&'a SharedVector) -> Result<G>,
) -> Result<BulkGuard<G>> {
    let mut order: Vec<usize> = (0..vectors.len()).collect();
    order.sort_by_key(|&index| vectors[index].id());

    let mut bulk = BulkGuard {
        guards: vectors.iter().map(|_| None).collect(),
        order: Vec::with_capacity(vectors.len()),
    };
    log::trace!("acquiring {} vector locks in id order", vectors.len());
    for index in order {
        // On error `bulk` drops here and releases what it already holds.
        let guard = acquire(vectors[index].as_ref())?;
        bulk.guards[index] = Some(guard);
        bulk.order.push(index);
    }
    Ok(bulk)
}

pub(crate) fn read_all(
    vectors: &[Arc<SharedVector>],
) -> Result<BulkGuard<RwLockReadGuard<'_, VectorState>>> {
    acquire_all(vectors, |vector| vector.read_state())
}

pub(crate) fn write_all(
    vectors: &[Arc<SharedVector>],
) -> Result<BulkGuard<RwLockWriteGuard<'_, VectorState>>> {
    acquire_all(vectors, |vector| vector.write_state())
}
