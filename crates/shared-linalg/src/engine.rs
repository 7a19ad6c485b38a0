//! Whole-matrix operations executed as per-vector tasks on a worker pool.
//!
//! The engine never locks a matrix as a unit. Each task goes through the
//! public [`SharedVector`] API, so tasks may interleave freely with other
//! threads touching the same vectors.

use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::EngineConfig;
use crate::error::{LinalgError, Result};
use crate::math::{Orientation, SharedMatrix, SharedVector};

pub struct LinearAlgebraEngine {
    pool: ThreadPool,
    config: EngineConfig,
}

impl LinearAlgebraEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let prefix = config.thread_name_prefix.clone();
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(move |index| format!("{}-{}", prefix, index))
            .build()?;
        log::debug!(
            "linear algebra engine started with {} workers",
            pool.current_num_threads()
        );
        Ok(Self { pool, config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of worker threads actually running.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs `task` once per vector on the pool and returns the first error.
    fn for_each_vector<F>(&self, vectors: &[Arc<SharedVector>], task: F) -> Result<()>
    where
        F: Fn(usize, &SharedVector) -> Result<()> + Send + Sync,
    {
        self.pool.install(|| {
            vectors
                .par_iter()
                .enumerate()
                .try_for_each(|(index, vector)| task(index, vector.as_ref()))
        })
    }

    /// `left += right`, vector by vector. Both matrices must hold the same
    /// number of vectors with the same orientation.
    pub fn add(&self, left: &SharedMatrix, right: &SharedMatrix) -> Result<()> {
        let lhs = left.vectors();
        let rhs = right.vectors();
        if lhs.len() != rhs.len() {
            return Err(LinalgError::LengthMismatch {
                op: "matrix add",
                left: lhs.len(),
                right: rhs.len(),
            });
        }
        let (left_orientation, right_orientation) = (left.orientation()?, right.orientation()?);
        if left_orientation != right_orientation {
            return Err(LinalgError::OrientationMismatch {
                op: "matrix add",
                expected: left_orientation,
                found: right_orientation,
            });
        }

        // Validate every pair up front so a failure changes nothing.
        for (index, (l, r)) in lhs.iter().zip(rhs.iter()).enumerate() {
            let (left_len, right_len) = (l.len()?, r.len()?);
            if left_len != right_len {
                log::debug!("matrix add rejected at vector {}", index);
                return Err(LinalgError::LengthMismatch {
                    op: "matrix add",
                    left: left_len,
                    right: right_len,
                });
            }
        }

        log::debug!("dispatching {} vector additions", lhs.len());
        self.for_each_vector(&lhs, |index, vector| vector.add(&rhs[index]))
    }

    pub fn negate(&self, matrix: &SharedMatrix) -> Result<()> {
        let vectors = matrix.vectors();
        log::debug!("dispatching {} vector negations", vectors.len());
        self.for_each_vector(&vectors, |_, vector| vector.negate())
    }

    /// `left = left × right`. `left` must be row-oriented; every row is
    /// multiplied against one shared snapshot of `right`.
    pub fn multiply(&self, left: &SharedMatrix, right: &SharedMatrix) -> Result<()> {
        let orientation = left.orientation()?;
        if !orientation.is_row() {
            return Err(LinalgError::OrientationMismatch {
                op: "matrix multiply",
                expected: Orientation::Row,
                found: orientation,
            });
        }

        let snapshot = right.read_row_major()?;
        let rows = left.vectors();
        for row in rows.iter() {
            let found = row.orientation()?;
            if !found.is_row() {
                return Err(LinalgError::OrientationMismatch {
                    op: "matrix multiply",
                    expected: Orientation::Row,
                    found,
                });
            }
            let width = row.len()?;
            if width != snapshot.nrows() {
                return Err(LinalgError::LengthMismatch {
                    op: "matrix multiply",
                    left: width,
                    right: snapshot.nrows(),
                });
            }
        }

        log::debug!(
            "dispatching {} row products against a {}x{} matrix",
            rows.len(),
            snapshot.nrows(),
            snapshot.ncols()
        );
        self.for_each_vector(&rows, |_, row| row.vec_mat_mul_snapshot(&snapshot))
    }

    pub fn transpose(&self, matrix: &SharedMatrix) -> Result<()> {
        matrix.transpose()
    }
}
