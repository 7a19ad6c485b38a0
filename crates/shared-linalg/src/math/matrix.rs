use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{LinalgError, Result};
use crate::math::ordering::{read_all, write_all};
use crate::math::{MatrixSnapshot, Orientation, SharedVector};

type VectorSeq = Arc<[Arc<SharedVector>]>;

/// A matrix stored as a sequence of independently locked vectors.
///
/// The matrix has no lock over its contents. The sequence itself is
/// immutable once built: loads construct a new sequence and swap the pointer,
/// so a reader works on either the old or the new sequence in full. The
/// `RwLock` around the pointer is only held for that clone or swap.
#[derive(Debug)]
pub struct SharedMatrix {
    vectors: RwLock<VectorSeq>,
}

impl Default for SharedMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedMatrix {
    pub fn new() -> Self {
        Self {
            vectors: RwLock::new(Arc::from(Vec::new())),
        }
    }

    /// Builds a row-oriented matrix from a copy of `rows`.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let matrix = Self::new();
        matrix.load_row_major(rows)?;
        Ok(matrix)
    }

    fn current(&self) -> VectorSeq {
        // A poisoned pointer lock still holds a complete sequence.
        Arc::clone(&self.vectors.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn install(&self, vectors: Vec<Arc<SharedVector>>) {
        let vectors: VectorSeq = Arc::from(vectors);
        *self.vectors.write().unwrap_or_else(PoisonError::into_inner) = vectors;
    }

    /// Replaces the contents with one row vector per input row.
    ///
    /// Fails without touching the matrix if the rows differ in width.
    pub fn load_row_major<R: AsRef<[f64]>>(&self, rows: &[R]) -> Result<()> {
        let width = check_rectangular(rows)?;
        let vectors: Vec<Arc<SharedVector>> = rows
            .iter()
            .map(|row| Arc::new(SharedVector::new(row.as_ref(), Orientation::Row)))
            .collect();
        log::debug!("loading {}x{} matrix row-major", rows.len(), width);
        self.install(vectors);
        Ok(())
    }

    /// Replaces the contents with one column vector per input column.
    pub fn load_column_major<R: AsRef<[f64]>>(&self, rows: &[R]) -> Result<()> {
        let width = check_rectangular(rows)?;
        let vectors: Vec<Arc<SharedVector>> = (0..width)
            .map(|col| {
                let column: Vec<f64> = rows.iter().map(|row| row.as_ref()[col]).collect();
                Arc::new(SharedVector::from_vec(column, Orientation::Column))
            })
            .collect();
        log::debug!("loading {}x{} matrix column-major", rows.len(), width);
        self.install(vectors);
        Ok(())
    }

    /// Materializes the matrix in row-major order, whatever its orientation.
    ///
    /// All vector read locks are held together while copying, so the result
    /// reflects one consistent state of every vector.
    pub fn read_row_major(&self) -> Result<MatrixSnapshot> {
        let vectors = self.current();
        if vectors.is_empty() {
            return Ok(MatrixSnapshot::empty());
        }

        let guards = read_all(&vectors)?;
        let orientation = guards.get(0).orientation;
        let width = guards.get(0).elements.len();
        for (index, state) in guards.iter().enumerate() {
            if state.orientation != orientation {
                return Err(LinalgError::OrientationMismatch {
                    op: "read_row_major",
                    expected: orientation,
                    found: state.orientation,
                });
            }
            if state.elements.len() != width {
                return Err(LinalgError::RaggedRows {
                    row: index,
                    expected: width,
                    found: state.elements.len(),
                });
            }
        }

        let count = guards.len();
        let snapshot = match orientation {
            Orientation::Row => {
                let mut data = Vec::with_capacity(count * width);
                for index in 0..count {
                    data.extend_from_slice(&guards.get(index).elements);
                }
                MatrixSnapshot::from_parts(count, width, data)
            }
            Orientation::Column => {
                let mut data = Vec::with_capacity(count * width);
                for row in 0..width {
                    for col in 0..count {
                        data.push(guards.get(col).elements[row]);
                    }
                }
                MatrixSnapshot::from_parts(width, count, data)
            }
        };
        drop(guards);
        Ok(snapshot)
    }

    /// Returns the vector at `index`. The vector stays shared with the
    /// matrix; writes through it are visible to later snapshots.
    pub fn get(&self, index: usize) -> Result<Arc<SharedVector>> {
        let vectors = self.current();
        vectors
            .get(index)
            .cloned()
            .ok_or(LinalgError::IndexOutOfBounds {
                index,
                len: vectors.len(),
            })
    }

    /// Number of installed vectors.
    pub fn len(&self) -> usize {
        self.current().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Orientation of the first vector, or [`Orientation::Row`] when empty.
    pub fn orientation(&self) -> Result<Orientation> {
        match self.current().first() {
            Some(vector) => vector.orientation(),
            None => Ok(Orientation::Row),
        }
    }

    /// The current vectors, in order.
    pub fn vectors(&self) -> Vec<Arc<SharedVector>> {
        self.current().to_vec()
    }

    /// Flips the orientation of every vector while holding all of their
    /// write locks, so no snapshot observes a half-transposed matrix.
    pub fn transpose(&self) -> Result<()> {
        let vectors = self.current();
        let mut guards = write_all(&vectors)?;
        for index in 0..guards.len() {
            let state = guards.get_mut(index);
            state.orientation = state.orientation.transposed();
        }
        Ok(())
    }
}

/// Returns the common row width, or 0 for no rows.
fn check_rectangular<R: AsRef<[f64]>>(rows: &[R]) -> Result<usize> {
    let width = rows.first().map_or(0, |row| row.as_ref().len());
    for (index, row) in rows.iter().enumerate() {
        let found = row.as_ref().len();
        if found != width {
            return Err(LinalgError::RaggedRows {
                row: index,
                expected: width,
                found,
            });
        }
    }
    Ok(width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_swaps_whole_sequence() {
        let matrix = SharedMatrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let old_row = matrix.get(0).unwrap();

        matrix.load_row_major(&[[9.0, 9.0, 9.0]]).unwrap();
        assert_eq!(matrix.len(), 1);
        // The detached vector keeps its own data.
        assert_eq!(old_row.to_vec().unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn ragged_input_leaves_matrix_unchanged() {
        let matrix = SharedMatrix::from_rows(&[[1.0, 2.0]]).unwrap();
        let ragged: Vec<Vec<f64>> = vec![vec![1.0, 2.0], vec![3.0]];

        let err = matrix.load_row_major(&ragged).unwrap_err();
        assert!(err.is_dimension_mismatch());
        let err = matrix.load_column_major(&ragged).unwrap_err();
        assert!(err.is_dimension_mismatch());

        assert_eq!(matrix.read_row_major().unwrap().to_rows(), vec![vec![1.0, 2.0]]);
    }

    #[test]
    fn column_load_of_zero_width_rows_is_empty() {
        let matrix = SharedMatrix::new();
        let rows: Vec<Vec<f64>> = vec![vec![], vec![]];
        matrix.load_column_major(&rows).unwrap();
        assert!(matrix.is_empty());
    }

    #[test]
    fn snapshot_rejects_vector_resized_through_get() {
        let matrix = SharedMatrix::from_rows(&[[1.0, 0.0], [0.0, 1.0]]).unwrap();
        let wide = SharedMatrix::from_rows(&[[1.0, 1.0, 1.0], [1.0, 1.0, 1.0]]).unwrap();
        matrix.get(0).unwrap().vec_mat_mul(&wide).unwrap();

        let err = matrix.read_row_major().unwrap_err();
        assert!(matches!(err, LinalgError::RaggedRows { row: 1, .. }));
    }
}
