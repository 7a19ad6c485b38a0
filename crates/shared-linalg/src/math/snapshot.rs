use std::fmt;
use std::ops::Index;

/// Dense row-major copy of a matrix, detached from any lock.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatrixSnapshot {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl MatrixSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// `data.len()` must equal `rows * cols`.
    pub(crate) fn from_parts(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Self { data, rows, cols }
    }

    pub fn nrows(&self) -> usize {
        self.rows
    }

    pub fn ncols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    fn offset(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let start = self.offset(row, 0);
        &self.data[start..start + self.cols]
    }

    pub fn column(&self, col: usize) -> Vec<f64> {
        assert!(col < self.cols, "column index out of bounds");
        (0..self.rows).map(|row| self[(row, col)]).collect()
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.rows).map(|row| self.row(row).to_vec()).collect()
    }
}

impl Index<(usize, usize)> for MatrixSnapshot {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        assert!(index.1 < self.cols, "column index out of bounds");
        let offset = self.offset(index.0, index.1);
        &self.data[offset]
    }
}

impl fmt::Display for MatrixSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for row in 0..self.rows {
            write!(f, "[")?;
            for (idx, value) in self.row(row).iter().enumerate() {
                write!(f, "{}", value)?;
                if idx + 1 != self.cols {
                    write!(f, ", ")?;
                }
            }
            write!(f, "]")?;
            if row + 1 != self.rows {
                write!(f, ", ")?;
            }
        }
        write!(f, "]")
    }
}
