//! Integration tests for SharedMatrix loading, snapshots and bulk transpose.

use std::sync::Arc;
use std::thread;

use shared_linalg::{ErrorKind, Orientation, SharedMatrix};

fn sample() -> Vec<Vec<f64>> {
    vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]
}

// ---------------------------------------------------------------------------
// Empty matrix
// ---------------------------------------------------------------------------

#[test]
fn empty_matrix_defaults() {
    let m = SharedMatrix::new();
    assert_eq!(m.len(), 0);
    assert!(m.is_empty());
    assert_eq!(m.orientation().unwrap(), Orientation::Row);
    let snap = m.read_row_major().unwrap();
    assert_eq!(snap.shape(), (0, 0));
    assert!(snap.to_rows().is_empty());
}

#[test]
fn empty_input_yields_empty_matrix() {
    let m = SharedMatrix::from_rows(&sample()).unwrap();
    let none: Vec<Vec<f64>> = Vec::new();

    m.load_row_major(&none).unwrap();
    assert!(m.is_empty());

    m.load_row_major(&sample()).unwrap();
    m.load_column_major(&none).unwrap();
    assert!(m.is_empty());
    assert_eq!(m.orientation().unwrap(), Orientation::Row);
}

// ---------------------------------------------------------------------------
// Loading and reading
// ---------------------------------------------------------------------------

#[test]
fn row_major_round_trip() {
    let m = SharedMatrix::new();
    m.load_row_major(&sample()).unwrap();
    assert_eq!(m.len(), 2);
    assert_eq!(m.orientation().unwrap(), Orientation::Row);
    assert_eq!(m.read_row_major().unwrap().to_rows(), sample());
}

#[test]
fn column_major_round_trip() {
    let m = SharedMatrix::new();
    m.load_column_major(&sample()).unwrap();
    assert_eq!(m.len(), 3);
    assert_eq!(m.orientation().unwrap(), Orientation::Column);
    assert_eq!(m.get(1).unwrap().to_vec().unwrap(), vec![2.0, 5.0]);
    assert_eq!(m.read_row_major().unwrap().to_rows(), sample());
}

#[test]
fn load_copies_input() {
    let mut rows = sample();
    let m = SharedMatrix::from_rows(&rows).unwrap();
    rows[0][0] = 100.0;
    assert_eq!(m.read_row_major().unwrap()[(0, 0)], 1.0);
}

#[test]
fn get_out_of_range_is_index_error() {
    let m = SharedMatrix::from_rows(&sample()).unwrap();
    let err = m.get(2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Index);
}

#[test]
fn writes_through_get_show_up_in_snapshots() {
    let m = SharedMatrix::from_rows(&sample()).unwrap();
    m.get(1).unwrap().negate().unwrap();
    assert_eq!(
        m.read_row_major().unwrap().to_rows(),
        vec![vec![1.0, 2.0, 3.0], vec![-4.0, -5.0, -6.0]]
    );
}

#[test]
fn vector_transposed_through_get_breaks_snapshot() {
    let m = SharedMatrix::from_rows(&sample()).unwrap();
    m.get(1).unwrap().transpose().unwrap();
    let err = m.read_row_major().unwrap_err();
    assert!(err.is_dimension_mismatch());
}

// ---------------------------------------------------------------------------
// Bulk transpose
// ---------------------------------------------------------------------------

#[test]
fn transpose_reads_back_transposed() {
    let m = SharedMatrix::from_rows(&sample()).unwrap();
    m.transpose().unwrap();
    assert_eq!(m.orientation().unwrap(), Orientation::Column);
    assert_eq!(
        m.read_row_major().unwrap().to_rows(),
        vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]]
    );
}

// ---------------------------------------------------------------------------
// Concurrent loads
// ---------------------------------------------------------------------------

#[test]
fn snapshots_never_mix_old_and_new_sequences() {
    let ones = vec![vec![1.0; 4]; 4];
    let twos = vec![vec![2.0; 4]; 4];
    let m = Arc::new(SharedMatrix::from_rows(&ones).unwrap());

    let writer = {
        let m = Arc::clone(&m);
        thread::spawn(move || {
            for i in 0..500 {
                if i % 2 == 0 {
                    m.load_row_major(&twos).unwrap();
                } else {
                    m.load_column_major(&ones).unwrap();
                }
            }
        })
    };

    for _ in 0..500 {
        let snap = m.read_row_major().unwrap();
        assert_eq!(snap.shape(), (4, 4));
        let first = snap[(0, 0)];
        assert!(snap.as_slice().iter().all(|&x| x == first));
    }
    writer.join().unwrap();
}
