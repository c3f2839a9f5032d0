#![allow(dead_code)]

use softnet_core::Tensor2D;

/// Assert that two f64 slices are element-wise close within a tolerance.
pub fn assert_f64_near(actual: &[f64], expected: &[f64], tolerance: f64, msg: &str) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "{}: length mismatch (actual={}, expected={})",
        msg,
        actual.len(),
        expected.len()
    );
    for (i, (&a, &e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert!(
            (a - e).abs() <= tolerance,
            "{}: element [{}] mismatch: actual={}, expected={}, diff={}, tolerance={}",
            msg,
            i,
            a,
            e,
            (a - e).abs(),
            tolerance
        );
    }
}

/// Build a tensor from row-major values.
pub fn make_tensor(rows: usize, cols: usize, data: &[f64]) -> Tensor2D {
    Tensor2D::from_vec(rows, cols, data.to_vec()).unwrap()
}

/// Naive triple-loop `W·X + b`.
pub fn naive_activation(w: &Tensor2D, x: &Tensor2D, b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; w.rows() * x.cols()];
    for i in 0..w.rows() {
        for j in 0..x.cols() {
            let mut acc = 0.0;
            for p in 0..w.cols() {
                acc += w.get(i, p) * x.get(p, j);
            }
            out[i * x.cols() + j] = acc + b[i];
        }
    }
    out
}
