mod common;

use common::{assert_f64_near, make_tensor};
use softnet_core::{Tensor1D, Tensor2D, TensorError};

#[test]
fn matmul_2x2_known_product() {
    // [[1,2],[3,4]] * [[5,6],[7,8]] = [[19,22],[43,50]]
    let a = make_tensor(2, 2, &[1.0, 2.0, 3.0, 4.0]);
    let b = make_tensor(2, 2, &[5.0, 6.0, 7.0, 8.0]);
    let c = a.matmul(&b).unwrap();
    assert_eq!(c.shape(), (2, 2));
    assert_f64_near(c.as_slice(), &[19.0, 22.0, 43.0, 50.0], 1e-12, "2x2 matmul");
}

#[test]
fn matmul_shape_mismatch_returns_error() {
    let a = make_tensor(2, 3, &[0.0; 6]);
    let b = make_tensor(4, 2, &[0.0; 8]);
    let result = a.matmul(&b);
    assert!(
        matches!(result, Err(TensorError::ShapeMismatch { .. })),
        "Expected shape mismatch error for [2,3]*[4,2]"
    );
}

#[test]
fn transpose_a_is_backprop_through_weights() {
    // dX = W^T · dS for W [2, 3] and dS [2, 1]
    let w = make_tensor(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let ds = make_tensor(2, 1, &[1.0, -1.0]);
    let dx = w.matmul_transpose_a(&ds).unwrap();
    assert_eq!(dx.shape(), (3, 1));
    assert_f64_near(dx.as_slice(), &[-3.0, -3.0, -3.0], 1e-12, "W^T dS");
}

#[test]
fn transpose_b_is_weight_gradient() {
    // dW = dS · X^T for dS [2, 2] and X [3, 2]
    let ds = make_tensor(2, 2, &[1.0, 0.0, 0.0, 1.0]);
    let x = make_tensor(3, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let dw = ds.matmul_transpose_b(&x).unwrap();
    assert_eq!(dw.shape(), (2, 3));
    assert_f64_near(dw.as_slice(), &[1.0, 3.0, 5.0, 2.0, 4.0, 6.0], 1e-12, "dS X^T");
}

#[test]
fn softmax_pipeline_end_to_end() {
    let mut s = make_tensor(3, 2, &[1.0, 0.0, 2.0, 0.0, 3.0, 0.0]);
    s.shift_and_exp_and_normalize();

    let z: f64 = (1.0f64).exp() + (2.0f64).exp() + (3.0f64).exp();
    let expected_col0 = [
        (1.0f64).exp() / z,
        (2.0f64).exp() / z,
        (3.0f64).exp() / z,
    ];
    assert_f64_near(s.column(0).as_slice(), &expected_col0, 1e-12, "column 0");
    assert_f64_near(s.column(1).as_slice(), &[1.0 / 3.0; 3], 1e-12, "column 1");

    let loss = s.cross_entropy_loss(&[2, 0]).unwrap();
    assert_f64_near(
        loss.as_slice(),
        &[-expected_col0[2].ln(), (3.0f64).ln()],
        1e-12,
        "cross entropy",
    );
}

#[test]
fn activation_over_batch_equals_per_example() {
    let w = make_tensor(2, 3, &[0.1, 0.2, 0.3, -0.4, 0.5, -0.6]);
    let b = Tensor1D::from_vec(vec![1.0, -1.0]);
    let x = make_tensor(3, 2, &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);

    let batch = Tensor2D::activation(&w, &x, &b).unwrap();
    for c in 0..2 {
        let single = x.columns(c, c + 1).unwrap();
        let one = Tensor2D::activation(&w, &single, &b).unwrap();
        assert_f64_near(
            one.as_slice(),
            batch.column(c).as_slice(),
            1e-12,
            "single vs batch",
        );
    }
}

#[test]
fn l2_norm_is_sum_of_squares() {
    let w = make_tensor(2, 2, &[1.0, -2.0, 3.0, -4.0]);
    assert_eq!(w.l2_norm(), 30.0);
}
