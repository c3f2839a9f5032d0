#![allow(dead_code)]

use softnet_nn::{Classifier, Network};

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
            "{}: element [{}] mismatch: actual={}, expected={}, diff={}",
            msg,
            i,
            a,
            e,
            (a - e).abs()
        );
    }
}

/// Every weight and bias value of `network`, layer by layer.
pub fn flat_parameters(network: &Network) -> Vec<f64> {
    network
        .layers()
        .iter()
        .flat_map(|l| {
            l.weights()
                .as_slice()
                .iter()
                .chain(l.bias().as_slice())
                .copied()
                .collect::<Vec<_>>()
        })
        .collect()
}

pub fn weights_of(classifier: &Classifier) -> Vec<f64> {
    flat_parameters(classifier.network())
}
