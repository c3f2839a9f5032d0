//! Deterministic toy datasets: [features, examples] inputs plus one class
//! index per example.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, Uniform};
use softnet_core::Tensor2D;

use crate::api::error::{NnError, NnResult};

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledData {
    pub inputs: Tensor2D,
    pub labels: Vec<usize>,
}

impl LabeledData {
    pub fn new(inputs: Tensor2D, labels: Vec<usize>) -> NnResult<Self> {
        if labels.len() != inputs.cols() {
            return Err(NnError::InvalidConfig(format!(
                "{} labels for {} examples",
                labels.len(),
                inputs.cols()
            )));
        }
        Ok(Self { inputs, labels })
    }

    pub fn num_examples(&self) -> usize {
        self.inputs.cols()
    }

    pub fn num_features(&self) -> usize {
        self.inputs.rows()
    }

    pub fn num_classes(&self) -> usize {
        self.labels.iter().max().map_or(0, |&m| m + 1)
    }

    /// The same examples in a seeded random order.
    pub fn shuffled(&self, seed: u64) -> NnResult<Self> {
        let mut order: Vec<usize> = (0..self.num_examples()).collect();
        order.shuffle(&mut StdRng::seed_from_u64(seed));
        Ok(Self {
            inputs: self.inputs.select_columns(&order)?,
            labels: order.iter().map(|&i| self.labels[i]).collect(),
        })
    }
}

/// The four corners of `[-1, 1]²`. Class 1 when the signs differ.
pub fn xor() -> LabeledData {
    let points = [(-1.0, -1.0), (-1.0, 1.0), (1.0, -1.0), (1.0, 1.0)];
    let mut inputs = Tensor2D::zeros(2, points.len());
    let mut labels = Vec::with_capacity(points.len());
    for (i, &(a, b)) in points.iter().enumerate() {
        inputs.set(0, i, a);
        inputs.set(1, i, b);
        labels.push(usize::from((a < 0.0) != (b < 0.0)));
    }
    LabeledData { inputs, labels }
}

/// `n` points uniform in `[-1, 1]²`, class 0 above the line `x + y = 0` and
/// class 1 below. Points closer than `margin` to the line are redrawn.
pub fn linearly_separable(n: usize, margin: f64, seed: u64) -> NnResult<LabeledData> {
    if !(0.0..1.0).contains(&margin) {
        return Err(NnError::InvalidConfig(format!(
            "margin must lie in [0, 1), got {margin}"
        )));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let dist = Uniform::new(-1.0, 1.0);
    let mut columns = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    while columns.len() < n {
        let x: f64 = dist.sample(&mut rng);
        let y: f64 = dist.sample(&mut rng);
        let side = (x + y) / std::f64::consts::SQRT_2;
        if side.abs() < margin {
            continue;
        }
        labels.push(usize::from(side < 0.0));
        columns.push(vec![x, y]);
    }
    LabeledData::new(Tensor2D::from_vec(2, n, transpose_points(&columns))?, labels)
}

/// `classes` interleaved spiral arms of `points_per_class` points each in
/// 2-D. The angle of every point gets Gaussian noise of stddev `noise`.
pub fn spiral(
    points_per_class: usize,
    classes: usize,
    noise: f64,
    seed: u64,
) -> NnResult<LabeledData> {
    if points_per_class < 2 || classes == 0 {
        return Err(NnError::InvalidConfig(format!(
            "spiral needs at least 2 points per class and one class, got {points_per_class} x {classes}"
        )));
    }
    let normal = Normal::new(0.0, noise)
        .map_err(|e| NnError::InvalidConfig(format!("spiral noise {noise}: {e}")))?;
    let mut rng = StdRng::seed_from_u64(seed);
    let last = (points_per_class - 1) as f64;

    let mut columns = Vec::with_capacity(points_per_class * classes);
    let mut labels = Vec::with_capacity(points_per_class * classes);
    for class in 0..classes {
        for i in 0..points_per_class {
            let t = i as f64 / last;
            let radius = t;
            let angle = (class as f64 + t) * 4.0 + normal.sample(&mut rng);
            columns.push(vec![radius * angle.sin(), radius * angle.cos()]);
            labels.push(class);
        }
    }
    let n = columns.len();
    LabeledData::new(Tensor2D::from_vec(2, n, transpose_points(&columns))?, labels)
}

/// Points as columns: `[x0, x1, ..., y0, y1, ...]`.
fn transpose_points(points: &[Vec<f64>]) -> Vec<f64> {
    let mut data = Vec::with_capacity(points.len() * 2);
    data.extend(points.iter().map(|p| p[0]));
    data.extend(points.iter().map(|p| p[1]));
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xor_layout() {
        let d = xor();
        assert_eq!(d.inputs.shape(), (2, 4));
        assert_eq!(d.labels, vec![0, 1, 1, 0]);
        assert_eq!(d.inputs.column(1).to_vec(), vec![-1.0, 1.0]);
    }

    #[test]
    fn separable_respects_margin() {
        let d = linearly_separable(200, 0.2, 7).unwrap();
        assert_eq!(d.num_examples(), 200);
        for i in 0..200 {
            let side = (d.inputs.get(0, i) + d.inputs.get(1, i)) / std::f64::consts::SQRT_2;
            assert!(side.abs() >= 0.2);
            assert_eq!(d.labels[i], usize::from(side < 0.0));
        }
        assert!(d.labels.contains(&0) && d.labels.contains(&1));
    }

    #[test]
    fn spiral_is_deterministic() {
        let a = spiral(50, 3, 0.2, 1).unwrap();
        let b = spiral(50, 3, 0.2, 1).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.num_examples(), 150);
        assert_eq!(a.num_classes(), 3);
        assert_ne!(a, spiral(50, 3, 0.2, 2).unwrap());
    }

    #[test]
    fn shuffled_keeps_pairs() {
        let d = linearly_separable(20, 0.1, 0).unwrap();
        let s = d.shuffled(4).unwrap();
        assert_ne!(s.inputs, d.inputs);
        for i in 0..s.num_examples() {
            let col = s.inputs.column(i).to_vec();
            let orig = (0..d.num_examples())
                .find(|&j| d.inputs.column(j).to_vec() == col)
                .unwrap();
            assert_eq!(s.labels[i], d.labels[orig]);
        }
    }
}
