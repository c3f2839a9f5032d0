use crate::api::error::{NnError, NnResult};

/// Running confusion matrix for a fixed number of classes.
///
/// `confusion[actual][predicted]` counts examples of class `actual` that were
/// classified as `predicted`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationMetrics {
    classes: usize,
    confusion: Vec<Vec<usize>>,
    count: usize,
}

impl ClassificationMetrics {
    pub fn new(classes: usize) -> Self {
        Self {
            classes,
            confusion: vec![vec![0; classes]; classes],
            count: 0,
        }
    }

    pub fn update(&mut self, predictions: &[usize], labels: &[usize]) -> NnResult<()> {
        if predictions.len() != labels.len() {
            return Err(NnError::InvalidConfig(format!(
                "{} predictions for {} labels",
                predictions.len(),
                labels.len()
            )));
        }
        if let Some(&c) = predictions.iter().chain(labels).find(|&&c| c >= self.classes) {
            return Err(NnError::InvalidConfig(format!(
                "class {c} outside 0..{}",
                self.classes
            )));
        }
        for (&p, &y) in predictions.iter().zip(labels) {
            self.confusion[y][p] += 1;
        }
        self.count += labels.len();
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn confusion(&self) -> &[Vec<usize>] {
        &self.confusion
    }

    pub fn accuracy(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let correct: usize = (0..self.classes).map(|c| self.confusion[c][c]).sum();
        correct as f64 / self.count as f64
    }

    /// Of the examples predicted as `class`, the fraction that were `class`.
    /// 0 when nothing was predicted as `class`.
    pub fn precision(&self, class: usize) -> f64 {
        if class >= self.classes {
            return 0.0;
        }
        let predicted: usize = self.confusion.iter().map(|row| row[class]).sum();
        if predicted == 0 {
            return 0.0;
        }
        self.confusion[class][class] as f64 / predicted as f64
    }

    /// Of the examples of `class`, the fraction predicted as `class`.
    /// 0 when `class` never occurred.
    pub fn recall(&self, class: usize) -> f64 {
        if class >= self.classes {
            return 0.0;
        }
        let actual: usize = self.confusion[class].iter().sum();
        if actual == 0 {
            return 0.0;
        }
        self.confusion[class][class] as f64 / actual as f64
    }

    pub fn reset(&mut self) {
        for row in &mut self.confusion {
            row.fill(0);
        }
        self.count = 0;
    }
}
