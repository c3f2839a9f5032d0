use softnet_core::Tensor2D;

use crate::api::error::{NnError, NnResult};
use crate::api::sink::TrainingLog;
use crate::core::config::settings::{Architecture, Settings};
use crate::core::training::classifier::Classifier;
use crate::core::training::metrics::ClassificationMetrics;

#[derive(Debug, Clone, PartialEq)]
pub struct CrossValidation {
    /// Held-out accuracy of each fold, in fold order.
    pub fold_accuracies: Vec<f64>,
    pub mean_accuracy: f64,
    /// Confusion matrix accumulated over every held-out example.
    pub metrics: ClassificationMetrics,
}

/// k-fold cross-validation over consecutive column ranges.
///
/// Fold `k` holds out columns `k·n/folds .. (k+1)·n/folds`, trains a fresh
/// classifier on the rest and scores the held-out columns. The sink is
/// silenced while the inner classifiers train and gets one line per fold
/// afterwards.
pub fn cross_validate(
    inputs: &Tensor2D,
    labels: &[usize],
    settings: &Settings,
    architecture: &Architecture,
    folds: usize,
    sink: &mut dyn TrainingLog,
) -> NnResult<CrossValidation> {
    let n = inputs.cols();
    if labels.len() != n {
        return Err(NnError::InvalidConfig(format!(
            "{} labels for {n} examples",
            labels.len()
        )));
    }
    if folds < 2 || folds > n {
        return Err(NnError::InvalidConfig(format!(
            "fold count must lie in 2..={n}, got {folds}"
        )));
    }
    let classes = labels.iter().max().map_or(0, |&m| m + 1);
    let mut metrics = ClassificationMetrics::new(classes);
    let mut fold_accuracies = Vec::with_capacity(folds);

    for k in 0..folds {
        let start = k * n / folds;
        let end = (k + 1) * n / folds;
        let train_idx: Vec<usize> = (0..n).filter(|i| !(start..end).contains(i)).collect();
        let test_idx: Vec<usize> = (start..end).collect();

        let was_enabled = sink.is_enabled();
        sink.set_enabled(false);
        let fold = run_fold(
            inputs,
            labels,
            &train_idx,
            &test_idx,
            classes,
            settings,
            architecture,
            sink,
        );
        sink.set_enabled(was_enabled);
        let (predicted, held_out) = fold?;

        metrics.update(&predicted, &held_out)?;
        let correct = predicted.iter().zip(&held_out).filter(|(p, y)| p == y).count();
        let accuracy = correct as f64 / held_out.len() as f64;
        log::debug!("fold {k}: columns {start}..{end}, accuracy {accuracy:.4}");
        sink.append_text(&format!("fold {}: accuracy {accuracy:.4}", k + 1));
        fold_accuracies.push(accuracy);
    }

    let mean_accuracy = fold_accuracies.iter().sum::<f64>() / folds as f64;
    sink.append_text(&format!("mean accuracy {mean_accuracy:.4} over {folds} folds"));
    log::info!("cross-validation: mean accuracy {mean_accuracy:.4} over {folds} folds");
    Ok(CrossValidation {
        fold_accuracies,
        mean_accuracy,
        metrics,
    })
}

#[allow(clippy::too_many_arguments)]
fn run_fold(
    inputs: &Tensor2D,
    labels: &[usize],
    train_idx: &[usize],
    test_idx: &[usize],
    classes: usize,
    settings: &Settings,
    architecture: &Architecture,
    sink: &mut dyn TrainingLog,
) -> NnResult<(Vec<usize>, Vec<usize>)> {
    let train_x = inputs.select_columns(train_idx)?;
    let train_y = train_idx.iter().map(|&i| labels[i]).collect();
    let mut classifier = Classifier::new_with_classes(
        train_x,
        train_y,
        classes,
        settings.clone(),
        architecture.clone(),
    )?;
    classifier.train(sink)?;

    let test_x = inputs.select_columns(test_idx)?;
    let held_out = test_idx.iter().map(|&i| labels[i]).collect();
    Ok((classifier.classify_all(&test_x)?, held_out))
}
