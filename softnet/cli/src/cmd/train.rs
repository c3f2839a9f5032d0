use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use softnet_nn::{network_summary, save_checkpoint, ClassificationMetrics, Classifier, StopReason};

use super::{ConsoleLog, DataArgs, ModelArgs};

#[derive(Args)]
pub struct TrainArgs {
    #[command(flatten)]
    data: DataArgs,

    #[command(flatten)]
    model: ModelArgs,

    /// Write the trained weights to this file.
    #[arg(long, value_name = "PATH")]
    checkpoint: Option<PathBuf>,

    /// Print the layer table before training.
    #[arg(long)]
    summary: bool,
}

pub fn run(args: TrainArgs) -> Result<()> {
    let data = args.data.load()?;
    let settings = args.model.settings()?;
    let architecture = args.model.architecture()?;

    let mut classifier = Classifier::new(
        data.inputs.clone(),
        data.labels.clone(),
        settings,
        architecture,
    )
    .context("Failed to build classifier")?;
    if args.summary {
        println!("{}", network_summary(classifier.network()));
    }

    let mut log = ConsoleLog::new();
    let summary = classifier.train(&mut log).context("Training failed")?;

    let predicted = classifier.classify_all(&data.inputs)?;
    let mut metrics = ClassificationMetrics::new(classifier.num_classes());
    metrics.update(&predicted, &data.labels)?;

    println!(
        "stopped after {} iterations ({}) in {:.2?}",
        summary.iterations,
        describe(summary.stop_reason),
        summary.elapsed
    );
    println!("final loss {:.6}", summary.final_loss);
    println!("training accuracy {:.4}", metrics.accuracy());
    for class in 0..classifier.num_classes() {
        println!(
            "  class {class}: precision {:.4}, recall {:.4}",
            metrics.precision(class),
            metrics.recall(class)
        );
    }

    if let Some(path) = &args.checkpoint {
        save_checkpoint(classifier.network(), path, summary.iterations, summary.final_loss)
            .with_context(|| format!("Failed to write checkpoint: {}", path.display()))?;
        println!("checkpoint written to {}", path.display());
    }
    Ok(())
}

fn describe(reason: StopReason) -> &'static str {
    match reason {
        StopReason::EpochsExhausted => "epoch limit",
        StopReason::Converged => "converged",
        StopReason::Diverged => "diverged",
    }
}
