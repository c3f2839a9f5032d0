use anyhow::{Context, Result};
use clap::Args;
use softnet_nn::cross_validate;

use super::{ConsoleLog, DataArgs, ModelArgs};

#[derive(Args)]
pub struct CvArgs {
    #[command(flatten)]
    data: DataArgs,

    #[command(flatten)]
    model: ModelArgs,

    /// Number of folds.
    #[arg(long, default_value_t = 5)]
    folds: usize,

    /// Keep the generated order instead of shuffling before splitting.
    #[arg(long)]
    no_shuffle: bool,
}

pub fn run(args: CvArgs) -> Result<()> {
    let mut data = args.data.load()?;
    if !args.no_shuffle {
        // Generated datasets are sorted by class; consecutive folds need mixing.
        data = data.shuffled(args.data.data_seed)?;
    }
    let settings = args.model.settings()?;
    let architecture = args.model.architecture()?;

    let mut log = ConsoleLog::new();
    let cv = cross_validate(
        &data.inputs,
        &data.labels,
        &settings,
        &architecture,
        args.folds,
        &mut log,
    )
    .context("Cross-validation failed")?;

    for class in 0..data.num_classes() {
        println!(
            "  class {class}: precision {:.4}, recall {:.4}",
            cv.metrics.precision(class),
            cv.metrics.recall(class)
        );
    }
    Ok(())
}
