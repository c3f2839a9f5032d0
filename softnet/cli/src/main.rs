mod cmd;

use anyhow::{Context, Result};
use clap::Parser;
use softnet_core::RuntimeConfig;

/// softnet: train and cross-validate gradient-descent classifiers on toy
/// datasets.
#[derive(Parser)]
#[command(name = "softnet", version, about)]
struct Cli {
    /// Rayon worker threads (0 = all cores).
    #[arg(long, global = true, default_value_t = 0)]
    threads: usize,

    /// Output element count at which kernels go parallel.
    #[arg(long, global = true, default_value_t = 4096)]
    par_threshold: usize,

    #[command(subcommand)]
    command: cmd::Command,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    RuntimeConfig {
        num_threads: cli.threads,
        par_threshold: cli.par_threshold,
    }
    .apply()
    .context("Failed to configure runtime")?;
    log::debug!(
        "runtime: threads={} par_threshold={}",
        cli.threads,
        cli.par_threshold
    );
    cmd::run(cli.command)
}
