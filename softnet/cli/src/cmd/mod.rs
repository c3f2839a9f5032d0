pub mod cv;
pub mod train;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use softnet_nn::{datasets, Architecture, LabeledData, Settings, TrainingLog};

#[derive(Subcommand)]
pub enum Command {
    /// Train a classifier and report its training accuracy.
    Train(train::TrainArgs),

    /// Estimate held-out accuracy with k-fold cross-validation.
    Cv(cv::CvArgs),
}

pub fn run(command: Command) -> Result<()> {
    match command {
        Command::Train(args) => train::run(args),
        Command::Cv(args) => cv::run(args),
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Dataset {
    /// Four corners of the square, labelled by sign agreement.
    Xor,
    /// Interleaved spiral arms, one per class.
    Spiral,
    /// Two classes split by the line x + y = 0.
    Separable,
}

/// Dataset selection shared by every subcommand.
#[derive(Args)]
pub struct DataArgs {
    #[arg(long, value_enum, default_value_t = Dataset::Spiral)]
    dataset: Dataset,

    /// Points per class (spiral) or in total (separable).
    #[arg(long, default_value_t = 100)]
    points: usize,

    /// Number of spiral arms.
    #[arg(long, default_value_t = 3)]
    classes: usize,

    /// Seed for generating the dataset.
    #[arg(long, default_value_t = 0)]
    data_seed: u64,
}

impl DataArgs {
    pub fn load(&self) -> Result<LabeledData> {
        let data = match self.dataset {
            Dataset::Xor => datasets::xor(),
            Dataset::Spiral => datasets::spiral(self.points, self.classes, 0.2, self.data_seed)?,
            Dataset::Separable => datasets::linearly_separable(self.points, 0.1, self.data_seed)?,
        };
        eprintln!(
            "Dataset {:?}: {} examples, {} features, {} classes",
            self.dataset,
            data.num_examples(),
            data.num_features(),
            data.num_classes()
        );
        Ok(data)
    }
}

/// Hyperparameters and layer stack shared by every subcommand.
#[derive(Args)]
pub struct ModelArgs {
    /// JSON settings file; missing fields take their defaults.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Hidden layer widths, comma separated. Omit for a softmax-only model.
    #[arg(long, value_delimiter = ',')]
    hidden: Vec<usize>,

    /// Override the settings seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Override the settings epoch count.
    #[arg(long)]
    epochs: Option<usize>,

    /// Override the settings learning rate.
    #[arg(long)]
    learning_rate: Option<f64>,
}

impl ModelArgs {
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::from_json_file(path)
                .with_context(|| format!("Failed to load settings: {}", path.display()))?,
            None => Settings::default(),
        };
        if let Some(seed) = self.seed {
            settings = settings.with_seed(seed);
        }
        if let Some(epochs) = self.epochs {
            settings = settings.with_epochs(epochs);
        }
        if let Some(lr) = self.learning_rate {
            settings = settings.with_learning_rate(lr);
        }
        settings.validate()?;
        Ok(settings)
    }

    pub fn architecture(&self) -> Result<Architecture> {
        let arch = if self.hidden.is_empty() {
            Architecture::Softmax
        } else {
            Architecture::neural_net(self.hidden.clone())
        };
        arch.validate()?;
        Ok(arch)
    }
}

/// Progress to stdout, warnings to stderr.
pub struct ConsoleLog {
    enabled: bool,
}

impl ConsoleLog {
    pub fn new() -> Self {
        Self { enabled: true }
    }
}

impl Default for ConsoleLog {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainingLog for ConsoleLog {
    fn append_text(&mut self, line: &str) {
        if self.enabled {
            println!("{line}");
        }
    }

    fn append_error(&mut self, line: &str) {
        if self.enabled {
            eprintln!("warning: {line}");
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
