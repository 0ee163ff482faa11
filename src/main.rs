use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use grove_cart::{Dataset, DecisionTreeConfig, ForestMode, RandomForest, RandomForestConfig};
use grove_io::DatasetReader;

#[derive(Parser)]
#[command(name = "grove")]
#[command(about = "CART decision trees and random forests for labeled numeric data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Shared tree growth parameters.
#[derive(Args, Debug, Clone)]
struct TreeArgs {
    /// Path to a CSV file with a header row, label in the last column
    /// (defaults to the built-in demonstration dataset)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Maximum depth of each tree
    #[arg(long, default_value_t = 9)]
    max_depth: usize,

    /// Partitions of at most this many rows become leaves
    #[arg(long, default_value_t = 1)]
    min_size: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Build a single decision tree, print it, and report training accuracy
    Tree {
        #[command(flatten)]
        tree: TreeArgs,

        /// Write the tree as a JSON document to this path
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Build a random forest and report training accuracy
    Forest {
        #[command(flatten)]
        tree: TreeArgs,

        /// Number of trees in the forest
        #[arg(long, default_value_t = 10)]
        trees: usize,

        /// Features drawn per split (defaults to floor(sqrt(n_features)))
        #[arg(long)]
        features: Option<usize>,

        /// Fraction of rows drawn with replacement for each tree
        #[arg(long, default_value_t = 1.0)]
        sample_ratio: f64,

        /// Train every tree on all rows, search every feature, and take the
        /// largest tree prediction
        #[arg(long, default_value_t = false)]
        reference: bool,

        /// Save the trained forest to this path
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Predict labels for a CSV file with a saved forest
    Predict {
        /// Path to a model written by `forest --save`
        #[arg(long)]
        model: PathBuf,

        /// Path to a CSV file with a header row
        #[arg(long)]
        data: PathBuf,
    },
}

/// Ten-row, two-feature, two-class dataset used when `--data` is omitted.
const DEMO_ROWS: [[f64; 3]; 10] = [
    [2.771244718, 1.784783929, 0.0],
    [1.728571309, 1.169761413, 0.0],
    [3.678319846, 2.81281357, 0.0],
    [3.961043357, 2.61995032, 0.0],
    [2.999208922, 2.209014212, 0.0],
    [7.497545867, 3.162953546, 1.0],
    [9.00220326, 3.339047188, 1.0],
    [7.4445542326, 0.476683375, 1.0],
    [10.12493903, 3.234550982, 1.0],
    [6.642287351, 3.319983761, 1.0],
];

fn load_dataset(data: Option<&Path>) -> Result<Dataset> {
    let rows = match data {
        Some(path) => DatasetReader::new(path)
            .read()
            .context("failed to read input CSV")?,
        None => DEMO_ROWS.iter().map(|r| r.to_vec()).collect(),
    };
    let dataset = Dataset::new(rows).context("invalid dataset")?;
    info!(
        n_rows = dataset.n_rows(),
        n_features = dataset.n_features(),
        n_classes = dataset.classes().len(),
        "dataset loaded"
    );
    Ok(dataset)
}

/// Print `Expected=<label>, Got=<prediction>` per row, then the accuracy.
fn report(dataset: &Dataset, predictions: &[f64]) {
    let mut correct = 0usize;
    for (expected, predicted) in dataset.labels().into_iter().zip(predictions) {
        if expected == *predicted {
            correct += 1;
        }
        println!("Expected={expected}, Got={predicted}");
    }
    let accuracy = correct as f64 / dataset.n_rows() as f64;
    println!("Accuracy: {accuracy:.3}");
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Tree { tree, export } => {
            let dataset = load_dataset(tree.data.as_deref())?;

            let fitted = DecisionTreeConfig::new()
                .with_max_depth(tree.max_depth)
                .with_min_size(tree.min_size)
                .fit(&dataset)
                .context("tree construction failed")?;

            print!("{fitted}");
            let predictions = fitted
                .predict_batch(dataset.rows())
                .context("prediction failed")?;
            report(&dataset, &predictions);

            if let Some(path) = export {
                let json = fitted.to_json().context("failed to export tree")?;
                std::fs::write(&path, json)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                info!(path = %path.display(), "tree exported");
            }
        }

        Command::Forest {
            tree,
            trees,
            features,
            sample_ratio,
            reference,
            save,
        } => {
            let dataset = load_dataset(tree.data.as_deref())?;

            let mode = if reference {
                ForestMode::Reference
            } else {
                ForestMode::Bagging
            };
            let mut config = RandomForestConfig::new(trees)?
                .with_max_depth(tree.max_depth)
                .with_min_size(tree.min_size)
                .with_sample_ratio(sample_ratio)
                .with_mode(mode)
                .with_seed(cli.seed);
            if let Some(features) = features {
                config = config.with_feature_num(features);
            }

            let forest = config
                .fit(&dataset)
                .context("forest training failed")?;

            let predictions = forest
                .predict_batch(dataset.rows())
                .context("prediction failed")?;
            report(&dataset, &predictions);

            if let Some(path) = save {
                forest.save(&path).context("failed to save model")?;
            }
        }

        Command::Predict { model, data } => {
            // 1. Load model
            let forest = RandomForest::load(&model).context("failed to load model")?;
            info!(
                n_trees = forest.n_trees(),
                n_features = forest.n_features(),
                "model loaded"
            );

            // 2. Read rows; a trailing label column is allowed and ignored
            let rows = DatasetReader::new(&data)
                .read()
                .context("failed to read input CSV")?;

            // 3. Predict and print
            let predictions = forest
                .predict_batch(&rows)
                .context("prediction failed")?;
            println!("{}", serde_json::to_string_pretty(&predictions)?);
        }
    }

    Ok(())
}
