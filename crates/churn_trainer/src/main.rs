//! Churn trainer CLI
//!
//! Trains one classifier kind on a labelled CSV and stores it in a model
//! directory, or re-scores a stored model on a dataset.

use anyhow::{Context, Result};
use churn_core::{EncodedColumnSchema, ModelKind, ModelStore, UnknownCategoryPolicy};
use churn_trainer::{
    check_plan_schema, evaluate, infer_plan, ChurnTrainer, Dataset, TrainingParams, ID_COLUMN,
    TARGET_COLUMN,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "churn-train")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and evaluate churn classifiers", long_about = None)]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit a model and save it to the model directory
    Train(TrainArgs),
    /// Score a stored model on a labelled dataset
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug)]
struct DataArgs {
    /// Input CSV dataset path (with header)
    #[arg(short, long)]
    input: PathBuf,

    /// Target column holding Yes/No or 1/0
    #[arg(long, default_value = TARGET_COLUMN)]
    target: String,

    /// Columns to drop before encoding
    #[arg(long, value_delimiter = ',', default_value = ID_COLUMN)]
    drop: Vec<String>,

    /// Numeric columns whose unparsable rows are discarded
    #[arg(long, value_delimiter = ',', default_value = "TotalCharges")]
    require_numeric: Vec<String>,
}

#[derive(Args, Debug)]
struct TrainArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Model directory
    #[arg(short, long, default_value = "models")]
    output: PathBuf,

    /// Classifier kind: lr, rfc or xgbc
    #[arg(short, long, default_value = "lr")]
    model: ModelKind,

    /// Columns to one-hot encode (disables inference)
    #[arg(long, value_delimiter = ',')]
    one_hot: Vec<String>,

    /// Columns to label encode (disables inference)
    #[arg(long, value_delimiter = ',')]
    label: Vec<String>,

    /// Fail unless the encoded columns match the 37-column telco schema
    #[arg(long)]
    expect_telco_schema: bool,

    /// Held-out fraction
    #[arg(long, default_value = "0.3")]
    test_size: f64,

    /// Seed for the train/test split
    #[arg(long, default_value = "1")]
    split_seed: u64,

    /// Seed for bootstrap and row subsampling
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Forest trees
    #[arg(long, default_value = "100")]
    trees: usize,

    /// Boosting rounds
    #[arg(long, default_value = "300")]
    rounds: usize,

    /// Boosting learning rate
    #[arg(long, default_value = "0.1")]
    learning_rate: f64,

    /// Boosting tree depth
    #[arg(long, default_value = "5")]
    max_depth: usize,

    /// Logistic regression iterations
    #[arg(long, default_value = "2000")]
    max_iter: usize,
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Model directory
    #[arg(long, default_value = "models")]
    models: PathBuf,

    /// Model key: lr, rfc or xgbc
    #[arg(short, long, default_value = "lr")]
    model: String,

    /// Encode unseen categories as all-zero rows instead of failing
    #[arg(long)]
    ignore_unseen: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Churn trainer v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Train(args) => train(args),
        Command::Evaluate(args) => run_evaluate(args),
    }
}

fn load_dataset(args: &DataArgs) -> Result<Dataset> {
    info!("Loading dataset from: {}", args.input.display());
    let mut dataset = Dataset::from_csv(&args.input, &args.target, &args.drop)
        .with_context(|| format!("Failed to load dataset {}", args.input.display()))?;

    let required: Vec<&str> = args.require_numeric.iter().map(String::as_str).collect();
    dataset.drop_non_numeric(&required);

    info!(
        "Loaded {} rows with {} attributes ({:.1}% churn)",
        dataset.len(),
        dataset.attributes().len(),
        dataset.positive_rate() * 100.0
    );
    Ok(dataset)
}

fn train(args: TrainArgs) -> Result<()> {
    let dataset = load_dataset(&args.data)?;
    let plan = infer_plan(&dataset, &args.one_hot, &args.label).context("Failed to build encoding plan")?;
    if args.expect_telco_schema {
        check_plan_schema(&dataset, &plan, &EncodedColumnSchema::telco())
            .context("Encoded columns do not match the telco schema")?;
    }

    let mut params = TrainingParams {
        kind: args.model,
        test_size: args.test_size,
        split_seed: args.split_seed,
        ..TrainingParams::default()
    };
    params.logistic.max_iter = args.max_iter;
    params.forest.n_trees = args.trees;
    params.forest.seed = args.seed;
    params.boosting.n_rounds = args.rounds;
    params.boosting.learning_rate = args.learning_rate;
    params.boosting.max_depth = args.max_depth;
    params.boosting.seed = args.seed;

    info!(
        "Training configuration: {}",
        serde_json::to_string(&params).context("Failed to render parameters")?
    );

    let artifact = ChurnTrainer::new(params)
        .train(&dataset, &plan)
        .context("Training failed")?;

    info!("Training complete!");
    info!("  Features: {}", artifact.schema.len());
    info!("  Schema hash: {}", artifact.schema.hash());
    info!("  Train accuracy: {:.4}", artifact.metrics.train_accuracy);
    info!("  Test accuracy: {:.4}", artifact.metrics.test_accuracy);
    if let Some(oob) = artifact.metrics.oob_accuracy {
        info!("  OOB accuracy: {:.4}", oob);
    }

    let store = ModelStore::new(&args.output);
    let hash = store.save(&artifact).context("Failed to save model")?;

    info!("✓ Model saved");
    info!("  Model: {}", store.artifact_path(artifact.kind).display());
    info!("  Hash: {}", hash);

    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    let store = ModelStore::new(&args.models);
    let artifact = store
        .load(&args.model)
        .with_context(|| format!("Failed to load model {}", args.model))?;

    let dataset = load_dataset(&args.data)?;
    let policy = if args.ignore_unseen {
        UnknownCategoryPolicy::Ignore
    } else {
        UnknownCategoryPolicy::Reject
    };
    if artifact.encoder.is_none() {
        warn!("Model {} has no encoder; expecting pre-encoded columns", artifact.key);
    }

    let score = evaluate(&artifact, &dataset, policy).context("Evaluation failed")?;
    info!("Accuracy of {} on {} rows: {:.4}", artifact.key, dataset.len(), score);
    println!(
        "{}",
        serde_json::json!({
            "model": artifact.key,
            "rows": dataset.len(),
            "accuracy": score,
            "schema_hash": artifact.schema.hash(),
        })
    );

    Ok(())
}
