use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use badger_credit::analytics::{FeatureTable, WalletAggregator};
use badger_credit::config::{Config, Logging, Policy};
use badger_credit::core::ScoreRecord;
use badger_credit::ingest::{load_json, EventNormalizer};
use badger_credit::models::RandomForest;
use badger_credit::scoring::{HeuristicVariant, LearnedScorer, ScoringPolicy, TrainedModel, WalletScorer};
use badger_credit::util;

#[derive(Parser)]
#[command(name = "badger-credit", version, about = "Credit scores for DeFi lending wallets")]
struct Cli {
    /// TOML configuration file; built-in defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Skip the score distribution report
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score wallets with a fixed heuristic formula
    Heuristic {
        /// JSON array of transaction records
        input: PathBuf,
        #[arg(short, long, default_value = "wallet_scores.csv")]
        output: PathBuf,
        #[arg(long, value_enum)]
        variant: Option<VariantArg>,
        /// Scoring policy whose label formula drives the rich variant
        #[arg(long)]
        policy: Option<String>,
    },
    /// Train a random forest on heuristic labels and save it
    Train {
        input: PathBuf,
        #[arg(short, long)]
        model: Option<PathBuf>,
        #[arg(long)]
        policy: Option<String>,
        #[arg(long)]
        trees: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        /// Also write scores for the training wallets
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Score wallets with a saved model
    Score {
        input: PathBuf,
        #[arg(short, long)]
        model: Option<PathBuf>,
        #[arg(short, long, default_value = "wallet_scores_model.csv")]
        output: PathBuf,
        /// Reject the model unless it was trained with this policy's columns
        #[arg(long)]
        policy: Option<String>,
    },
    /// Write the per-wallet feature table
    Features {
        input: PathBuf,
        #[arg(short, long, default_value = "wallet_features.csv")]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum VariantArg {
    ActionTally,
    Rich,
}

impl From<VariantArg> for HeuristicVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::ActionTally => HeuristicVariant::ActionTally,
            VariantArg::Rich => HeuristicVariant::Rich,
        }
    }
}

fn init_tracing(logging: &Logging) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&logging.directory)
        .with_context(|| format!("Failed to create log directory {}", logging.directory.display()))?;

    let file_appender = tracing_appender::rolling::daily(&logging.directory, &logging.file_prefix);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true)
        .compact();

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .json()
        .with_current_span(false)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.default_filter)),
        )
        .init();

    Ok(guard)
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(Config::default()),
    }
}

fn override_policy(config: &mut Config, name: Option<String>) {
    if let Some(name) = name {
        config.policy = Policy { name, custom: None };
    }
}

#[instrument]
fn load_features(input: &Path) -> Result<FeatureTable> {
    let raw = load_json(input).with_context(|| format!("Failed to read transactions from {}", input.display()))?;
    let events = EventNormalizer::new()
        .normalize(raw)
        .context("Failed to normalize transaction records")?;
    Ok(WalletAggregator::new().aggregate(&events))
}

fn report(config: &Config, scores: &[ScoreRecord], table: &FeatureTable) {
    let summary = util::bucket_summary(scores, config.score, config.report.bucket_width);
    util::print_bucket_summary(&summary);
    util::print_wallet_examples(&util::wallet_examples(scores, table, config.report.top_n));
}

fn run(cli: Cli, mut config: Config) -> Result<()> {
    match cli.command {
        Command::Heuristic { input, output, variant, policy } => {
            override_policy(&mut config, policy);
            if let Some(variant) = variant {
                config.heuristic.variant = variant.into();
            }
            config.validate()?;

            let table = load_features(&input)?;
            let scorer = WalletScorer::new(config.score, config.policy.resolve()?);
            let scores = scorer.score_wallets(&table, config.heuristic.variant)?;
            util::save_scores(&output, &scores)?;
            if !cli.quiet {
                report(&config, &scores, &table);
            }
        }
        Command::Train { input, model, policy, trees, seed, output } => {
            override_policy(&mut config, policy);
            if let Some(model) = model {
                config.model.path = model;
            }
            if let Some(trees) = trees {
                config.model.forest.n_trees = trees;
            }
            if let Some(seed) = seed {
                config.model.forest.seed = seed;
            }
            config.validate()?;

            let table = load_features(&input)?;
            let policy = config.policy.resolve()?;
            let scorer = LearnedScorer::new(config.score);
            let trained = scorer
                .train(&table, &policy, RandomForest::new(config.model.forest.clone()))
                .context("Model training failed")?;
            trained
                .save(&config.model.path)
                .with_context(|| format!("Failed to save model to {}", config.model.path.display()))?;

            if !cli.quiet {
                util::print_feature_importances(&trained.feature_importance_ranking());
            }
            if let Some(output) = output {
                let scores = scorer.predict(&trained, &table)?;
                util::save_scores(&output, &scores)?;
                if !cli.quiet {
                    report(&config, &scores, &table);
                }
            }
        }
        Command::Score { input, model, output, policy } => {
            if let Some(model) = model {
                config.model.path = model;
            }
            config.validate()?;

            let trained: TrainedModel<RandomForest> = TrainedModel::load(&config.model.path)
                .with_context(|| format!("Failed to load model from {}", config.model.path.display()))?;
            if let Some(name) = policy {
                trained.check_policy(&ScoringPolicy::by_name(&name)?)?;
            }

            let table = load_features(&input)?;
            let scores = LearnedScorer::new(config.score).predict(&trained, &table)?;
            util::save_scores(&output, &scores)?;
            if !cli.quiet {
                report(&config, &scores, &table);
            }
        }
        Command::Features { input, output } => {
            let table = load_features(&input)?;
            util::save_features(&output, &table)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let _guard = init_tracing(&config.logging)?;

    info!("🦡 Badger Credit - Wallet Scoring");
    run(cli, config)?;
    info!("👋 Done");
    Ok(())
}
