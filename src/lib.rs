// Shared types, errors and constants
pub mod core;

// Raw event ingestion and normalization
pub mod ingest;

// Per-wallet feature engineering
pub mod analytics;

// Regression models
pub mod models;

// Heuristic and learned scoring
pub mod scoring;

// Configuration
pub mod config;

// CSV export and terminal reports
pub mod util;

// Re-export commonly used types for convenience
pub use analytics::{FeatureTable, WalletAggregator, WalletFeatures};
pub use config::Config;
pub use crate::core::*;
pub use ingest::EventNormalizer;
pub use scoring::{HeuristicVariant, LearnedScorer, ScoreRange, ScoringPolicy, TrainedModel, WalletScorer};
