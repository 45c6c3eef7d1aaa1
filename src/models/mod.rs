/// Regression models used by the learned scorer

pub mod dataset;
pub mod decision_tree;
pub mod random_forest;

pub use dataset::Dataset;
pub use decision_tree::{DecisionTree, TreeConfig};
pub use random_forest::{ForestConfig, RandomForest};

use crate::core::ScoringError;

/// Capability the learned scorer needs from a trained model
pub trait Regressor: Send + Sync {
    fn fit(&mut self, dataset: &Dataset) -> Result<(), ScoringError>;

    fn predict(&self, rows: &[Vec<f64>]) -> Vec<f64>;

    /// (feature name, importance) pairs in column order
    fn feature_importances(&self) -> Vec<(String, f64)>;
}
