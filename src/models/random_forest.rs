//! Random forest regressor

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::dataset::Dataset;
use super::decision_tree::{DecisionTree, TreeConfig};
use super::Regressor;
use crate::core::{ScoringError, DEFAULT_FOREST_SEED, DEFAULT_FOREST_TREES};

/// Random forest configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub n_trees: usize,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features considered per split (all when None)
    pub max_features: Option<usize>,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Base seed; tree `i` uses `seed + i`
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: DEFAULT_FOREST_TREES,
            max_depth: 16,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: DEFAULT_FOREST_SEED,
        }
    }
}

/// Bagged ensemble of regression trees; predictions are the mean over trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
    feature_names: Vec<String>,
    feature_importances: Vec<f64>,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            feature_names: Vec::new(),
            feature_importances: Vec::new(),
        }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn tree_config(&self, index: usize) -> TreeConfig {
        TreeConfig {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: self.config.max_features,
            seed: self.config.seed.wrapping_add(index as u64),
        }
    }

    /// Mean R² against the dataset's own labels
    pub fn r2_score(&self, dataset: &Dataset) -> f64 {
        if dataset.is_empty() {
            return 0.0;
        }
        let predictions = self.predict(&dataset.features);
        let mean_label = dataset.labels.iter().sum::<f64>() / dataset.n_samples() as f64;

        let ss_res: f64 = predictions
            .iter()
            .zip(dataset.labels.iter())
            .map(|(p, l)| (l - p).powi(2))
            .sum();
        let ss_tot: f64 = dataset.labels.iter().map(|l| (l - mean_label).powi(2)).sum();

        if ss_tot == 0.0 {
            0.0
        } else {
            1.0 - ss_res / ss_tot
        }
    }
}

impl Regressor for RandomForest {
    fn fit(&mut self, dataset: &Dataset) -> Result<(), ScoringError> {
        if dataset.is_empty() {
            return Err(ScoringError::EmptyTrainingSet);
        }
        if self.config.n_trees == 0 {
            return Err(ScoringError::InvalidValue {
                field: "n_trees".to_string(),
                value: "0".to_string(),
            });
        }

        self.feature_names = dataset.feature_names.clone();
        let n_features = dataset.n_features();

        // Tree i is seeded with seed + i regardless of scheduling
        let trees: Vec<DecisionTree> = (0..self.config.n_trees)
            .into_par_iter()
            .map(|i| {
                let mut tree = DecisionTree::new(self.tree_config(i));
                if self.config.bootstrap {
                    let sample = dataset.bootstrap_sample(self.config.seed.wrapping_add(i as u64));
                    tree.fit(&sample);
                } else {
                    tree.fit(dataset);
                }
                tree
            })
            .collect();
        self.trees = trees;

        self.feature_importances = vec![0.0; n_features];
        for tree in &self.trees {
            for (i, &imp) in tree.feature_importances().iter().enumerate() {
                self.feature_importances[i] += imp;
            }
        }
        let sum: f64 = self.feature_importances.iter().sum();
        if sum > 0.0 {
            for imp in &mut self.feature_importances {
                *imp /= sum;
            }
        }

        debug!(max_depth = self.trees.iter().map(|t| t.depth()).max().unwrap_or(0), "forest depth");
        info!("🌲 Trained random forest: {} trees on {} samples x {} features", self.trees.len(), dataset.n_samples(), n_features);
        Ok(())
    }

    fn predict(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        if self.trees.is_empty() {
            return vec![0.0; rows.len()];
        }
        rows.par_iter()
            .map(|row| self.trees.iter().map(|t| t.predict_one(row)).sum::<f64>() / self.trees.len() as f64)
            .collect()
    }

    fn feature_importances(&self) -> Vec<(String, f64)> {
        self.feature_names
            .iter()
            .cloned()
            .zip(self.feature_importances.iter().copied())
            .collect()
    }
}
