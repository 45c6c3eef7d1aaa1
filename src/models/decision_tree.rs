//! Regression tree with variance-reduction splits

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::dataset::Dataset;

/// Decision tree configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum depth of tree
    pub max_depth: usize,
    /// Minimum samples required to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf node
    pub min_samples_leaf: usize,
    /// Maximum features to consider for split (None = all)
    pub max_features: Option<usize>,
    /// Random seed for feature sampling
    pub seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }
}

/// Tree node; a node without children is a leaf
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    pub split: Option<Split>,
    /// Mean label of the samples reaching this node
    pub value: f64,
    pub n_samples: usize,
    pub impurity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Split {
    pub feature_idx: usize,
    pub threshold: f64,
    pub left: Box<TreeNode>,
    pub right: Box<TreeNode>,
}

impl TreeNode {
    fn leaf(value: f64, n_samples: usize, impurity: f64) -> Self {
        Self {
            split: None,
            value,
            n_samples,
            impurity,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.split.is_none()
    }

    pub fn depth(&self) -> usize {
        match &self.split {
            None => 1,
            Some(split) => 1 + split.left.depth().max(split.right.depth()),
        }
    }
}

struct BestSplit {
    feature_idx: usize,
    threshold: f64,
    left: Vec<usize>,
    right: Vec<usize>,
    importance: f64,
}

/// Regression tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    config: TreeConfig,
    root: Option<TreeNode>,
    feature_importances: Vec<f64>,
}

impl DecisionTree {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            root: None,
            feature_importances: Vec::new(),
        }
    }

    /// Train the tree on every row of `dataset`
    pub fn fit(&mut self, dataset: &Dataset) {
        self.feature_importances = vec![0.0; dataset.n_features()];
        if dataset.is_empty() {
            self.root = None;
            return;
        }

        let indices: Vec<usize> = (0..dataset.n_samples()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.root = Some(self.build_tree(dataset, &indices, 0, &mut rng));

        let sum: f64 = self.feature_importances.iter().sum();
        if sum > 0.0 {
            for imp in &mut self.feature_importances {
                *imp /= sum;
            }
        }
    }

    fn build_tree(&mut self, dataset: &Dataset, indices: &[usize], depth: usize, rng: &mut ChaCha8Rng) -> TreeNode {
        let labels: Vec<f64> = indices.iter().map(|&i| dataset.labels[i]).collect();
        let value = mean(&labels);
        let impurity = mse(&labels);

        if depth >= self.config.max_depth || indices.len() < self.config.min_samples_split || impurity < 1e-12 {
            return TreeNode::leaf(value, indices.len(), impurity);
        }

        let Some(best) = self.find_best_split(dataset, indices, impurity, rng) else {
            return TreeNode::leaf(value, indices.len(), impurity);
        };

        self.feature_importances[best.feature_idx] += best.importance;

        let left = self.build_tree(dataset, &best.left, depth + 1, rng);
        let right = self.build_tree(dataset, &best.right, depth + 1, rng);

        TreeNode {
            split: Some(Split {
                feature_idx: best.feature_idx,
                threshold: best.threshold,
                left: Box::new(left),
                right: Box::new(right),
            }),
            value,
            n_samples: indices.len(),
            impurity,
        }
    }

    fn find_best_split(
        &self,
        dataset: &Dataset,
        indices: &[usize],
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<BestSplit> {
        let n_features = dataset.n_features();
        let max_features = self.config.max_features.unwrap_or(n_features).clamp(1, n_features.max(1));

        let mut feature_indices: Vec<usize> = (0..n_features).collect();
        feature_indices.shuffle(rng);
        feature_indices.truncate(max_features);

        let mut best_gain = 0.0;
        let mut best: Option<BestSplit> = None;

        for &feature_idx in &feature_indices {
            let mut values: Vec<f64> = indices.iter().map(|&i| dataset.features[i][feature_idx]).collect();
            values.sort_by(|a, b| a.total_cmp(b));
            values.dedup();

            for window in values.windows(2) {
                let threshold = (window[0] + window[1]) / 2.0;

                let (left, right): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| dataset.features[i][feature_idx] <= threshold);

                if left.len() < self.config.min_samples_leaf || right.len() < self.config.min_samples_leaf {
                    continue;
                }

                let left_labels: Vec<f64> = left.iter().map(|&i| dataset.labels[i]).collect();
                let right_labels: Vec<f64> = right.iter().map(|&i| dataset.labels[i]).collect();

                let n_left = left.len() as f64;
                let n_right = right.len() as f64;
                let weighted = (n_left * mse(&left_labels) + n_right * mse(&right_labels)) / (n_left + n_right);
                let gain = parent_impurity - weighted;

                if gain > best_gain {
                    best_gain = gain;
                    best = Some(BestSplit {
                        feature_idx,
                        threshold,
                        importance: gain * indices.len() as f64,
                        left,
                        right,
                    });
                }
            }
        }

        best
    }

    /// Predict for a single row; an untrained tree predicts 0.0
    pub fn predict_one(&self, features: &[f64]) -> f64 {
        let Some(mut node) = self.root.as_ref() else {
            return 0.0;
        };
        while let Some(split) = &node.split {
            node = if features[split.feature_idx] <= split.threshold {
                split.left.as_ref()
            } else {
                split.right.as_ref()
            };
        }
        node.value
    }

    pub fn predict(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|row| self.predict_one(row)).collect()
    }

    /// Normalized impurity decrease per feature
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn depth(&self) -> usize {
        self.root.as_ref().map(|r| r.depth()).unwrap_or(0)
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn mse(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean(values);
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}
