/// Training matrix for the regressors

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::ScoringError;

/// Row-major feature matrix with one label per row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<f64>,
    pub feature_names: Vec<String>,
}

impl Dataset {
    pub fn new(feature_names: Vec<String>) -> Self {
        Self {
            features: Vec::new(),
            labels: Vec::new(),
            feature_names,
        }
    }

    /// Build a dataset, checking every row against the column schema
    pub fn from_rows(
        features: Vec<Vec<f64>>,
        labels: Vec<f64>,
        feature_names: Vec<String>,
    ) -> Result<Self, ScoringError> {
        if features.len() != labels.len() {
            return Err(ScoringError::Schema(format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            )));
        }
        if let Some(row) = features.iter().find(|row| row.len() != feature_names.len()) {
            return Err(ScoringError::Schema(format!(
                "row has {} values, schema has {} columns",
                row.len(),
                feature_names.len()
            )));
        }
        Ok(Self {
            features,
            labels,
            feature_names,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.features.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            feature_names: self.feature_names.clone(),
        }
    }

    /// Row indices drawn with replacement
    pub fn bootstrap_indices(&self, seed: u64) -> Vec<usize> {
        let n = self.n_samples();
        if n == 0 {
            return Vec::new();
        }
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n).map(|_| rng.gen_range(0..n)).collect()
    }

    /// Random sample with replacement
    pub fn bootstrap_sample(&self, seed: u64) -> Dataset {
        self.subset(&self.bootstrap_indices(seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_checks_widths() {
        let names = vec!["a".to_string(), "b".to_string()];
        assert!(Dataset::from_rows(vec![vec![1.0, 2.0]], vec![1.0], names.clone()).is_ok());
        assert!(Dataset::from_rows(vec![vec![1.0]], vec![1.0], names.clone()).is_err());
        assert!(Dataset::from_rows(vec![vec![1.0, 2.0]], vec![], names).is_err());
    }

    #[test]
    fn test_bootstrap_is_seeded() {
        let names = vec!["x".to_string()];
        let data = Dataset::from_rows((0..20).map(|i| vec![i as f64]).collect(), (0..20).map(|i| i as f64).collect(), names).unwrap();
        assert_eq!(data.bootstrap_indices(7), data.bootstrap_indices(7));
        assert_eq!(data.bootstrap_sample(7).n_samples(), 20);
    }
}
