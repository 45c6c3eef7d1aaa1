/// Learned wallet scoring
///
/// Trains a regressor on synthetic labels from the policy's label formula,
/// then scores arbitrary wallets with it. Predictions are rescaled with the
/// prediction batch's own min and max, so scores are comparable only within
/// one call.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{debug, info, instrument};

use super::heuristic::to_records;
use super::policy::ScoringPolicy;
use super::scaler::{scale, ScoreRange};
use crate::analytics::FeatureTable;
use crate::core::{ScoreRecord, ScoringError};
use crate::models::{Dataset, RandomForest, Regressor};

/// Fitted regressor together with the feature schema it was trained on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel<R = RandomForest> {
    policy: ScoringPolicy,
    regressor: R,
    trained_at: DateTime<Utc>,
    training_wallets: usize,
}

impl<R: Regressor> TrainedModel<R> {
    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    pub fn feature_columns(&self) -> Vec<String> {
        self.policy.column_names()
    }

    pub fn regressor(&self) -> &R {
        &self.regressor
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    pub fn training_wallets(&self) -> usize {
        self.training_wallets
    }

    /// Fail unless `policy` derives exactly the columns this model was trained on
    pub fn check_policy(&self, policy: &ScoringPolicy) -> Result<(), ScoringError> {
        if policy.columns != self.policy.columns {
            return Err(ScoringError::Schema(format!(
                "model trained on policy '{}' {:?}, got policy '{}' {:?}",
                self.policy.name,
                self.policy.column_names(),
                policy.name,
                policy.column_names()
            )));
        }
        Ok(())
    }

    /// Feature importances sorted descending
    pub fn feature_importance_ranking(&self) -> Vec<(String, f64)> {
        let mut ranking = self.regressor.feature_importances();
        ranking.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranking
    }
}

impl<R: Regressor + Serialize> TrainedModel<R> {
    /// Persist the model as a bincode blob
    #[instrument(skip(self))]
    pub fn save(&self, path: &Path) -> Result<(), ScoringError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, self)?;
        info!("💾 Saved model ({}) to {}", self.policy.name, path.display());
        Ok(())
    }
}

impl<R: Regressor + DeserializeOwned> TrainedModel<R> {
    #[instrument]
    pub fn load(path: &Path) -> Result<Self, ScoringError> {
        let reader = BufReader::new(File::open(path)?);
        let model: Self = bincode::deserialize_from(reader)?;
        info!(
            "📂 Loaded model ({}) trained on {} wallets at {}",
            model.policy.name, model.training_wallets, model.trained_at
        );
        Ok(model)
    }
}

pub struct LearnedScorer {
    range: ScoreRange,
}

impl LearnedScorer {
    pub fn new(range: ScoreRange) -> Self {
        Self { range }
    }

    /// Train `regressor` on the policy's derived columns and rescaled labels
    #[instrument(skip(self, table, policy, regressor), fields(wallets = table.len(), policy = %policy.name))]
    pub fn train<R: Regressor>(
        &self,
        table: &FeatureTable,
        policy: &ScoringPolicy,
        mut regressor: R,
    ) -> Result<TrainedModel<R>, ScoringError> {
        policy.validate(table)?;
        if table.is_empty() {
            return Err(ScoringError::EmptyTrainingSet);
        }

        let labels = scale(&policy.raw_labels(table)?, self.range);
        let dataset = Dataset::from_rows(policy.feature_matrix(table)?, labels, policy.column_names())?;
        debug!(samples = dataset.n_samples(), features = dataset.n_features(), "training matrix built");

        regressor.fit(&dataset)?;

        info!("✅ Trained {} model on {} wallets", policy.name, table.len());
        Ok(TrainedModel {
            policy: policy.clone(),
            regressor,
            trained_at: Utc::now(),
            training_wallets: table.len(),
        })
    }

    /// Score every wallet in the table with a trained model, in table order
    #[instrument(skip(self, model, table), fields(wallets = table.len()))]
    pub fn predict<R: Regressor>(&self, model: &TrainedModel<R>, table: &FeatureTable) -> Result<Vec<ScoreRecord>, ScoringError> {
        let matrix = model.policy.feature_matrix(table)?;
        if table.is_empty() {
            return Ok(Vec::new());
        }

        let predictions = model.regressor.predict(&matrix);
        let scaled = scale(&predictions, self.range);
        let scores = to_records(table, &scaled, f64::trunc);

        info!("🎯 Learned model ({}) scored {} wallets", model.policy.name, scores.len());
        Ok(scores)
    }
}
