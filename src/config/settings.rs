/// Pipeline configuration structures

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::{ScoringError, DEFAULT_MODEL_PATH};
use crate::models::ForestConfig;
use crate::scoring::{HeuristicVariant, ScoreRange, ScoringPolicy};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub score: ScoreRange,
    pub heuristic: Heuristic,
    pub model: Model,
    pub policy: Policy,
    pub logging: Logging,
    pub report: Report,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Heuristic {
    pub variant: HeuristicVariant,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Model {
    pub path: PathBuf,
    pub forest: ForestConfig,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_MODEL_PATH),
            forest: ForestConfig::default(),
        }
    }
}

/// Built-in policy by name, or a fully specified custom policy
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Policy {
    pub name: String,
    pub custom: Option<ScoringPolicy>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            name: "baseline".to_string(),
            custom: None,
        }
    }
}

impl Policy {
    pub fn resolve(&self) -> Result<ScoringPolicy, ScoringError> {
        match &self.custom {
            Some(policy) => Ok(policy.clone()),
            None => ScoringPolicy::by_name(&self.name),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Logging {
    pub directory: PathBuf,
    pub file_prefix: String,
    pub default_filter: String,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            file_prefix: "badger-credit.log".to_string(),
            default_filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Report {
    /// Wallets shown per group in the lowest/median/highest listing
    pub top_n: usize,
    pub bucket_width: u32,
}

impl Default for Report {
    fn default() -> Self {
        Self {
            top_n: 3,
            bucket_width: 100,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self, ScoringError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ScoringError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        self.score.validate()?;
        self.policy.resolve()?;
        if self.report.bucket_width == 0 {
            return Err(ScoringError::InvalidValue {
                field: "report.bucket_width".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Transform;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.score, ScoreRange::default());
        assert_eq!(config.model.path, PathBuf::from("model.bin"));
        assert_eq!(config.model.forest.n_trees, 100);
        assert_eq!(config.model.forest.seed, 42);
        assert_eq!(config.heuristic.variant, HeuristicVariant::Rich);
        assert_eq!(config.policy.resolve().unwrap().name, "baseline");
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml(
            r#"
            [score]
            min = 300.0
            max = 850.0

            [heuristic]
            variant = "action_tally"

            [model]
            path = "artifacts/forest.bin"

            [model.forest]
            n_trees = 25

            [policy]
            name = "extended"
            "#,
        )
        .unwrap();
        assert_eq!(config.score.midpoint(), 575.0);
        assert_eq!(config.heuristic.variant, HeuristicVariant::ActionTally);
        assert_eq!(config.model.forest.n_trees, 25);
        assert_eq!(config.model.forest.max_depth, ForestConfig::default().max_depth);
        assert_eq!(config.policy.resolve().unwrap().columns.len(), 10);
    }

    #[test]
    fn test_custom_policy() {
        let config = Config::from_toml(
            r#"
            [policy.custom]
            name = "volume_only"

            [[policy.custom.columns]]
            name = "log_total_usd"
            source = "total_usd"
            transform = "log1p"

            [[policy.custom.label]]
            source = "total_usd"
            transform = "log1p"
            weight = 1.0
            "#,
        )
        .unwrap();
        let policy = config.policy.resolve().unwrap();
        assert_eq!(policy.name, "volume_only");
        assert_eq!(policy.columns[0].transform, Transform::Log1p);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Config::from_toml("[score]\nmin = 10.0\nmax = 5.0").is_err());
        assert!(matches!(
            Config::from_toml("[score]\nmin = -100.0\nmax = 100.0"),
            Err(ScoringError::InvalidRange { .. })
        ));
        assert!(Config::from_toml("[policy]\nname = \"xgboost\"").is_err());
        assert!(Config::from_toml("[report]\nbucket_width = 0").is_err());
        assert!(matches!(Config::from_toml("score = 3"), Err(ScoringError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scoring.toml");
        std::fs::write(&path, "[report]\ntop_n = 5\n").unwrap();
        assert_eq!(Config::load_from_file(&path).unwrap().report.top_n, 5);
    }
}
