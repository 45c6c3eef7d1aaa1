/// Scoring policies
///
/// A policy names the derived feature columns a model is trained on and the
/// label formula that produces its synthetic training targets. The rich
/// heuristic score is the same label formula, rescaled. Policies are plain
/// values so alternate heuristics can be loaded from configuration without
/// touching aggregation or scaling.

use serde::{Deserialize, Serialize};

use crate::analytics::{FeatureTable, WalletFeatures};
use crate::core::{ScoringError, RATIO_CLIP_MAX};

/// Element-wise transform applied to a source column.
///
/// Must stay externally tagged: policies are embedded in bincode model blobs.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    #[default]
    Identity,
    /// ln(1 + x)
    Log1p,
    Clip { min: f64, max: f64 },
}

impl Transform {
    pub fn apply(&self, value: f64) -> f64 {
        match *self {
            Transform::Identity => value,
            Transform::Log1p => value.ln_1p(),
            Transform::Clip { min, max } => value.clamp(min, max),
        }
    }
}

/// Derived model input: a feature-table column passed through a transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    pub source: String,
    #[serde(default)]
    pub transform: Transform,
}

impl FeatureColumn {
    pub fn raw(source: &str) -> Self {
        Self {
            name: source.to_string(),
            source: source.to_string(),
            transform: Transform::Identity,
        }
    }

    pub fn derived(name: &str, source: &str, transform: Transform) -> Self {
        Self {
            name: name.to_string(),
            source: source.to_string(),
            transform,
        }
    }

    fn value(&self, row: &WalletFeatures) -> Result<f64, ScoringError> {
        row.column(&self.source)
            .map(|v| self.transform.apply(v))
            .ok_or_else(|| ScoringError::MissingColumn(self.source.clone()))
    }
}

/// One weighted term of a label formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelTerm {
    pub source: String,
    #[serde(default)]
    pub transform: Transform,
    pub weight: f64,
}

impl LabelTerm {
    pub fn new(source: &str, transform: Transform, weight: f64) -> Self {
        Self {
            source: source.to_string(),
            transform,
            weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub name: String,
    pub columns: Vec<FeatureColumn>,
    pub label: Vec<LabelTerm>,
}

fn clipped_ratio() -> Transform {
    Transform::Clip {
        min: 0.0,
        max: RATIO_CLIP_MAX,
    }
}

impl ScoringPolicy {
    /// Seven-column policy with the deposit/repayment/liquidation label
    pub fn baseline() -> Self {
        Self {
            name: "baseline".to_string(),
            columns: Self::baseline_columns(),
            label: vec![
                LabelTerm::new("num_deposits", Transform::Identity, 1.1),
                LabelTerm::new("repay_borrow_ratio", clipped_ratio(), 5.0),
                LabelTerm::new("num_liquidations", Transform::Identity, -37.0),
                LabelTerm::new("activity_duration_days", Transform::Identity, 0.2),
                LabelTerm::new("total_usd", Transform::Log1p, 1.0 / 1000.0),
                LabelTerm::new("avg_tx_usd", Transform::Log1p, 1.0 / 100.0),
            ],
        }
    }

    /// Baseline columns plus ticket size, volatility and frequency, with a
    /// label that weights activity more heavily
    pub fn extended() -> Self {
        let mut columns = Self::baseline_columns();
        columns.extend([
            FeatureColumn::raw("avg_tx_usd"),
            FeatureColumn::raw("usd_stddev"),
            FeatureColumn::raw("tx_frequency"),
        ]);

        Self {
            name: "extended".to_string(),
            columns,
            label: vec![
                LabelTerm::new("num_deposits", Transform::Identity, 3.0),
                LabelTerm::new("repay_borrow_ratio", clipped_ratio(), 8.0),
                LabelTerm::new("num_liquidations", Transform::Identity, -15.0),
                LabelTerm::new("activity_duration_days", Transform::Identity, 0.5),
                LabelTerm::new("total_usd", Transform::Log1p, 1.0 / 5000.0),
                LabelTerm::new("tx_frequency", Transform::Identity, 0.25),
            ],
        }
    }

    fn baseline_columns() -> Vec<FeatureColumn> {
        vec![
            FeatureColumn::raw("num_deposits"),
            FeatureColumn::raw("num_borrows"),
            FeatureColumn::raw("num_repays"),
            FeatureColumn::raw("num_liquidations"),
            FeatureColumn::derived("log_total_usd", "total_usd", Transform::Log1p),
            FeatureColumn::derived("clipped_ratio", "repay_borrow_ratio", clipped_ratio()),
            FeatureColumn::raw("activity_duration_days"),
        ]
    }

    /// Built-in policy by name
    pub fn by_name(name: &str) -> Result<Self, ScoringError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "extended" => Ok(Self::extended()),
            other => Err(ScoringError::InvalidValue {
                field: "policy".to_string(),
                value: other.to_string(),
            }),
        }
    }

    /// Ordered model input column names
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Check that every source column the policy reads exists in the table
    pub fn validate(&self, table: &FeatureTable) -> Result<(), ScoringError> {
        if self.columns.is_empty() {
            return Err(ScoringError::Schema(format!("policy '{}' has no feature columns", self.name)));
        }
        table.require_columns(
            self.columns
                .iter()
                .map(|c| c.source.as_str())
                .chain(self.label.iter().map(|t| t.source.as_str())),
        )
    }

    /// Derived feature matrix, one row per wallet in table order
    pub fn feature_matrix(&self, table: &FeatureTable) -> Result<Vec<Vec<f64>>, ScoringError> {
        self.validate(table)?;
        table
            .rows()
            .iter()
            .map(|row| self.columns.iter().map(|c| c.value(row)).collect::<Result<Vec<f64>, ScoringError>>())
            .collect()
    }

    /// Unscaled label formula evaluated for every wallet
    pub fn raw_labels(&self, table: &FeatureTable) -> Result<Vec<f64>, ScoringError> {
        self.validate(table)?;
        table
            .rows()
            .iter()
            .map(|row| {
                self.label.iter().try_fold(0.0, |acc, term| {
                    let value = row
                        .column(&term.source)
                        .ok_or_else(|| ScoringError::MissingColumn(term.source.clone()))?;
                    Ok::<f64, ScoringError>(acc + term.transform.apply(value) * term.weight)
                })
            })
            .collect()
    }
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self::baseline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::features::tests::sample_wallet;

    #[test]
    fn test_baseline_columns() {
        let names = ScoringPolicy::baseline().column_names();
        assert_eq!(
            names,
            vec![
                "num_deposits",
                "num_borrows",
                "num_repays",
                "num_liquidations",
                "log_total_usd",
                "clipped_ratio",
                "activity_duration_days",
            ]
        );
        assert_eq!(ScoringPolicy::extended().columns.len(), 10);
    }

    #[test]
    fn test_baseline_label_formula() {
        let mut wallet = sample_wallet("0xa");
        wallet.num_deposits = 2;
        wallet.repay_borrow_ratio = 9.0;
        wallet.num_liquidations = 1;
        wallet.activity_duration_days = 10.0;
        wallet.total_usd = 999.0;
        wallet.avg_tx_usd = 99.0;
        let table = FeatureTable::new(vec![wallet]);

        let labels = ScoringPolicy::baseline().raw_labels(&table).unwrap();
        let expected = 2.0 * 1.1 + 5.0 * 5.0 - 37.0 + 10.0 * 0.2 + 1000f64.ln() / 1000.0 + 100f64.ln() / 100.0;
        assert!((labels[0] - expected).abs() < 1e-9);
    }

    #[test]
    fn test_feature_matrix_applies_transforms() {
        let mut wallet = sample_wallet("0xa");
        wallet.total_usd = std::f64::consts::E - 1.0;
        wallet.repay_borrow_ratio = 12.0;
        let matrix = ScoringPolicy::baseline().feature_matrix(&FeatureTable::new(vec![wallet])).unwrap();
        assert!((matrix[0][4] - 1.0).abs() < 1e-12);
        assert_eq!(matrix[0][5], 5.0);
    }

    #[test]
    fn test_unknown_source_column_is_schema_error() {
        let mut policy = ScoringPolicy::baseline();
        policy.columns.push(FeatureColumn::raw("health_factor"));
        let table = FeatureTable::new(vec![sample_wallet("0xa")]);
        assert!(policy.feature_matrix(&table).unwrap_err().is_schema_error());
        assert!(policy.raw_labels(&table).unwrap_err().is_schema_error());
    }

    #[test]
    fn test_policy_from_toml() {
        let text = r#"
            name = "custom"

            [[columns]]
            name = "log_volume"
            source = "total_usd"
            transform = "log1p"

            [[columns]]
            name = "num_repays"
            source = "num_repays"

            [[label]]
            source = "num_repays"
            weight = 2.0

            [[label]]
            source = "repay_borrow_ratio"
            transform = { clip = { min = 0.0, max = 3.0 } }
            weight = 1.5
        "#;
        let policy: ScoringPolicy = toml::from_str(text).unwrap();
        assert_eq!(policy.columns[0].transform, Transform::Log1p);
        assert_eq!(policy.columns[1].transform, Transform::Identity);
        assert_eq!(policy.label[0].weight, 2.0);
        assert_eq!(policy.label[1].transform, Transform::Clip { min: 0.0, max: 3.0 });
    }

    #[test]
    fn test_by_name() {
        assert_eq!(ScoringPolicy::by_name("extended").unwrap().name, "extended");
        assert!(ScoringPolicy::by_name("lightgbm").is_err());
    }
}
