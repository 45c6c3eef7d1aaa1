/// Heuristic wallet scoring
///
/// Two fixed formulas over the feature table, both rescaled per batch:
/// an action tally scaled by the batch maximum, and the policy label
/// formula scaled min-max.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::policy::ScoringPolicy;
use super::scaler::{scale, scale_by_max, ScoreRange};
use crate::analytics::FeatureTable;
use crate::core::{ScoreRecord, ScoringError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicVariant {
    /// repay x3 - borrow x2 + deposit, floored at zero
    ActionTally,
    /// Weighted feature formula of the active scoring policy
    #[default]
    Rich,
}

pub struct WalletScorer {
    range: ScoreRange,
    policy: ScoringPolicy,
}

impl WalletScorer {
    pub fn new(range: ScoreRange, policy: ScoringPolicy) -> Self {
        Self { range, policy }
    }

    /// Score every wallet in the table, in table order
    #[instrument(skip(self, table), fields(wallets = table.len()))]
    pub fn score_wallets(&self, table: &FeatureTable, variant: HeuristicVariant) -> Result<Vec<ScoreRecord>, ScoringError> {
        let raw = match variant {
            HeuristicVariant::ActionTally => self.action_tally(table)?,
            HeuristicVariant::Rich => self.policy.raw_labels(table)?,
        };

        if raw.len() == 1 {
            warn!("⚠️ Single wallet batch: score falls back to the range midpoint");
        }

        let scaled = match variant {
            HeuristicVariant::ActionTally => scale_by_max(&raw, self.range),
            HeuristicVariant::Rich => scale(&raw, self.range),
        };

        let scores = to_records(table, &scaled, |v| v.round());
        info!("🧮 Heuristic ({:?}) scored {} wallets", variant, scores.len());
        Ok(scores)
    }

    /// Raw action tally per wallet
    pub fn action_tally(&self, table: &FeatureTable) -> Result<Vec<f64>, ScoringError> {
        let repays = table.column("num_repays")?;
        let borrows = table.column("num_borrows")?;
        let deposits = table.column("num_deposits")?;

        Ok(repays
            .iter()
            .zip(&borrows)
            .zip(&deposits)
            .map(|((r, b), d)| (r * 3.0 - b * 2.0 + d).max(0.0))
            .collect())
    }

    /// Score and sort wallets by score descending, ties by address
    pub fn rank_wallets(&self, table: &FeatureTable, variant: HeuristicVariant) -> Result<Vec<ScoreRecord>, ScoringError> {
        let mut scores = self.score_wallets(table, variant)?;
        rank(&mut scores);
        Ok(scores)
    }
}

/// Sort score records by score descending, ties by address
pub fn rank(scores: &mut [ScoreRecord]) {
    scores.sort_by(|a, b| {
        b.credit_score
            .cmp(&a.credit_score)
            .then_with(|| a.wallet_address.cmp(&b.wallet_address))
    });
}

/// Pair scaled values with wallet addresses, converting with `to_int`
pub(crate) fn to_records<F>(table: &FeatureTable, scaled: &[f64], to_int: F) -> Vec<ScoreRecord>
where
    F: Fn(f64) -> f64,
{
    table
        .wallet_addresses()
        .zip(scaled)
        .map(|(wallet, &value)| ScoreRecord {
            wallet_address: wallet.to_string(),
            credit_score: to_int(value).max(0.0) as u32,
        })
        .collect()
}
