/// Typed records for each pipeline stage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::ScoringError;

/// Lending protocol action kinds recognized by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Deposit,
    Borrow,
    Repay,
    RedeemUnderlying,
    LiquidationCall,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Deposit => "deposit",
            Action::Borrow => "borrow",
            Action::Repay => "repay",
            Action::RedeemUnderlying => "redeemunderlying",
            Action::LiquidationCall => "liquidationcall",
        }
    }
}

impl FromStr for Action {
    type Err = ScoringError;

    /// Exact, case-sensitive match against the wire names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(Action::Deposit),
            "borrow" => Ok(Action::Borrow),
            "repay" => Ok(Action::Repay),
            "redeemunderlying" => Ok(Action::RedeemUnderlying),
            "liquidationcall" => Ok(Action::LiquidationCall),
            other => Err(ScoringError::InvalidValue {
                field: "action".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event row as produced by ingestion, before normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub wallet_address: String,

    /// Action wire name, possibly one the pipeline does not score
    pub action: String,

    /// Epoch seconds
    pub timestamp: f64,

    pub amount: Option<f64>,
    pub asset_symbol: Option<String>,
    pub price_usd: Option<f64>,
}

/// Cleaned event with a typed action and an absolute timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub wallet_address: String,
    pub action: Action,
    pub timestamp: DateTime<Utc>,
    pub amount: Option<f64>,
    pub asset_symbol: Option<String>,
    pub price_usd: Option<f64>,
}

impl NormalizedEvent {
    /// USD value of the event with missing amount or price counted as zero,
    /// saturated to the finite range
    pub fn usd_value(&self) -> f64 {
        (self.amount.unwrap_or(0.0) * self.price_usd.unwrap_or(0.0)).clamp(-f64::MAX, f64::MAX)
    }
}

/// Final per-wallet score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub wallet_address: String,
    pub credit_score: u32,
}
