/// Wallet feature vectors and the feature table
///
/// The table is the boundary between aggregation and scoring. Scorers read
/// it through named columns so that a scoring policy can ask for any field
/// and get a schema error when the field does not exist.

use serde::{Deserialize, Serialize};

use crate::core::ScoringError;

/// Fixed-width behavioral summary of one wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletFeatures {
    pub wallet_address: String,
    pub tx_count: u32,
    pub num_deposits: u32,
    pub num_borrows: u32,
    pub num_repays: u32,
    pub num_redeems: u32,
    pub num_liquidations: u32,

    /// Sum of amount * price_usd over the wallet's events
    pub total_usd: f64,
    pub avg_usd: f64,

    /// Sample standard deviation (ddof = 1) of per-event USD value, 0.0 below two events
    pub usd_stddev: f64,

    /// num_repays / num_borrows, exactly 0.0 when the wallet never borrowed
    pub repay_borrow_ratio: f64,

    /// Days between the first and last event
    pub activity_duration_days: f64,

    /// Events per day of activity, or tx_count when the duration is zero
    pub tx_frequency: f64,
    pub avg_tx_usd: f64,
}

impl WalletFeatures {
    /// Every numeric column name, in table order
    pub const COLUMNS: [&'static str; 13] = [
        "tx_count",
        "num_deposits",
        "num_borrows",
        "num_repays",
        "num_redeems",
        "num_liquidations",
        "total_usd",
        "avg_usd",
        "usd_stddev",
        "repay_borrow_ratio",
        "activity_duration_days",
        "tx_frequency",
        "avg_tx_usd",
    ];

    /// Look up a numeric column by name
    pub fn column(&self, name: &str) -> Option<f64> {
        let value = match name {
            "tx_count" => self.tx_count as f64,
            "num_deposits" => self.num_deposits as f64,
            "num_borrows" => self.num_borrows as f64,
            "num_repays" => self.num_repays as f64,
            "num_redeems" => self.num_redeems as f64,
            "num_liquidations" => self.num_liquidations as f64,
            "total_usd" => self.total_usd,
            "avg_usd" => self.avg_usd,
            "usd_stddev" => self.usd_stddev,
            "repay_borrow_ratio" => self.repay_borrow_ratio,
            "activity_duration_days" => self.activity_duration_days,
            "tx_frequency" => self.tx_frequency,
            "avg_tx_usd" => self.avg_tx_usd,
            _ => return None,
        };
        Some(value)
    }

    pub fn has_column(name: &str) -> bool {
        Self::COLUMNS.contains(&name)
    }
}

/// Feature vectors for a batch of wallets, sorted by wallet address
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    rows: Vec<WalletFeatures>,
}

impl FeatureTable {
    /// Build a table, sorting rows by address
    pub fn new(mut rows: Vec<WalletFeatures>) -> Self {
        rows.sort_by(|a, b| a.wallet_address.cmp(&b.wallet_address));
        Self { rows }
    }

    pub fn rows(&self) -> &[WalletFeatures] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, wallet_address: &str) -> Option<&WalletFeatures> {
        self.rows
            .binary_search_by(|row| row.wallet_address.as_str().cmp(wallet_address))
            .ok()
            .map(|idx| &self.rows[idx])
    }

    pub fn wallet_addresses(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.wallet_address.as_str())
    }

    /// Fail with a schema error unless every named column exists
    pub fn require_columns<'a, I>(&self, names: I) -> Result<(), ScoringError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for name in names {
            if !WalletFeatures::has_column(name) {
                return Err(ScoringError::MissingColumn(name.to_string()));
            }
        }
        Ok(())
    }

    /// Values of one column for every wallet
    pub fn column(&self, name: &str) -> Result<Vec<f64>, ScoringError> {
        self.require_columns([name])?;
        Ok(self
            .rows
            .iter()
            .filter_map(|row| row.column(name))
            .collect())
    }

    /// Write the table as CSV with a header row
    pub fn write_csv<W: std::io::Write>(&self, writer: W) -> Result<(), ScoringError> {
        let mut writer = csv::Writer::from_writer(writer);
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl FromIterator<WalletFeatures> for FeatureTable {
    fn from_iter<T: IntoIterator<Item = WalletFeatures>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
