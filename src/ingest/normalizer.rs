/// Event normalization
///
/// Converts epoch timestamps to instants, keeps only the scored lending
/// actions and puts events in canonical (wallet, timestamp) order. Missing
/// amounts and prices stay `None` here; the aggregator substitutes zero.

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use crate::core::{Action, NormalizedEvent, RawEvent, ScoringError};

pub struct EventNormalizer;

impl EventNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Clean a batch of raw events.
    ///
    /// Unknown actions are dropped without error. A timestamp that cannot be
    /// represented as an instant fails the whole batch.
    #[instrument(skip(self, raw), fields(raw = raw.len()))]
    pub fn normalize(&self, raw: Vec<RawEvent>) -> Result<Vec<NormalizedEvent>, ScoringError> {
        let total = raw.len();
        let mut events = Vec::with_capacity(total);

        for row in raw {
            let Ok(action) = row.action.parse::<Action>() else {
                debug!(action = %row.action, wallet = %row.wallet_address, "dropping unrecognized action");
                continue;
            };

            events.push(NormalizedEvent {
                timestamp: epoch_to_instant(row.timestamp)?,
                wallet_address: row.wallet_address,
                action,
                amount: row.amount.filter(|v| v.is_finite()),
                asset_symbol: row.asset_symbol,
                price_usd: row.price_usd.filter(|v| v.is_finite()),
            });
        }

        events.sort_by(|a, b| {
            a.wallet_address
                .cmp(&b.wallet_address)
                .then_with(|| a.timestamp.cmp(&b.timestamp))
        });

        let dropped = total - events.len();
        info!("🧹 Normalized {} events ({} dropped with unrecognized actions)", events.len(), dropped);
        Ok(events)
    }
}

impl Default for EventNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert epoch seconds, possibly fractional, to a UTC instant
pub fn epoch_to_instant(seconds: f64) -> Result<DateTime<Utc>, ScoringError> {
    let invalid = || ScoringError::InvalidValue {
        field: "timestamp".to_string(),
        value: seconds.to_string(),
    };

    if !seconds.is_finite() || seconds.abs() > i64::MAX as f64 {
        return Err(invalid());
    }

    let whole = seconds.floor();
    let nanos = (((seconds - whole) * 1e9).round() as u32).min(999_999_999);
    DateTime::from_timestamp(whole as i64, nanos).ok_or_else(invalid)
}
