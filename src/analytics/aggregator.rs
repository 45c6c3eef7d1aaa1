/// Wallet aggregation
///
/// Reduces a batch of normalized events to one feature vector per wallet.
/// The result is a pure function of each wallet's event set.

use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

use super::features::{FeatureTable, WalletFeatures};
use crate::core::{Action, NormalizedEvent, SECONDS_PER_DAY};

pub struct WalletAggregator;

impl WalletAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Group events by wallet and compute a feature vector for each group
    #[instrument(skip(self, events), fields(events = events.len()))]
    pub fn aggregate(&self, events: &[NormalizedEvent]) -> FeatureTable {
        let mut by_wallet: BTreeMap<&str, Vec<&NormalizedEvent>> = BTreeMap::new();
        for event in events {
            by_wallet
                .entry(event.wallet_address.as_str())
                .or_default()
                .push(event);
        }

        let rows: Vec<WalletFeatures> = by_wallet
            .into_iter()
            .map(|(wallet, mut group)| {
                group.sort_by_key(|event| event.timestamp);
                let features = wallet_features(wallet, &group);
                debug!(wallet, tx_count = features.tx_count, "aggregated wallet");
                features
            })
            .collect();

        info!("📊 Aggregated {} events into {} wallet feature vectors", events.len(), rows.len());
        FeatureTable::new(rows)
    }
}

impl Default for WalletAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute the feature vector of one wallet from its time-sorted events
fn wallet_features(wallet: &str, group: &[&NormalizedEvent]) -> WalletFeatures {
    let count = |action: Action| group.iter().filter(|e| e.action == action).count() as u32;

    let tx_count = group.len() as u32;
    let num_deposits = count(Action::Deposit);
    let num_borrows = count(Action::Borrow);
    let num_repays = count(Action::Repay);
    let num_redeems = count(Action::RedeemUnderlying);
    let num_liquidations = count(Action::LiquidationCall);

    let usd_values: Vec<f64> = group.iter().map(|e| e.usd_value()).collect();
    let total_usd = saturate(usd_values.iter().sum());
    let avg_usd = mean(&usd_values);
    let usd_stddev = sample_stddev(&usd_values);

    let repay_borrow_ratio = if num_borrows > 0 {
        num_repays as f64 / num_borrows as f64
    } else {
        0.0
    };

    let activity_duration_days = match (group.first(), group.last()) {
        (Some(first), Some(last)) if group.len() > 1 => {
            let span = last.timestamp.signed_duration_since(first.timestamp);
            span.num_nanoseconds()
                .map(|ns| ns as f64 / 1e9)
                .unwrap_or_else(|| span.num_seconds() as f64)
                / SECONDS_PER_DAY
        }
        _ => 0.0,
    };

    let tx_frequency = if activity_duration_days > 0.0 {
        tx_count as f64 / activity_duration_days
    } else {
        tx_count as f64
    };

    let avg_tx_usd = if tx_count > 0 {
        total_usd / tx_count as f64
    } else {
        0.0
    };

    WalletFeatures {
        wallet_address: wallet.to_string(),
        tx_count,
        num_deposits,
        num_borrows,
        num_repays,
        num_redeems,
        num_liquidations,
        total_usd,
        avg_usd,
        usd_stddev,
        repay_borrow_ratio,
        activity_duration_days,
        tx_frequency,
        avg_tx_usd,
    }
}

/// Clamp overflowed USD sums back into the finite range
fn saturate(value: f64) -> f64 {
    value.clamp(-f64::MAX, f64::MAX)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    saturate(values.iter().sum::<f64>()) / values.len() as f64
}

/// Sample standard deviation with ddof = 1; 0.0 for fewer than two values
fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    saturate(variance.sqrt())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(seconds, 0).unwrap()
    }

    pub(crate) fn event(wallet: &str, action: Action, seconds: i64, amount: f64, price: f64) -> NormalizedEvent {
        NormalizedEvent {
            wallet_address: wallet.to_string(),
            action,
            timestamp: at(seconds),
            amount: Some(amount),
            asset_symbol: Some("USDC".to_string()),
            price_usd: Some(price),
        }
    }

    /// Wallet A: deposit $100, borrow $50, repay $50 over 5 days. Wallet B: one $10 deposit.
    pub(crate) fn scenario_events() -> Vec<NormalizedEvent> {
        let day = 86_400;
        vec![
            event("A", Action::Repay, 1_700_000_000 + 5 * day, 50.0, 1.0),
            event("B", Action::Deposit, 1_700_000_500, 10.0, 1.0),
            event("A", Action::Deposit, 1_700_000_000, 100.0, 1.0),
            event("A", Action::Borrow, 1_700_000_000 + 2 * day, 50.0, 1.0),
        ]
    }

    #[test]
    fn test_end_to_end_scenario() {
        let table = WalletAggregator::new().aggregate(&scenario_events());
        assert_eq!(table.len(), 2);

        let a = table.get("A").unwrap();
        assert_eq!(a.tx_count, 3);
        assert_eq!(a.num_deposits, 1);
        assert_eq!(a.num_borrows, 1);
        assert_eq!(a.num_repays, 1);
        assert_eq!(a.repay_borrow_ratio, 1.0);
        assert_eq!(a.total_usd, 200.0);
        assert!((a.activity_duration_days - 5.0).abs() < 1e-12);
        assert!((a.tx_frequency - 0.6).abs() < 1e-12);

        let b = table.get("B").unwrap();
        assert_eq!(b.activity_duration_days, 0.0);
        assert_eq!(b.tx_frequency, 1.0);
        assert_eq!(b.avg_tx_usd, 10.0);
    }

    #[test]
    fn test_zero_borrows_ratio_is_exactly_zero() {
        let events = vec![
            event("w", Action::Deposit, 100, 1.0, 1.0),
            event("w", Action::Repay, 200, 1.0, 1.0),
        ];
        let table = WalletAggregator::new().aggregate(&events);
        let w = table.get("w").unwrap();
        assert_eq!(w.num_borrows, 0);
        assert_eq!(w.repay_borrow_ratio, 0.0);
        assert!(w.repay_borrow_ratio.is_finite());
    }

    #[test]
    fn test_single_event_wallet() {
        let table = WalletAggregator::new().aggregate(&[event("solo", Action::Borrow, 100, 3.0, 2.0)]);
        let solo = table.get("solo").unwrap();
        assert_eq!(solo.activity_duration_days, 0.0);
        assert_eq!(solo.tx_frequency, solo.tx_count as f64);
        assert_eq!(solo.usd_stddev, 0.0);
        assert_eq!(solo.avg_usd, 6.0);
    }

    #[test]
    fn test_missing_amount_or_price_counts_as_zero_usd() {
        let mut no_price = event("w", Action::Deposit, 100, 5.0, 0.0);
        no_price.price_usd = None;
        let mut no_amount = event("w", Action::Deposit, 200, 0.0, 3.0);
        no_amount.amount = None;
        let table = WalletAggregator::new().aggregate(&[no_price, no_amount, event("w", Action::Deposit, 300, 2.0, 4.0)]);
        let w = table.get("w").unwrap();
        assert_eq!(w.total_usd, 8.0);
        assert_eq!(w.tx_count, 3);
    }

    #[test]
    fn test_usd_stddev_is_sample_stddev() {
        let events = vec![
            event("w", Action::Deposit, 1, 2.0, 1.0),
            event("w", Action::Deposit, 2, 4.0, 1.0),
            event("w", Action::Deposit, 3, 6.0, 1.0),
        ];
        let table = WalletAggregator::new().aggregate(&events);
        assert!((table.get("w").unwrap().usd_stddev - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_redeems_and_liquidations_counted() {
        let events = vec![
            event("w", Action::RedeemUnderlying, 1, 1.0, 1.0),
            event("w", Action::LiquidationCall, 2, 1.0, 1.0),
            event("w", Action::LiquidationCall, 3, 1.0, 1.0),
        ];
        let w = WalletAggregator::new().aggregate(&events).get("w").cloned().unwrap();
        assert_eq!(w.num_redeems, 1);
        assert_eq!(w.num_liquidations, 2);
        assert!(w.num_deposits + w.num_borrows + w.num_repays + w.num_liquidations <= w.tx_count);
    }

    #[test]
    fn test_aggregation_is_idempotent_and_order_independent() {
        let aggregator = WalletAggregator::new();
        let events = scenario_events();
        let first = aggregator.aggregate(&events);
        let second = aggregator.aggregate(&events);

        let mut reversed = events.clone();
        reversed.reverse();
        let third = aggregator.aggregate(&reversed);

        for ((x, y), z) in first.rows().iter().zip(second.rows()).zip(third.rows()) {
            assert_eq!(x, y);
            assert_eq!(x, z);
            assert_eq!(x.total_usd.to_bits(), y.total_usd.to_bits());
            assert_eq!(x.usd_stddev.to_bits(), z.usd_stddev.to_bits());
        }
    }

    #[test]
    fn test_overflowing_usd_values_stay_finite() {
        let events = vec![
            event("whale", Action::Deposit, 1, 1e200, 1e200),
            event("whale", Action::Deposit, 2, 1e200, 1e200),
        ];
        let whale = WalletAggregator::new().aggregate(&events).get("whale").cloned().unwrap();
        assert_eq!(whale.total_usd, f64::MAX);
        assert!(whale.avg_usd.is_finite());
        assert!(whale.usd_stddev.is_finite());
        assert!(whale.avg_tx_usd.is_finite());
    }

    #[test]
    fn test_empty_input_yields_empty_table() {
        assert!(WalletAggregator::new().aggregate(&[]).is_empty());
    }
}
