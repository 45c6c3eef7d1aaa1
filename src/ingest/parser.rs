/// JSON ingestion for lending protocol transaction dumps
///
/// Accepts AAVE-style records with the event payload nested under
/// `actionData`, as well as flat records that already use the pipeline's
/// field names. Numeric payload fields may be JSON numbers or numeric
/// strings; anything unparsable becomes null.

use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{info, instrument};

use crate::core::{RawEvent, ScoringError};

#[derive(Debug, Deserialize)]
struct ActionDataWire {
    #[serde(default)]
    amount: Option<Value>,
    #[serde(default, rename = "assetSymbol")]
    asset_symbol: Option<Value>,
    #[serde(default, rename = "assetPriceUSD")]
    asset_price_usd: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RecordWire {
    #[serde(default, alias = "userWallet")]
    wallet_address: Option<String>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    timestamp: Option<Value>,
    #[serde(default, rename = "actionData")]
    action_data: Option<ActionDataWire>,
    #[serde(default)]
    amount: Option<Value>,
    #[serde(default, alias = "asset")]
    asset_symbol: Option<Value>,
    #[serde(default)]
    price_usd: Option<Value>,
}

/// Coerce a JSON number or numeric string to a finite f64
fn coerce_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn coerce_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

impl RecordWire {
    fn into_raw_event(self, index: usize) -> Result<RawEvent, ScoringError> {
        let wallet_address = self
            .wallet_address
            .filter(|w| !w.is_empty())
            .ok_or_else(|| ScoringError::MissingField(format!("record {}: wallet_address", index)))?;

        let action = self
            .action
            .ok_or_else(|| ScoringError::MissingField(format!("record {}: action", index)))?;

        let timestamp_value = self
            .timestamp
            .ok_or_else(|| ScoringError::MissingField(format!("record {}: timestamp", index)))?;
        let timestamp = coerce_number(Some(&timestamp_value)).ok_or_else(|| ScoringError::InvalidValue {
            field: format!("record {}: timestamp", index),
            value: timestamp_value.to_string(),
        })?;

        // Nested payload wins over flat fields when both are present
        let (nested_amount, nested_symbol, nested_price) = match &self.action_data {
            Some(data) => (
                coerce_number(data.amount.as_ref()),
                coerce_string(data.asset_symbol.as_ref()),
                coerce_number(data.asset_price_usd.as_ref()),
            ),
            None => (None, None, None),
        };

        Ok(RawEvent {
            wallet_address,
            action,
            timestamp,
            amount: nested_amount.or_else(|| coerce_number(self.amount.as_ref())),
            asset_symbol: nested_symbol.or_else(|| coerce_string(self.asset_symbol.as_ref())),
            price_usd: nested_price.or_else(|| coerce_number(self.price_usd.as_ref())),
        })
    }
}

/// Parse a JSON array of transaction records
pub fn parse_records<R: Read>(reader: R) -> Result<Vec<RawEvent>, ScoringError> {
    let records: Vec<RecordWire> = serde_json::from_reader(reader)?;
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| record.into_raw_event(index))
        .collect()
}

/// Load raw events from a JSON file
#[instrument]
pub fn load_json(path: &Path) -> Result<Vec<RawEvent>, ScoringError> {
    let file = File::open(path)?;
    let events = parse_records(BufReader::new(file))?;
    info!("📥 Loaded {} raw events from {}", events.len(), path.display());
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_aave_record() {
        let json = r#"[{
            "_id": {"$oid": "681d38fed63812d4655f571a"},
            "userWallet": "0x00000000001accfa9cef68cf5371a23025b6d4b6",
            "network": "polygon",
            "action": "deposit",
            "timestamp": 1629178166,
            "actionData": {
                "type": "Deposit",
                "amount": "2000000000",
                "assetSymbol": "USDC",
                "assetPriceUSD": "0.9938318274296357"
            }
        }]"#;
        let events = parse_records(json.as_bytes()).unwrap();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.wallet_address, "0x00000000001accfa9cef68cf5371a23025b6d4b6");
        assert_eq!(event.action, "deposit");
        assert_eq!(event.timestamp, 1629178166.0);
        assert_eq!(event.amount, Some(2_000_000_000.0));
        assert_eq!(event.asset_symbol.as_deref(), Some("USDC"));
        assert!((event.price_usd.unwrap() - 0.9938318274296357).abs() < 1e-15);
    }

    #[test]
    fn test_parse_flat_record() {
        let json = r#"[{"wallet_address": "w1", "action": "borrow", "timestamp": "1700000000.5",
                        "amount": 12.5, "asset": "DAI", "price_usd": 1.0}]"#;
        let events = parse_records(json.as_bytes()).unwrap();
        assert_eq!(events[0].timestamp, 1_700_000_000.5);
        assert_eq!(events[0].amount, Some(12.5));
        assert_eq!(events[0].asset_symbol.as_deref(), Some("DAI"));
    }

    #[test]
    fn test_unparsable_numbers_become_null() {
        let json = r#"[{"userWallet": "w", "action": "repay", "timestamp": 1,
                        "actionData": {"amount": "n/a", "assetPriceUSD": null}}]"#;
        let events = parse_records(json.as_bytes()).unwrap();
        assert_eq!(events[0].amount, None);
        assert_eq!(events[0].price_usd, None);
        assert_eq!(events[0].asset_symbol, None);
    }

    #[test]
    fn test_missing_wallet_is_schema_error() {
        let json = r#"[{"action": "deposit", "timestamp": 1}]"#;
        let err = parse_records(json.as_bytes()).unwrap_err();
        assert!(err.is_schema_error());
        assert!(err.to_string().contains("wallet_address"));
    }

    #[test]
    fn test_bad_timestamp_is_schema_error() {
        let json = r#"[{"userWallet": "w", "action": "deposit", "timestamp": "yesterday"}]"#;
        assert!(parse_records(json.as_bytes()).unwrap_err().is_schema_error());
    }

    #[test]
    fn test_malformed_json_propagates() {
        let err = parse_records("not json".as_bytes()).unwrap_err();
        assert!(matches!(err, ScoringError::Json(_)));
    }
}
