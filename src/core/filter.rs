//! Normalizes raw per-currency records into dated sale/purchase rates.
use crate::core::error::RateError;
use crate::core::rate::{DatedRates, RatePair, parse_date};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// One record of the per-currency endpoint, as sent by the API.
///
/// Fields are kept loosely typed: `date` has been seen both as a `dd.mm.yyyy`
/// string and as a bare number, and rates arrive as strings or numbers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRateRecord {
    #[serde(default)]
    pub date: Option<Value>,
    #[serde(default)]
    pub sale: Option<Value>,
    #[serde(default)]
    pub buy: Option<Value>,
}

fn parse_rate(
    identifier: &str,
    field: &'static str,
    value: Option<&Value>,
) -> Result<f64, RateError> {
    let invalid = |value: String| RateError::InvalidNumber {
        identifier: identifier.to_string(),
        field,
        value,
    };

    let rate = match value {
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| invalid(s.clone()))?,
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| invalid(n.to_string()))?,
        Some(other) => return Err(invalid(other.to_string())),
        None => return Err(invalid("<missing>".to_string())),
    };

    // Rates are quoted as positive amounts of the base currency
    if !rate.is_finite() || rate <= 0.0 {
        return Err(invalid(rate.to_string()));
    }
    Ok(rate)
}

fn record_date(record: &RawRateRecord) -> Option<NaiveDate> {
    match record.date.as_ref()? {
        Value::String(s) => parse_date(s),
        _ => None,
    }
}

/// Keeps the records dated within `window_days` of `today` (inclusive).
///
/// Records with a missing or unparseable date are skipped with a warning.
/// A sale or purchase value that is not a positive finite number fails the
/// whole identifier.
pub fn filter_records(
    identifier: &str,
    records: &[RawRateRecord],
    window_days: u32,
    today: NaiveDate,
) -> Result<DatedRates, RateError> {
    let mut rates = DatedRates::new();

    for record in records {
        let Some(date) = record_date(record) else {
            warn!(
                identifier,
                date = ?record.date,
                "Skipping record with unrecognized date"
            );
            continue;
        };

        let age = (today - date).num_days();
        if age > i64::from(window_days) {
            debug!(identifier, %date, age, "Record outside window");
            continue;
        }

        let sale = parse_rate(identifier, "sale", record.sale.as_ref())?;
        let purchase = parse_rate(identifier, "buy", record.buy.as_ref())?;
        rates.insert(date, RatePair::new(sale, purchase));
    }

    Ok(rates)
}
