//! Currency conversion through the bank's purchase rates.

use crate::core::rate::RatePair;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConversionError {
    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    #[error("Invalid exchange rates data for {0}")]
    InvalidRateData(String),
}

/// A single conversion to run against a set of resolved rates.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub amount: f64,
    pub from: String,
    pub to: String,
}

impl ConversionRequest {
    pub fn new(amount: f64, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            amount,
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn convert(&self, rates: &HashMap<String, RatePair>) -> Result<f64, ConversionError> {
        convert(self.amount, &self.from, &self.to, rates)
    }
}

fn purchase_rate(
    currency: &str,
    rates: &HashMap<String, RatePair>,
) -> Result<f64, ConversionError> {
    match rates.get(currency).map(|pair| pair.purchase) {
        None => Err(ConversionError::InvalidCurrency(currency.to_string())),
        Some(Some(rate)) if rate > 0.0 => Ok(rate),
        Some(_) => Err(ConversionError::InvalidRateData(currency.to_string())),
    }
}

/// Converts `amount` from one currency to another.
///
/// Both purchase rates are quoted against the bank's base currency, which acts
/// as the pivot: `amount / purchase(from) * purchase(to)`.
pub fn convert(
    amount: f64,
    from: &str,
    to: &str,
    rates: &HashMap<String, RatePair>,
) -> Result<f64, ConversionError> {
    if from == to {
        return Ok(amount);
    }

    if !rates.contains_key(from) {
        return Err(ConversionError::InvalidCurrency(from.to_string()));
    }
    if !rates.contains_key(to) {
        return Err(ConversionError::InvalidCurrency(to.to_string()));
    }

    let from_rate = purchase_rate(from, rates)?;
    let to_rate = purchase_rate(to, rates)?;
    Ok(amount / from_rate * to_rate)
}
