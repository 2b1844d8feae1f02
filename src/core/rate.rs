//! Exchange rate abstractions and core types

use crate::core::error::RateError;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Upstream only serves history for the last ten days.
pub const MAX_WINDOW_DAYS: u32 = 10;

/// Date format used by the bank API, both in responses and in query strings.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

pub fn validate_window(window_days: u32) -> Result<(), RateError> {
    if window_days > MAX_WINDOW_DAYS {
        return Err(RateError::Validation(format!(
            "Number of days cannot exceed {MAX_WINDOW_DAYS}, got {window_days}"
        )));
    }
    Ok(())
}

/// Sale and purchase rate of one currency against the bank's base currency.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RatePair {
    pub sale: Option<f64>,
    pub purchase: Option<f64>,
}

impl RatePair {
    pub fn new(sale: f64, purchase: f64) -> Self {
        Self {
            sale: Some(sale),
            purchase: Some(purchase),
        }
    }
}

/// Rates of one currency keyed by date, in the order the API returned them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatedRates {
    entries: Vec<(NaiveDate, RatePair)>,
}

impl DatedRates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a rate, replacing the value of an existing date in place.
    pub fn insert(&mut self, date: NaiveDate, rates: RatePair) {
        match self.entries.iter_mut().find(|(d, _)| *d == date) {
            Some((_, existing)) => *existing = rates,
            None => self.entries.push((date, rates)),
        }
    }

    pub fn get(&self, date: NaiveDate) -> Option<&RatePair> {
        self.entries
            .iter()
            .find(|(d, _)| *d == date)
            .map(|(_, rates)| rates)
    }

    /// Most recent entry, regardless of insertion order.
    pub fn latest(&self) -> Option<(NaiveDate, &RatePair)> {
        self.entries
            .iter()
            .max_by_key(|(d, _)| *d)
            .map(|(d, rates)| (*d, rates))
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &RatePair)> {
        self.entries.iter().map(|(d, rates)| (*d, rates))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-currency rate histories, in the order the currencies were requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    currencies: Vec<(String, DatedRates)>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, currency: impl Into<String>, rates: DatedRates) {
        let currency = currency.into();
        match self.currencies.iter_mut().find(|(c, _)| *c == currency) {
            Some((_, existing)) => *existing = rates,
            None => self.currencies.push((currency, rates)),
        }
    }

    pub fn get(&self, currency: &str) -> Option<&DatedRates> {
        self.currencies
            .iter()
            .find(|(c, _)| c == currency)
            .map(|(_, rates)| rates)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DatedRates)> {
        self.currencies.iter().map(|(c, rates)| (c.as_str(), rates))
    }

    pub fn currencies(&self) -> Vec<&str> {
        self.currencies.iter().map(|(c, _)| c.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty()
    }

    /// Resolves one rate per currency by taking its most recent date.
    /// Currencies without any entry inside the window are left out.
    pub fn latest_rates(&self) -> HashMap<String, RatePair> {
        self.currencies
            .iter()
            .filter_map(|(c, rates)| rates.latest().map(|(_, pair)| (c.clone(), *pair)))
            .collect()
    }
}

impl FromIterator<(String, DatedRates)> for RateTable {
    fn from_iter<T: IntoIterator<Item = (String, DatedRates)>>(iter: T) -> Self {
        let mut table = RateTable::new();
        for (currency, rates) in iter {
            table.push(currency, rates);
        }
        table
    }
}

/// Rates of the requested currencies published for a single day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayRates {
    pub date: NaiveDate,
    pub rates: Vec<(String, RatePair)>,
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Fetches the rate history of one currency, keeping entries no older than
    /// `window_days` relative to `today`.
    async fn fetch_currency(
        &self,
        currency: &str,
        window_days: u32,
        today: NaiveDate,
    ) -> Result<DatedRates, RateError>;

    /// Fetches every rate the bank published for `date`.
    async fn fetch_day(&self, date: NaiveDate) -> Result<Vec<(String, RatePair)>, RateError>;
}
