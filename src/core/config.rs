use crate::core::batch::JoinPolicy;
use crate::core::error::RateError;
use crate::core::rate::{MAX_WINDOW_DAYS, validate_window};
use chrono::NaiveDate;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.privatbank.ua/p24api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Settings of the per-currency pipeline.
#[derive(Debug, Clone)]
pub struct CurrencyConfig {
    pub base: String,
    pub targets: Vec<String>,
    pub window_days: u32,
    pub amount: f64,
    pub policy: JoinPolicy,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        CurrencyConfig {
            base: "USD".to_string(),
            targets: vec!["EUR".to_string(), "GBP".to_string()],
            window_days: MAX_WINDOW_DAYS,
            amount: 100.0,
            policy: JoinPolicy::AllOrNothing,
        }
    }
}

impl CurrencyConfig {
    /// Base currency followed by the targets, in request order.
    pub fn currency_codes(&self) -> Vec<String> {
        std::iter::once(self.base.clone())
            .chain(self.targets.iter().cloned())
            .collect()
    }
}

/// Settings of the per-date pipeline.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    pub days: u32,
    pub currencies: Vec<String>,
    pub policy: JoinPolicy,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            days: MAX_WINDOW_DAYS,
            currencies: vec!["USD".to_string(), "EUR".to_string()],
            policy: JoinPolicy::BestEffort,
        }
    }
}

impl HistoryConfig {
    /// The `days` calendar days before `today`, most recent first.
    pub fn dates(&self, today: NaiveDate) -> Vec<NaiveDate> {
        (1..=self.days)
            .filter_map(|offset| today.checked_sub_days(chrono::Days::new(u64::from(offset))))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub currencies: CurrencyConfig,
    pub history: HistoryConfig,
    /// Reference date for window filtering; the local date when unset.
    pub today: Option<NaiveDate>,
}

impl AppConfig {
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Checks the settings used by the per-currency pipeline.
    pub fn validate_currencies(&self) -> Result<(), RateError> {
        self.validate_provider()?;
        validate_window(self.currencies.window_days)?;

        if self.currencies.base.trim().is_empty() {
            return Err(RateError::Validation("Base currency cannot be empty".to_string()));
        }
        if self.currencies.targets.is_empty() {
            return Err(RateError::Validation(
                "At least one target currency is required".to_string(),
            ));
        }

        debug!("Currency configuration is valid");
        Ok(())
    }

    /// Checks the settings used by the per-date pipeline.
    pub fn validate_history(&self) -> Result<(), RateError> {
        self.validate_provider()?;
        validate_window(self.history.days)?;

        if self.history.days == 0 {
            return Err(RateError::Validation("Number of days must be at least 1".to_string()));
        }

        debug!("History configuration is valid");
        Ok(())
    }

    fn validate_provider(&self) -> Result<(), RateError> {
        if self.provider.timeout.is_zero() {
            return Err(RateError::Validation("Request timeout must be positive".to_string()));
        }
        Ok(())
    }
}
