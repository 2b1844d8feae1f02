use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::config::ProviderConfig;
use crate::core::error::RateError;
use crate::core::filter::{RawRateRecord, filter_records};
use crate::core::rate::{DatedRates, RatePair, RateProvider, format_date, validate_window};

/// PrivatBank public API. Holds endpoint settings only; requests go through a
/// [`PrivatBankSession`] opened per batch.
pub struct PrivatBankProvider {
    base_url: String,
    timeout: Duration,
}

impl PrivatBankProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        PrivatBankProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(&config.base_url, config.timeout)
    }

    /// Opens an HTTP session to be shared by every request of one batch.
    pub fn session(&self) -> Result<PrivatBankSession, RateError> {
        let client = reqwest::Client::builder()
            .user_agent("privat-rates/0.1")
            .timeout(self.timeout)
            .build()
            .map_err(RateError::Session)?;

        Ok(PrivatBankSession {
            base_url: self.base_url.clone(),
            client,
        })
    }
}

pub struct PrivatBankSession {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArchiveResponse {
    #[serde(default)]
    exchange_rate: Vec<ArchiveRate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArchiveRate {
    currency: Option<String>,
    sale_rate: Option<f64>,
    purchase_rate: Option<f64>,
}

impl PrivatBankSession {
    async fn get_json<T: DeserializeOwned>(
        &self,
        identifier: &str,
        url: &str,
    ) -> Result<T, RateError> {
        debug!("Requesting exchange rates from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| RateError::Transport {
                identifier: identifier.to_string(),
                source,
            })?;

        if response.status() != StatusCode::OK {
            return Err(RateError::Fetch {
                identifier: identifier.to_string(),
                status: response.status(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|source| RateError::Transport {
                identifier: identifier.to_string(),
                source,
            })?;

        serde_json::from_str(&text).map_err(|source| RateError::Body {
            identifier: identifier.to_string(),
            source,
        })
    }
}

#[async_trait]
impl RateProvider for PrivatBankSession {
    #[instrument(
        name = "PrivatCurrencyFetch",
        skip(self, today),
        fields(currency = %currency)
    )]
    async fn fetch_currency(
        &self,
        currency: &str,
        window_days: u32,
        today: NaiveDate,
    ) -> Result<DatedRates, RateError> {
        validate_window(window_days)?;

        let url = format!("{}/pubinfo?json&exchange&coursid=5&ccy={}", self.base_url, currency);
        let records: Vec<RawRateRecord> = self.get_json(currency, &url).await?;
        debug!(count = records.len(), "Received currency records");

        filter_records(currency, &records, window_days, today)
    }

    #[instrument(name = "PrivatDayFetch", skip(self), fields(date = %date))]
    async fn fetch_day(&self, date: NaiveDate) -> Result<Vec<(String, RatePair)>, RateError> {
        let identifier = format_date(date);
        let url = format!("{}/exchange_rates?json&date={}", self.base_url, identifier);
        let data: ArchiveResponse = self.get_json(&identifier, &url).await?;

        Ok(data
            .exchange_rate
            .into_iter()
            .filter_map(|rate| {
                rate.currency.map(|currency| {
                    (
                        currency,
                        RatePair {
                            sale: rate.sale_rate,
                            purchase: rate.purchase_rate,
                        },
                    )
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
    }

    async fn create_currency_mock(currency: &str, status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/pubinfo"))
            .and(query_param("coursid", "5"))
            .and(query_param("ccy", currency))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn provider(mock_server: &MockServer) -> PrivatBankProvider {
        PrivatBankProvider::new(&mock_server.uri(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_successful_currency_fetch() {
        let body = r#"[
            {"date": "01.01.2024", "sale": "27.5", "buy": "27.0"},
            {"date": "04.01.2024", "sale": "27.7", "buy": "27.2"}
        ]"#;
        let mock_server = create_currency_mock("USD", 200, body).await;

        let session = provider(&mock_server).session().unwrap();
        let rates = session.fetch_currency("USD", 10, today()).await.unwrap();

        assert_eq!(rates.len(), 2);
        let (latest_date, latest) = rates.latest().unwrap();
        assert_eq!(latest_date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
        assert_eq!(latest, &RatePair::new(27.7, 27.2));
    }

    #[tokio::test]
    async fn test_window_above_limit_makes_no_request() {
        let mock_server = create_currency_mock("USD", 200, "[]").await;

        let session = provider(&mock_server).session().unwrap();
        let result = session.fetch_currency("USD", 11, today()).await;

        assert!(matches!(result, Err(RateError::Validation(_))));
        let requests = mock_server.received_requests().await.unwrap();
        assert!(requests.is_empty());
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let mock_server = create_currency_mock("XYZ", 500, "").await;

        let session = provider(&mock_server).session().unwrap();
        let result = session.fetch_currency("XYZ", 10, today()).await;

        assert_eq!(
            result.unwrap_err().to_string(),
            "Failed to fetch exchange rates for XYZ: HTTP 500 Internal Server Error"
        );
        // No retry
        assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let mock_server = create_currency_mock("USD", 200, "<html>maintenance</html>").await;

        let session = provider(&mock_server).session().unwrap();
        let result = session.fetch_currency("USD", 10, today()).await;

        let err = result.unwrap_err();
        assert!(matches!(err, RateError::Body { .. }));
        let message = err.to_string();
        assert!(message.contains("Failed to parse JSON response for USD"));
    }

    #[tokio::test]
    async fn test_timeout_is_applied() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pubinfo"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("[]")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let provider = PrivatBankProvider::new(&mock_server.uri(), Duration::from_millis(100));
        let session = provider.session().unwrap();
        let result = session.fetch_currency("USD", 10, today()).await;

        assert!(matches!(result, Err(RateError::Transport { .. })));
    }

    #[tokio::test]
    async fn test_successful_day_fetch() {
        let mock_server = MockServer::start().await;
        let body = r#"{
            "date": "01.12.2014",
            "bank": "PB",
            "baseCurrency": 980,
            "baseCurrencyLit": "UAH",
            "exchangeRate": [
                {"baseCurrency": "UAH", "saleRateNB": 15.05, "purchaseRateNB": 15.05},
                {"baseCurrency": "UAH", "currency": "USD", "saleRateNB": 15.05,
                 "purchaseRateNB": 15.05, "saleRate": 15.7, "purchaseRate": 15.35},
                {"baseCurrency": "UAH", "currency": "PLN", "saleRateNB": 4.47,
                 "purchaseRateNB": 4.47}
            ]
        }"#;

        Mock::given(method("GET"))
            .and(path("/exchange_rates"))
            .and(query_param("date", "01.12.2014"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;

        let session = provider(&mock_server).session().unwrap();
        let rates = session
            .fetch_day(NaiveDate::from_ymd_opt(2014, 12, 1).unwrap())
            .await
            .unwrap();

        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0], ("USD".to_string(), RatePair::new(15.7, 15.35)));
        assert_eq!(rates[1].0, "PLN");
        assert_eq!(rates[1].1.purchase, None);
    }

    #[tokio::test]
    async fn test_day_fetch_error_names_date() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/exchange_rates"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let session = provider(&mock_server).session().unwrap();
        let err = session
            .fetch_day(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
            .await
            .unwrap_err();

        assert_eq!(err.identifier(), Some("02.01.2024"));
    }
}
