use super::ui;
use crate::core::batch::fetch_all;
use crate::core::config::CurrencyConfig;
use crate::core::rate::format_date;
use crate::core::{ConversionRequest, RateError, RateProvider, RateTable};
use crate::providers::PrivatBankProvider;
use chrono::NaiveDate;
use comfy_table::{Cell, Table};
use tracing::debug;

/// Outcome of one per-currency batch.
#[derive(Debug, Default)]
pub struct CurrencyReport {
    pub table: RateTable,
    /// Currencies dropped by a best-effort batch.
    pub failed: Vec<String>,
}

/// Fetches the base and target currencies concurrently over one session.
pub async fn fetch_rate_table(
    provider: &PrivatBankProvider,
    config: &CurrencyConfig,
    today: NaiveDate,
) -> Result<CurrencyReport, RateError> {
    let codes = config.currency_codes();
    let session = provider.session()?;
    let session = &session;

    let pb = ui::new_progress_bar(codes.len() as u64);
    let result = fetch_all(&codes, config.policy, |code: String| {
        let pb = pb.clone();
        async move {
            let res = session.fetch_currency(&code, config.window_days, today).await;
            pb.inc(1);
            res
        }
    })
    .await;
    pb.finish_and_clear();

    let mut report = CurrencyReport::default();
    for item in result? {
        match item.value {
            Some(rates) => report.table.push(item.identifier, rates),
            None => report.failed.push(item.identifier),
        }
    }
    debug!(
        fetched = report.table.currencies().len(),
        failed = report.failed.len(),
        "Currency batch complete"
    );
    Ok(report)
}

/// Renders currency -> date -> sale/purchase.
pub fn render_rate_table(table: &RateTable) -> Table {
    let mut output = ui::new_styled_table();
    output.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Date"),
        ui::header_cell("Sale"),
        ui::header_cell("Purchase"),
    ]);

    for (currency, rates) in table.iter() {
        if rates.is_empty() {
            output.add_row(vec![
                Cell::new(currency),
                Cell::new("no rates in window"),
                ui::rate_cell(None),
                ui::rate_cell(None),
            ]);
            continue;
        }
        for (date, pair) in rates.iter() {
            output.add_row(vec![
                Cell::new(currency),
                Cell::new(format_date(date)),
                ui::rate_cell(pair.sale),
                ui::rate_cell(pair.purchase),
            ]);
        }
    }
    output
}

pub fn format_conversion(request: &ConversionRequest, converted: f64) -> String {
    format!("{} {} = {:.2} {}", request.amount, request.from, converted, request.to)
}

/// Fetches, prints the rates and runs the example conversion.
///
/// A failed fetch or conversion is printed, not returned: the process still
/// exits normally.
pub async fn run(
    provider: &PrivatBankProvider,
    config: &CurrencyConfig,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let report = match fetch_rate_table(provider, config, today).await {
        Ok(report) => report,
        Err(e) => {
            println!("{}", ui::style_text(&format!("Error: {e}"), ui::StyleType::Error));
            return Ok(());
        }
    };

    println!("\n{}", ui::style_text("Exchange rates", ui::StyleType::Title));
    println!("{}", render_rate_table(&report.table));
    if !report.failed.is_empty() {
        println!(
            "{}",
            ui::style_text(
                &format!("Rates unavailable for: {}", report.failed.join(", ")),
                ui::StyleType::Error
            )
        );
    }

    let Some(target) = config.targets.first() else {
        return Ok(());
    };
    let request = ConversionRequest::new(config.amount, &config.base, target);
    match request.convert(&report.table.latest_rates()) {
        Ok(converted) => println!(
            "\n{}",
            ui::style_text(&format_conversion(&request, converted), ui::StyleType::Result)
        ),
        Err(e) => println!(
            "\n{}",
            ui::style_text(&format!("Conversion error: {e}"), ui::StyleType::Error)
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DatedRates, JoinPolicy, RatePair};
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn jan(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    async fn mount_currency(
        server: &MockServer,
        code: &str,
        status: u16,
        body: &str,
        delay_ms: u64,
    ) {
        Mock::given(method("GET"))
            .and(path("/pubinfo"))
            .and(query_param("ccy", code))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_string(body)
                    .set_delay(Duration::from_millis(delay_ms)),
            )
            .mount(server)
            .await;
    }

    fn config(targets: &[&str], policy: JoinPolicy) -> CurrencyConfig {
        CurrencyConfig {
            base: "USD".to_string(),
            targets: targets.iter().map(|t| t.to_string()).collect(),
            window_days: 10,
            amount: 100.0,
            policy,
        }
    }

    #[tokio::test]
    async fn test_scenario_usd_eur() {
        let server = MockServer::start().await;
        let usd = r#"[{"date":"01.01.2024","sale":"27.5","buy":"27.0"}]"#;
        let eur = r#"[{"date":"01.01.2024","sale":"30.0","buy":"29.5"}]"#;
        mount_currency(&server, "USD", 200, usd, 0).await;
        mount_currency(&server, "EUR", 200, eur, 0).await;

        let provider = PrivatBankProvider::new(&server.uri(), Duration::from_secs(5));
        let config = config(&["EUR"], JoinPolicy::AllOrNothing);
        let report = fetch_rate_table(&provider, &config, jan(5)).await.unwrap();

        assert_eq!(report.table.currencies(), vec!["USD", "EUR"]);
        assert_eq!(
            report.table.get("USD").unwrap().get(jan(1)),
            Some(&RatePair::new(27.5, 27.0))
        );

        let request = ConversionRequest::new(100.0, "USD", "EUR");
        let converted = request.convert(&report.table.latest_rates()).unwrap();
        assert!((converted - 109.259_259_259).abs() < 1e-6);
        assert_eq!(format_conversion(&request, converted), "100 USD = 109.26 EUR");
    }

    #[tokio::test]
    async fn test_order_survives_reversed_latency() {
        let server = MockServer::start().await;
        let body = r#"[{"date":"01.01.2024","sale":"1.0","buy":"1.0"}]"#;
        mount_currency(&server, "USD", 200, body, 300).await;
        mount_currency(&server, "EUR", 200, body, 150).await;
        mount_currency(&server, "GBP", 200, body, 0).await;

        let provider = PrivatBankProvider::new(&server.uri(), Duration::from_secs(5));
        let config = config(&["EUR", "GBP"], JoinPolicy::AllOrNothing);
        let report = fetch_rate_table(&provider, &config, jan(5)).await.unwrap();

        assert_eq!(report.table.currencies(), vec!["USD", "EUR", "GBP"]);
    }

    #[tokio::test]
    async fn test_all_or_nothing_returns_error() {
        let server = MockServer::start().await;
        let body = r#"[{"date":"01.01.2024","sale":"1.0","buy":"1.0"}]"#;
        mount_currency(&server, "USD", 200, body, 0).await;
        mount_currency(&server, "EUR", 503, "", 0).await;

        let provider = PrivatBankProvider::new(&server.uri(), Duration::from_secs(5));
        let config = config(&["EUR"], JoinPolicy::AllOrNothing);
        let err = fetch_rate_table(&provider, &config, jan(5)).await.unwrap_err();

        assert_eq!(err.identifier(), Some("EUR"));
    }

    #[tokio::test]
    async fn test_best_effort_reports_failures() {
        let server = MockServer::start().await;
        let body = r#"[{"date":"01.01.2024","sale":"1.0","buy":"1.0"}]"#;
        mount_currency(&server, "USD", 200, body, 0).await;
        mount_currency(&server, "EUR", 503, "", 0).await;
        mount_currency(&server, "GBP", 200, body, 0).await;

        let provider = PrivatBankProvider::new(&server.uri(), Duration::from_secs(5));
        let config = config(&["EUR", "GBP"], JoinPolicy::BestEffort);
        let report = fetch_rate_table(&provider, &config, jan(5)).await.unwrap();

        assert_eq!(report.table.currencies(), vec!["USD", "GBP"]);
        assert_eq!(report.failed, vec!["EUR"]);
    }

    #[test]
    fn test_render_rate_table() {
        let mut usd = DatedRates::new();
        usd.insert(jan(2), RatePair::new(27.5, 27.0));
        let table: RateTable = vec![
            ("USD".to_string(), usd),
            ("EUR".to_string(), DatedRates::new()),
        ]
        .into_iter()
        .collect();

        let rendered = render_rate_table(&table).to_string();
        assert!(rendered.contains("02.01.2024"));
        assert!(rendered.contains("27.5000"));
        assert!(rendered.contains("no rates in window"));
    }
}
