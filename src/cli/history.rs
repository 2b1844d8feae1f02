use super::ui;
use crate::core::batch::{BatchItem, fetch_all};
use crate::core::config::HistoryConfig;
use crate::core::rate::format_date;
use crate::core::{DayRates, RateError, RatePair, RateProvider};
use crate::providers::PrivatBankProvider;
use chrono::NaiveDate;
use comfy_table::{Cell, Table};

/// Keeps the requested currencies of each fetched day.
///
/// Days that failed or that carry none of the currencies are dropped.
pub fn select_currencies(
    items: Vec<BatchItem<NaiveDate, Vec<(String, RatePair)>>>,
    currencies: &[String],
) -> Vec<DayRates> {
    items
        .into_iter()
        .filter_map(|item| {
            let rates: Vec<(String, RatePair)> = item
                .value?
                .into_iter()
                .filter(|(currency, _)| currencies.contains(currency))
                .collect();
            (!rates.is_empty()).then_some(DayRates {
                date: item.identifier,
                rates,
            })
        })
        .collect()
}

/// Fetches the archive for each of the last `days` days over one session.
pub async fn fetch_history(
    provider: &PrivatBankProvider,
    config: &HistoryConfig,
    today: NaiveDate,
) -> Result<Vec<DayRates>, RateError> {
    let dates = config.dates(today);
    let session = provider.session()?;
    let session = &session;

    let pb = ui::new_progress_bar(dates.len() as u64);
    let result = fetch_all(&dates, config.policy, |date: NaiveDate| {
        let pb = pb.clone();
        async move {
            let res = session.fetch_day(date).await;
            pb.inc(1);
            res
        }
    })
    .await;
    pb.finish_and_clear();

    Ok(select_currencies(result?, &config.currencies))
}

pub fn render_history(days: &[DayRates]) -> Table {
    let mut output = ui::new_styled_table();
    output.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Currency"),
        ui::header_cell("Sale"),
        ui::header_cell("Purchase"),
    ]);

    for day in days {
        for (currency, pair) in &day.rates {
            output.add_row(vec![
                Cell::new(format_date(day.date)),
                Cell::new(currency),
                ui::rate_cell(pair.sale),
                ui::rate_cell(pair.purchase),
            ]);
        }
    }
    output
}

pub async fn run(
    provider: &PrivatBankProvider,
    config: &HistoryConfig,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let days = match fetch_history(provider, config, today).await {
        Ok(days) => days,
        Err(e) => {
            println!("{}", ui::style_text(&format!("Error: {e}"), ui::StyleType::Error));
            return Ok(());
        }
    };

    if days.is_empty() {
        println!("{}", ui::style_text("No exchange rates found.", ui::StyleType::Subtle));
        return Ok(());
    }

    println!("\n{}", ui::style_text("Exchange rate history", ui::StyleType::Title));
    println!("{}", render_history(&days));
    Ok(())
}
