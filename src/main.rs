use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use privat_rates::core::JoinPolicy;
use privat_rates::core::config::{AppConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use privat_rates::core::log::init_logging;
use std::time::Duration;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Base URL of the bank API
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct CurrenciesArgs {
    /// Currency to convert from
    #[arg(long, default_value = "USD")]
    base: String,

    /// Currencies to fetch alongside the base; the first one is the conversion target
    #[arg(long = "target", default_values = ["EUR", "GBP"])]
    targets: Vec<String>,

    /// Maximum age in days of the rates to show (at most 10)
    #[arg(long, default_value_t = 10)]
    days: u32,

    /// Amount used for the example conversion
    #[arg(long, default_value_t = 100.0)]
    amount: f64,

    /// What to do when one currency fails: all-or-nothing or best-effort
    #[arg(long, default_value_t = JoinPolicy::AllOrNothing)]
    policy: JoinPolicy,
}

#[derive(Args)]
struct HistoryArgs {
    /// Number of past days to fetch (1-10)
    #[arg(value_parser = clap::value_parser!(u32).range(1..=10))]
    days: u32,

    /// Currencies to keep for each day
    #[arg(long = "currency", default_values = ["USD", "EUR"])]
    currencies: Vec<String>,

    /// What to do when one day fails: all-or-nothing or best-effort
    #[arg(long, default_value_t = JoinPolicy::BestEffort)]
    policy: JoinPolicy,
}

#[derive(Subcommand)]
enum Commands {
    /// Show recent rates per currency and convert an example amount
    Currencies(CurrenciesArgs),
    /// Show rates of selected currencies for each of the last days
    History(HistoryArgs),
}

impl Cli {
    fn app_config(&self) -> AppConfig {
        let mut config = AppConfig::default();
        config.provider.base_url = self.base_url.clone();
        config.provider.timeout = Duration::from_secs(self.timeout);

        match &self.command {
            Some(Commands::Currencies(args)) => {
                config.currencies.base = args.base.clone();
                config.currencies.targets = args.targets.clone();
                config.currencies.window_days = args.days;
                config.currencies.amount = args.amount;
                config.currencies.policy = args.policy;
            }
            Some(Commands::History(args)) => {
                config.history.days = args.days;
                config.history.currencies = args.currencies.clone();
                config.history.policy = args.policy;
            }
            None => {}
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = cli.app_config();
    let result = match cli.command {
        Some(Commands::Currencies(_)) => {
            privat_rates::run_command(privat_rates::AppCommand::Currencies, config).await
        }
        Some(Commands::History(_)) => {
            privat_rates::run_command(privat_rates::AppCommand::History, config).await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
