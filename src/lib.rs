pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::providers::PrivatBankProvider;
use anyhow::{Context, Result};
use tracing::{debug, info};

pub enum AppCommand {
    /// Rate history per currency plus an example conversion
    Currencies,
    /// Rates of selected currencies for each of the last days
    History,
}

/// Wires configuration, provider and console output together.
pub struct App {
    config: AppConfig,
    provider: PrivatBankProvider,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let provider = PrivatBankProvider::from_config(&config.provider);
        App { config, provider }
    }

    pub async fn run(&self, command: AppCommand) -> Result<()> {
        debug!("Running with config: {:#?}", self.config);

        let today = self.config.today();
        match command {
            AppCommand::Currencies => {
                self.config
                    .validate_currencies()
                    .context("Invalid currency configuration")?;
                info!(today = %today, "Fetching rates per currency");
                cli::currencies::run(&self.provider, &self.config.currencies, today).await
            }
            AppCommand::History => {
                self.config
                    .validate_history()
                    .context("Invalid history configuration")?;
                info!(today = %today, "Fetching rates per date");
                cli::history::run(&self.provider, &self.config.history, today).await
            }
        }
    }
}

pub async fn run_command(command: AppCommand, config: AppConfig) -> Result<()> {
    App::new(config).run(command).await
}
