pub mod cli;
pub mod core;
pub mod providers;
pub mod server;

use crate::core::config::AppConfig;
use crate::core::query::ListingQuery;
use crate::server::AppState;
use anyhow::Result;
use tracing::{debug, info};

/// Commands that need a loaded configuration.
#[derive(Debug, Clone)]
pub enum AppCommand {
    Serve,
    Products(ListingQuery),
    Price,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("aurum starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(
        catalog = %config.catalog_path.display(),
        environment = config.environment.as_str(),
        "Loaded config"
    );

    match command {
        AppCommand::Serve => server::serve(&config).await,
        AppCommand::Products(query) => {
            let state = AppState::from_config(&config)?;
            cli::products::run(&state.service, query).await
        }
        AppCommand::Price => {
            let state = AppState::from_config(&config)?;
            cli::price::run(&state.service).await
        }
    }
}
