pub mod catalog;
pub mod cli;
pub mod core;
pub mod providers;
pub mod service;
pub mod store;

use crate::core::config::AppConfig;
use crate::providers::NbpProvider;
use crate::service::{RateCacheService, ServiceSettings};
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

pub enum AppCommand {
    Rate { code: String },
    History { code: String, days: i64 },
    Currencies,
    Queries { count: usize },
}

/// Wires the configured store and provider into a ready service.
pub async fn build_service(config: &AppConfig) -> Result<RateCacheService> {
    let store = store::open_store(config)?;
    let provider = NbpProvider::new(&config.provider.nbp.base_url, config.provider_timeout())?;
    Ok(RateCacheService::new(store, Arc::new(provider), ServiceSettings::from(config)).await)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let service = build_service(&config).await?;

    match command {
        AppCommand::Rate { code } => cli::rates::display_rate(&service, &code).await,
        AppCommand::History { code, days } => {
            cli::rates::display_history(&service, &code, days).await
        }
        AppCommand::Currencies => cli::catalog::display_currencies(&service).await,
        AppCommand::Queries { count } => cli::catalog::display_queries(&service, count).await,
    }
}
