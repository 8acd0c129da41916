//! CLI subcommands.

pub mod config_cmd;
pub mod doctor;
pub mod serve;

use chatrelay_config::AppConfig;
use chatrelay_core::HistoryStore;
use chatrelay_memory::{InMemoryHistory, SqliteHistory};
use std::path::Path;
use std::sync::Arc;

/// Load config from `path` (or the default location) with env overrides.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    }
    .map_err(|e| format!("Failed to load config: {e}"))?;
    Ok(config)
}

/// Open the configured history store.
pub async fn open_history(config: &AppConfig) -> Result<Arc<dyn HistoryStore>, Box<dyn std::error::Error>> {
    let store: Arc<dyn HistoryStore> = match config.storage.backend.as_str() {
        "memory" => Arc::new(InMemoryHistory::new()),
        _ => Arc::new(SqliteHistory::new(&config.storage.database_url).await?),
    };
    Ok(store)
}
