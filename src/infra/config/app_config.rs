use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AppConfig {
    pub logging: LogConfig,
    pub storage: StorageConfig,
    pub paging: PagingConfig,
    pub fixture: FixtureConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    /// Also write logs to this file when set.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StorageConfig {
    /// Defaults to `messages.db` under the platform data directory.
    pub database_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PagingConfig {
    pub page_size: usize,
    pub initial_load_size: usize,
    pub max_fetches_per_load: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            initial_load_size: 60,
            max_fetches_per_load: 32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FixtureConfig {
    pub batch_size: usize,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self { batch_size: 16 }
    }
}
