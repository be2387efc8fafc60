use std::path::PathBuf;

use serde::Deserialize;

use crate::infra::config::{AppConfig, FixtureConfig, LogConfig, PagingConfig, StorageConfig};

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub logging: Option<FileLogConfig>,
    pub storage: Option<FileStorageConfig>,
    pub paging: Option<FilePagingConfig>,
    pub fixture: Option<FileFixtureConfig>,
}

impl FileConfig {
    pub fn merge_into(self, config: &mut AppConfig) {
        if let Some(logging) = self.logging {
            logging.merge_into(&mut config.logging);
        }

        if let Some(storage) = self.storage {
            storage.merge_into(&mut config.storage);
        }

        if let Some(paging) = self.paging {
            paging.merge_into(&mut config.paging);
        }

        if let Some(fixture) = self.fixture {
            fixture.merge_into(&mut config.fixture);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileLogConfig {
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

impl FileLogConfig {
    fn merge_into(self, config: &mut LogConfig) {
        if let Some(level) = self.level {
            config.level = level;
        }

        if let Some(file) = self.file {
            config.file = Some(file);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileStorageConfig {
    pub database_path: Option<PathBuf>,
}

impl FileStorageConfig {
    fn merge_into(self, config: &mut StorageConfig) {
        if let Some(database_path) = self.database_path {
            config.database_path = Some(database_path);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FilePagingConfig {
    pub page_size: Option<usize>,
    pub initial_load_size: Option<usize>,
    pub max_fetches_per_load: Option<usize>,
}

impl FilePagingConfig {
    fn merge_into(self, config: &mut PagingConfig) {
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }

        if let Some(initial_load_size) = self.initial_load_size {
            config.initial_load_size = initial_load_size;
        }

        if let Some(max_fetches) = self.max_fetches_per_load {
            config.max_fetches_per_load = max_fetches;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileFixtureConfig {
    pub batch_size: Option<usize>,
}

impl FileFixtureConfig {
    fn merge_into(self, config: &mut FixtureConfig) {
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
    }
}
