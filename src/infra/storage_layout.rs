use std::{fs, path::PathBuf};

use crate::infra::{config::StorageConfig, error::AppError};

const APP_DIR_NAME: &str = "chatcache";
const DATABASE_FILE_NAME: &str = "messages.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    pub data_dir: PathBuf,
    pub database_file: PathBuf,
}

impl StorageLayout {
    /// An explicit database path wins; otherwise the platform data directory is used.
    pub fn resolve(config: &StorageConfig) -> Result<Self, AppError> {
        if let Some(database_file) = &config.database_path {
            let data_dir = database_file
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));

            return Ok(Self {
                data_dir,
                database_file: database_file.clone(),
            });
        }

        let data_dir = dirs::data_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
            .ok_or_else(|| AppError::StoragePathResolution {
                details: "unable to resolve data base directory".into(),
            })?
            .join(APP_DIR_NAME);

        Ok(Self {
            database_file: data_dir.join(DATABASE_FILE_NAME),
            data_dir,
        })
    }

    pub fn ensure_dirs(&self) -> Result<(), AppError> {
        if self.data_dir.as_os_str().is_empty() {
            return Ok(());
        }

        fs::create_dir_all(&self.data_dir).map_err(|source| AppError::StorageDirCreate {
            path: self.data_dir.clone(),
            source,
        })
    }
}
