use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("message store query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to encode message column: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to create message store directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("pending message {id} is not stored")]
    PendingNotFound { id: i64 },
}
