use std::{path::Path, sync::Arc};

use tracing_appender::non_blocking::WorkerGuard;

use crate::{
    infra::{
        self, config::FileConfigAdapter, contracts::ConfigAdapter, error::AppError,
        storage_layout::StorageLayout,
    },
    storage::SqliteMessageStore,
    usecases::context::AppContext,
};

const STORE_OPENED: &str = "STORE_OPENED";

/// Loads config, installs logging and opens the message store.
pub fn bootstrap(config_path: Option<&Path>) -> anyhow::Result<(AppContext, Option<WorkerGuard>)> {
    let config = FileConfigAdapter::new(config_path).load()?;
    let guard = infra::logging::init(&config.logging)?;
    let context = build_context(config)?;

    Ok((context, guard))
}

fn build_context(config: infra::config::AppConfig) -> Result<AppContext, AppError> {
    let layout = StorageLayout::resolve(&config.storage)?;
    layout.ensure_dirs()?;

    let store = SqliteMessageStore::open(&layout.database_file).map_err(AppError::StoreOpen)?;
    tracing::debug!(
        code = STORE_OPENED,
        path = %layout.database_file.display(),
        "message store opened"
    );

    Ok(AppContext::new(config, Arc::new(store)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        infra::{config::AppConfig, stubs::StubConfigAdapter},
        usecases::contracts::MessageStore,
    };

    #[test]
    fn builds_context_with_store_at_configured_path() {
        let root = tempfile::tempdir().expect("temp dir");
        let mut config = StubConfigAdapter.load().expect("stub config must load");
        config.storage.database_path = Some(root.path().join("db").join("messages.db"));

        let context = build_context(config).expect("context should build");

        assert!(root.path().join("db").join("messages.db").exists());
        assert_eq!(context.store.message_count(1).expect("count"), 0);
        assert_eq!(context.config.paging, AppConfig::default().paging);
    }

    #[test]
    fn paging_state_follows_config() {
        let root = tempfile::tempdir().expect("temp dir");
        let mut config = AppConfig::default();
        config.storage.database_path = Some(root.path().join("messages.db"));
        config.paging.page_size = 7;
        config.paging.initial_load_size = 21;

        let context = build_context(config).expect("context should build");
        let paging = context.paging_state();

        assert_eq!(paging.page_size, 7);
        assert_eq!(paging.initial_load_size, 21);
    }
}
