use std::fs;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::infra::{config::LogConfig, error::AppError};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Installs the global subscriber. Keep the returned guard alive for the file
/// sink to flush.
pub fn init(config: &LogConfig) -> Result<Option<WorkerGuard>, AppError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (file_layer, guard): (Option<BoxedLayer>, Option<WorkerGuard>) = match &config.file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .map(|dir| dir.to_path_buf())
                .unwrap_or_else(|| ".".into());
            fs::create_dir_all(&directory).map_err(|source| AppError::StorageDirCreate {
                path: directory.clone(),
                source,
            })?;

            let file_name = path
                .file_name()
                .map(|name| name.to_owned())
                .unwrap_or_else(|| "chatcache.log".into());
            let appender = tracing_appender::rolling::never(&directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()
        .map_err(|error| AppError::LoggingInit(Box::new(error)))?;

    Ok(guard)
}
