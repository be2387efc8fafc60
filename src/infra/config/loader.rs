use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::infra::{
    config::{file_config::FileConfig, AppConfig},
    error::AppError,
};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

pub fn load(path: Option<&Path>) -> Result<AppConfig, AppError> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = AppConfig::default();

    if !config_path.exists() {
        return Ok(config);
    }

    let raw = fs::read_to_string(&config_path).map_err(|source| AppError::ConfigRead {
        path: config_path.clone(),
        source,
    })?;

    let file_config: FileConfig = toml::from_str(&raw).map_err(|source| AppError::ConfigParse {
        path: config_path.clone(),
        source,
    })?;

    file_config.merge_into(&mut config);
    validate(&config, &config_path)?;
    Ok(config)
}

fn validate(config: &AppConfig, path: &Path) -> Result<(), AppError> {
    let invalid = |details: &str| AppError::ConfigInvalid {
        path: path.to_path_buf(),
        details: details.to_owned(),
    };

    if config.paging.page_size == 0 {
        return Err(invalid("paging.page_size must be greater than zero"));
    }
    if config.paging.initial_load_size == 0 {
        return Err(invalid("paging.initial_load_size must be greater than zero"));
    }
    if config.paging.max_fetches_per_load == 0 {
        return Err(invalid("paging.max_fetches_per_load must be greater than zero"));
    }
    if config.fixture.batch_size == 0 {
        return Err(invalid("fixture.batch_size must be greater than zero"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_defaults_when_file_is_missing() {
        let config = load(Some(Path::new("./missing-config.toml"))).expect("config must load");

        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn merges_file_values_over_defaults() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let config_path = temp_dir.path().join("config.toml");

        fs::write(
            &config_path,
            r#"[logging]
level = "debug"

[storage]
database_path = "/var/cache/chatcache/messages.db"

[paging]
page_size = 30
"#,
        )
        .expect("must write test config");

        let config = load(Some(&config_path)).expect("config must load");

        assert_eq!(config.logging.level, "debug");
        assert_eq!(
            config.storage.database_path,
            Some(PathBuf::from("/var/cache/chatcache/messages.db"))
        );
        assert_eq!(config.paging.page_size, 30);
        assert_eq!(config.paging.initial_load_size, 60);
        assert_eq!(config.fixture.batch_size, 16);
    }

    #[test]
    fn rejects_zero_page_size() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[paging]\npage_size = 0\n").expect("must write test config");

        let err = load(Some(&config_path)).expect_err("zero page size must be rejected");

        assert!(matches!(err, AppError::ConfigInvalid { .. }));
    }

    #[test]
    fn reports_malformed_toml() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[paging\n").expect("must write test config");

        let err = load(Some(&config_path)).expect_err("malformed file must fail");

        assert!(matches!(err, AppError::ConfigParse { .. }));
    }
}
