use std::path::Path;

use serde::Deserialize;

use crate::domain::DomainError;

/// Address used when no Redis URL is configured
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreSettings,
    pub logging: LoggingConfig,
}

/// Key-value store settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// `redis` or `in_memory`; the latter lives only as long as the process
    pub backend: String,
    pub redis_url: Option<String>,
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: "redis".to_string(),
            redis_url: Some(DEFAULT_REDIS_URL.to_string()),
            connection_timeout_secs: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// Loads `config/default`, `config/local` and `APP__*` variables
    pub fn load() -> Result<Self, DomainError> {
        Self::load_from("config")
    }

    /// Loads `default` and `local` from `dir`, then `APP__*` variables
    ///
    /// Missing files are skipped. A file that cannot be parsed, or a value of
    /// the wrong type, is a configuration error.
    pub fn load_from(dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let dir = dir.as_ref();

        let config = config::Config::builder()
            .add_source(config::File::with_name(&dir.join("default").to_string_lossy()).required(false))
            .add_source(config::File::with_name(&dir.join("local").to_string_lossy()).required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|e| {
                DomainError::configuration(format!(
                    "Failed to load configuration from '{}': {}",
                    dir.display(),
                    e
                ))
            })?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;

    fn config_dir(files: &[(&str, &str)]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("kv-typed-cache-config-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();

        for (name, contents) in files {
            fs::write(dir.join(name), contents).unwrap();
        }

        dir
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.store.backend, "redis");
        assert_eq!(config.store.redis_url.as_deref(), Some(DEFAULT_REDIS_URL));
        assert_eq!(config.store.connection_timeout_secs, 5);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_sources_fall_back_to_defaults() {
        let config: AppConfig = config::Config::builder()
            .set_override("store.backend", "redis")
            .unwrap()
            .set_override("store.redis_url", "redis://cache:6379")
            .unwrap()
            .set_override("logging.format", "json")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.store.backend, "redis");
        assert_eq!(config.store.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(config.store.connection_timeout_secs, 5);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_load_from_missing_directory_uses_defaults() {
        let dir = config_dir(&[]);

        let config = AppConfig::load_from(&dir).unwrap();

        assert_eq!(config.store.backend, "redis");
        assert_eq!(config.store.connection_timeout_secs, 5);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_load_from_merges_local_over_default() {
        let dir = config_dir(&[
            (
                "default.toml",
                "[store]\nbackend = \"redis\"\nredis_url = \"redis://cache:6379\"\n",
            ),
            ("local.toml", "[store]\nconnection_timeout_secs = 2\n"),
        ]);

        let config = AppConfig::load_from(&dir).unwrap();

        assert_eq!(config.store.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(config.store.connection_timeout_secs, 2);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_load_from_rejects_value_of_wrong_type() {
        let dir = config_dir(&[(
            "default.toml",
            "[store]\nbackend = \"redis\"\nredis_url = \"redis://cache:6379\"\nconnection_timeout_secs = \"five\"\n",
        )]);

        let err = AppConfig::load_from(&dir).unwrap_err();

        assert!(matches!(err, DomainError::Configuration { .. }));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_load_from_rejects_malformed_file() {
        let dir = config_dir(&[("default.toml", "[store\nbackend = ")]);

        let err = AppConfig::load_from(&dir).unwrap_err();

        assert!(matches!(err, DomainError::Configuration { .. }));
        fs::remove_dir_all(dir).unwrap();
    }
}
