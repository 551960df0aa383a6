//! Store factory for runtime backend selection

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::StoreSettings;
use crate::domain::cache::KeyValueStore;
use crate::domain::DomainError;

use super::in_memory::InMemoryStore;
use super::redis::{RedisStore, RedisStoreConfig};

/// Supported store backends
#[derive(Debug, Clone, Default, PartialEq)]
pub enum StoreType {
    /// Process-local store using moka
    #[default]
    InMemory,
    /// Redis store
    Redis,
}

impl std::fmt::Display for StoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreType::InMemory => write!(f, "in_memory"),
            StoreType::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for StoreType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(StoreType::InMemory),
            "redis" => Ok(StoreType::Redis),
            _ => Err(DomainError::configuration(format!(
                "Unknown store type: {}. Valid types: in_memory, redis",
                s
            ))),
        }
    }
}

/// Configuration for the store factory
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Backend to create
    pub store_type: StoreType,
    /// Redis URL (required for Redis type)
    pub redis_url: Option<String>,
    /// Time allowed to establish the Redis connection
    pub connection_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::InMemory,
            redis_url: None,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl StoreConfig {
    /// Creates a configuration for the in-memory store
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Creates a configuration for a Redis store
    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            store_type: StoreType::Redis,
            redis_url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Sets the connection timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Creates config from the application settings
    pub fn from_settings(settings: &StoreSettings) -> Result<Self, DomainError> {
        Ok(Self {
            store_type: settings.backend.parse()?,
            redis_url: settings.redis_url.clone(),
            connection_timeout: Duration::from_secs(settings.connection_timeout_secs),
        })
    }
}

/// Factory for creating store instances
#[derive(Debug, Default)]
pub struct StoreFactory;

impl StoreFactory {
    /// Creates a new store factory
    pub fn new() -> Self {
        Self
    }

    /// Creates a store based on configuration
    pub async fn create(&self, config: &StoreConfig) -> Result<Arc<dyn KeyValueStore>, DomainError> {
        info!(store_type = %config.store_type, "Creating key-value store");

        match config.store_type {
            StoreType::InMemory => Ok(self.create_in_memory()),
            StoreType::Redis => {
                let url = config.redis_url.clone().ok_or_else(|| {
                    DomainError::configuration("Redis URL is required for Redis store type")
                })?;

                let redis_config =
                    RedisStoreConfig::new(url).with_connection_timeout(config.connection_timeout);

                self.create_redis_with_config(redis_config).await
            }
        }
    }

    /// Creates an empty in-memory store
    pub fn create_in_memory(&self) -> Arc<dyn KeyValueStore> {
        Arc::new(InMemoryStore::new())
    }

    /// Creates a Redis store with custom configuration
    pub async fn create_redis_with_config(
        &self,
        config: RedisStoreConfig,
    ) -> Result<Arc<dyn KeyValueStore>, DomainError> {
        let store = RedisStore::new(config).await?;
        Ok(Arc::new(store))
    }
}
