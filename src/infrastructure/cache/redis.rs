//! Redis key-value store implementation

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::info;

use crate::domain::cache::KeyValueStore;
use crate::domain::DomainError;

/// Number of keys Redis is asked to inspect per SCAN step
const SCAN_BATCH_SIZE: usize = 100;

/// Configuration for the Redis store
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Time allowed to establish the initial connection
    pub connection_timeout: Duration,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisStoreConfig {
    /// Creates a new configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the connection timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }
}

/// Redis-backed key-value store
///
/// One command per trait method. The `ConnectionManager` is cloned per call
/// and reconnects on its own; nothing is retried here.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
    config: RedisStoreConfig,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisStore {
    /// Connects to Redis
    pub async fn new(config: RedisStoreConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::store(format!("Failed to create Redis client: {}", e)))?;

        let connection =
            tokio::time::timeout(config.connection_timeout, ConnectionManager::new(client))
                .await
                .map_err(|_| {
                    DomainError::store(format!(
                        "Timed out connecting to Redis after {:?}",
                        config.connection_timeout
                    ))
                })?
                .map_err(|e| DomainError::store(format!("Failed to connect to Redis: {}", e)))?;

        info!(url = %config.url, "Connected to Redis");

        Ok(Self { connection, config })
    }

    /// Connects to Redis with default settings
    pub async fn with_url(url: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(RedisStoreConfig::new(url)).await
    }

    pub fn config(&self) -> &RedisStoreConfig {
        &self.config
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DomainError> {
        let mut conn = self.connection.clone();

        let value: Option<Vec<u8>> = conn
            .get(key)
            .await
            .map_err(|e| DomainError::store(format!("Failed to get key '{}': {}", key, e)))?;

        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        let _: () = conn
            .set(key, value)
            .await
            .map_err(|e| DomainError::store(format!("Failed to set key '{}': {}", key, e)))?;

        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<usize, DomainError> {
        // DEL without arguments is a protocol error
        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connection.clone();

        let deleted: usize = conn.del(keys).await.map_err(|e| {
            DomainError::store(format!("Failed to delete {} keys: {}", keys.len(), e))
        })?;

        Ok(deleted)
    }

    async fn exists(&self, keys: &[String]) -> Result<usize, DomainError> {
        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connection.clone();

        let count: usize = conn.exists(keys).await.map_err(|e| {
            DomainError::store(format!("Failed to check existence of {} keys: {}", keys.len(), e))
        })?;

        Ok(count)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, DomainError> {
        let mut conn = self.connection.clone();

        // SCAN instead of KEYS so a large keyspace does not block the server
        let mut cursor = 0u64;
        let mut seen = HashSet::new();
        let mut keys = Vec::new();

        loop {
            let (new_cursor, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH_SIZE)
                .query_async(&mut conn)
                .await
                .map_err(|e| {
                    DomainError::store(format!(
                        "Failed to scan keys with pattern '{}': {}",
                        pattern, e
                    ))
                })?;

            // SCAN may report a key more than once
            for key in batch {
                if seen.insert(key.clone()) {
                    keys.push(key);
                }
            }

            cursor = new_cursor;

            if cursor == 0 {
                break;
            }
        }

        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::domain::cache::{Namespace, TypedCache};

    // Note: These tests require a running Redis instance
    // Run with: cargo test -- --ignored

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Foo {
        name: String,
        age: u32,
    }

    fn get_test_config() -> RedisStoreConfig {
        RedisStoreConfig::new("redis://127.0.0.1:6379")
            .with_connection_timeout(Duration::from_secs(2))
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_set_get_delete() {
        let store = RedisStore::new(get_test_config()).await.unwrap();

        store.set("test:key1", b"value1").await.unwrap();
        assert_eq!(store.get("test:key1").await.unwrap(), Some(b"value1".to_vec()));

        let keys = vec!["test:key1".to_string()];
        assert_eq!(store.exists(&keys).await.unwrap(), 1);
        assert_eq!(store.delete(&keys).await.unwrap(), 1);
        assert!(store.get("test:key1").await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_empty_key_lists() {
        let store = RedisStore::new(get_test_config()).await.unwrap();

        assert_eq!(store.delete(&[]).await.unwrap(), 0);
        assert_eq!(store.exists(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_typed_cache_scenario() {
        let store: Arc<dyn KeyValueStore> =
            Arc::new(RedisStore::new(get_test_config()).await.unwrap());
        let cache: TypedCache<Foo> =
            TypedCache::new(store, Namespace::new("test:Foo:").unwrap());
        cache.clear().await.unwrap();

        let foo = Foo {
            name: "bar".to_string(),
            age: 42,
        };

        cache.set("bar", &foo).await.unwrap();
        assert_eq!(cache.get("bar").await.unwrap(), Some(foo));
        assert_eq!(cache.keys().await.unwrap(), vec!["test:Foo:bar".to_string()]);

        cache.evict("bar").await.unwrap();
        assert!(cache.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_connect_to_unreachable_server_fails_with_store_error() {
        let config = RedisStoreConfig::new("redis://127.0.0.1:1")
            .with_connection_timeout(Duration::from_millis(500));

        let err = RedisStore::new(config).await.unwrap_err();
        assert!(err.is_store());
    }

    #[test]
    fn test_invalid_url_fails_with_store_error() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let err = runtime
            .block_on(RedisStore::with_url("not a url"))
            .unwrap_err();

        assert!(err.is_store());
    }

    #[test]
    fn test_config_builder() {
        let config = RedisStoreConfig::new("redis://localhost")
            .with_connection_timeout(Duration::from_secs(1));

        assert_eq!(config.url, "redis://localhost");
        assert_eq!(config.connection_timeout, Duration::from_secs(1));
    }
}
