//! Key-value store client trait

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Client for a remote string-keyed, binary-valued store
///
/// Implementations map one method to one store command. No transactional
/// semantics are assumed across calls. Every failure is reported as
/// [`DomainError::Store`].
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    /// Reads the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DomainError>;

    /// Writes `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), DomainError>;

    /// Removes the given keys, returning how many existed
    async fn delete(&self, keys: &[String]) -> Result<usize, DomainError>;

    /// Counts how many of the given keys exist
    async fn exists(&self, keys: &[String]) -> Result<usize, DomainError>;

    /// Lists keys matching a glob pattern (`*`, `?`, `[...]`, `\` escapes)
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, DomainError>;
}
