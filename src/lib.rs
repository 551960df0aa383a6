//! Typed cache-aside facade over a remote key-value store
//!
//! A [`TypedCache`] binds one value type to one key namespace and offers:
//! - get and get-or-load with write-back on miss
//! - set, single and bulk eviction
//! - key enumeration and namespace clearing
//!
//! Stores implement [`KeyValueStore`]; Redis and an in-memory store ship
//! with the crate.

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::{
    CacheIdentifier, Codec, DomainError, JsonCodec, KeyValueStore, Namespace, TypedCache,
};
pub use infrastructure::cache::{InMemoryStore, RedisStore, RedisStoreConfig, StoreConfig, StoreFactory};
