//! Typed cache-aside facade bound to one value type and one namespace

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::domain::DomainError;

use super::codec::{Codec, JsonCodec};
use super::key::{CacheIdentifier, Namespace};
use super::store::KeyValueStore;

/// Cache manager for values of type `T`
///
/// Every entry lives under `namespace + identifier`. The facade holds no
/// state besides its configuration: the store owns the entries, and
/// concurrent callers are not coordinated. A miss followed by a load is two
/// round trips, so two callers may both run their loader and the last write
/// wins.
pub struct TypedCache<T, C = JsonCodec<T>> {
    store: Arc<dyn KeyValueStore>,
    namespace: Namespace,
    codec: C,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedCache<T, JsonCodec<T>>
where
    T: Serialize + DeserializeOwned,
{
    /// Creates a cache storing values as JSON
    pub fn new(store: Arc<dyn KeyValueStore>, namespace: Namespace) -> Self {
        Self::with_codec(store, namespace, JsonCodec::new())
    }
}

impl<T, C> TypedCache<T, C>
where
    C: Codec<T>,
{
    /// Creates a cache with a custom codec
    pub fn with_codec(store: Arc<dyn KeyValueStore>, namespace: Namespace, codec: C) -> Self {
        Self {
            store,
            namespace,
            codec,
            _marker: PhantomData,
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Key under which the entry for `identifier` is stored
    pub fn derive_key<I>(&self, identifier: &I) -> Result<String, DomainError>
    where
        I: CacheIdentifier + ?Sized,
    {
        self.namespace.derive_key(identifier)
    }

    /// Store pattern matching every key of this cache
    pub fn key_pattern(&self) -> String {
        self.namespace.key_pattern()
    }

    /// Returns the cached value, if any
    pub async fn get<I>(&self, identifier: &I) -> Result<Option<T>, DomainError>
    where
        I: CacheIdentifier + ?Sized,
    {
        let key = self.derive_key(identifier)?;
        self.read(&key).await
    }

    /// Returns the cached value, or runs `loader` on a miss and stores what it
    /// produces
    ///
    /// A loader returning `None` leaves the entry absent.
    pub async fn get_or_load<I, F, Fut>(
        &self,
        identifier: &I,
        loader: F,
    ) -> Result<Option<T>, DomainError>
    where
        I: CacheIdentifier + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        self.try_get_or_load(identifier, move || async move {
            Ok::<_, DomainError>(loader().await)
        })
        .await
    }

    /// Like [`get_or_load`](Self::get_or_load) with a fallible loader
    ///
    /// A loader error is returned as is and nothing is written.
    pub async fn try_get_or_load<I, F, Fut, E>(
        &self,
        identifier: &I,
        loader: F,
    ) -> Result<Option<T>, E>
    where
        I: CacheIdentifier + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
        E: From<DomainError>,
    {
        let key = self.derive_key(identifier)?;

        if let Some(value) = self.read(&key).await? {
            return Ok(Some(value));
        }

        debug!(namespace = %self.namespace, key = %key, "Cache miss, invoking loader");

        match loader().await? {
            Some(value) => {
                self.write(&key, &value).await?;
                Ok(Some(value))
            }
            None => {
                debug!(namespace = %self.namespace, key = %key, "Loader produced no value");
                Ok(None)
            }
        }
    }

    /// Stores `value` under `identifier`, overwriting any previous entry
    ///
    /// Storing `None` does nothing; in particular it does not remove an
    /// existing entry.
    pub async fn set<'v, I>(
        &self,
        identifier: &I,
        value: impl Into<Option<&'v T>>,
    ) -> Result<(), DomainError>
    where
        I: CacheIdentifier + ?Sized,
        T: 'v,
    {
        let key = self.derive_key(identifier)?;

        match value.into() {
            Some(value) => self.write(&key, value).await,
            None => Ok(()),
        }
    }

    /// Returns true if an entry exists for `identifier`
    pub async fn contains<I>(&self, identifier: &I) -> Result<bool, DomainError>
    where
        I: CacheIdentifier + ?Sized,
    {
        let key = self.derive_key(identifier)?;
        Ok(self.store.exists(&[key]).await? > 0)
    }

    /// Removes the entry for `identifier`
    pub async fn evict<I>(&self, identifier: &I) -> Result<usize, DomainError>
    where
        I: CacheIdentifier + ?Sized,
    {
        if identifier.identifier().is_none() {
            return Err(DomainError::null_key());
        }

        self.evict_many(vec![identifier]).await
    }

    /// Removes the entries for all `identifiers` in one store call
    ///
    /// A `None` collection is rejected. Absent identifiers inside the
    /// collection are skipped. Returns the number of entries removed.
    pub async fn evict_many<I, L>(&self, identifiers: L) -> Result<usize, DomainError>
    where
        I: CacheIdentifier,
        L: Into<Option<Vec<I>>>,
    {
        let identifiers = identifiers.into().ok_or_else(DomainError::null_key)?;

        let keys = identifiers
            .iter()
            .filter(|id| id.identifier().is_some())
            .map(|id| self.derive_key(id))
            .collect::<Result<Vec<_>, _>>()?;

        self.delete_keys(&keys).await
    }

    /// Removes every entry of this namespace
    ///
    /// Keys are listed first and deleted afterwards, so entries written in
    /// between may survive.
    pub async fn clear(&self) -> Result<usize, DomainError> {
        let keys = self.keys().await?;
        self.delete_keys(&keys).await
    }

    /// Lists the keys currently stored under this namespace
    pub async fn keys(&self) -> Result<Vec<String>, DomainError> {
        self.store.keys(&self.key_pattern()).await
    }

    async fn read(&self, key: &str) -> Result<Option<T>, DomainError> {
        let Some(bytes) = self.store.get(key).await? else {
            return Ok(None);
        };

        match self.codec.decode(&bytes) {
            Ok(value) => {
                debug!(namespace = %self.namespace, key = %key, "Cache hit");
                Ok(Some(value))
            }
            Err(e) => {
                warn!(namespace = %self.namespace, key = %key, error = %e, "Stored entry cannot be decoded");
                Err(e)
            }
        }
    }

    async fn write(&self, key: &str, value: &T) -> Result<(), DomainError> {
        let bytes = self.codec.encode(value)?;
        self.store.set(key, &bytes).await?;

        debug!(namespace = %self.namespace, key = %key, size_bytes = bytes.len(), "Cache entry written");
        Ok(())
    }

    async fn delete_keys(&self, keys: &[String]) -> Result<usize, DomainError> {
        if keys.is_empty() {
            return Ok(0);
        }

        let deleted = self.store.delete(keys).await?;

        debug!(
            namespace = %self.namespace,
            requested = keys.len(),
            deleted,
            "Cache entries evicted"
        );
        Ok(deleted)
    }
}

impl<T, C: fmt::Debug> fmt::Debug for TypedCache<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedCache")
            .field("namespace", &self.namespace)
            .field("codec", &self.codec)
            .field("store", &self.store)
            .finish()
    }
}
