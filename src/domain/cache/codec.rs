//! Serialization boundary between typed values and stored bytes

use std::fmt::Debug;
use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};

use crate::domain::DomainError;

/// Encodes values of `T` to bytes and back
///
/// Failures are reported as [`DomainError::Serialization`], never as store
/// errors.
pub trait Codec<T>: Send + Sync + Debug {
    fn encode(&self, value: &T) -> Result<Vec<u8>, DomainError>;

    fn decode(&self, bytes: &[u8]) -> Result<T, DomainError>;
}

/// JSON codec backed by serde_json
pub struct JsonCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonCodec")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> Codec<T> for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<Vec<u8>, DomainError> {
        serde_json::to_vec(value).map_err(|e| {
            DomainError::serialization_with_source(
                format!(
                    "Failed to serialize {}: {}",
                    std::any::type_name::<T>(),
                    e
                ),
                e,
            )
        })
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, DomainError> {
        serde_json::from_slice(bytes).map_err(|e| {
            DomainError::serialization_with_source(
                format!(
                    "Failed to deserialize {}: {}",
                    std::any::type_name::<T>(),
                    e
                ),
                e,
            )
        })
    }
}
