//! Domain layer - cache abstraction and error taxonomy

pub mod cache;
pub mod error;

pub use cache::{CacheIdentifier, Codec, JsonCodec, KeyValueStore, Namespace, TypedCache};
pub use error::{DomainError, NULL_KEYS_NOT_SUPPORTED_MSG};
