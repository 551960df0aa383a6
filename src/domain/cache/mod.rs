//! Cache domain - typed cache-aside facade over a key-value store

mod codec;
mod key;
mod store;
mod typed;

pub use codec::{Codec, JsonCodec};
pub use key::{CacheIdentifier, Namespace};
pub use store::KeyValueStore;
pub use typed::TypedCache;

#[cfg(test)]
pub use store::MockKeyValueStore;
