//! Cache key derivation

use std::borrow::Cow;
use std::fmt;

use uuid::Uuid;

use crate::domain::DomainError;

/// Characters with special meaning in store key patterns
const PATTERN_METACHARACTERS: [char; 5] = ['*', '?', '[', ']', '\\'];

/// Trait for values that can identify a cache entry within a namespace
///
/// The string form must be deterministic: the same identifier always yields
/// the same string. `None` means the identifier is absent.
pub trait CacheIdentifier {
    fn identifier(&self) -> Option<Cow<'_, str>>;
}

impl CacheIdentifier for str {
    fn identifier(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self))
    }
}

impl CacheIdentifier for String {
    fn identifier(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.as_str()))
    }
}

impl CacheIdentifier for Cow<'_, str> {
    fn identifier(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.as_ref()))
    }
}

impl CacheIdentifier for Uuid {
    fn identifier(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Owned(self.to_string()))
    }
}

impl<I: CacheIdentifier + ?Sized> CacheIdentifier for &I {
    fn identifier(&self) -> Option<Cow<'_, str>> {
        (**self).identifier()
    }
}

impl<I: CacheIdentifier> CacheIdentifier for Option<I> {
    fn identifier(&self) -> Option<Cow<'_, str>> {
        self.as_ref().and_then(|id| id.identifier())
    }
}

macro_rules! impl_cache_identifier_for_integers {
    ($($ty:ty),*) => {
        $(
            impl CacheIdentifier for $ty {
                fn identifier(&self) -> Option<Cow<'_, str>> {
                    Some(Cow::Owned(self.to_string()))
                }
            }
        )*
    };
}

impl_cache_identifier_for_integers!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

/// Prefix shared by every key of one cache instance, e.g. `"USER:"`
///
/// It should end with a delimiter (`:`, `/`, `-`) so that enumeration by
/// prefix does not pick up keys of another namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace(String);

impl Namespace {
    /// Creates a namespace, rejecting the empty prefix
    pub fn new(prefix: impl Into<String>) -> Result<Self, DomainError> {
        let prefix = prefix.into();

        if prefix.is_empty() {
            return Err(DomainError::invalid_key("Namespace must not be empty"));
        }

        Ok(Self(prefix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds the key for an identifier: `namespace + identifier`
    pub fn derive_key<I>(&self, identifier: &I) -> Result<String, DomainError>
    where
        I: CacheIdentifier + ?Sized,
    {
        let id = identifier.identifier().ok_or_else(DomainError::null_key)?;

        if id.is_empty() {
            return Err(DomainError::invalid_key(format!(
                "Empty identifier in namespace '{}'",
                self.0
            )));
        }

        let mut key = String::with_capacity(self.0.len() + id.len());
        key.push_str(&self.0);
        key.push_str(&id);
        Ok(key)
    }

    /// Pattern matching every key of this namespace
    pub fn key_pattern(&self) -> String {
        let mut pattern = String::with_capacity(self.0.len() + 1);

        for c in self.0.chars() {
            if PATTERN_METACHARACTERS.contains(&c) {
                pattern.push('\\');
            }
            pattern.push(c);
        }

        pattern.push('*');
        pattern
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
