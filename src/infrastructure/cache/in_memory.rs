//! In-memory key-value store using moka

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use regex::Regex;

use crate::domain::cache::KeyValueStore;
use crate::domain::DomainError;

/// Process-local key-value store
///
/// Unbounded and without expiry: an entry stays until it is deleted, the
/// way it would in a remote store with no TTL. Useful for tests and local
/// development. Data is lost when the process terminates.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    entries: MokaCache<String, Vec<u8>>,
}

impl InMemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self {
            entries: MokaCache::builder().build(),
        }
    }

    /// Creates an empty store with room for `capacity` entries
    pub fn with_initial_capacity(capacity: usize) -> Self {
        Self {
            entries: MokaCache::builder().initial_capacity(capacity).build(),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DomainError> {
        Ok(self.entries.get(key).await)
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), DomainError> {
        self.entries.insert(key.to_string(), value.to_vec()).await;
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<usize, DomainError> {
        let mut deleted = 0;

        for key in keys {
            if self.entries.remove(key).await.is_some() {
                deleted += 1;
            }
        }

        Ok(deleted)
    }

    async fn exists(&self, keys: &[String]) -> Result<usize, DomainError> {
        Ok(keys
            .iter()
            .filter(|key| self.entries.contains_key(key.as_str()))
            .count())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, DomainError> {
        let regex = glob_to_regex(pattern)?;

        self.entries.run_pending_tasks().await;

        Ok(self
            .entries
            .iter()
            .filter(|(key, _)| regex.is_match(key.as_str()))
            .map(|(key, _)| key.to_string())
            .collect())
    }
}

/// Translates a store glob pattern into an anchored regex
fn glob_to_regex(pattern: &str) -> Result<Regex, DomainError> {
    let mut expr = String::from("(?s)^");
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            '\\' => {
                let literal = chars.next().unwrap_or('\\');
                push_literal(&mut expr, literal);
            }
            '[' => {
                let mut class = Vec::new();
                let mut closed = false;

                while let Some(inner) = chars.next() {
                    match inner {
                        ']' => {
                            closed = true;
                            break;
                        }
                        '\\' => class.push((true, chars.next().unwrap_or('\\'))),
                        other => class.push((false, other)),
                    }
                }

                if closed {
                    push_class(&mut expr, &class);
                } else {
                    push_literal(&mut expr, '[');
                    for (_, inner) in class {
                        push_literal(&mut expr, inner);
                    }
                }
            }
            other => push_literal(&mut expr, other),
        }
    }

    expr.push('$');

    Regex::new(&expr).map_err(|e| DomainError::store(format!("Invalid pattern '{}': {}", pattern, e)))
}

fn push_literal(expr: &mut String, c: char) {
    let mut buf = [0u8; 4];
    expr.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}

/// Pushes a character class; each entry is (escaped, char)
fn push_class(expr: &mut String, class: &[(bool, char)]) {
    if class.is_empty() {
        // An empty class matches nothing
        expr.push_str(r"[^\s\S]");
        return;
    }

    expr.push('[');

    for (i, &(escaped, c)) in class.iter().enumerate() {
        let negation = i == 0 && c == '^' && !escaped;
        let range = c == '-' && !escaped && i > 0 && i + 1 < class.len();

        if !negation && !range && c.is_ascii_punctuation() {
            expr.push('\\');
        }
        expr.push(c);
    }

    expr.push(']');
}
