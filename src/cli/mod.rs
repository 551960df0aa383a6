//! CLI module for the typed cache
//!
//! Operates on JSON values stored under one namespace:
//! - `get`, `set`, `contains`: single entries
//! - `evict`, `clear`: removal
//! - `keys`: enumeration

use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing::info;

use crate::config::AppConfig;
use crate::domain::cache::{KeyValueStore, Namespace, TypedCache};
use crate::infrastructure::cache::{StoreConfig, StoreFactory, StoreType};
use crate::infrastructure::logging;

/// Typed cache-aside client for Redis and in-memory stores
#[derive(Debug, Parser)]
#[command(name = "kv-typed-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Key prefix shared by all entries of the cache, e.g. "USER:"
    #[arg(short, long, global = true, default_value = "cache:")]
    pub namespace: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Overrides for the configured store
#[derive(Debug, Args)]
pub struct StoreArgs {
    /// Store backend: redis (default) or in_memory, which keeps entries only
    /// for the duration of one command
    #[arg(long, global = true)]
    pub backend: Option<StoreType>,

    /// Redis connection URL
    #[arg(long, global = true)]
    pub redis_url: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the value stored for an identifier
    Get { identifier: String },

    /// Store a JSON value for an identifier
    Set { identifier: String, value: String },

    /// Report whether an entry exists for an identifier
    Contains { identifier: String },

    /// Remove the entries of the given identifiers
    Evict {
        #[arg(required = true)]
        identifiers: Vec<String>,
    },

    /// Remove every entry of the namespace
    Clear,

    /// List the keys of the namespace
    Keys,
}

/// Loads configuration, connects to the store and runs the command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Invalid configuration")?;
    logging::init_logging(&config.logging)?;

    let store_config = resolve_store_config(&config, &cli.store)?;
    let store = StoreFactory::new().create(&store_config).await?;

    let output = execute(store, &cli.namespace, cli.command).await?;
    println!("{}", output);

    Ok(())
}

fn resolve_store_config(config: &AppConfig, args: &StoreArgs) -> anyhow::Result<StoreConfig> {
    let mut store_config = StoreConfig::from_settings(&config.store)
        .context("Invalid store configuration")?;

    if let Some(backend) = &args.backend {
        store_config.store_type = backend.clone();
    }

    if let Some(url) = &args.redis_url {
        store_config.redis_url = Some(url.clone());
    }

    Ok(store_config)
}

/// Runs one command against the store and returns what should be printed
pub async fn execute(
    store: Arc<dyn KeyValueStore>,
    namespace: &str,
    command: Command,
) -> anyhow::Result<String> {
    let cache: TypedCache<Value> = TypedCache::new(store, Namespace::new(namespace)?);

    let output = match command {
        Command::Get { identifier } => match cache.get(&identifier).await? {
            Some(value) => serde_json::to_string_pretty(&value)?,
            None => "null".to_string(),
        },
        Command::Set { identifier, value } => {
            let value: Value = serde_json::from_str(&value)
                .with_context(|| format!("Value for '{}' is not valid JSON", identifier))?;
            cache.set(&identifier, &value).await?;
            info!(namespace, identifier = %identifier, "Entry stored");
            cache.derive_key(&identifier)?
        }
        Command::Contains { identifier } => cache.contains(&identifier).await?.to_string(),
        Command::Evict { identifiers } => {
            let evicted = cache.evict_many(identifiers).await?;
            info!(namespace, evicted, "Entries evicted");
            evicted.to_string()
        }
        Command::Clear => {
            let cleared = cache.clear().await?;
            info!(namespace, cleared, "Namespace cleared");
            cleared.to_string()
        }
        Command::Keys => {
            let mut keys = cache.keys().await?;
            keys.sort();
            keys.join("\n")
        }
    };

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_REDIS_URL;
    use crate::infrastructure::cache::InMemoryStore;

    fn store() -> Arc<dyn KeyValueStore> {
        Arc::new(InMemoryStore::new())
    }

    #[test]
    fn test_parse_set_command() {
        let cli = Cli::try_parse_from([
            "kv-typed-cache",
            "--namespace",
            "Foo:",
            "set",
            "bar",
            r#"{"name":"bar","age":42}"#,
        ])
        .unwrap();

        assert_eq!(cli.namespace, "Foo:");
        assert!(matches!(cli.command, Command::Set { ref identifier, .. } if identifier == "bar"));
    }

    #[test]
    fn test_parse_backend_override() {
        let cli = Cli::try_parse_from(["kv-typed-cache", "keys", "--backend", "redis"]).unwrap();

        assert_eq!(cli.store.backend, Some(StoreType::Redis));
        assert_eq!(cli.namespace, "cache:");
    }

    #[test]
    fn test_parse_evict_requires_identifiers() {
        assert!(Cli::try_parse_from(["kv-typed-cache", "evict"]).is_err());
    }

    #[test]
    fn test_store_args_override_settings() {
        let config = AppConfig::default();
        let args = StoreArgs {
            backend: Some(StoreType::Redis),
            redis_url: Some("redis://cache:6379".to_string()),
        };

        let store_config = resolve_store_config(&config, &args).unwrap();

        assert_eq!(store_config.store_type, StoreType::Redis);
        assert_eq!(store_config.redis_url.as_deref(), Some("redis://cache:6379"));
    }

    #[test]
    fn test_default_settings_target_local_redis() {
        let args = StoreArgs {
            backend: None,
            redis_url: None,
        };

        let store_config = resolve_store_config(&AppConfig::default(), &args).unwrap();

        assert_eq!(store_config.store_type, StoreType::Redis);
        assert_eq!(store_config.redis_url.as_deref(), Some(DEFAULT_REDIS_URL));
    }

    #[test]
    fn test_in_memory_backend_is_opt_in() {
        let cli = Cli::try_parse_from(["kv-typed-cache", "--backend", "in_memory", "keys"]).unwrap();

        let store_config = resolve_store_config(&AppConfig::default(), &cli.store).unwrap();

        assert_eq!(store_config.store_type, StoreType::InMemory);
    }

    #[test]
    fn test_unknown_configured_backend_is_an_error() {
        let mut config = AppConfig::default();
        config.store.backend = "memcached".to_string();
        let args = StoreArgs {
            backend: None,
            redis_url: None,
        };

        assert!(resolve_store_config(&config, &args).is_err());
    }

    #[tokio::test]
    async fn test_execute_scenario() {
        let store = store();

        let key = execute(
            store.clone(),
            "Foo:",
            Command::Set {
                identifier: "bar".to_string(),
                value: r#"{"name":"bar","age":42}"#.to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(key, "Foo:bar");

        let value = execute(
            store.clone(),
            "Foo:",
            Command::Get {
                identifier: "bar".to_string(),
            },
        )
        .await
        .unwrap();
        let value: Value = serde_json::from_str(&value).unwrap();
        assert_eq!(value, serde_json::json!({"name": "bar", "age": 42}));

        let keys = execute(store.clone(), "Foo:", Command::Keys).await.unwrap();
        assert_eq!(keys, "Foo:bar");

        let evicted = execute(
            store.clone(),
            "Foo:",
            Command::Evict {
                identifiers: vec!["bar".to_string()],
            },
        )
        .await
        .unwrap();
        assert_eq!(evicted, "1");

        let keys = execute(store, "Foo:", Command::Keys).await.unwrap();
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn test_execute_get_missing_prints_null() {
        let output = execute(
            store(),
            "Foo:",
            Command::Get {
                identifier: "ghost".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(output, "null");
    }

    #[tokio::test]
    async fn test_execute_set_rejects_invalid_json() {
        let result = execute(
            store(),
            "Foo:",
            Command::Set {
                identifier: "bar".to_string(),
                value: "{not json".to_string(),
            },
        )
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_execute_rejects_empty_namespace() {
        assert!(execute(store(), "", Command::Keys).await.is_err());
    }

    #[tokio::test]
    async fn test_execute_clear_and_contains() {
        let store = store();
        for id in ["a", "b"] {
            execute(
                store.clone(),
                "Foo:",
                Command::Set {
                    identifier: id.to_string(),
                    value: "1".to_string(),
                },
            )
            .await
            .unwrap();
        }

        let contains = execute(
            store.clone(),
            "Foo:",
            Command::Contains {
                identifier: "a".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(contains, "true");

        let cleared = execute(store.clone(), "Foo:", Command::Clear).await.unwrap();
        assert_eq!(cleared, "2");
    }
}
