use std::error::Error as StdError;

use thiserror::Error;

/// Message carried by every error raised for an absent identifier
pub const NULL_KEYS_NOT_SUPPORTED_MSG: &str = "Null keys are not supported";

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid key: {message}")]
    InvalidKey { message: String },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Store error: {message}")]
    Store { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl DomainError {
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Error for an absent identifier or identifier collection
    pub fn null_key() -> Self {
        Self::invalid_key(NULL_KEYS_NOT_SUPPORTED_MSG)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps an underlying codec failure
    pub fn serialization_with_source(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Serialization {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn is_invalid_key(&self) -> bool {
        matches!(self, Self::InvalidKey { .. })
    }

    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }

    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store { .. })
    }
}
