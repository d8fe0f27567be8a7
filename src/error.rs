//! Cache error types

use redis::RedisError;

/// Failures while turning a descriptor and call arguments into a key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("Malformed template '{template}': placeholder opened at {position} is never closed")]
    MalformedTemplate { template: String, position: usize },

    #[error("Template '{template}' has more placeholders than the {available} candidate argument(s)")]
    InsufficientArguments { template: String, available: usize },

    #[error("Field '{segment}' not found while resolving path '{path}'")]
    FieldNotFound { path: String, segment: String },

    #[error("Null value reached at '{segment}' while resolving path '{path}'")]
    NullTraversal { path: String, segment: String },

    #[error("Argument index {index} out of range for a call with {len} argument(s)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Cache-related errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    #[error("Redis error: {0}")]
    Redis(#[from] RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(#[from] Box<dyn std::error::Error + Send + Sync>),

    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

impl CacheError {
    /// Whether this error points at a misconfigured descriptor rather than a runtime condition
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            CacheError::Key(KeyError::IndexOutOfRange { .. })
                | CacheError::InvalidDescriptor(_)
                | CacheError::InvalidConfig(_)
        )
    }
}
