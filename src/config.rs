//! Advisor configuration

/// Configuration for the cache advisor and its in-process store
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Opening delimiter of a key placeholder
    pub placeholder_prefix: String,
    /// Closing delimiter of a key placeholder
    pub placeholder_suffix: String,
    /// Maximum number of entries held by a [`MokaStore`](crate::MokaStore)
    pub local_max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            placeholder_prefix: "{".to_owned(),
            placeholder_suffix: "}".to_owned(),
            local_max_capacity: 10_000,
        }
    }
}
