//! Redis-backed store
//!
//! Uses a `ConnectionManager`, so a dropped connection is re-established on
//! the next command. Every command failure is returned to the advisor, which
//! decides whether to degrade to a miss or to report it.

use async_trait::async_trait;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::debug;

use crate::{CacheError, CacheStore};

/// [`CacheStore`] over a shared Redis connection
#[derive(Clone)]
pub struct RedisStore {
    redis: redis::aio::ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis using the given client
    pub async fn new(redis_client: redis::Client) -> Result<Self, redis::RedisError> {
        let redis = redis::aio::ConnectionManager::new(redis_client).await?;
        Ok(Self { redis })
    }

    /// Build from an already established connection manager
    pub fn from_manager(redis: redis::aio::ConnectionManager) -> Self {
        Self { redis }
    }
}

/// Whole seconds for `SET EX`, rounding any fractional second up.
/// Zero means no expiry.
fn expire_seconds(ttl: Duration) -> Option<u64> {
    if ttl.is_zero() {
        None
    } else {
        Some(ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0))
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.redis.clone();
        Ok(conn.get::<_, Option<String>>(key).await?)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.redis.clone();
        match expire_seconds(ttl) {
            Some(seconds) => conn.set_ex::<_, _, ()>(key, value, seconds).await?,
            None => {
                debug!("Redis SET without expiry for key: {}", key);
                conn.set::<_, _, ()>(key, value).await?
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.redis.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expire_seconds() {
        assert_eq!(expire_seconds(Duration::ZERO), None);
        assert_eq!(expire_seconds(Duration::from_millis(200)), Some(1));
        assert_eq!(expire_seconds(Duration::from_secs(14_400)), Some(14_400));
        assert_eq!(expire_seconds(Duration::from_millis(2_500)), Some(3));
        assert_eq!(expire_seconds(Duration::from_millis(1_001)), Some(2));
        assert_eq!(expire_seconds(Duration::from_secs(3)), Some(3));
    }
}
