//! Interception engine
//!
//! [`CacheAdvisor`] applies descriptors around an operation's invocation:
//! - read-through: serve from the store or invoke and cache the result
//! - write-through: cache a successful result
//! - evict: delete a key after a successful call
//! - composite: invoke once, then apply writes followed by evictions
//!
//! Failures local to the advice (key resolution, store I/O) never replace
//! the operation's own result or error. They are logged and handed to the
//! optional error hook instead.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{fmt, future::Future, sync::Arc, time::Duration};
use tracing::{debug, error, warn};

use crate::selector::select;
use crate::single_flight::{Boarding, Landed, SingleFlight, wait};
use crate::template::PlaceholderResolver;
use crate::{
    CacheConfig, CacheError, CacheStore, Composite, Evict, KeySpec, ReadMode, ReadThrough,
    WriteThrough,
};

/// Trait for types that can be cached
pub trait Cacheable: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}
impl<T> Cacheable for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

/// Which advice produced a reported failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdviceKind {
    ReadThrough,
    WriteThrough,
    Evict,
    Composite,
}

impl fmt::Display for AdviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AdviceKind::ReadThrough => "read-through",
            AdviceKind::WriteThrough => "write-through",
            AdviceKind::Evict => "evict",
            AdviceKind::Composite => "composite",
        })
    }
}

/// Receives advice-local failures that were not propagated to the caller
pub type ErrorHook = Arc<dyn Fn(AdviceKind, &CacheError) + Send + Sync + 'static>;

/// Applies cache descriptors around operation invocations
pub struct CacheAdvisor<S: CacheStore> {
    store: Arc<S>,
    resolver: PlaceholderResolver,
    in_flight: SingleFlight,
    on_error: Option<ErrorHook>,
}

impl<S: CacheStore> Clone for CacheAdvisor<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            resolver: self.resolver.clone(),
            in_flight: self.in_flight.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<S: CacheStore> CacheAdvisor<S> {
    /// Create an advisor over `store` using the delimiters from `config`
    pub fn new(store: S, config: &CacheConfig) -> Result<Self, CacheError> {
        Ok(Self::with_resolver(
            Arc::new(store),
            PlaceholderResolver::from_config(config)?,
        ))
    }

    /// Create an advisor sharing an existing store
    pub fn with_resolver(store: Arc<S>, resolver: PlaceholderResolver) -> Self {
        Self {
            store,
            resolver,
            in_flight: SingleFlight::default(),
            on_error: None,
        }
    }

    /// Install a hook that receives every advice-local failure
    pub fn with_error_hook(
        mut self,
        hook: impl Fn(AdviceKind, &CacheError) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Arc::new(hook));
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Compute the concrete key for `spec` from a call's arguments
    pub fn resolve_key(&self, spec: &KeySpec, args: &[Value]) -> Result<String, CacheError> {
        let candidates = select(args, spec.arg_indices())?;
        Ok(self.resolver.substitute(spec.template(), &candidates)?)
    }

    /// Read-through around `op`.
    ///
    /// In [`ReadMode::ReadFirst`] a stored value is returned without invoking
    /// `op`. A key that cannot be resolved, or a failing store read, counts as
    /// a miss. A non-empty result is written back with the descriptor's TTL.
    pub async fn around_read_through<T, E, F, Fut>(
        &self,
        descriptor: &ReadThrough,
        args: &[Value],
        op: F,
    ) -> Result<Option<T>, E>
    where
        T: Cacheable,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Option<T>, E>> + Send,
        E: Send,
    {
        let key = match self.resolve_key(descriptor.key(), args) {
            Ok(key) => key,
            Err(e) => {
                self.report(AdviceKind::ReadThrough, &e);
                return op().await;
            }
        };

        if descriptor.mode() == ReadMode::ReadFirst
            && let Some(hit) = self.lookup::<T>(&key).await
        {
            debug!("Cache hit for key: {}", key);
            return Ok(Some(hit));
        }

        let (result, write_back) = if descriptor.sync() {
            self.invoke_coalesced(&key, op).await?
        } else {
            (op().await?, true)
        };

        if write_back
            && let Some(value) = &result
            && let Err(e) = self.write_value(&key, value, descriptor.ttl()).await
        {
            self.report(AdviceKind::ReadThrough, &e);
        }

        Ok(result)
    }

    /// Write-through after a successful call that produced `result`.
    ///
    /// Does nothing for an empty result.
    pub async fn after_write_through<T>(
        &self,
        descriptor: &WriteThrough,
        args: &[Value],
        result: Option<&T>,
    ) -> Result<(), CacheError>
    where
        T: Serialize + Sync,
    {
        let key = self.resolve_key(descriptor.key(), args)?;
        match result {
            Some(value) => self.write_value(&key, value, descriptor.ttl()).await,
            None => {
                debug!("Empty result, skipping write for key: {}", key);
                Ok(())
            }
        }
    }

    /// Evict after a successful call
    pub async fn after_evict(&self, descriptor: &Evict, args: &[Value]) -> Result<(), CacheError> {
        let key = self.resolve_key(descriptor.key(), args)?;
        if key.is_empty() {
            return Ok(());
        }
        self.store.delete(&key).await?;
        debug!("Evicted key: {}", key);
        Ok(())
    }

    /// Invoke `op` once, then apply the composite's writes and evictions in order
    pub async fn around_composite<T, E, F, Fut>(
        &self,
        descriptor: &Composite,
        args: &[Value],
        op: F,
    ) -> Result<Option<T>, E>
    where
        T: Cacheable,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Option<T>, E>> + Send,
        E: Send,
    {
        let result = op().await?;

        for put in descriptor.write_through() {
            if let Err(e) = self.after_write_through(put, args, result.as_ref()).await {
                self.report(AdviceKind::WriteThrough, &e);
            }
        }
        for evict in descriptor.evict() {
            if let Err(e) = self.after_evict(evict, args).await {
                self.report(AdviceKind::Evict, &e);
            }
        }

        Ok(result)
    }

    /// Log an advice-local failure and pass it to the error hook
    pub(crate) fn report(&self, kind: AdviceKind, err: &CacheError) {
        if err.is_configuration_error() {
            error!("Cache {} advice misconfigured: {}", kind, err);
        } else {
            warn!("Cache {} advice failed: {}", kind, err);
        }
        if let Some(hook) = &self.on_error {
            hook(kind, err);
        }
    }

    /// Read and decode a stored value; every failure degrades to a miss
    async fn lookup<T: Cacheable>(&self, key: &str) -> Option<T> {
        let cached = match self.store.get(key).await {
            Ok(cached) => cached,
            Err(e) => {
                warn!(
                    "Cache GET error for key {} ({}). Invoking operation.",
                    key, e
                );
                return None;
            }
        };

        let Some(json) = cached.filter(|json| !json.is_empty() && json != "null") else {
            debug!("Cache miss for key: {}", key);
            return None;
        };

        match serde_json::from_str::<T>(&json) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(
                    "Failed to deserialize cached value for key {}: {}. Deleting corrupt entry.",
                    key, e
                );
                if let Err(del_err) = self.store.delete(key).await {
                    warn!("Failed to delete corrupt entry for key {}: {}", key, del_err);
                }
                None
            }
        }
    }

    /// Serialize and store a value. Values serializing to `null` are skipped.
    async fn write_value<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), CacheError>
    where
        T: Serialize + Sync + ?Sized,
    {
        let json = serde_json::to_string(value)?;
        if json == "null" {
            debug!("Empty result, skipping write for key: {}", key);
            return Ok(());
        }
        self.store.set(key, json, ttl).await?;
        debug!("Cached value for key: {} (ttl {}s)", key, ttl.as_secs());
        Ok(())
    }

    /// Invoke `op` at most once per key across concurrent callers.
    ///
    /// Returns the result and whether this caller should write it back.
    async fn invoke_coalesced<T, E, F, Fut>(
        &self,
        key: &str,
        op: F,
    ) -> Result<(Option<T>, bool), E>
    where
        T: Cacheable,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Option<T>, E>> + Send,
        E: Send,
    {
        match self.in_flight.board(key) {
            Boarding::Leader(guard) => {
                let result = op().await;
                guard.complete(match &result {
                    Ok(Some(value)) => match serde_json::to_string(value) {
                        Ok(json) => Landed::Value(json),
                        Err(_) => Landed::Failed,
                    },
                    Ok(None) => Landed::Empty,
                    Err(_) => Landed::Failed,
                });
                result.map(|value| (value, true))
            }
            Boarding::Follower(rx) => {
                debug!("Waiting for in-flight invocation for key: {}", key);
                match wait(rx).await {
                    Landed::Value(json) => match serde_json::from_str::<T>(&json) {
                        Ok(value) => Ok((Some(value), false)),
                        Err(e) => {
                            warn!(
                                "Failed to decode in-flight result for key {}: {}. Invoking operation.",
                                key, e
                            );
                            op().await.map(|value| (value, true))
                        }
                    },
                    Landed::Empty => Ok((None, false)),
                    Landed::Failed => {
                        debug!("In-flight invocation failed for key: {}. Invoking operation.", key);
                        op().await.map(|value| (value, true))
                    }
                }
            }
        }
    }
}
