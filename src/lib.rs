//! cache-advice - Declarative cache advice for async operations
//!
//! This library attaches cache behavior to an operation without the
//! operation containing any cache logic:
//! - Read-through: serve a stored value or invoke and cache the result
//! - Write-through: cache a successful result under a computed key
//! - Evict: delete a computed key after a successful call
//! - Composite: several writes and evictions around a single call
//!
//! Keys come from templates such as `USER:{id}` whose placeholders are
//! filled, in order, from the call's (optionally selected) arguments.
//! Stores are pluggable: an in-process Moka store and a Redis store are
//! provided.

mod config;
mod descriptor;
mod engine;
mod error;
mod operation;
mod redis_store;
mod selector;
mod single_flight;
mod store;
pub mod template;
pub mod value;

pub use config::CacheConfig;
pub use descriptor::{
    Composite, DEFAULT_TTL, Evict, KeySpec, NULL_TTL, ReadMode, ReadThrough, WriteThrough,
};
pub use engine::{AdviceKind, CacheAdvisor, Cacheable, ErrorHook};
pub use error::{CacheError, KeyError};
pub use operation::{CompositeOp, EvictOp, Operation, ReadThroughOp, WriteThroughOp};
pub use redis_store::RedisStore;
pub use selector::select;
pub use store::{CacheStore, MokaStore};
pub use template::PlaceholderResolver;

// Re-export async_trait for convenience
pub use async_trait::async_trait;
