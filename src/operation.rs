//! Wrapping operations with cache advice
//!
//! An [`Operation`] takes its arguments as a single value (a tuple for
//! several arguments) and returns an optional result. Closures returning a
//! future implement it directly. Each `wrap_*` method on [`CacheAdvisor`]
//! returns a decorator with the same call contract, so wrappers compose:
//!
//! ```ignore
//! let find_user = advisor.wrap_read_through(
//!     ReadThrough::new("USER:{id}")?,
//!     |(query,): (UserQuery,)| async move { repo.find(query).await },
//! );
//! let user = find_user.call((UserQuery { id: 42 },)).await?;
//! ```

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use tracing::warn;

use crate::value::to_arguments;
use crate::{
    AdviceKind, CacheAdvisor, CacheError, CacheStore, Cacheable, Composite, Evict, ReadThrough,
    WriteThrough,
};

/// An invocable operation: arguments in, optional result out
#[async_trait]
pub trait Operation<A>: Send + Sync
where
    A: Send + 'static,
{
    type Output: Send + 'static;
    type Error: Send + 'static;

    async fn call(&self, args: A) -> Result<Option<Self::Output>, Self::Error>;
}

#[async_trait]
impl<A, F, Fut, T, E> Operation<A> for F
where
    A: Send + 'static,
    F: Fn(A) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<T>, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = T;
    type Error = E;

    async fn call(&self, args: A) -> Result<Option<T>, E> {
        (self)(args).await
    }
}

impl<S: CacheStore> CacheAdvisor<S> {
    /// Wrap `inner` so calls go through read-through advice
    pub fn wrap_read_through<O>(&self, descriptor: ReadThrough, inner: O) -> ReadThroughOp<O, S> {
        ReadThroughOp {
            inner,
            descriptor,
            advisor: self.clone(),
        }
    }

    /// Wrap `inner` so successful results are written through
    pub fn wrap_write_through<O>(&self, descriptor: WriteThrough, inner: O) -> WriteThroughOp<O, S> {
        WriteThroughOp {
            inner,
            descriptor,
            advisor: self.clone(),
        }
    }

    /// Wrap `inner` so a key is evicted after each successful call
    pub fn wrap_evict<O>(&self, descriptor: Evict, inner: O) -> EvictOp<O, S> {
        EvictOp {
            inner,
            descriptor,
            advisor: self.clone(),
        }
    }

    /// Wrap `inner` with a composite of writes and evictions.
    ///
    /// Read-through entries in the composite are not executed.
    pub fn wrap_composite<O>(&self, descriptor: Composite, inner: O) -> CompositeOp<O, S> {
        if !descriptor.read_through().is_empty() {
            warn!(
                "Composite carries {} read-through descriptor(s); they will not be executed",
                descriptor.read_through().len()
            );
        }
        CompositeOp {
            inner,
            descriptor,
            advisor: self.clone(),
        }
    }

    /// Convert call arguments for key resolution, reporting failures
    fn arguments<A: Serialize + ?Sized>(&self, kind: AdviceKind, args: &A) -> Option<Vec<Value>> {
        match to_arguments(args) {
            Ok(values) => Some(values),
            Err(e) => {
                self.report(kind, &CacheError::from(e));
                None
            }
        }
    }
}

/// Operation decorated with read-through advice
pub struct ReadThroughOp<O, S: CacheStore> {
    inner: O,
    descriptor: ReadThrough,
    advisor: CacheAdvisor<S>,
}

impl<O, S: CacheStore> ReadThroughOp<O, S> {
    pub fn descriptor(&self) -> &ReadThrough {
        &self.descriptor
    }
}

#[async_trait]
impl<A, O, S> Operation<A> for ReadThroughOp<O, S>
where
    A: Serialize + Send + 'static,
    O: Operation<A>,
    O::Output: Cacheable,
    S: CacheStore,
{
    type Output = O::Output;
    type Error = O::Error;

    async fn call(&self, args: A) -> Result<Option<O::Output>, O::Error> {
        let Some(values) = self.advisor.arguments(AdviceKind::ReadThrough, &args) else {
            return self.inner.call(args).await;
        };
        self.advisor
            .around_read_through(&self.descriptor, &values, || self.inner.call(args))
            .await
    }
}

/// Operation decorated with write-through advice
pub struct WriteThroughOp<O, S: CacheStore> {
    inner: O,
    descriptor: WriteThrough,
    advisor: CacheAdvisor<S>,
}

impl<O, S: CacheStore> WriteThroughOp<O, S> {
    pub fn descriptor(&self) -> &WriteThrough {
        &self.descriptor
    }
}

#[async_trait]
impl<A, O, S> Operation<A> for WriteThroughOp<O, S>
where
    A: Serialize + Send + 'static,
    O: Operation<A>,
    O::Output: Cacheable,
    S: CacheStore,
{
    type Output = O::Output;
    type Error = O::Error;

    async fn call(&self, args: A) -> Result<Option<O::Output>, O::Error> {
        let values = self.advisor.arguments(AdviceKind::WriteThrough, &args);
        let result = self.inner.call(args).await?;

        if let Some(values) = values
            && let Err(e) = self
                .advisor
                .after_write_through(&self.descriptor, &values, result.as_ref())
                .await
        {
            self.advisor.report(AdviceKind::WriteThrough, &e);
        }

        Ok(result)
    }
}

/// Operation decorated with evict advice
pub struct EvictOp<O, S: CacheStore> {
    inner: O,
    descriptor: Evict,
    advisor: CacheAdvisor<S>,
}

impl<O, S: CacheStore> EvictOp<O, S> {
    pub fn descriptor(&self) -> &Evict {
        &self.descriptor
    }
}

#[async_trait]
impl<A, O, S> Operation<A> for EvictOp<O, S>
where
    A: Serialize + Send + 'static,
    O: Operation<A>,
    S: CacheStore,
{
    type Output = O::Output;
    type Error = O::Error;

    async fn call(&self, args: A) -> Result<Option<O::Output>, O::Error> {
        let values = self.advisor.arguments(AdviceKind::Evict, &args);
        let result = self.inner.call(args).await?;

        if let Some(values) = values
            && let Err(e) = self.advisor.after_evict(&self.descriptor, &values).await
        {
            self.advisor.report(AdviceKind::Evict, &e);
        }

        Ok(result)
    }
}

/// Operation decorated with a composite of writes and evictions
pub struct CompositeOp<O, S: CacheStore> {
    inner: O,
    descriptor: Composite,
    advisor: CacheAdvisor<S>,
}

impl<O, S: CacheStore> CompositeOp<O, S> {
    pub fn descriptor(&self) -> &Composite {
        &self.descriptor
    }
}

#[async_trait]
impl<A, O, S> Operation<A> for CompositeOp<O, S>
where
    A: Serialize + Send + 'static,
    O: Operation<A>,
    O::Output: Cacheable,
    S: CacheStore,
{
    type Output = O::Output;
    type Error = O::Error;

    async fn call(&self, args: A) -> Result<Option<O::Output>, O::Error> {
        let Some(values) = self.advisor.arguments(AdviceKind::Composite, &args) else {
            return self.inner.call(args).await;
        };
        self.advisor
            .around_composite(&self.descriptor, &values, || self.inner.call(args))
            .await
    }
}
