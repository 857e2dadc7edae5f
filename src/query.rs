//! # Remote Query Capability
//!
//! The aggregation client never talks to the network itself; it is handed a
//! [`RemoteQuery`] and calls it once per batch.

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::error::QueryError;
use crate::models::{Identifier, TimeWindow, UserRecord};

/// Per-call context handed to every batch query
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// Contribution window, passed through unchanged
    pub window: TimeWindow,
    /// Fires when the caller cancels, the deadline elapses or a sibling
    /// failure aborts the aggregation
    pub cancellation: CancellationToken,
}

impl QueryContext {
    pub fn new(window: TimeWindow, cancellation: CancellationToken) -> Self {
        Self {
            window,
            cancellation,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

/// One network call covering at most one batch of identifiers
///
/// Implementations return records positionally: one record per identifier,
/// with [`UserRecord::not_a_user`] in slots that did not resolve to a user.
/// Errors are reported, never retried, by the caller.
#[async_trait]
pub trait RemoteQuery: Send + Sync {
    /// Name used in logs
    fn query_name(&self) -> &'static str {
        "remote_query"
    }

    async fn fetch(
        &self,
        batch: &[Identifier],
        ctx: &QueryContext,
    ) -> Result<Vec<UserRecord>, QueryError>;
}

type BoxedQueryFn =
    dyn Fn(Vec<Identifier>, QueryContext) -> BoxFuture<'static, Result<Vec<UserRecord>, QueryError>>
        + Send
        + Sync;

/// Adapts a closure returning a boxed future into a [`RemoteQuery`]
///
/// ```rust
/// use devcard_core::query::QueryFn;
/// use devcard_core::models::UserRecord;
/// use futures::FutureExt;
///
/// let query = QueryFn::new(|batch, _ctx| {
///     async move { Ok(batch.iter().map(|id| UserRecord::new(id.as_str())).collect()) }.boxed()
/// });
/// ```
pub struct QueryFn {
    inner: Box<BoxedQueryFn>,
}

impl QueryFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Vec<Identifier>, QueryContext) -> BoxFuture<'static, Result<Vec<UserRecord>, QueryError>>
            + Send
            + Sync
            + 'static,
    {
        Self { inner: Box::new(f) }
    }
}

impl std::fmt::Debug for QueryFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryFn").finish_non_exhaustive()
    }
}

#[async_trait]
impl RemoteQuery for QueryFn {
    fn query_name(&self) -> &'static str {
        "query_fn"
    }

    async fn fetch(
        &self,
        batch: &[Identifier],
        ctx: &QueryContext,
    ) -> Result<Vec<UserRecord>, QueryError> {
        (self.inner)(batch.to_vec(), ctx.clone()).await
    }
}
