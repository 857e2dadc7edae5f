//! # Parallel Executor
//!
//! Fan-out side of the aggregation: one tokio task per chunk, each making
//! exactly one remote call.
//!
//! ## Guarantees
//!
//! - Every launched task is drained before `execute` returns, including after
//!   a failure; nothing is left running in the background.
//! - Exactly one [`ChunkOutcome`] per chunk. A panicking query becomes a
//!   `TaskFailed` outcome for its own chunk.
//! - Cancellation and the deadline reach in-flight queries promptly: the
//!   query future is dropped and the chunk reports `Cancelled` or
//!   `DeadlineExceeded`.
//! - An optional permit pool bounds how many queries are in flight at once.

use futures::FutureExt;
use std::any::Any;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::ops::Range;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::error::QueryError;
use crate::models::{TimeWindow, UserRecord};
use crate::query::{QueryContext, RemoteQuery};

use super::assembler::ChunkOutcome;
use super::planner::Chunk;

/// Per-call inputs shared by every chunk task
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub window: TimeWindow,
    /// Caller-owned cancellation signal
    pub cancellation: CancellationToken,
    deadline: Option<Instant>,
    timeout_ms: u64,
}

impl ExecutionContext {
    pub fn new(window: TimeWindow, cancellation: CancellationToken) -> Self {
        Self {
            window,
            cancellation,
            deadline: None,
            timeout_ms: 0,
        }
    }

    /// Bound the whole call to `timeout` from now
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// Launches one task per chunk and collects their outcomes
#[derive(Debug, Clone, Default)]
pub struct ParallelExecutor {
    max_in_flight: Option<NonZeroUsize>,
    abort_on_first_failure: bool,
}

impl ParallelExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap concurrent queries; `None` runs every chunk at once
    pub fn with_max_in_flight(mut self, max_in_flight: Option<NonZeroUsize>) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    /// Cancel the remaining chunks once any chunk fails
    pub fn with_abort_on_first_failure(mut self, enabled: bool) -> Self {
        self.abort_on_first_failure = enabled;
        self
    }

    /// Run `query` once per chunk and return every outcome in completion order
    #[instrument(skip_all, fields(chunk_count = chunks.len(), query = query.query_name()))]
    pub async fn execute(
        &self,
        chunks: Vec<Chunk>,
        query: Arc<dyn RemoteQuery>,
        ctx: &ExecutionContext,
    ) -> Vec<ChunkOutcome> {
        if chunks.is_empty() {
            return Vec::new();
        }

        let chunk_count = chunks.len();
        let started = Instant::now();

        // Child of the caller's token: fires on caller cancellation, on the
        // deadline, or on the first failure when aborting is enabled.
        let stop = ctx.cancellation.child_token();
        let _watchdog = ctx
            .deadline
            .map(|deadline| DeadlineWatchdog::spawn(deadline, stop.clone()));

        let limiter = self
            .max_in_flight
            .map(|permits| Arc::new(Semaphore::new(permits.get())));

        let mut unreported: BTreeMap<usize, Range<usize>> = chunks
            .iter()
            .map(|chunk| (chunk.index, chunk.span()))
            .collect();

        let mut tasks = JoinSet::new();
        for chunk in chunks {
            let task = ChunkTask {
                chunk,
                query: Arc::clone(&query),
                window: ctx.window,
                caller: ctx.cancellation.clone(),
                stop: stop.clone(),
                deadline: ctx.deadline,
                timeout_ms: ctx.timeout_ms,
                limiter: limiter.clone(),
            };
            tasks.spawn(task.run());
        }

        let mut outcomes = Vec::with_capacity(chunk_count);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    unreported.remove(&outcome.index);
                    if self.abort_on_first_failure && !stop.is_cancelled() {
                        if let Some(error) = outcome.error() {
                            debug!(
                                batch_index = outcome.index,
                                error_kind = error.kind(),
                                "Aborting remaining batches after failure"
                            );
                            stop.cancel();
                        }
                    }
                    outcomes.push(outcome);
                }
                Err(join_error) => {
                    error!(error = %join_error, "Batch task terminated without an outcome");
                }
            }
        }

        for (index, span) in unreported {
            outcomes.push(ChunkOutcome::failure(
                index,
                span,
                QueryError::TaskFailed("batch task terminated without reporting".to_string()),
            ));
        }

        info!(
            chunk_count = chunk_count,
            succeeded = outcomes.iter().filter(|o| o.is_success()).count(),
            failed = outcomes.iter().filter(|o| !o.is_success()).count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Batch fan-out completed"
        );

        outcomes
    }
}

/// Everything one chunk's task owns
struct ChunkTask {
    chunk: Chunk,
    query: Arc<dyn RemoteQuery>,
    window: TimeWindow,
    caller: CancellationToken,
    stop: CancellationToken,
    deadline: Option<Instant>,
    timeout_ms: u64,
    limiter: Option<Arc<Semaphore>>,
}

impl ChunkTask {
    async fn run(self) -> ChunkOutcome {
        let index = self.chunk.index;
        let span = self.chunk.span();
        let started = Instant::now();

        let result = match AssertUnwindSafe(self.query_once()).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(QueryError::TaskFailed(panic_message(panic.as_ref()))),
        };

        match &result {
            Ok(records) => debug!(
                batch_index = index,
                span_start = span.start,
                span_end = span.end,
                records = records.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Batch query succeeded"
            ),
            Err(error) => debug!(
                batch_index = index,
                span_start = span.start,
                span_end = span.end,
                error_kind = error.kind(),
                error = %error,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Batch query failed"
            ),
        }

        ChunkOutcome {
            index,
            span,
            result,
        }
    }

    async fn query_once(&self) -> Result<Vec<UserRecord>, QueryError> {
        let _permit = match &self.limiter {
            Some(limiter) => tokio::select! {
                biased;
                _ = self.stop.cancelled() => return Err(self.interruption()),
                permit = Arc::clone(limiter).acquire_owned() => {
                    Some(permit.map_err(|e| QueryError::TaskFailed(e.to_string()))?)
                }
            },
            None => None,
        };

        let ctx = QueryContext::new(self.window, self.stop.clone());
        tokio::select! {
            biased;
            _ = self.stop.cancelled() => Err(self.interruption()),
            result = self.query.fetch(&self.chunk.items, &ctx) => result,
        }
    }

    /// Why `stop` fired
    fn interruption(&self) -> QueryError {
        if self.caller.is_cancelled() {
            QueryError::Cancelled
        } else if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            QueryError::DeadlineExceeded {
                timeout_ms: self.timeout_ms,
            }
        } else {
            QueryError::Aborted
        }
    }
}

/// Cancels a token when the deadline passes; stops when dropped
struct DeadlineWatchdog(JoinHandle<()>);

impl DeadlineWatchdog {
    fn spawn(deadline: Instant, token: CancellationToken) -> Self {
        Self(tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => token.cancel(),
                _ = token.cancelled() => {}
            }
        }))
    }
}

impl Drop for DeadlineWatchdog {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("query panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("query panicked: {message}")
    } else {
        "query panicked".to_string()
    }
}
