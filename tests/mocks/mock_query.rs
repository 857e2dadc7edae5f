//! Mock RemoteQuery Implementation for Testing
//!
//! Scripted stand-in for a remote profile source. Behavior is keyed by
//! identifier: a batch that contains a scripted identifier picks up its
//! delay, failure or hang. Every call is recorded for assertions.

use async_trait::async_trait;
use devcard_core::{
    ContributionCounts, Identifier, LanguageBytes, QueryContext, QueryError, RemoteQuery,
    TimeWindow, UserRecord,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Recorded interactions with the mock
#[derive(Debug, Default, Clone)]
pub struct MockQueryState {
    /// Every batch received, in call order
    pub calls: Vec<Vec<String>>,
    /// Window seen by each call, aligned with `calls`
    pub windows: Vec<TimeWindow>,
    /// Cancellation token handed to each call, aligned with `calls`
    pub tokens: Vec<CancellationToken>,
    /// Calls that ran to completion
    pub completed: usize,
    /// Calls whose future was dropped before completing
    pub dropped: usize,
    /// Highest number of calls in flight at once
    pub peak_in_flight: usize,
    in_flight: usize,
}

/// Scripted remote query
#[derive(Default)]
pub struct MockQuery {
    state: Arc<Mutex<MockQueryState>>,
    delays: HashMap<String, Duration>,
    default_delay: Option<Duration>,
    failures: HashMap<String, QueryError>,
    hangs: HashSet<String>,
    non_users: HashSet<String>,
    languages: HashMap<String, LanguageBytes>,
}

impl MockQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call
    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = Some(delay);
        self
    }

    /// Delay any batch containing `id`
    pub fn with_delay(mut self, id: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(id.into(), delay);
        self
    }

    /// Fail any batch containing `id`
    pub fn with_failure(mut self, id: impl Into<String>, error: QueryError) -> Self {
        self.failures.insert(id.into(), error);
        self
    }

    /// Never complete any batch containing `id`
    pub fn with_hang(mut self, id: impl Into<String>) -> Self {
        self.hangs.insert(id.into());
        self
    }

    /// Answer with an empty slot for `id`
    pub fn with_non_user(mut self, id: impl Into<String>) -> Self {
        self.non_users.insert(id.into());
        self
    }

    /// Language breakdown reported for `id`
    pub fn with_languages<I, S>(mut self, id: impl Into<String>, languages: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        self.languages.insert(
            id.into(),
            languages
                .into_iter()
                .map(|(name, bytes)| (name.into(), bytes))
                .collect(),
        );
        self
    }

    /// Get the current state for assertions
    pub fn get_state(&self) -> MockQueryState {
        self.state.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    fn delay_for(&self, batch: &[Identifier]) -> Option<Duration> {
        batch
            .iter()
            .filter_map(|id| self.delays.get(id.as_str()).copied())
            .max()
            .or(self.default_delay)
    }

    fn record_for(&self, id: &Identifier) -> UserRecord {
        if self.non_users.contains(id.as_str()) {
            return UserRecord::not_a_user();
        }

        let login = format!("user-{id}");
        UserRecord::new(login.clone())
            .with_display_name(login)
            .with_avatar_url(format!("https://avatars.example.com/{id}"))
            .with_contributions(ContributionCounts {
                total: 1,
                commits: 1,
                ..Default::default()
            })
            .with_language_bytes(self.languages.get(id.as_str()).cloned().unwrap_or_default())
    }
}

/// Tracks one call; counts it as dropped unless marked complete
struct CallGuard {
    state: Arc<Mutex<MockQueryState>>,
    completed: bool,
}

impl CallGuard {
    fn start(
        state: &Arc<Mutex<MockQueryState>>,
        batch: &[Identifier],
        ctx: &QueryContext,
    ) -> Self {
        let mut guard = state.lock().unwrap();
        guard
            .calls
            .push(batch.iter().map(|id| id.as_str().to_string()).collect());
        guard.windows.push(ctx.window);
        guard.tokens.push(ctx.cancellation.clone());
        guard.in_flight += 1;
        guard.peak_in_flight = guard.peak_in_flight.max(guard.in_flight);
        drop(guard);

        Self {
            state: Arc::clone(state),
            completed: false,
        }
    }

    fn complete(mut self) {
        self.completed = true;
    }
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.in_flight -= 1;
        if self.completed {
            state.completed += 1;
        } else {
            state.dropped += 1;
        }
    }
}

#[async_trait]
impl RemoteQuery for MockQuery {
    fn query_name(&self) -> &'static str {
        "mock_query"
    }

    async fn fetch(
        &self,
        batch: &[Identifier],
        ctx: &QueryContext,
    ) -> Result<Vec<UserRecord>, QueryError> {
        let guard = CallGuard::start(&self.state, batch, ctx);

        if let Some(delay) = self.delay_for(batch) {
            tokio::time::sleep(delay).await;
        }

        if batch.iter().any(|id| self.hangs.contains(id.as_str())) {
            std::future::pending::<()>().await;
        }

        let failure = batch
            .iter()
            .find_map(|id| self.failures.get(id.as_str()).cloned());

        let result = match failure {
            Some(error) => Err(error),
            None => Ok(batch.iter().map(|id| self.record_for(id)).collect()),
        };

        guard.complete();
        result
    }
}
