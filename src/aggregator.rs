//! # Profile Aggregator
//!
//! Entry point of the crate: fetch enriched profiles for many identifiers
//! through a batch-limited [`RemoteQuery`].
//!
//! ```text
//! identifiers ─► plan ─► chunk × N ─► execute (one task each) ─► assemble ─► enrich
//! ```
//!
//! The caller receives either every profile in input order (minus slots that
//! were not users) or a single error. Partial lists are never returned.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use devcard_core::aggregator::ProfileAggregator;
//! use devcard_core::config::AggregatorConfig;
//! use devcard_core::github::GitHubNodesQuery;
//! use devcard_core::models::{Identifier, TimeWindow};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AggregatorConfig::load()?;
//! let query = GitHubNodesQuery::from_config(&config.github)?;
//! let aggregator = ProfileAggregator::new(Arc::new(query), config)?;
//!
//! let ids: Vec<Identifier> = vec!["MDQ6VXNlcjE=".into(), "MDQ6VXNlcjI=".into()];
//! let profiles = aggregator.fetch_profiles(&ids, aggregator.default_window()?).await?;
//! # Ok(())
//! # }
//! ```

use chrono::Utc;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::batch::{assemble, plan, ExecutionContext, ParallelExecutor};
use crate::config::{AggregatorConfig, ConfigResult};
use crate::error::AggregationResult;
use crate::languages::{LanguageAggregator, LanguageCatalog};
use crate::models::{Identifier, TimeWindow, UserRecord};
use crate::query::RemoteQuery;

/// Concurrent batched aggregation client
pub struct ProfileAggregator {
    query: Arc<dyn RemoteQuery>,
    config: AggregatorConfig,
    batch_size: NonZeroUsize,
    executor: ParallelExecutor,
    catalog: &'static LanguageCatalog,
}

impl std::fmt::Debug for ProfileAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileAggregator")
            .field("query", &self.query.query_name())
            .field("batch_size", &self.batch_size)
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

impl ProfileAggregator {
    /// Build an aggregator; the configuration is validated here
    pub fn new(query: Arc<dyn RemoteQuery>, config: AggregatorConfig) -> ConfigResult<Self> {
        config.validate()?;
        let batch_size = config.batch_size()?;
        let executor = ParallelExecutor::new()
            .with_max_in_flight(config.max_concurrent_batches.and_then(NonZeroUsize::new))
            .with_abort_on_first_failure(config.abort_on_first_failure);

        Ok(Self {
            query,
            config,
            batch_size,
            executor,
            catalog: LanguageCatalog::global(),
        })
    }

    /// Aggregator with default configuration
    pub fn with_defaults(query: Arc<dyn RemoteQuery>) -> ConfigResult<Self> {
        Self::new(query, AggregatorConfig::default())
    }

    /// Use a specific catalog instead of the embedded one
    pub fn with_catalog(mut self, catalog: &'static LanguageCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Trailing window of `window_days` ending now
    pub fn default_window(&self) -> ConfigResult<TimeWindow> {
        TimeWindow::trailing_days(Utc::now(), self.config.window_days)
    }

    /// Fetch profiles for `identifiers`, bounded by the configured deadline
    pub async fn fetch_profiles(
        &self,
        identifiers: &[Identifier],
        window: TimeWindow,
    ) -> AggregationResult<Vec<UserRecord>> {
        self.fetch_profiles_with_cancel(identifiers, window, CancellationToken::new())
            .await
    }

    /// Same as [`fetch_profiles`](Self::fetch_profiles), also stopping when
    /// `cancellation` fires
    ///
    /// Cancellation reaches every in-flight batch query and the call returns
    /// `AggregationError::Cancelled` rather than a partial list.
    #[instrument(
        skip_all,
        fields(
            aggregation_id = %Uuid::new_v4(),
            identifiers = identifiers.len(),
            batch_size = self.batch_size.get()
        )
    )]
    pub async fn fetch_profiles_with_cancel(
        &self,
        identifiers: &[Identifier],
        window: TimeWindow,
        cancellation: CancellationToken,
    ) -> AggregationResult<Vec<UserRecord>> {
        let chunks = plan(identifiers, self.batch_size);
        if chunks.is_empty() {
            debug!("No identifiers supplied; skipping remote queries");
            return Ok(Vec::new());
        }

        let chunk_count = chunks.len();
        let mut ctx = ExecutionContext::new(window, cancellation);
        if let Some(timeout) = self.config.request_timeout() {
            ctx = ctx.with_timeout(timeout);
        }

        let outcomes = self
            .executor
            .execute(chunks, Arc::clone(&self.query), &ctx)
            .await;

        let mut records = assemble(outcomes, chunk_count).inspect_err(|error| {
            warn!(error = %error, "Profile aggregation failed");
        })?;

        LanguageAggregator::new(self.catalog).enrich_all(&mut records);

        info!(
            chunk_count = chunk_count,
            profiles = records.len(),
            dropped = identifiers.len().saturating_sub(records.len()),
            "Profile aggregation completed"
        );

        Ok(records)
    }
}
