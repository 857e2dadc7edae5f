#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # devcard-core
//!
//! Concurrent batched aggregation client for developer profile cards.
//!
//! ## Overview
//!
//! Given a list of external user identifiers, the crate fetches a composite
//! profile for each one (display name, avatar, contribution counts and the
//! dominant programming language) from a remote source that only accepts a
//! bounded number of identifiers per query.
//!
//! ## Architecture
//!
//! - **Batch planning**: identifiers are split into index-tagged chunks of at
//!   most `max_batch_size` entries
//! - **Fan-out**: one tokio task per chunk, each making exactly one remote call,
//!   optionally bounded by a permit pool
//! - **Fan-in**: outcomes are reordered by chunk index; any failure discards
//!   every record and surfaces one error naming the failing range
//! - **Enrichment**: each profile gets its dominant language and color from a
//!   process-wide catalog initialized once
//!
//! ## Module Organization
//!
//! - [`aggregator`] - The `ProfileAggregator` entry point
//! - [`batch`] - Planner, parallel executor and result assembler
//! - [`languages`] - Language catalog and dominant-language selection
//! - [`query`] - The `RemoteQuery` capability injected by callers
//! - [`github`] - GitHub GraphQL implementation of `RemoteQuery`
//! - [`models`] - Identifiers, user records and time windows
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Structured error handling
//! - [`logging`] - `tracing` subscriber setup
//!
//! ## Quick Start
//!
//! ```rust
//! use devcard_core::{Identifier, ProfileAggregator, QueryFn, UserRecord};
//! use futures::FutureExt;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let query = QueryFn::new(|batch, _ctx| {
//!     async move {
//!         Ok(batch
//!             .iter()
//!             .map(|id| UserRecord::new(id.as_str()).with_language_bytes([("Rust", 1024_u64)]))
//!             .collect())
//!     }
//!     .boxed()
//! });
//!
//! let aggregator = ProfileAggregator::with_defaults(Arc::new(query)).unwrap();
//! let ids: Vec<Identifier> = (0..23_u64).map(Identifier::from).collect();
//! let profiles = aggregator
//!     .fetch_profiles(&ids, aggregator.default_window().unwrap())
//!     .await
//!     .unwrap();
//!
//! assert_eq!(profiles.len(), 23);
//! assert_eq!(profiles[22].login, "22");
//! assert_eq!(profiles[0].dominant_language.as_ref().unwrap().name, "Rust");
//! # });
//! ```

pub mod aggregator;
pub mod batch;
pub mod config;
pub mod constants;
pub mod error;
pub mod github;
pub mod languages;
pub mod logging;
pub mod models;
pub mod query;

pub use aggregator::ProfileAggregator;
pub use batch::{assemble, plan, Chunk, ChunkOutcome, ExecutionContext, ParallelExecutor};
pub use config::{AggregatorConfig, ConfigurationError, GitHubConfig};
pub use error::{AggregationError, AggregationResult, CancelReason, QueryError};
pub use github::GitHubNodesQuery;
pub use languages::{language_color, resolve_dominant_language, LanguageAggregator, LanguageCatalog};
pub use models::{
    ContributionCounts, Identifier, LanguageBytes, LanguageStat, RepositoryLanguages, TimeWindow,
    UserRecord,
};
pub use query::{QueryContext, QueryFn, RemoteQuery};
