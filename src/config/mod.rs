//! # Aggregator Configuration
//!
//! Settings consumed by the aggregation client: batch sizing, the optional
//! secondary concurrency cap, the per-call deadline, the contribution window
//! and the GitHub GraphQL endpoint.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use devcard_core::config::AggregatorConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // config/devcard.{toml,yaml} if present, then DEVCARD_* variables
//! let config = AggregatorConfig::load()?;
//! let batch_size = config.batch_size()?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::time::Duration;

use crate::constants::{self, github};

pub use error::{ConfigResult, ConfigurationError};

/// Root configuration for the aggregation client
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Identifiers per remote query
    pub max_batch_size: usize,

    /// Upper bound on in-flight batch queries; unset runs every batch at once
    pub max_concurrent_batches: Option<usize>,

    /// Deadline for a whole aggregation call, in milliseconds
    pub request_timeout_ms: Option<u64>,

    /// Stop sibling batches as soon as one batch fails
    pub abort_on_first_failure: bool,

    /// Length of the default contribution window
    pub window_days: i64,

    /// Remote GraphQL endpoint settings
    pub github: GitHubConfig,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_batch_size: constants::DEFAULT_MAX_BATCH_SIZE,
            max_concurrent_batches: None,
            request_timeout_ms: Some(constants::DEFAULT_REQUEST_TIMEOUT_MS),
            abort_on_first_failure: false,
            window_days: constants::DEFAULT_WINDOW_DAYS,
            github: GitHubConfig::default(),
        }
    }
}

/// GitHub GraphQL endpoint configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub endpoint: String,
    /// Bearer token; anonymous requests are rejected by the GraphQL API
    pub token: Option<String>,
    pub user_agent: String,
    pub repositories_per_user: u32,
    pub languages_per_repository: u32,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            endpoint: github::DEFAULT_GRAPHQL_ENDPOINT.to_string(),
            token: None,
            user_agent: github::DEFAULT_USER_AGENT.to_string(),
            repositories_per_user: github::DEFAULT_REPOSITORIES_PER_USER,
            languages_per_repository: github::DEFAULT_LANGUAGES_PER_REPOSITORY,
        }
    }
}

impl AggregatorConfig {
    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_batch_size == 0 {
            return Err(ConfigurationError::invalid_value(
                "max_batch_size",
                "0",
                "must be greater than 0",
            ));
        }

        if self.max_concurrent_batches == Some(0) {
            return Err(ConfigurationError::invalid_value(
                "max_concurrent_batches",
                "0",
                "must be greater than 0 when set",
            ));
        }

        if self.request_timeout_ms == Some(0) {
            return Err(ConfigurationError::invalid_value(
                "request_timeout_ms",
                "0",
                "must be greater than 0 when set",
            ));
        }

        if self.window_days <= 0 || self.window_days > constants::MAX_WINDOW_DAYS {
            return Err(ConfigurationError::invalid_value(
                "window_days",
                self.window_days.to_string(),
                format!("must be between 1 and {} days", constants::MAX_WINDOW_DAYS),
            ));
        }

        // The GraphQL API caps `first:` arguments at 100
        for (field, value) in [
            ("github.repositories_per_user", self.github.repositories_per_user),
            ("github.languages_per_repository", self.github.languages_per_repository),
        ] {
            if value == 0 || value > 100 {
                return Err(ConfigurationError::invalid_value(
                    field,
                    value.to_string(),
                    "must be between 1 and 100",
                ));
            }
        }

        if self.github.endpoint.trim().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "github.endpoint",
                "",
                "must not be empty",
            ));
        }

        Ok(())
    }

    /// Batch size as a non-zero value, as required by the planner
    pub fn batch_size(&self) -> ConfigResult<NonZeroUsize> {
        NonZeroUsize::new(self.max_batch_size).ok_or_else(|| {
            ConfigurationError::invalid_value("max_batch_size", "0", "must be greater than 0")
        })
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}
