//! # System Constants
//!
//! Fixed values that define the operational boundaries of the aggregation
//! client: batch limits, language fallbacks and remote endpoint defaults.

/// Maximum identifiers per remote query.
///
/// Kept deliberately small so a single query stays within the remote
/// source's node and complexity limits.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 10;

/// Per-aggregation deadline applied when the configuration does not override it.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Length of the contribution window, in days, used by `TimeWindow::trailing_days`.
pub const DEFAULT_WINDOW_DAYS: i64 = 365;

/// Longest contribution window accepted by configuration validation.
pub const MAX_WINDOW_DAYS: i64 = 36_500;

/// Language constants shared by the catalog and the aggregator
pub mod languages {
    /// Name reported when a user has no language data at all
    pub const UNKNOWN_LANGUAGE: &str = "Unknown";

    /// Color used for unknown languages and for catalog entries without a color
    pub const DEFAULT_LANGUAGE_COLOR: &str = "#858585";
}

/// GitHub GraphQL defaults
pub mod github {
    pub const DEFAULT_GRAPHQL_ENDPOINT: &str = "https://api.github.com/graphql";
    pub const DEFAULT_USER_AGENT: &str = concat!("devcard-core/", env!("CARGO_PKG_VERSION"));
    pub const DEFAULT_REPOSITORIES_PER_USER: u32 = 100;
    pub const DEFAULT_LANGUAGES_PER_REPOSITORY: u32 = 10;
}

/// Environment variables consulted by configuration and logging
pub mod env {
    pub const CONFIG_PREFIX: &str = "DEVCARD";
    pub const ENVIRONMENT: &str = "DEVCARD_ENV";
    pub const LOG_FORMAT: &str = "DEVCARD_LOG_FORMAT";
}
