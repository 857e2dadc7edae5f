//! Configuration Loader
//!
//! Layers an optional configuration file under `DEVCARD_`-prefixed
//! environment variables. Nested keys use `__`, so
//! `DEVCARD_GITHUB__TOKEN` sets `github.token`.

use config::{Config, Environment, File};
use std::path::Path;
use tracing::debug;

use super::error::{ConfigResult, ConfigurationError};
use super::AggregatorConfig;
use crate::constants::env;

/// Base name searched for in `config/` by [`AggregatorConfig::load`]
const DEFAULT_CONFIG_BASENAME: &str = "config/devcard";

impl AggregatorConfig {
    /// Load from `config/devcard.*` (optional) and the environment
    pub fn load() -> ConfigResult<Self> {
        let builder = Config::builder()
            .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
            .add_source(Self::environment_source());

        Self::build(builder, DEFAULT_CONFIG_BASENAME)
    }

    /// Load from an explicit file, which must exist, then the environment
    pub fn load_from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigurationError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let builder = Config::builder()
            .add_source(File::from(path))
            .add_source(Self::environment_source());

        Self::build(builder, &path.display().to_string())
    }

    /// Defaults overridden by the environment only
    pub fn from_env() -> ConfigResult<Self> {
        let builder = Config::builder().add_source(Self::environment_source());
        Self::build(builder, "environment")
    }

    fn environment_source() -> Environment {
        Environment::with_prefix(env::CONFIG_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        source_name: &str,
    ) -> ConfigResult<Self> {
        let merged = builder
            .build()
            .map_err(|e| ConfigurationError::load_error(source_name, e))?;

        let config: AggregatorConfig = merged.try_deserialize()?;
        config.validate()?;

        debug!(
            source = source_name,
            max_batch_size = config.max_batch_size,
            max_concurrent_batches = ?config.max_concurrent_batches,
            request_timeout_ms = ?config.request_timeout_ms,
            abort_on_first_failure = config.abort_on_first_failure,
            has_token = config.github.token.is_some(),
            "Aggregator configuration loaded"
        );

        Ok(config)
    }
}
