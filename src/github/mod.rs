//! # GitHub GraphQL Query
//!
//! [`RemoteQuery`] implementation backed by the GitHub GraphQL API. One batch
//! becomes one `nodes(ids: [...])` request; the response keeps one slot per
//! requested id, which is what the assembler relies on to preserve order.
//!
//! Failures map onto the query error taxonomy:
//!
//! | Condition                          | Error                       |
//! |------------------------------------|-----------------------------|
//! | connection / body read failure     | `QueryError::Transport`     |
//! | non-2xx HTTP status                | `QueryError::Protocol` + status |
//! | GraphQL `errors` array             | `QueryError::Protocol` (first message) |
//! | body not shaped like a response    | `QueryError::Decode`        |

pub mod graphql;
pub mod response;

use async_trait::async_trait;
use tracing::debug;

use crate::config::{ConfigResult, ConfigurationError, GitHubConfig};
use crate::error::QueryError;
use crate::models::{Identifier, UserRecord};
use crate::query::{QueryContext, RemoteQuery};

pub use graphql::{build_request_body, profile_query};
pub use response::decode_response;

/// Batched profile query against a GitHub GraphQL endpoint
#[derive(Debug, Clone)]
pub struct GitHubNodesQuery {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
    document: String,
}

impl GitHubNodesQuery {
    pub fn from_config(config: &GitHubConfig) -> ConfigResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                ConfigurationError::invalid_value("github", config.endpoint.clone(), e.to_string())
            })?;

        Ok(Self::with_client(client, config))
    }

    /// Use a preconfigured HTTP client (proxies, custom TLS, ...)
    pub fn with_client(client: reqwest::Client, config: &GitHubConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            token: config.token.clone(),
            document: profile_query(
                config.repositories_per_user,
                config.languages_per_repository,
            ),
        }
    }
}

#[async_trait]
impl RemoteQuery for GitHubNodesQuery {
    fn query_name(&self) -> &'static str {
        "github_nodes"
    }

    async fn fetch(
        &self,
        batch: &[Identifier],
        ctx: &QueryContext,
    ) -> Result<Vec<UserRecord>, QueryError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let body = build_request_body(&self.document, batch, &ctx.window);
        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(QueryError::transport)?;
        let status = response.status();
        let payload = response.bytes().await.map_err(QueryError::transport)?;

        debug!(
            endpoint = %self.endpoint,
            ids = batch.len(),
            status = status.as_u16(),
            bytes = payload.len(),
            "GraphQL batch response received"
        );

        if !status.is_success() {
            let message = response::error_message(&payload).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string()
            });
            return Err(QueryError::http_status(status.as_u16(), message));
        }

        decode_response(&payload, batch.len())
    }
}
