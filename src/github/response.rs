//! Response decoding for the batched profile query.

use serde::Deserialize;

use crate::error::QueryError;
use crate::languages::tally_repository_languages;
use crate::models::{ContributionCounts, RepositoryLanguages, UserRecord};

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<NodesData>,
    #[serde(default)]
    errors: Vec<GraphQlErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorMessage {
    message: String,
}

#[derive(Debug, Deserialize)]
struct NodesData {
    #[serde(default)]
    nodes: Vec<Option<UserNode>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserNode {
    login: Option<String>,
    name: Option<String>,
    avatar_url: Option<String>,
    contributions_collection: Option<ContributionsCollection>,
    repositories: Option<Connection<RepositoryNode>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ContributionsCollection {
    contribution_calendar: Option<ContributionCalendar>,
    total_commit_contributions: u64,
    total_issue_contributions: u64,
    total_pull_request_contributions: u64,
    total_pull_request_review_contributions: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionCalendar {
    total_contributions: u64,
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    #[serde(default = "Vec::new")]
    nodes: Vec<Option<T>>,
}

#[derive(Debug, Deserialize)]
struct RepositoryNode {
    languages: Option<EdgeConnection>,
}

#[derive(Debug, Deserialize)]
struct EdgeConnection {
    #[serde(default)]
    edges: Vec<Option<LanguageEdgeNode>>,
}

#[derive(Debug, Deserialize)]
struct LanguageEdgeNode {
    size: u64,
    node: LanguageNode,
}

#[derive(Debug, Deserialize)]
struct LanguageNode {
    name: String,
}

/// Decode one response body into positional records
///
/// The first GraphQL error message, if any, fails the whole batch. The node
/// list must have one entry per requested identifier.
pub fn decode_response(body: &[u8], expected: usize) -> Result<Vec<UserRecord>, QueryError> {
    let response: GraphQlResponse = serde_json::from_slice(body).map_err(QueryError::decode)?;

    if let Some(first) = response.errors.into_iter().next() {
        return Err(QueryError::protocol(first.message));
    }

    let data = response
        .data
        .ok_or_else(|| QueryError::decode("response contained neither data nor errors"))?;

    if data.nodes.len() != expected {
        return Err(QueryError::decode(format!(
            "expected {expected} nodes, received {}",
            data.nodes.len()
        )));
    }

    Ok(data
        .nodes
        .into_iter()
        .map(|node| node.map(into_record).unwrap_or_else(UserRecord::not_a_user))
        .collect())
}

/// Best-effort `message` from an error body, for non-success statuses
pub fn error_message(body: &[u8]) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
}

fn into_record(node: UserNode) -> UserRecord {
    let Some(login) = node.login.filter(|login| !login.is_empty()) else {
        return UserRecord::not_a_user();
    };

    let contributions = node
        .contributions_collection
        .map(|c| ContributionCounts {
            total: c.contribution_calendar.map_or(0, |cal| cal.total_contributions),
            commits: c.total_commit_contributions,
            issues: c.total_issue_contributions,
            pull_requests: c.total_pull_request_contributions,
            reviews: c.total_pull_request_review_contributions,
        })
        .unwrap_or_default();

    let repositories: Vec<RepositoryLanguages> = node
        .repositories
        .map(|connection| connection.nodes)
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .filter_map(|repo| repo.languages)
        .map(|languages| {
            RepositoryLanguages::new(
                languages
                    .edges
                    .into_iter()
                    .flatten()
                    .map(|edge| (edge.node.name, edge.size)),
            )
        })
        .collect();

    UserRecord {
        display_name: node.name.unwrap_or_else(|| login.clone()),
        avatar_url: node.avatar_url.unwrap_or_default(),
        contributions,
        language_bytes: tally_repository_languages(&repositories),
        login,
        dominant_language: None,
    }
}
