//! GraphQL document and request body for the batched `nodes(ids:)` query.

use serde::Serialize;

use crate::models::{Identifier, TimeWindow};

/// Build the query document for the given page sizes
///
/// Non-User nodes match no fragment and come back as `{}`, keeping their
/// positional slot.
pub fn profile_query(repositories_per_user: u32, languages_per_repository: u32) -> String {
    format!(
        r#"query Profiles($ids: [ID!]!, $from: DateTime!, $to: DateTime!) {{
  nodes(ids: $ids) {{
    ... on User {{
      login
      name
      avatarUrl
      contributionsCollection(from: $from, to: $to) {{
        contributionCalendar {{ totalContributions }}
        totalCommitContributions
        totalIssueContributions
        totalPullRequestContributions
        totalPullRequestReviewContributions
      }}
      repositories(first: {repositories_per_user}, ownerAffiliations: OWNER, isFork: false, orderBy: {{field: PUSHED_AT, direction: DESC}}) {{
        nodes {{
          languages(first: {languages_per_repository}, orderBy: {{field: SIZE, direction: DESC}}) {{
            edges {{ size node {{ name }} }}
          }}
        }}
      }}
    }}
  }}
}}"#
    )
}

#[derive(Debug, Serialize)]
pub struct RequestBody<'a> {
    pub query: &'a str,
    pub variables: Variables<'a>,
}

#[derive(Debug, Serialize)]
pub struct Variables<'a> {
    pub ids: &'a [Identifier],
    pub from: String,
    pub to: String,
}

pub fn build_request_body<'a>(
    query: &'a str,
    batch: &'a [Identifier],
    window: &TimeWindow,
) -> RequestBody<'a> {
    RequestBody {
        query,
        variables: Variables {
            ids: batch,
            from: window.from.to_rfc3339(),
            to: window.to.to_rfc3339(),
        },
    }
}
