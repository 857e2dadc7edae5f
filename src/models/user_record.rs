use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Language name to byte count, ordered by name
///
/// The ordering is what makes dominant-language selection reproducible.
pub type LanguageBytes = BTreeMap<String, u64>;

/// Contribution totals within the requested time window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionCounts {
    pub total: u64,
    pub commits: u64,
    pub issues: u64,
    pub pull_requests: u64,
    pub reviews: u64,
}

/// Display language with its resolved color
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageStat {
    pub name: String,
    pub color: String,
}

/// One `(language, bytes)` edge of a repository breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageEdge {
    pub name: String,
    pub size: u64,
}

/// Language breakdown of a single repository, as reported remotely
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryLanguages {
    pub languages: Vec<LanguageEdge>,
}

impl RepositoryLanguages {
    pub fn new<I, S>(edges: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self {
            languages: edges
                .into_iter()
                .map(|(name, size)| LanguageEdge {
                    name: name.into(),
                    size,
                })
                .collect(),
        }
    }
}

/// Composite profile for one identifier
///
/// An empty `login` marks a slot the remote source filled with something
/// other than a user; such records are dropped during assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub login: String,
    pub display_name: String,
    pub avatar_url: String,
    pub contributions: ContributionCounts,
    pub language_bytes: LanguageBytes,
    /// Filled in by `LanguageAggregator::enrich`
    pub dominant_language: Option<LanguageStat>,
}

impl UserRecord {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            ..Default::default()
        }
    }

    /// Placeholder for a positional slot that did not hold a user
    pub fn not_a_user() -> Self {
        Self::default()
    }

    pub fn is_user(&self) -> bool {
        !self.login.is_empty()
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = avatar_url.into();
        self
    }

    pub fn with_contributions(mut self, contributions: ContributionCounts) -> Self {
        self.contributions = contributions;
        self
    }

    pub fn with_language_bytes<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        self.language_bytes = languages
            .into_iter()
            .map(|(name, bytes)| (name.into(), bytes))
            .collect();
        self
    }
}
