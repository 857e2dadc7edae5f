//! # Language Aggregator
//!
//! Turns per-repository language breakdowns into a single dominant language
//! per user.
//!
//! Selection scans [`LanguageBytes`] in ascending name order and only replaces
//! the current candidate on a strictly larger byte count, so ties always go to
//! the lexicographically smallest name. The result never depends on hash or
//! completion order.

use crate::constants::languages::{DEFAULT_LANGUAGE_COLOR, UNKNOWN_LANGUAGE};
use crate::models::{LanguageBytes, LanguageStat, RepositoryLanguages, UserRecord};

use super::catalog::LanguageCatalog;

/// Resolves dominant languages against a catalog
#[derive(Debug, Clone, Copy)]
pub struct LanguageAggregator<'a> {
    catalog: &'a LanguageCatalog,
}

impl Default for LanguageAggregator<'static> {
    fn default() -> Self {
        Self::new(LanguageCatalog::global())
    }
}

impl<'a> LanguageAggregator<'a> {
    pub fn new(catalog: &'a LanguageCatalog) -> Self {
        Self { catalog }
    }

    /// Dominant language and its color; `Unknown` with the default color when
    /// there is no language data
    pub fn resolve(&self, language_bytes: &LanguageBytes) -> LanguageStat {
        match dominant_language_name(language_bytes) {
            Some(name) => LanguageStat {
                name: name.to_string(),
                color: self.catalog.lookup(name).to_string(),
            },
            None => LanguageStat {
                name: UNKNOWN_LANGUAGE.to_string(),
                color: DEFAULT_LANGUAGE_COLOR.to_string(),
            },
        }
    }

    /// Set `record.dominant_language` in place
    pub fn enrich(&self, record: &mut UserRecord) {
        record.dominant_language = Some(self.resolve(&record.language_bytes));
    }

    pub fn enrich_all(&self, records: &mut [UserRecord]) {
        for record in records {
            self.enrich(record);
        }
    }
}

/// Dominant language resolved against the global catalog
pub fn resolve_dominant_language(language_bytes: &LanguageBytes) -> LanguageStat {
    LanguageAggregator::default().resolve(language_bytes)
}

/// Name with the largest byte count, first in name order on ties
fn dominant_language_name(language_bytes: &LanguageBytes) -> Option<&str> {
    let mut best: Option<(&str, u64)> = None;
    for (name, &bytes) in language_bytes {
        match best {
            Some((_, best_bytes)) if bytes <= best_bytes => {}
            _ => best = Some((name.as_str(), bytes)),
        }
    }
    best.map(|(name, _)| name)
}

/// Sum per-repository breakdowns into one tally keyed by language name
pub fn tally_repository_languages(repositories: &[RepositoryLanguages]) -> LanguageBytes {
    let mut tally = LanguageBytes::new();
    for edge in repositories.iter().flat_map(|repo| &repo.languages) {
        if edge.name.is_empty() {
            continue;
        }
        let bytes = tally.entry(edge.name.clone()).or_insert(0);
        *bytes = bytes.saturating_add(edge.size);
    }
    tally
}
