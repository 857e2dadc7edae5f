//! # Language Catalog
//!
//! Process-wide, read-only mapping from language name to display color.
//!
//! The embedded dataset is parsed at most once, on first use, behind a
//! `OnceLock`. Lookups never fail: unknown names, entries without a color and
//! an unreadable dataset all resolve to [`DEFAULT_LANGUAGE_COLOR`].

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::constants::languages::DEFAULT_LANGUAGE_COLOR;

/// Embedded `name -> { color, url }` dataset
const EMBEDDED_DATASET: &str = include_str!("../../data/languages.json");

static GLOBAL_CATALOG: OnceLock<LanguageCatalog> = OnceLock::new();

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    color: Option<String>,
}

/// Immutable language color table
#[derive(Debug, Clone, Default)]
pub struct LanguageCatalog {
    colors: HashMap<String, String>,
    /// ASCII-lowercased name -> canonical name
    folded: HashMap<String, String>,
}

impl LanguageCatalog {
    /// The shared catalog built from the embedded dataset
    pub fn global() -> &'static LanguageCatalog {
        GLOBAL_CATALOG.get_or_init(|| {
            let catalog = Self::from_json(EMBEDDED_DATASET);
            debug!(languages = catalog.len(), "Language catalog initialized");
            catalog
        })
    }

    /// Build a catalog from a JSON document
    ///
    /// Malformed input yields an empty catalog, so every lookup falls back to
    /// the default color.
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<BTreeMap<String, Option<CatalogEntry>>>(json) {
            Ok(entries) => Self::from_entries(entries.into_iter().filter_map(|(name, entry)| {
                entry.and_then(|e| e.color).map(|color| (name, color))
            })),
            Err(error) => {
                warn!(error = %error, "Language dataset could not be parsed; using default colors");
                Self::default()
            }
        }
    }

    /// Build a catalog from `(name, color)` pairs; blank colors are skipped
    ///
    /// When names differ only by case, the case-insensitive fallback keeps
    /// the first one supplied.
    pub fn from_entries<I, N, C>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<String>,
    {
        let mut catalog = Self::default();
        for (name, color) in entries {
            let (name, color) = (name.into(), color.into());
            if name.is_empty() || color.trim().is_empty() {
                continue;
            }
            catalog
                .folded
                .entry(name.to_ascii_lowercase())
                .or_insert_with(|| name.clone());
            catalog.colors.insert(name, color);
        }
        catalog
    }

    /// Color for `name`, or the default color
    pub fn lookup(&self, name: &str) -> &str {
        self.get(name).unwrap_or(DEFAULT_LANGUAGE_COLOR)
    }

    /// Color for `name` if the catalog knows it
    pub fn get(&self, name: &str) -> Option<&str> {
        if let Some(color) = self.colors.get(name) {
            return Some(color.as_str());
        }
        self.folded
            .get(&name.to_ascii_lowercase())
            .and_then(|canonical| self.colors.get(canonical))
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// Shorthand for `LanguageCatalog::global().lookup(name)`
pub fn language_color(name: &str) -> &'static str {
    LanguageCatalog::global().lookup(name)
}
