//! # Languages
//!
//! Static language-to-color catalog and the dominant-language selection
//! applied to every fetched user record.

pub mod aggregator;
pub mod catalog;

pub use aggregator::{resolve_dominant_language, tally_repository_languages, LanguageAggregator};
pub use catalog::{language_color, LanguageCatalog};
