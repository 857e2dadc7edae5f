//! # Models
//!
//! Plain data carried through the aggregation pipeline. None of these types
//! are persisted by this crate; they live for the duration of one call.

pub mod identifier;
pub mod time_window;
pub mod user_record;

pub use identifier::Identifier;
pub use time_window::TimeWindow;
pub use user_record::{
    ContributionCounts, LanguageBytes, LanguageEdge, LanguageStat, RepositoryLanguages, UserRecord,
};
