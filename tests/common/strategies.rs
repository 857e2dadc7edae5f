use devcard_core::{ChunkOutcome, Identifier, LanguageBytes, UserRecord};
use proptest::prelude::*;

/// Strategy for generating identifier lists, duplicates included
pub fn identifiers_strategy() -> impl Strategy<Value = Vec<Identifier>> {
    prop::collection::vec("[a-z0-9]{1,8}", 0..120)
        .prop_map(|ids| ids.into_iter().map(Identifier::from).collect())
}

/// Strategy for generating batch sizes
pub fn batch_size_strategy() -> impl Strategy<Value = usize> {
    1usize..=25
}

/// Strategy for generating language names, a few known to the catalog
pub fn language_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Go".to_string()),
        Just("Rust".to_string()),
        Just("Python".to_string()),
        Just("C".to_string()),
        "[A-Z][a-z]{0,9}",
    ]
}

/// Strategy for generating language byte tallies with frequent ties
pub fn language_bytes_strategy() -> impl Strategy<Value = LanguageBytes> {
    prop::collection::btree_map(language_name_strategy(), 0u64..4, 0..8)
}

/// Successful outcomes for `total` positions split by `batch_size`, shuffled
pub fn shuffled_outcomes_strategy() -> impl Strategy<Value = (usize, Vec<ChunkOutcome>)> {
    (0usize..80, batch_size_strategy())
        .prop_flat_map(|(total, batch_size)| {
            let outcomes: Vec<ChunkOutcome> = (0..total)
                .step_by(batch_size)
                .enumerate()
                .map(|(index, start)| {
                    let end = (start + batch_size).min(total);
                    let records = (start..end)
                        .map(|i| UserRecord::new(format!("user-{i}")))
                        .collect();
                    ChunkOutcome::success(index, start..end, records)
                })
                .collect();
            (Just(total), Just(outcomes).prop_shuffle())
        })
}
