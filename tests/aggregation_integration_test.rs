//! End-to-end tests for `ProfileAggregator` against a scripted remote query.

mod mocks;

use chrono::{TimeZone, Utc};
use devcard_core::{
    AggregationError, AggregatorConfig, CancelReason, Identifier, ProfileAggregator, QueryError,
    TimeWindow,
};
use mocks::MockQuery;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

fn ids(n: usize) -> Vec<Identifier> {
    (0..n).map(|i| Identifier::from(i as u64)).collect()
}

fn window() -> TimeWindow {
    let to = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    TimeWindow::trailing_days(to, 365).unwrap()
}

fn logins(records: &[devcard_core::UserRecord]) -> Vec<String> {
    records.iter().map(|r| r.login.clone()).collect()
}

fn expected_logins(range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| format!("user-{i}")).collect()
}

fn aggregator(mock: &Arc<MockQuery>, config: AggregatorConfig) -> ProfileAggregator {
    ProfileAggregator::new(Arc::clone(mock) as _, config).unwrap()
}

#[tokio::test]
async fn test_output_follows_input_order_when_batches_finish_in_reverse() {
    // First chunk is slowest, last chunk fastest
    let mock = Arc::new(
        MockQuery::new()
            .with_delay("0", Duration::from_millis(60))
            .with_delay("10", Duration::from_millis(30)),
    );
    let aggregator = aggregator(&mock, AggregatorConfig::default());

    let profiles = assert_ok!(aggregator.fetch_profiles(&ids(23), window()).await);

    assert_eq!(logins(&profiles), expected_logins(0..23));
    assert_eq!(mock.call_count(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_one_call_per_chunk_within_batch_size() {
    let mock = Arc::new(MockQuery::new().with_default_delay(Duration::from_millis(5)));
    let config = AggregatorConfig {
        max_batch_size: 7,
        ..Default::default()
    };
    let aggregator = aggregator(&mock, config);

    let profiles = assert_ok!(aggregator.fetch_profiles(&ids(50), window()).await);
    assert_eq!(profiles.len(), 50);

    let state = mock.get_state();
    assert_eq!(state.calls.len(), 8);
    assert!(state.calls.iter().all(|batch| !batch.is_empty() && batch.len() <= 7));

    let mut seen: Vec<String> = state.calls.into_iter().flatten().collect();
    seen.sort_by_key(|id| id.parse::<u64>().unwrap());
    let all: Vec<String> = (0..50).map(|i| i.to_string()).collect();
    assert_eq!(seen, all);
}

#[tokio::test]
async fn test_batches_run_concurrently_without_a_cap() {
    let mock = Arc::new(MockQuery::new().with_default_delay(Duration::from_millis(50)));
    let aggregator = aggregator(&mock, AggregatorConfig::default());

    assert_ok!(aggregator.fetch_profiles(&ids(40), window()).await);
    assert_eq!(mock.get_state().peak_in_flight, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_cap_bounds_in_flight_batches() {
    let mock = Arc::new(MockQuery::new().with_default_delay(Duration::from_millis(10)));
    let config = AggregatorConfig {
        max_batch_size: 2,
        max_concurrent_batches: Some(3),
        ..Default::default()
    };
    let aggregator = aggregator(&mock, config);

    let profiles = assert_ok!(aggregator.fetch_profiles(&ids(30), window()).await);

    assert_eq!(logins(&profiles), expected_logins(0..30));
    let state = mock.get_state();
    assert_eq!(state.calls.len(), 15);
    assert!(state.peak_in_flight <= 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_batch_receives_the_caller_window() {
    let mock = Arc::new(MockQuery::new().with_delay("0", Duration::from_millis(20)));
    let config = AggregatorConfig {
        max_batch_size: 4,
        ..Default::default()
    };
    let aggregator = aggregator(&mock, config);

    let from = Utc.with_ymd_and_hms(2019, 3, 15, 8, 30, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2019, 9, 1, 23, 59, 59).unwrap();
    let requested = TimeWindow::new(from, to).unwrap();

    assert_ok!(aggregator.fetch_profiles(&ids(23), requested).await);

    let state = mock.get_state();
    assert_eq!(state.windows.len(), 6);
    assert!(state.windows.iter().all(|window| *window == requested));
    assert_ne!(requested, aggregator.default_window().unwrap());
}

#[tokio::test]
async fn test_empty_input_makes_no_remote_calls() {
    let mock = Arc::new(MockQuery::new());
    let aggregator = aggregator(&mock, AggregatorConfig::default());

    let profiles = assert_ok!(aggregator.fetch_profiles(&[], window()).await);

    assert!(profiles.is_empty());
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_single_identifier_makes_one_call() {
    let mock = Arc::new(MockQuery::new());
    let aggregator = aggregator(&mock, AggregatorConfig::default());

    let profiles = assert_ok!(aggregator.fetch_profiles(&ids(1), window()).await);

    assert_eq!(logins(&profiles), vec!["user-0"]);
    assert_eq!(mock.get_state().calls, vec![vec!["0".to_string()]]);
}

#[tokio::test]
async fn test_failed_batch_discards_every_record() {
    let mock = Arc::new(
        MockQuery::new().with_failure("15", QueryError::transport("connection timed out")),
    );
    let aggregator = aggregator(&mock, AggregatorConfig::default());

    let error = assert_err!(aggregator.fetch_profiles(&ids(23), window()).await);

    assert!(error.to_string().contains("10-20"), "{error}");
    assert_eq!(error.failed_range(), Some(10..20));
    match error {
        AggregationError::BatchFailed {
            index,
            failed_batches,
            total_batches,
            source,
            ..
        } => {
            assert_eq!(index, 1);
            assert_eq!(failed_batches, 1);
            assert_eq!(total_batches, 3);
            assert_eq!(source, QueryError::Transport("connection timed out".to_string()));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // Sibling batches were still drained
    let state = mock.get_state();
    assert_eq!(state.calls.len(), 3);
    assert_eq!(state.dropped, 0);
}

#[tokio::test]
async fn test_lowest_index_failure_is_reported() {
    let mock = Arc::new(
        MockQuery::new()
            .with_failure("3", QueryError::http_status(502, "Bad Gateway"))
            .with_delay("3", Duration::from_millis(40))
            .with_failure("21", QueryError::protocol("Could not resolve to a node")),
    );
    let aggregator = aggregator(&mock, AggregatorConfig::default());

    let error = assert_err!(aggregator.fetch_profiles(&ids(23), window()).await);

    assert_eq!(error.failed_range(), Some(0..10));
    assert!(error.to_string().contains("HTTP 502"), "{error}");
}

#[tokio::test]
async fn test_abort_on_first_failure_stops_siblings() {
    let mock = Arc::new(
        MockQuery::new()
            .with_failure("12", QueryError::protocol("rate limited"))
            .with_hang("0")
            .with_hang("25"),
    );
    let config = AggregatorConfig {
        abort_on_first_failure: true,
        request_timeout_ms: None,
        ..Default::default()
    };
    let aggregator = aggregator(&mock, config);

    let started = Instant::now();
    let error = assert_err!(aggregator.fetch_profiles(&ids(30), window()).await);

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(error.failed_range(), Some(10..20));
    assert!(!error.is_cancelled());

    let state = mock.get_state();
    assert_eq!(state.dropped, 2);
    for (batch, token) in state.calls.iter().zip(&state.tokens) {
        if batch.contains(&"0".to_string()) || batch.contains(&"25".to_string()) {
            assert!(token.is_cancelled(), "hung batch {batch:?} was not signalled");
        }
    }
}

#[tokio::test]
async fn test_caller_cancellation_interrupts_in_flight_batches() {
    let mock = Arc::new(MockQuery::new().with_hang("5").with_hang("15"));
    let config = AggregatorConfig {
        request_timeout_ms: None,
        ..Default::default()
    };
    let aggregator = aggregator(&mock, config);

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let error = assert_err!(
        aggregator
            .fetch_profiles_with_cancel(&ids(23), window(), token)
            .await
    );

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(
        error,
        AggregationError::Cancelled {
            reason: CancelReason::Requested
        }
    );

    let state = mock.get_state();
    assert_eq!(state.dropped, 2);
    assert_eq!(state.completed, 1);
    assert_eq!(state.tokens.len(), 3);
    assert!(state.tokens.iter().all(|token| token.is_cancelled()));
}

#[tokio::test]
async fn test_cancelled_before_start_returns_promptly() {
    let mock = Arc::new(MockQuery::new().with_default_delay(Duration::from_secs(30)));
    let aggregator = aggregator(&mock, AggregatorConfig::default());

    let token = CancellationToken::new();
    token.cancel();

    let error = assert_err!(
        aggregator
            .fetch_profiles_with_cancel(&ids(12), window(), token)
            .await
    );
    assert!(error.is_cancelled());
}

#[tokio::test]
async fn test_deadline_bounds_the_whole_call() {
    let mock = Arc::new(MockQuery::new().with_hang("22"));
    let config = AggregatorConfig {
        request_timeout_ms: Some(50),
        ..Default::default()
    };
    let aggregator = aggregator(&mock, config);

    let started = Instant::now();
    let error = assert_err!(aggregator.fetch_profiles(&ids(23), window()).await);

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(
        error,
        AggregationError::Cancelled {
            reason: CancelReason::DeadlineExceeded { timeout_ms: 50 }
        }
    );
    assert_eq!(mock.get_state().dropped, 1);
}

#[tokio::test]
async fn test_non_user_slots_are_dropped_and_duplicates_kept() {
    let mock = Arc::new(MockQuery::new().with_non_user("4").with_non_user("11"));
    let aggregator = aggregator(&mock, AggregatorConfig::default());

    let mut input = ids(12);
    input.push(Identifier::from("3"));
    input.push(Identifier::from("3"));

    let profiles = assert_ok!(aggregator.fetch_profiles(&input, window()).await);

    let expected: Vec<String> = [0, 1, 2, 3, 5, 6, 7, 8, 9, 10, 3, 3]
        .iter()
        .map(|i| format!("user-{i}"))
        .collect();
    assert_eq!(logins(&profiles), expected);
}

#[tokio::test]
async fn test_profiles_are_enriched_with_dominant_language() {
    let mock = Arc::new(
        MockQuery::new()
            .with_languages("0", [("Go", 5_000_u64), ("Python", 3_000)])
            .with_languages("1", [("Rust", 10_u64), ("C", 10), ("Zig", 10)])
            .with_languages("2", [("Brainfunk", 99_u64)]),
    );
    let aggregator = aggregator(&mock, AggregatorConfig::default());

    let profiles = assert_ok!(aggregator.fetch_profiles(&ids(4), window()).await);
    let dominant: Vec<(String, String)> = profiles
        .iter()
        .map(|p| {
            let stat = p.dominant_language.clone().unwrap();
            (stat.name, stat.color)
        })
        .collect();

    assert_eq!(
        dominant,
        vec![
            ("Go".to_string(), "#00ADD8".to_string()),
            ("C".to_string(), "#555555".to_string()),
            ("Brainfunk".to_string(), "#858585".to_string()),
            ("Unknown".to_string(), "#858585".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_invalid_configuration_is_rejected() {
    let mock = Arc::new(MockQuery::new());
    let config = AggregatorConfig {
        max_batch_size: 0,
        ..Default::default()
    };

    assert!(ProfileAggregator::new(mock as _, config).is_err());
}

#[test]
fn test_window_beyond_date_range_is_rejected_before_use() {
    let mock = Arc::new(MockQuery::new());
    let config = AggregatorConfig {
        window_days: 100_000_000,
        ..Default::default()
    };

    assert!(ProfileAggregator::new(mock as _, config).is_err());
}
