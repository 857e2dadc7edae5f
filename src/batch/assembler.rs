//! # Result Assembler
//!
//! Fan-in side of the aggregation: puts chunk outcomes back into input order
//! and decides the overall result.
//!
//! Error precedence is fixed so that identical outcomes always produce the
//! same error:
//!
//! 1. a cancellation or deadline outcome reports [`AggregationError::Cancelled`]
//! 2. otherwise the lowest-index real failure reports
//!    [`AggregationError::BatchFailed`]; `Aborted` siblings are never chosen

use std::ops::Range;
use tracing::{debug, warn};

use crate::error::{AggregationError, AggregationResult, CancelReason, QueryError};
use crate::models::UserRecord;

/// Result of one chunk's query, tagged with the chunk's position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOutcome {
    pub index: usize,
    /// Positions covered in the original input
    pub span: Range<usize>,
    pub result: Result<Vec<UserRecord>, QueryError>,
}

impl ChunkOutcome {
    pub fn success(index: usize, span: Range<usize>, records: Vec<UserRecord>) -> Self {
        Self {
            index,
            span,
            result: Ok(records),
        }
    }

    pub fn failure(index: usize, span: Range<usize>, error: QueryError) -> Self {
        Self {
            index,
            span,
            result: Err(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn error(&self) -> Option<&QueryError> {
        self.result.as_ref().err()
    }
}

/// Combine every chunk outcome into the ordered record list, or one error
///
/// `outcomes` may arrive in any order but must contain exactly one entry per
/// index in `0..chunk_count`. Records whose login is empty are dropped.
pub fn assemble(
    mut outcomes: Vec<ChunkOutcome>,
    chunk_count: usize,
) -> AggregationResult<Vec<UserRecord>> {
    outcomes.sort_by_key(|outcome| outcome.index);

    let complete = outcomes.len() == chunk_count
        && outcomes
            .iter()
            .enumerate()
            .all(|(position, outcome)| outcome.index == position);
    if !complete {
        return Err(AggregationError::IncompleteOutcomes {
            expected: chunk_count,
            received: outcomes.len(),
        });
    }

    if let Some(error) = select_failure(&outcomes) {
        return Err(error);
    }

    let mut records = Vec::with_capacity(outcomes.iter().map(|o| o.span.len()).sum());
    let mut dropped = 0usize;
    for outcome in outcomes {
        // every outcome is Ok here
        if let Ok(batch) = outcome.result {
            for record in batch {
                if record.is_user() {
                    records.push(record);
                } else {
                    dropped += 1;
                }
            }
        }
    }

    debug!(
        chunk_count = chunk_count,
        records = records.len(),
        dropped_non_users = dropped,
        "Assembled batch results"
    );

    Ok(records)
}

fn select_failure(outcomes: &[ChunkOutcome]) -> Option<AggregationError> {
    let failed: Vec<(&ChunkOutcome, &QueryError)> = outcomes
        .iter()
        .filter_map(|outcome| outcome.error().map(|error| (outcome, error)))
        .collect();

    if failed.is_empty() {
        return None;
    }

    let cancellation = failed.iter().find_map(|(_, error)| match error {
        QueryError::Cancelled => Some(CancelReason::Requested),
        QueryError::DeadlineExceeded { timeout_ms } => Some(CancelReason::DeadlineExceeded {
            timeout_ms: *timeout_ms,
        }),
        _ => None,
    });
    if let Some(reason) = cancellation {
        warn!(
            reason = %reason,
            failed_batches = failed.len(),
            total_batches = outcomes.len(),
            "Aggregation cancelled before all batches completed"
        );
        return Some(AggregationError::Cancelled { reason });
    }

    let (primary, cause) = failed
        .iter()
        .find(|(_, error)| !matches!(error, QueryError::Aborted))
        .or_else(|| failed.first())
        .copied()?;

    warn!(
        batch_index = primary.index,
        span_start = primary.span.start,
        span_end = primary.span.end,
        error_kind = cause.kind(),
        error = %cause,
        failed_batches = failed.len(),
        total_batches = outcomes.len(),
        "Batch failed; discarding all batch results"
    );

    Some(AggregationError::BatchFailed {
        index: primary.index,
        start: primary.span.start,
        end: primary.span.end,
        failed_batches: failed.len(),
        total_batches: outcomes.len(),
        source: cause.clone(),
    })
}
