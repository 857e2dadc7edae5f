//! # Error Types
//!
//! Chunk-level query failures and the single aggregated error surfaced to
//! callers of the aggregation client.

use std::fmt;
use thiserror::Error;

/// Failure of one remote query covering a single chunk
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Protocol {
        status: Option<u16>,
        message: String,
    },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Query cancelled by caller")]
    Cancelled,

    #[error("Deadline of {timeout_ms}ms exceeded")]
    DeadlineExceeded { timeout_ms: u64 },

    /// Stopped early because a sibling chunk already failed
    #[error("Query aborted after a sibling batch failed")]
    Aborted,

    #[error("Batch task failed: {0}")]
    TaskFailed(String),
}

impl QueryError {
    pub fn transport(message: impl fmt::Display) -> Self {
        Self::Transport(message.to_string())
    }

    /// Protocol error reported by the remote endpoint itself
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            status: None,
            message: message.into(),
        }
    }

    /// Protocol error derived from a non-success HTTP status
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::Protocol {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn decode(message: impl fmt::Display) -> Self {
        Self::Decode(message.to_string())
    }

    /// True when the failure came from the caller's cancellation token or deadline
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded { .. })
    }

    /// Short machine-friendly label used in structured log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Protocol { .. } => "protocol",
            Self::Decode(_) => "decode",
            Self::Cancelled => "cancelled",
            Self::DeadlineExceeded { .. } => "deadline_exceeded",
            Self::Aborted => "aborted",
            Self::TaskFailed(_) => "task_failed",
        }
    }
}

/// Why an aggregation stopped before all batches finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller's cancellation token fired
    Requested,
    /// The aggregation deadline elapsed
    DeadlineExceeded { timeout_ms: u64 },
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Requested => write!(f, "cancellation requested"),
            CancelReason::DeadlineExceeded { timeout_ms } => {
                write!(f, "deadline of {timeout_ms}ms exceeded")
            }
        }
    }
}

/// The single error returned for a failed aggregation
///
/// No partial record list ever accompanies one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationError {
    #[error(
        "Batch {index} covering elements {start}-{end} failed \
         ({failed_batches} of {total_batches} batches failed): {source}"
    )]
    BatchFailed {
        index: usize,
        start: usize,
        end: usize,
        failed_batches: usize,
        total_batches: usize,
        #[source]
        source: QueryError,
    },

    #[error("Aggregation cancelled: {reason}")]
    Cancelled { reason: CancelReason },

    #[error("Expected {expected} batch outcomes, received {received}")]
    IncompleteOutcomes { expected: usize, received: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AggregationError {
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Positional range of the failing batch, when the error has one
    pub fn failed_range(&self) -> Option<std::ops::Range<usize>> {
        match self {
            Self::BatchFailed { start, end, .. } => Some(*start..*end),
            _ => None,
        }
    }
}

impl From<crate::config::ConfigurationError> for AggregationError {
    fn from(error: crate::config::ConfigurationError) -> Self {
        AggregationError::Configuration(error.to_string())
    }
}

pub type AggregationResult<T> = std::result::Result<T, AggregationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_batch_failure_names_the_positional_range_and_keeps_the_cause() {
        let error = AggregationError::BatchFailed {
            index: 1,
            start: 10,
            end: 20,
            failed_batches: 1,
            total_batches: 3,
            source: QueryError::transport("connection reset"),
        };

        let message = error.to_string();
        assert!(message.contains("elements 10-20"), "{message}");
        assert!(message.contains("1 of 3"), "{message}");
        assert_eq!(error.failed_range(), Some(10..20));

        let cause = error.source().expect("cause should be preserved");
        assert_eq!(cause.to_string(), "Transport error: connection reset");
    }

    #[test]
    fn test_protocol_message_includes_status_only_when_known() {
        assert_eq!(
            QueryError::protocol("Could not resolve to a node").to_string(),
            "Protocol error: Could not resolve to a node"
        );
        assert_eq!(
            QueryError::http_status(502, "Bad Gateway").to_string(),
            "Protocol error (HTTP 502): Bad Gateway"
        );
    }

    #[test]
    fn test_cancellation_kinds() {
        assert!(QueryError::Cancelled.is_cancellation());
        assert!(QueryError::DeadlineExceeded { timeout_ms: 5 }.is_cancellation());
        assert!(!QueryError::Aborted.is_cancellation());
        assert!(!QueryError::decode("bad json").is_cancellation());
        assert_eq!(QueryError::Aborted.kind(), "aborted");
    }
}
