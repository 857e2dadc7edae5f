use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{ConfigResult, ConfigurationError};

/// Contribution window `[from, to]` passed unchanged to every remote query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> ConfigResult<Self> {
        if from > to {
            return Err(ConfigurationError::invalid_value(
                "time_window",
                format!("{from} > {to}"),
                "window start must not be after its end",
            ));
        }
        Ok(Self { from, to })
    }

    /// Window ending at `now` and reaching `days` back
    pub fn trailing_days(now: DateTime<Utc>, days: i64) -> ConfigResult<Self> {
        if days <= 0 {
            return Err(ConfigurationError::invalid_value(
                "window_days",
                days.to_string(),
                "must be a positive number of days",
            ));
        }
        let from = Duration::try_days(days)
            .and_then(|span| now.checked_sub_signed(span))
            .ok_or_else(|| {
                ConfigurationError::invalid_value(
                    "window_days",
                    days.to_string(),
                    "window start falls outside the representable date range",
                )
            })?;
        Self::new(from, now)
    }

    pub fn duration(&self) -> Duration {
        self.to - self.from
    }
}
