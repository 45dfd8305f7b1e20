//! Error taxonomy for dispatch simulation runs.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Problems with the input signal series. Raised before any battery mutation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("signal series is empty")]
    Empty,

    #[error("period {index} at {timestamp} precedes the previous period at {previous}")]
    NonMonotonic {
        index: usize,
        previous: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },

    #[error("period {index} repeats timestamp {timestamp}")]
    DuplicateTimestamp {
        index: usize,
        timestamp: DateTime<Utc>,
    },

    #[error("period {index} at {timestamp} has a non-finite {field}")]
    NonFinite {
        index: usize,
        timestamp: DateTime<Utc>,
        field: &'static str,
    },
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.soc_min_fraction"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A battery mutation would have left SOC outside its bounds.
///
/// Clamping makes this unreachable for well-formed requests; seeing it means a
/// logic defect, so the run aborts instead of recovering.
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "invariant violation in {operation}{}: soc {soc_mwh:.9} MWh outside [{soc_min_mwh}, {soc_max_mwh}]",
    location(.period, .timestamp)
)]
pub struct InvariantViolation {
    pub operation: &'static str,
    pub soc_mwh: f64,
    pub soc_min_mwh: f64,
    pub soc_max_mwh: f64,
    pub period: Option<usize>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl InvariantViolation {
    /// Attaches the offending period to the violation.
    pub fn at(mut self, period: usize, timestamp: DateTime<Utc>) -> Self {
        self.period = Some(period);
        self.timestamp = Some(timestamp);
        self
    }
}

fn location(period: &Option<usize>, timestamp: &Option<DateTime<Utc>>) -> String {
    match (period, timestamp) {
        (Some(p), Some(ts)) => format!(" at period {p} ({ts})"),
        (Some(p), None) => format!(" at period {p}"),
        _ => String::new(),
    }
}

/// Top-level error returned by simulation entry points.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),

    #[error("signal csv: {0}")]
    Csv(#[from] csv::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn invariant_message_names_period() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 0, 30, 0).unwrap();
        let err = InvariantViolation {
            operation: "apply_charge",
            soc_mwh: 5.1,
            soc_min_mwh: 0.25,
            soc_max_mwh: 5.0,
            period: None,
            timestamp: None,
        }
        .at(3, ts);
        let msg = err.to_string();
        assert!(msg.contains("apply_charge"));
        assert!(msg.contains("period 3"));
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::new("battery.energy_mwh", "must be > 0");
        assert_eq!(err.to_string(), "config error: battery.energy_mwh: must be > 0");
    }
}
