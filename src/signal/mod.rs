//! Per-period price signals consumed by the simulator.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// Combines component price series into the two scalar signals.
pub mod normalizer;
/// Seeded synthetic price profiles.
pub mod synthetic;

pub use normalizer::SignalComponents;
pub use synthetic::SyntheticProfile;

/// Shortest supported period: one millisecond.
pub const MIN_PERIOD_HOURS: f64 = 1.0 / 3_600_000.0;
/// Longest supported period: one day.
pub const MAX_PERIOD_HOURS: f64 = 24.0;

/// Whether `period_hours` is finite and within the supported range.
pub fn period_hours_in_range(period_hours: f64) -> bool {
    period_hours.is_finite() && (MIN_PERIOD_HOURS..=MAX_PERIOD_HOURS).contains(&period_hours)
}

/// Period length as a whole-millisecond step, or `None` when out of range.
pub(crate) fn period_step(period_hours: f64) -> Option<Duration> {
    if !period_hours_in_range(period_hours) {
        return None;
    }
    let millis = (period_hours * 3_600_000.0).round() as i64;
    Duration::try_milliseconds(millis).filter(|step| *step > Duration::zero())
}

/// Cost and revenue signal for one settlement period.
///
/// `cost_now` is the all-in price of importing one MWh (£/MWh) and
/// `revenue_now` the all-in value of exporting one MWh in the same period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodSignal {
    pub timestamp: DateTime<Utc>,
    pub cost_now: f64,
    pub revenue_now: f64,
}

impl PeriodSignal {
    pub fn new(timestamp: DateTime<Utc>, cost_now: f64, revenue_now: f64) -> Self {
        Self {
            timestamp,
            cost_now,
            revenue_now,
        }
    }
}

/// Checks that a series is non-empty, strictly time-ordered, and finite.
///
/// Calendar alignment and period length are not checked.
///
/// # Errors
///
/// Returns the first `DataError` found, naming the offending period.
pub fn validate_series(signals: &[PeriodSignal]) -> Result<(), DataError> {
    if signals.is_empty() {
        return Err(DataError::Empty);
    }

    let mut previous: Option<DateTime<Utc>> = None;
    for (index, s) in signals.iter().enumerate() {
        if !s.cost_now.is_finite() {
            return Err(DataError::NonFinite {
                index,
                timestamp: s.timestamp,
                field: "cost_now",
            });
        }
        if !s.revenue_now.is_finite() {
            return Err(DataError::NonFinite {
                index,
                timestamp: s.timestamp,
                field: "revenue_now",
            });
        }

        if let Some(prev) = previous {
            if s.timestamp == prev {
                return Err(DataError::DuplicateTimestamp {
                    index,
                    timestamp: s.timestamp,
                });
            }
            if s.timestamp < prev {
                return Err(DataError::NonMonotonic {
                    index,
                    previous: prev,
                    timestamp: s.timestamp,
                });
            }
        }
        previous = Some(s.timestamp);
    }

    Ok(())
}

/// Highest revenue and lowest cost over a whole series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesExtrema {
    pub max_revenue: f64,
    pub min_cost: f64,
}

impl SeriesExtrema {
    /// Scans `signals` once. An empty slice yields `(-inf, +inf)`.
    pub fn of(signals: &[PeriodSignal]) -> Self {
        signals.iter().fold(
            Self {
                max_revenue: f64::NEG_INFINITY,
                min_cost: f64::INFINITY,
            },
            |acc, s| Self {
                max_revenue: acc.max_revenue.max(s.revenue_now),
                min_cost: acc.min_cost.min(s.cost_now),
            },
        )
    }
}
