//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use bess_dispatch::battery::BatteryConfig;
use bess_dispatch::signal::PeriodSignal;
use bess_dispatch::sim::types::SimConfig;
use chrono::{DateTime, Duration, TimeZone, Utc};

/// Start of the first settlement period used by fixtures.
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap()
}

/// Timestamp of half-hour period `i`.
pub fn at(i: usize) -> DateTime<Utc> {
    start() + Duration::minutes(30 * i as i64)
}

/// Half-hourly series from `(cost_now, revenue_now)` pairs.
pub fn series(prices: &[(f64, f64)]) -> Vec<PeriodSignal> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &(c, r))| PeriodSignal::new(at(i), c, r))
        .collect()
}

/// 10 MW / 10 MWh, η 0.9, SOC bounds [0.5, 10] MWh, starting at 0.5 MWh.
///
/// At 30-minute periods this moves 5 MWh per period.
pub fn arbitrage_battery() -> BatteryConfig {
    BatteryConfig::new(10.0, 10.0, 0.9, 0.05, 1.0, 0.5).unwrap()
}

/// 2.5 MW / 5 MWh, η 0.85, SOC bounds [0.25, 5] MWh, starting half full.
pub fn btm_battery() -> BatteryConfig {
    BatteryConfig::new(2.5, 5.0, 0.85, 0.05, 1.0, 2.5).unwrap()
}

/// Half-hour periods with no opex, so EBITDA equals trading margin.
pub fn no_opex() -> SimConfig {
    SimConfig::new(0.5, 0.0, 0.0).unwrap()
}
