//! Core simulation types: run configuration, decisions, and ledger records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::kpi::EconomicSummary;
use crate::error::ConfigError;
use crate::signal::period_hours_in_range;

/// Run-wide settings shared by the driver and the aggregator.
///
/// # Examples
///
/// ```
/// use bess_dispatch::sim::types::SimConfig;
///
/// let cfg = SimConfig::new(0.5, 100_000.0, 3.0).unwrap();
/// assert_eq!(cfg.period_hours, 0.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimConfig {
    /// Settlement period length in hours.
    pub period_hours: f64,
    /// Fixed operating cost charged once per run (£).
    pub fixed_opex: f64,
    /// Operating cost per MWh discharged (£/MWh).
    pub variable_opex_per_mwh: f64,
}

impl SimConfig {
    /// Creates a run configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the period length is not positive or an
    /// opex value is negative or non-finite.
    pub fn new(
        period_hours: f64,
        fixed_opex: f64,
        variable_opex_per_mwh: f64,
    ) -> Result<Self, ConfigError> {
        if !period_hours_in_range(period_hours) {
            return Err(ConfigError::new(
                "simulation.period_hours",
                "must be between 1 ms and 24 h",
            ));
        }
        if !(fixed_opex.is_finite() && fixed_opex >= 0.0) {
            return Err(ConfigError::new("economics.fixed_opex", "must be >= 0"));
        }
        if !(variable_opex_per_mwh.is_finite() && variable_opex_per_mwh >= 0.0) {
            return Err(ConfigError::new(
                "economics.variable_opex_per_mwh",
                "must be >= 0",
            ));
        }
        Ok(Self {
            period_hours,
            fixed_opex,
            variable_opex_per_mwh,
        })
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            period_hours: 0.5,
            fixed_opex: 100_000.0,
            variable_opex_per_mwh: 3.0,
        }
    }
}

/// What the battery does in one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Charge,
    Discharge,
    Idle,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Charge => "CHARGE",
            Action::Discharge => "DISCHARGE",
            Action::Idle => "IDLE",
        };
        f.pad(s)
    }
}

/// A policy's sized decision for one period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchDecision {
    pub action: Action,
    /// Grid-side energy (MWh, >= 0); zero when idle.
    pub energy_mwh: f64,
}

impl DispatchDecision {
    pub fn idle() -> Self {
        Self {
            action: Action::Idle,
            energy_mwh: 0.0,
        }
    }
}

/// Complete record of one settlement period.
///
/// Energies are grid-side. `cost` and `revenue` are cash amounts for the
/// period; `cost_now` and `revenue_now` are the prices that produced them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntry {
    /// Position in the input series.
    pub period: usize,
    pub timestamp: DateTime<Utc>,
    pub action: Action,
    pub soc_start_mwh: f64,
    pub soc_end_mwh: f64,
    pub charge_mwh: f64,
    pub discharge_mwh: f64,
    pub cost_now: f64,
    pub revenue_now: f64,
    /// `charge_mwh * cost_now`.
    pub cost: f64,
    /// `discharge_mwh * revenue_now`.
    pub revenue: f64,
}

impl LedgerEntry {
    /// Period cash flow: revenue minus cost.
    pub fn net(&self) -> f64 {
        self.revenue - self.cost
    }
}

impl fmt::Display for LedgerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "p={:>4} {} | {:<9} | soc {:>7.3} -> {:>7.3} MWh | chg={:.3} dis={:.3} MWh \
             | cost={:>9.2} rev={:>9.2} net={:>9.2}",
            self.period,
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.action,
            self.soc_start_mwh,
            self.soc_end_mwh,
            self.charge_mwh,
            self.discharge_mwh,
            self.cost,
            self.revenue,
            self.net(),
        )
    }
}

/// Output of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    /// Name of the policy that produced the ledger.
    pub policy: &'static str,
    /// One entry per input signal, in input order.
    pub ledger: Vec<LedgerEntry>,
    pub summary: EconomicSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sim_config_rejects_zero_period() {
        let err = SimConfig::new(0.0, 0.0, 0.0).unwrap_err();
        assert_eq!(err.field, "simulation.period_hours");
    }

    #[test]
    fn sim_config_rejects_out_of_range_periods() {
        assert!(SimConfig::new(1e-8, 0.0, 0.0).is_err());
        assert!(SimConfig::new(1e12, 0.0, 0.0).is_err());
        assert!(SimConfig::new(24.0, 0.0, 0.0).is_ok());
    }

    #[test]
    fn sim_config_rejects_negative_opex() {
        assert!(SimConfig::new(0.5, -1.0, 0.0).is_err());
        assert!(SimConfig::new(0.5, 0.0, f64::NAN).is_err());
    }

    #[test]
    fn default_matches_half_hour_settlement() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.period_hours, 0.5);
        assert_eq!(SimConfig::new(0.5, 100_000.0, 3.0).ok(), Some(cfg));
    }

    #[test]
    fn ledger_entry_display_does_not_panic() {
        let e = LedgerEntry {
            period: 0,
            timestamp: Utc.with_ymd_and_hms(2025, 1, 6, 17, 0, 0).unwrap(),
            action: Action::Discharge,
            soc_start_mwh: 2.5,
            soc_end_mwh: 0.375,
            charge_mwh: 0.0,
            discharge_mwh: 2.125,
            cost_now: 120.0,
            revenue_now: 180.0,
            cost: 0.0,
            revenue: 382.5,
        };
        let s = format!("{e}");
        assert!(s.contains("DISCHARGE"));
        assert_eq!(e.net(), 382.5);
    }
}
