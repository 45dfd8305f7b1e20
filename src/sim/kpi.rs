//! Post-hoc economic aggregation over a dispatch ledger.

use std::fmt;

use serde::Serialize;

use super::types::{Action, LedgerEntry, SimConfig};

/// Run totals derived from a complete ledger.
///
/// Computed post-hoc from `&[LedgerEntry]` so the summary can never drift
/// from the per-period records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EconomicSummary {
    /// Σ discharge_mwh · revenue_now (£).
    pub total_revenue: f64,
    /// Σ charge_mwh · cost_now (£).
    pub total_cost: f64,
    pub total_charged_mwh: f64,
    pub total_discharged_mwh: f64,
    /// variable_opex_per_mwh · total_discharged_mwh (£).
    pub variable_opex: f64,
    pub fixed_opex: f64,
    /// Revenue less cost and both opex terms (£).
    pub ebitda: f64,
    pub charge_periods: usize,
    pub discharge_periods: usize,
    pub idle_periods: usize,
    /// Discharged energy over usable capacity.
    pub equivalent_full_cycles: f64,
}

impl EconomicSummary {
    /// Folds a ledger into totals.
    ///
    /// # Arguments
    ///
    /// * `ledger` - Complete per-period records of one run
    /// * `config` - Run settings carrying the opex terms
    /// * `usable_capacity_mwh` - SOC window used for the cycle count
    pub fn from_ledger(
        ledger: &[LedgerEntry],
        config: &SimConfig,
        usable_capacity_mwh: f64,
    ) -> Self {
        let mut total_revenue = 0.0;
        let mut total_cost = 0.0;
        let mut total_charged_mwh = 0.0;
        let mut total_discharged_mwh = 0.0;
        let mut charge_periods = 0;
        let mut discharge_periods = 0;
        let mut idle_periods = 0;

        for e in ledger {
            total_revenue += e.discharge_mwh * e.revenue_now;
            total_cost += e.charge_mwh * e.cost_now;
            total_charged_mwh += e.charge_mwh;
            total_discharged_mwh += e.discharge_mwh;

            match e.action {
                Action::Charge => charge_periods += 1,
                Action::Discharge => discharge_periods += 1,
                Action::Idle => idle_periods += 1,
            }
        }

        let variable_opex = config.variable_opex_per_mwh * total_discharged_mwh;
        let ebitda = total_revenue - total_cost - variable_opex - config.fixed_opex;

        let equivalent_full_cycles = if usable_capacity_mwh > 0.0 {
            total_discharged_mwh / usable_capacity_mwh
        } else {
            0.0
        };

        Self {
            total_revenue,
            total_cost,
            total_charged_mwh,
            total_discharged_mwh,
            variable_opex,
            fixed_opex: config.fixed_opex,
            ebitda,
            charge_periods,
            discharge_periods,
            idle_periods,
            equivalent_full_cycles,
        }
    }

    /// Gross margin before opex.
    pub fn trading_margin(&self) -> f64 {
        self.total_revenue - self.total_cost
    }
}

impl fmt::Display for EconomicSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Economic Summary ---")?;
        writeln!(f, "Total revenue:         £{:.2}", self.total_revenue)?;
        writeln!(f, "Total cost:            £{:.2}", self.total_cost)?;
        writeln!(f, "Variable opex:         £{:.2}", self.variable_opex)?;
        writeln!(f, "Fixed opex:            £{:.2}", self.fixed_opex)?;
        writeln!(f, "EBITDA:                £{:.2}", self.ebitda)?;
        writeln!(
            f,
            "Energy:                {:.3} MWh charged, {:.3} MWh discharged ({:.2} equiv. cycles)",
            self.total_charged_mwh, self.total_discharged_mwh, self.equivalent_full_cycles
        )?;
        write!(
            f,
            "Periods:               {} charge / {} discharge / {} idle",
            self.charge_periods, self.discharge_periods, self.idle_periods
        )
    }
}

/// Lookahead against greedy over the same series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyComparison {
    pub greedy: EconomicSummary,
    pub lookahead: EconomicSummary,
    /// Lookahead EBITDA minus greedy EBITDA (£).
    pub improvement: f64,
    /// `improvement / |greedy EBITDA| * 100`, or 0 when greedy EBITDA is 0.
    pub improvement_pct: f64,
}

impl PolicyComparison {
    pub fn from_summaries(greedy: EconomicSummary, lookahead: EconomicSummary) -> Self {
        let improvement = lookahead.ebitda - greedy.ebitda;
        let improvement_pct = if greedy.ebitda != 0.0 {
            improvement / greedy.ebitda.abs() * 100.0
        } else {
            0.0
        };
        Self {
            greedy,
            lookahead,
            improvement,
            improvement_pct,
        }
    }
}

impl fmt::Display for PolicyComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Policy Comparison ---")?;
        writeln!(f, "{:<22} {:>14} {:>14}", "", "greedy", "lookahead")?;
        let rows = [
            ("Revenue (£)", self.greedy.total_revenue, self.lookahead.total_revenue),
            ("Cost (£)", self.greedy.total_cost, self.lookahead.total_cost),
            ("Variable opex (£)", self.greedy.variable_opex, self.lookahead.variable_opex),
            ("EBITDA (£)", self.greedy.ebitda, self.lookahead.ebitda),
            (
                "Discharged (MWh)",
                self.greedy.total_discharged_mwh,
                self.lookahead.total_discharged_mwh,
            ),
        ];
        for (label, g, l) in rows {
            writeln!(f, "{label:<22} {g:>14.2} {l:>14.2}")?;
        }
        write!(
            f,
            "Improvement:           £{:.2} ({:+.2}%)",
            self.improvement, self.improvement_pct
        )
    }
}
