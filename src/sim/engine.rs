//! Simulation driver: walks the signal series once, applying one policy.

use tracing::{debug, info, trace, warn};

use super::kpi::EconomicSummary;
use super::policy::{DecisionContext, DispatchPolicy};
use super::types::{Action, LedgerEntry, SimConfig, SimulationResult};
use crate::battery::{BatteryConfig, BatteryState};
use crate::error::SimError;
use crate::signal::{PeriodSignal, SeriesExtrema, validate_series};

/// Simulation engine pairing a battery, run settings, and a policy.
///
/// Generic over `P: DispatchPolicy` for static dispatch. The engine holds
/// only immutable inputs; every call to [`Engine::run`] builds a fresh
/// `BatteryState`, so one engine can serve several runs and threads.
#[derive(Debug, Clone)]
pub struct Engine<P: DispatchPolicy> {
    battery: BatteryConfig,
    config: SimConfig,
    policy: P,
}

impl<P: DispatchPolicy> Engine<P> {
    pub fn new(battery: BatteryConfig, config: SimConfig, policy: P) -> Self {
        Self {
            battery,
            config,
            policy,
        }
    }

    /// Runs the policy over `signals` and aggregates the ledger.
    ///
    /// The series is validated before the battery is touched, so a data
    /// error never leaves a partial ledger behind.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Data` for an empty, unordered, duplicated, or
    /// non-finite series, and `SimError::Invariant` if a battery update
    /// would break its SOC bounds.
    pub fn run(&self, signals: &[PeriodSignal]) -> Result<SimulationResult, SimError> {
        validate_series(signals)?;

        let mut run = Run {
            engine: self,
            signals,
            series: SeriesExtrema::of(signals),
            battery: BatteryState::new(&self.battery),
            last_action: Action::Idle,
            tail_reported: false,
        };

        info!(
            policy = self.policy.name(),
            periods = signals.len(),
            initial_soc_mwh = run.battery.soc_mwh(),
            "dispatch run started"
        );

        let mut ledger = Vec::with_capacity(signals.len());
        for period in 0..signals.len() {
            ledger.push(run.step(period)?);
        }

        let summary = EconomicSummary::from_ledger(
            &ledger,
            &self.config,
            self.battery.usable_capacity_mwh(),
        );
        info!(
            policy = self.policy.name(),
            charged_mwh = summary.total_charged_mwh,
            discharged_mwh = summary.total_discharged_mwh,
            revenue = summary.total_revenue,
            cost = summary.total_cost,
            ebitda = summary.ebitda,
            "dispatch run finished"
        );

        Ok(SimulationResult {
            policy: self.policy.name(),
            ledger,
            summary,
        })
    }
}

/// Runs `policy` over `signals` with a fresh battery.
///
/// # Errors
///
/// See [`Engine::run`].
pub fn run<P: DispatchPolicy + Clone>(
    signals: &[PeriodSignal],
    battery: &BatteryConfig,
    config: &SimConfig,
    policy: &P,
) -> Result<SimulationResult, SimError> {
    Engine::new(*battery, *config, policy.clone()).run(signals)
}

/// Mutable state of a single run. Owns the battery for the run's lifetime.
struct Run<'a, P: DispatchPolicy> {
    engine: &'a Engine<P>,
    signals: &'a [PeriodSignal],
    series: SeriesExtrema,
    battery: BatteryState,
    last_action: Action,
    tail_reported: bool,
}

impl<P: DispatchPolicy> Run<'_, P> {
    fn step(&mut self, period: usize) -> Result<LedgerEntry, SimError> {
        let signal = &self.signals[period];
        let upcoming = &self.signals[period + 1..];
        let efficiency = self.engine.battery.round_trip_efficiency();

        let ctx = DecisionContext {
            period,
            signal,
            upcoming,
            series: self.series,
            headroom_to_charge: self.battery.headroom_to_charge(),
            headroom_to_discharge: self.battery.headroom_to_discharge(),
            charge_limit_mwh: self
                .engine
                .battery
                .charge_limit_mwh(self.engine.config.period_hours),
            efficiency,
        };

        if let Some(h) = self.engine.policy.horizon() {
            if upcoming.len() < h && !self.tail_reported {
                warn!(
                    period,
                    horizon = h,
                    remaining = upcoming.len(),
                    "lookahead window truncated; using whole-series extrema for remaining periods"
                );
                self.tail_reported = true;
            }
        }

        let decision = self.engine.policy.decide(&ctx);
        let soc_start_mwh = self.battery.soc_mwh();

        let (charge_mwh, discharge_mwh) = match decision.action {
            Action::Charge => (
                self.battery
                    .apply_charge(decision.energy_mwh)
                    .map_err(|e| e.at(period, signal.timestamp))?,
                0.0,
            ),
            Action::Discharge => (
                0.0,
                self.battery
                    .apply_discharge(decision.energy_mwh)
                    .map_err(|e| e.at(period, signal.timestamp))?,
            ),
            Action::Idle => (0.0, 0.0),
        };

        let action = if charge_mwh > 0.0 {
            Action::Charge
        } else if discharge_mwh > 0.0 {
            Action::Discharge
        } else {
            Action::Idle
        };

        if action != self.last_action {
            debug!(period, from = %self.last_action, to = %action, "dispatch state change");
            self.last_action = action;
        }

        let entry = LedgerEntry {
            period,
            timestamp: signal.timestamp,
            action,
            soc_start_mwh,
            soc_end_mwh: self.battery.soc_mwh(),
            charge_mwh,
            discharge_mwh,
            cost_now: signal.cost_now,
            revenue_now: signal.revenue_now,
            cost: charge_mwh * signal.cost_now,
            revenue: discharge_mwh * signal.revenue_now,
        };
        trace!(entry = %entry, "period settled");

        Ok(entry)
    }
}
