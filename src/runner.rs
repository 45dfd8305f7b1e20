//! Config-driven entry points: one run, or both policies side by side.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::ScenarioConfig;
use crate::error::SimError;
use crate::signal::PeriodSignal;
use crate::sim::engine::Engine;
use crate::sim::kpi::PolicyComparison;
use crate::sim::policy::{DispatchPolicy, GreedyPolicy, LookaheadPolicy};
use crate::sim::types::SimulationResult;

/// Both runs over one series plus the EBITDA comparison.
#[derive(Debug, Clone)]
pub struct ScenarioComparison {
    pub greedy: SimulationResult,
    pub lookahead: SimulationResult,
    pub report: PolicyComparison,
}

/// Runs the scenario's configured policy over `signals`.
///
/// # Errors
///
/// Returns the first configuration violation as `SimError::Config`, or any
/// data or invariant error raised by the run.
pub fn run_scenario(
    config: &ScenarioConfig,
    signals: &[PeriodSignal],
) -> Result<SimulationResult, SimError> {
    check(config)?;
    run_with(config, config.policy()?, signals)
}

/// Runs greedy and lookahead over the same `signals`, each with its own
/// battery state, and compares their EBITDA.
///
/// The configured policy name is ignored; the horizon is taken from the
/// scenario.
///
/// # Errors
///
/// See [`run_scenario`].
pub fn compare_policies(
    config: &ScenarioConfig,
    signals: &[PeriodSignal],
) -> Result<ScenarioComparison, SimError> {
    check(config)?;
    let greedy = run_with(config, GreedyPolicy, signals)?;
    let lookahead = run_with(
        config,
        LookaheadPolicy::new(config.simulation.lookahead_horizon)?,
        signals,
    )?;

    let report =
        PolicyComparison::from_summaries(greedy.summary.clone(), lookahead.summary.clone());
    info!(
        improvement = report.improvement,
        improvement_pct = report.improvement_pct,
        "policy comparison complete"
    );

    Ok(ScenarioComparison {
        greedy,
        lookahead,
        report,
    })
}

/// Generates the scenario's synthetic price series starting at `start`.
///
/// # Errors
///
/// Returns `SimError::Config` if the period length is out of range or the
/// series would overflow the timestamp range.
pub fn synthetic_signals(
    config: &ScenarioConfig,
    start: DateTime<Utc>,
) -> Result<Vec<PeriodSignal>, SimError> {
    let signals = config.profile.generate(
        start,
        config.simulation.periods,
        config.simulation.period_hours,
    )?;
    Ok(signals)
}

fn check(config: &ScenarioConfig) -> Result<(), SimError> {
    match config.validate().into_iter().next() {
        Some(first) => Err(first.into()),
        None => Ok(()),
    }
}

fn run_with<P: DispatchPolicy>(
    config: &ScenarioConfig,
    policy: P,
    signals: &[PeriodSignal],
) -> Result<SimulationResult, SimError> {
    let engine = Engine::new(config.battery_config()?, config.sim_config()?, policy);
    engine.run(signals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap()
    }

    #[test]
    fn deterministic_run() {
        let cfg = ScenarioConfig::btm();
        let signals = synthetic_signals(&cfg, start()).unwrap();
        let a = run_scenario(&cfg, &signals).unwrap();
        let b = run_scenario(&cfg, &signals).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn synthetic_length_follows_config() {
        let mut cfg = ScenarioConfig::btm();
        cfg.simulation.periods = 10;
        assert_eq!(synthetic_signals(&cfg, start()).unwrap().len(), 10);
    }

    #[test]
    fn oversized_period_is_error_not_panic() {
        let mut cfg = ScenarioConfig::btm();
        cfg.simulation.period_hours = 1e12;
        let err = synthetic_signals(&cfg, start()).unwrap_err();
        assert!(matches!(
            err,
            SimError::Config(ref e) if e.field == "simulation.period_hours"
        ));
    }

    #[test]
    fn invalid_config_rejected_before_run() {
        let mut cfg = ScenarioConfig::btm();
        cfg.battery.initial_soc_mwh = 99.0;
        let signals = synthetic_signals(&ScenarioConfig::btm(), start()).unwrap();
        let err = run_scenario(&cfg, &signals).unwrap_err();
        assert!(matches!(
            err,
            SimError::Config(ref e) if e.field == "battery.initial_soc_mwh"
        ));
    }

    #[test]
    fn comparison_reports_both_policies() {
        let cfg = ScenarioConfig::arbitrage_demo();
        let signals = synthetic_signals(&cfg, start()).unwrap();
        let cmp = compare_policies(&cfg, &signals).unwrap();
        assert_eq!(cmp.greedy.policy, "greedy");
        assert_eq!(cmp.lookahead.policy, "lookahead");
        assert_eq!(
            cmp.report.improvement,
            cmp.lookahead.summary.ebitda - cmp.greedy.summary.ebitda
        );
    }
}
