//! Dispatch policies: pure decision rules over one period's signals.
//!
//! A policy only chooses an [`Action`]. Sizing the energy is shared by every
//! policy through [`DispatchPolicy::decide`], so policies cannot diverge in
//! clamping.

use super::types::{Action, DispatchDecision};
use crate::error::ConfigError;
use crate::signal::{PeriodSignal, SeriesExtrema};

/// One day of half-hour settlement periods.
pub const DEFAULT_LOOKAHEAD_HORIZON: usize = 48;

/// Everything a policy may look at for one period.
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    /// Index of the current period.
    pub period: usize,
    pub signal: &'a PeriodSignal,
    /// Signals strictly after the current period, in order.
    pub upcoming: &'a [PeriodSignal],
    /// Extrema of the entire series, read by the lookahead tail fallback.
    pub series: SeriesExtrema,
    pub headroom_to_charge: f64,
    pub headroom_to_discharge: f64,
    /// Grid energy the battery may draw this period (power x period length).
    pub charge_limit_mwh: f64,
    pub efficiency: f64,
}

/// A dispatch decision rule.
pub trait DispatchPolicy {
    /// Short label used in results and logs.
    fn name(&self) -> &'static str;

    /// Chooses an action for the period without sizing it.
    fn intent(&self, ctx: &DecisionContext<'_>) -> Action;

    /// Forward horizon in periods, if the policy reads future signals.
    fn horizon(&self) -> Option<usize> {
        None
    }

    /// Chooses and sizes the period's action.
    fn decide(&self, ctx: &DecisionContext<'_>) -> DispatchDecision {
        size_decision(self.intent(ctx), ctx)
    }
}

/// Clamps an action to power and SOC headroom.
///
/// Charge draws `min(limit, headroom_to_charge)`; discharge delivers
/// `min(limit * efficiency, headroom_to_discharge)`. Zero energy is idle.
pub fn size_decision(action: Action, ctx: &DecisionContext<'_>) -> DispatchDecision {
    let energy_mwh = match action {
        Action::Charge => ctx.charge_limit_mwh.min(ctx.headroom_to_charge),
        Action::Discharge => (ctx.charge_limit_mwh * ctx.efficiency).min(ctx.headroom_to_discharge),
        Action::Idle => 0.0,
    };

    if energy_mwh > 0.0 {
        DispatchDecision { action, energy_mwh }
    } else {
        DispatchDecision::idle()
    }
}

/// Decides from the current period only.
///
/// Charges when the efficiency-derated revenue beats the cost, otherwise
/// discharges when revenue beats cost. Charge is checked first.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GreedyPolicy;

impl DispatchPolicy for GreedyPolicy {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn intent(&self, ctx: &DecisionContext<'_>) -> Action {
        let s = ctx.signal;
        if ctx.headroom_to_charge > 0.0 && ctx.efficiency * s.revenue_now > s.cost_now {
            Action::Charge
        } else if ctx.headroom_to_discharge > 0.0 && s.revenue_now > s.cost_now {
            Action::Discharge
        } else {
            Action::Idle
        }
    }
}

/// Best selling price and cheapest buying price the lookahead policy sees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForwardExtrema {
    pub max_revenue: f64,
    pub min_cost: f64,
    /// True when fewer than `horizon` periods remained and the whole-series
    /// extrema were used instead.
    pub tail_fallback: bool,
}

/// Decides against the next `horizon` periods.
///
/// Charges when the best revenue in the window, derated by efficiency, beats
/// today's cost. Discharges when today's revenue beats the cheapest cost in
/// the window. Near the end of the series, once fewer than `horizon` periods
/// remain, the window is replaced by the extrema of the entire series,
/// including periods already processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookaheadPolicy {
    horizon: usize,
}

impl LookaheadPolicy {
    /// # Errors
    ///
    /// Returns a `ConfigError` if `horizon` is zero.
    pub fn new(horizon: usize) -> Result<Self, ConfigError> {
        if horizon == 0 {
            return Err(ConfigError::new("simulation.lookahead_horizon", "must be >= 1"));
        }
        Ok(Self { horizon })
    }

    pub fn forward_extrema(&self, ctx: &DecisionContext<'_>) -> ForwardExtrema {
        match ctx.upcoming.get(..self.horizon) {
            Some(window) => {
                let ext = SeriesExtrema::of(window);
                ForwardExtrema {
                    max_revenue: ext.max_revenue,
                    min_cost: ext.min_cost,
                    tail_fallback: false,
                }
            }
            None => ForwardExtrema {
                max_revenue: ctx.series.max_revenue,
                min_cost: ctx.series.min_cost,
                tail_fallback: true,
            },
        }
    }
}

impl Default for LookaheadPolicy {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_LOOKAHEAD_HORIZON,
        }
    }
}

impl DispatchPolicy for LookaheadPolicy {
    fn name(&self) -> &'static str {
        "lookahead"
    }

    fn horizon(&self) -> Option<usize> {
        Some(self.horizon)
    }

    fn intent(&self, ctx: &DecisionContext<'_>) -> Action {
        let fwd = self.forward_extrema(ctx);
        let s = ctx.signal;
        if ctx.headroom_to_charge > 0.0 && ctx.efficiency * fwd.max_revenue > s.cost_now {
            Action::Charge
        } else if ctx.headroom_to_discharge > 0.0 && s.revenue_now > fwd.min_cost {
            Action::Discharge
        } else {
            Action::Idle
        }
    }
}

/// Either policy, selectable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Greedy(GreedyPolicy),
    Lookahead(LookaheadPolicy),
}

impl Policy {
    pub fn greedy() -> Self {
        Policy::Greedy(GreedyPolicy)
    }

    /// # Errors
    ///
    /// Returns a `ConfigError` if `horizon` is zero.
    pub fn lookahead(horizon: usize) -> Result<Self, ConfigError> {
        LookaheadPolicy::new(horizon).map(Policy::Lookahead)
    }
}

impl DispatchPolicy for Policy {
    fn name(&self) -> &'static str {
        match self {
            Policy::Greedy(p) => p.name(),
            Policy::Lookahead(p) => p.name(),
        }
    }

    fn intent(&self, ctx: &DecisionContext<'_>) -> Action {
        match self {
            Policy::Greedy(p) => p.intent(ctx),
            Policy::Lookahead(p) => p.intent(ctx),
        }
    }

    fn horizon(&self) -> Option<usize> {
        match self {
            Policy::Greedy(p) => p.horizon(),
            Policy::Lookahead(p) => p.horizon(),
        }
    }
}
