use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, InvariantViolation};

/// Absolute slack (MWh) allowed on SOC bound checks before a result counts as
/// a violation. Results inside the slack are snapped onto the bound.
pub const SOC_TOLERANCE_MWH: f64 = 1e-9;

/// Unvalidated battery parameters, as read from a scenario file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatterySpec {
    /// Maximum charge/discharge power (MW).
    pub power_rating_mw: f64,
    /// Nameplate energy capacity (MWh).
    pub energy_capacity_mwh: f64,
    /// Round-trip efficiency in (0, 1].
    pub round_trip_efficiency: f64,
    /// Lowest allowed SOC as a fraction of capacity.
    pub soc_min_fraction: f64,
    /// Highest allowed SOC as a fraction of capacity.
    pub soc_max_fraction: f64,
    /// SOC at the start of the run (MWh).
    pub initial_soc_mwh: f64,
}

impl Default for BatterySpec {
    fn default() -> Self {
        Self {
            power_rating_mw: 2.5,
            energy_capacity_mwh: 5.0,
            round_trip_efficiency: 0.85,
            soc_min_fraction: 0.05,
            soc_max_fraction: 1.0,
            initial_soc_mwh: 2.5,
        }
    }
}

impl BatterySpec {
    /// Returns every constraint the parameters violate. Empty means valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if !(self.power_rating_mw.is_finite() && self.power_rating_mw > 0.0) {
            errors.push(ConfigError::new("battery.power_rating_mw", "must be > 0"));
        }
        if !(self.energy_capacity_mwh.is_finite() && self.energy_capacity_mwh > 0.0) {
            errors.push(ConfigError::new("battery.energy_capacity_mwh", "must be > 0"));
        }
        if !(self.round_trip_efficiency > 0.0 && self.round_trip_efficiency <= 1.0) {
            errors.push(ConfigError::new(
                "battery.round_trip_efficiency",
                "must be in (0.0, 1.0]",
            ));
        }

        let bounds_ok = self.soc_min_fraction >= 0.0
            && self.soc_min_fraction < self.soc_max_fraction
            && self.soc_max_fraction <= 1.0;
        if !bounds_ok {
            errors.push(ConfigError::new(
                "battery.soc_min_fraction",
                format!(
                    "need 0 <= soc_min_fraction < soc_max_fraction <= 1, got [{}, {}]",
                    self.soc_min_fraction, self.soc_max_fraction
                ),
            ));
        }

        if bounds_ok && errors.is_empty() {
            let lo = self.soc_min_fraction * self.energy_capacity_mwh;
            let hi = self.soc_max_fraction * self.energy_capacity_mwh;
            let tol = SOC_TOLERANCE_MWH;
            if !(self.initial_soc_mwh >= lo - tol && self.initial_soc_mwh <= hi + tol) {
                errors.push(ConfigError::new(
                    "battery.initial_soc_mwh",
                    format!("must be within [{lo}, {hi}] MWh, got {}", self.initial_soc_mwh),
                ));
            }
        }

        errors
    }

    /// Validates and freezes the parameters.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn build(&self) -> Result<BatteryConfig, ConfigError> {
        if let Some(first) = self.validate().into_iter().next() {
            return Err(first);
        }
        Ok(BatteryConfig {
            power_rating_mw: self.power_rating_mw,
            energy_capacity_mwh: self.energy_capacity_mwh,
            round_trip_efficiency: self.round_trip_efficiency,
            soc_min_fraction: self.soc_min_fraction,
            soc_max_fraction: self.soc_max_fraction,
            initial_soc_mwh: self.initial_soc_mwh,
        })
    }
}

/// Validated, immutable battery parameters.
///
/// # Efficiency convention
///
/// Round-trip efficiency η is applied on both sides of the battery:
/// - a charge of `e` MWh drawn from the grid raises SOC by `e * η`;
/// - a discharge delivers at most `power * period * η` MWh per period, and
///   lowers SOC by exactly the energy delivered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatteryConfig {
    power_rating_mw: f64,
    energy_capacity_mwh: f64,
    round_trip_efficiency: f64,
    soc_min_fraction: f64,
    soc_max_fraction: f64,
    initial_soc_mwh: f64,
}

impl BatteryConfig {
    /// Creates a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for inverted SOC bounds, an initial SOC outside
    /// them, or non-positive capacity, power, or efficiency.
    pub fn new(
        power_rating_mw: f64,
        energy_capacity_mwh: f64,
        round_trip_efficiency: f64,
        soc_min_fraction: f64,
        soc_max_fraction: f64,
        initial_soc_mwh: f64,
    ) -> Result<Self, ConfigError> {
        BatterySpec {
            power_rating_mw,
            energy_capacity_mwh,
            round_trip_efficiency,
            soc_min_fraction,
            soc_max_fraction,
            initial_soc_mwh,
        }
        .build()
    }

    pub fn power_rating_mw(&self) -> f64 {
        self.power_rating_mw
    }

    pub fn energy_capacity_mwh(&self) -> f64 {
        self.energy_capacity_mwh
    }

    pub fn round_trip_efficiency(&self) -> f64 {
        self.round_trip_efficiency
    }

    pub fn initial_soc_mwh(&self) -> f64 {
        self.initial_soc_mwh
    }

    pub fn soc_min_mwh(&self) -> f64 {
        self.soc_min_fraction * self.energy_capacity_mwh
    }

    pub fn soc_max_mwh(&self) -> f64 {
        self.soc_max_fraction * self.energy_capacity_mwh
    }

    /// Usable energy window between the SOC bounds (MWh).
    pub fn usable_capacity_mwh(&self) -> f64 {
        self.soc_max_mwh() - self.soc_min_mwh()
    }

    /// Grid energy the battery may draw in one period (MWh).
    pub fn charge_limit_mwh(&self, period_hours: f64) -> f64 {
        self.power_rating_mw * period_hours
    }

    /// Grid energy the battery may deliver in one period (MWh).
    pub fn discharge_limit_mwh(&self, period_hours: f64) -> f64 {
        self.power_rating_mw * period_hours * self.round_trip_efficiency
    }
}

/// Mutable state of charge for one simulation run.
///
/// Not `Clone`. Each run builds its own state from a `BatteryConfig` and only
/// the owning driver mutates it.
#[derive(Debug)]
pub struct BatteryState {
    soc_mwh: f64,
    soc_min_mwh: f64,
    soc_max_mwh: f64,
    efficiency: f64,
}

impl BatteryState {
    pub fn new(config: &BatteryConfig) -> Self {
        Self {
            soc_mwh: config
                .initial_soc_mwh()
                .clamp(config.soc_min_mwh(), config.soc_max_mwh()),
            soc_min_mwh: config.soc_min_mwh(),
            soc_max_mwh: config.soc_max_mwh(),
            efficiency: config.round_trip_efficiency(),
        }
    }

    pub fn soc_mwh(&self) -> f64 {
        self.soc_mwh
    }

    pub fn soc_min_mwh(&self) -> f64 {
        self.soc_min_mwh
    }

    pub fn soc_max_mwh(&self) -> f64 {
        self.soc_max_mwh
    }

    /// Room left below the upper SOC bound (MWh, >= 0).
    pub fn headroom_to_charge(&self) -> f64 {
        (self.soc_max_mwh - self.soc_mwh).max(0.0)
    }

    /// Energy available above the lower SOC bound (MWh, >= 0).
    pub fn headroom_to_discharge(&self) -> f64 {
        (self.soc_mwh - self.soc_min_mwh).max(0.0)
    }

    /// Charges with up to `requested_mwh` of grid energy.
    ///
    /// Draws `min(requested, headroom_to_charge)` and stores that amount
    /// derated by efficiency. Returns the grid energy actually drawn.
    ///
    /// # Errors
    ///
    /// Returns an `InvariantViolation` for a negative or non-finite request, or
    /// if the resulting SOC would leave its bounds.
    pub fn apply_charge(&mut self, requested_mwh: f64) -> Result<f64, InvariantViolation> {
        self.check_request("apply_charge", requested_mwh)?;
        let actual = requested_mwh.min(self.headroom_to_charge());
        self.commit("apply_charge", self.soc_mwh + actual * self.efficiency)?;
        Ok(actual)
    }

    /// Discharges up to `requested_mwh`, returning the energy delivered.
    ///
    /// # Errors
    ///
    /// Returns an `InvariantViolation` for a negative or non-finite request, or
    /// if the resulting SOC would leave its bounds.
    pub fn apply_discharge(&mut self, requested_mwh: f64) -> Result<f64, InvariantViolation> {
        self.check_request("apply_discharge", requested_mwh)?;
        let actual = requested_mwh.min(self.headroom_to_discharge());
        self.commit("apply_discharge", self.soc_mwh - actual)?;
        Ok(actual)
    }

    fn check_request(
        &self,
        operation: &'static str,
        requested_mwh: f64,
    ) -> Result<(), InvariantViolation> {
        if requested_mwh.is_finite() && requested_mwh >= 0.0 {
            Ok(())
        } else {
            Err(self.violation(operation, self.soc_mwh))
        }
    }

    fn commit(&mut self, operation: &'static str, next_mwh: f64) -> Result<(), InvariantViolation> {
        let within = next_mwh.is_finite()
            && next_mwh <= self.soc_max_mwh + SOC_TOLERANCE_MWH
            && next_mwh >= self.soc_min_mwh - SOC_TOLERANCE_MWH;
        if !within {
            return Err(self.violation(operation, next_mwh));
        }
        self.soc_mwh = next_mwh.clamp(self.soc_min_mwh, self.soc_max_mwh);
        Ok(())
    }

    fn violation(&self, operation: &'static str, soc_mwh: f64) -> InvariantViolation {
        InvariantViolation {
            operation,
            soc_mwh,
            soc_min_mwh: self.soc_min_mwh,
            soc_max_mwh: self.soc_max_mwh,
            period: None,
            timestamp: None,
        }
    }
}
