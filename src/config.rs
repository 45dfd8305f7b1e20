//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::battery::{BatteryConfig, BatterySpec};
use crate::error::ConfigError;
use crate::signal::{SyntheticProfile, period_hours_in_range};
use crate::sim::policy::{DEFAULT_LOOKAHEAD_HORIZON, Policy};
use crate::sim::types::SimConfig;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the `btm` preset. Load from TOML with
/// [`ScenarioConfig::from_toml_file`] or pick a built-in with
/// [`ScenarioConfig::from_preset`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Settlement timing and policy selection.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Battery asset parameters.
    #[serde(default)]
    pub battery: BatterySpec,
    /// Operating cost terms.
    #[serde(default)]
    pub economics: EconomicsConfig,
    /// Synthetic price profile, used when no signal file is supplied.
    #[serde(default)]
    pub profile: SyntheticProfile,
}

/// Settlement timing and policy selection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Settlement period length in hours (must be > 0).
    pub period_hours: f64,
    /// Policy name: `"greedy"` or `"lookahead"`.
    pub policy: String,
    /// Forward window for the lookahead policy, in periods (must be >= 1).
    pub lookahead_horizon: usize,
    /// Length of a generated synthetic series.
    pub periods: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            period_hours: 0.5,
            policy: "greedy".to_string(),
            lookahead_horizon: DEFAULT_LOOKAHEAD_HORIZON,
            periods: 96,
        }
    }
}

/// Operating cost terms applied by the aggregator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EconomicsConfig {
    /// Fixed cost per run (£).
    pub fixed_opex: f64,
    /// Cost per MWh discharged (£/MWh).
    pub variable_opex_per_mwh: f64,
}

impl Default for EconomicsConfig {
    fn default() -> Self {
        Self {
            fixed_opex: 100_000.0,
            variable_opex_per_mwh: 3.0,
        }
    }
}

impl ScenarioConfig {
    /// Behind-the-meter asset: 2.5 MW / 5 MWh, η 0.85, half full at start.
    pub fn btm() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            battery: BatterySpec::default(),
            economics: EconomicsConfig::default(),
            profile: SyntheticProfile::default(),
        }
    }

    /// The `btm` asset with the SOC floor raised to 0.5 MWh.
    pub fn fullpack() -> Self {
        Self {
            battery: BatterySpec {
                soc_min_fraction: 0.1,
                ..BatterySpec::default()
            },
            ..Self::btm()
        }
    }

    /// A 10 MW / 10 MWh arbitrage asset starting at its SOC floor, with no
    /// opex and a wider price spread.
    pub fn arbitrage_demo() -> Self {
        Self {
            simulation: SimulationConfig {
                policy: "lookahead".to_string(),
                ..SimulationConfig::default()
            },
            battery: BatterySpec {
                power_rating_mw: 10.0,
                energy_capacity_mwh: 10.0,
                round_trip_efficiency: 0.9,
                soc_min_fraction: 0.05,
                soc_max_fraction: 1.0,
                initial_soc_mwh: 0.5,
            },
            economics: EconomicsConfig {
                fixed_opex: 0.0,
                variable_opex_per_mwh: 0.0,
            },
            profile: SyntheticProfile {
                cost_amplitude: 50.0,
                noise_std: 6.0,
                ..SyntheticProfile::default()
            },
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["btm", "fullpack", "arbitrage_demo"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "btm" => Ok(Self::btm()),
            "fullpack" => Ok(Self::fullpack()),
            "arbitrage_demo" => Ok(Self::arbitrage_demo()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        if !period_hours_in_range(s.period_hours) {
            errors.push(ConfigError::new(
                "simulation.period_hours",
                "must be between 1 ms and 24 h",
            ));
        }
        if s.policy != "greedy" && s.policy != "lookahead" {
            errors.push(ConfigError::new(
                "simulation.policy",
                format!("must be \"greedy\" or \"lookahead\", got \"{}\"", s.policy),
            ));
        }
        if s.lookahead_horizon == 0 {
            errors.push(ConfigError::new(
                "simulation.lookahead_horizon",
                "must be >= 1",
            ));
        }
        if s.periods == 0 {
            errors.push(ConfigError::new("simulation.periods", "must be > 0"));
        }

        errors.extend(self.battery.validate());

        let eco = &self.economics;
        if !(eco.fixed_opex.is_finite() && eco.fixed_opex >= 0.0) {
            errors.push(ConfigError::new("economics.fixed_opex", "must be >= 0"));
        }
        if !(eco.variable_opex_per_mwh.is_finite() && eco.variable_opex_per_mwh >= 0.0) {
            errors.push(ConfigError::new(
                "economics.variable_opex_per_mwh",
                "must be >= 0",
            ));
        }

        if self.profile.noise_std < 0.0 {
            errors.push(ConfigError::new("profile.noise_std", "must be >= 0"));
        }

        errors
    }

    /// Builds the validated battery parameters.
    ///
    /// # Errors
    ///
    /// Returns the first battery constraint violated.
    pub fn battery_config(&self) -> Result<BatteryConfig, ConfigError> {
        self.battery.build()
    }

    /// Builds the run settings from the simulation and economics sections.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for a non-positive period or negative opex.
    pub fn sim_config(&self) -> Result<SimConfig, ConfigError> {
        SimConfig::new(
            self.simulation.period_hours,
            self.economics.fixed_opex,
            self.economics.variable_opex_per_mwh,
        )
    }

    /// Resolves the configured policy.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for an unknown policy name or a zero horizon.
    pub fn policy(&self) -> Result<Policy, ConfigError> {
        match self.simulation.policy.as_str() {
            "greedy" => Ok(Policy::greedy()),
            "lookahead" => Policy::lookahead(self.simulation.lookahead_horizon),
            other => Err(ConfigError::new(
                "simulation.policy",
                format!("must be \"greedy\" or \"lookahead\", got \"{other}\""),
            )),
        }
    }
}
