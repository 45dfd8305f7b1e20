use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Deserialize;

use super::{PeriodSignal, period_step};
use crate::error::ConfigError;

/// A seeded generator of daily price shapes.
///
/// Cost follows a sinusoid over the day plus Gaussian noise; revenue is the
/// cost shape shifted by a premium and scaled by `revenue_swing`, so the
/// spread between the two widens at the evening peak.
///
/// # Examples
///
/// ```
/// use bess_dispatch::signal::SyntheticProfile;
/// use chrono::{TimeZone, Utc};
///
/// let start = Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap();
/// let signals = SyntheticProfile::default().generate(start, 96, 0.5).unwrap();
/// assert_eq!(signals.len(), 96);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntheticProfile {
    /// Mean import cost (£/MWh).
    pub base_cost: f64,
    /// Daily cost amplitude (£/MWh).
    pub cost_amplitude: f64,
    /// Phase offset of the daily cycle (radians).
    pub phase_rad: f64,
    /// Constant export premium over cost (£/MWh, may be negative).
    pub revenue_premium: f64,
    /// Multiplier on the cost swing when forming revenue.
    pub revenue_swing: f64,
    /// Standard deviation of cost and revenue noise (£/MWh).
    pub noise_std: f64,
    /// Random seed for reproducible noise.
    pub seed: u64,
}

impl Default for SyntheticProfile {
    fn default() -> Self {
        Self {
            base_cost: 60.0,
            cost_amplitude: 35.0,
            phase_rad: -1.9,
            revenue_premium: -5.0,
            revenue_swing: 1.4,
            noise_std: 4.0,
            seed: 42,
        }
    }
}

impl SyntheticProfile {
    /// Generates `periods` consecutive signals starting at `start`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `period_hours` is outside the supported
    /// period range or the series would run past the last representable
    /// timestamp.
    pub fn generate(
        &self,
        start: DateTime<Utc>,
        periods: usize,
        period_hours: f64,
    ) -> Result<Vec<PeriodSignal>, ConfigError> {
        let step = period_step(period_hours).ok_or_else(|| {
            ConfigError::new(
                "simulation.period_hours",
                format!("{period_hours} h is not a supported period length"),
            )
        })?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let per_day = (24.0 / period_hours).round().max(1.0);

        let mut out = Vec::with_capacity(periods);
        let mut timestamp = start;
        for t in 0..periods {
            if t > 0 {
                timestamp = timestamp.checked_add_signed(step).ok_or_else(|| {
                    ConfigError::new(
                        "simulation.periods",
                        format!("period {t} falls past the last representable timestamp"),
                    )
                })?;
            }

            let day_pos = (t as f64 % per_day) / per_day;
            let swing = (2.0 * std::f64::consts::PI * day_pos + self.phase_rad).sin();

            let cost = self.base_cost
                + self.cost_amplitude * swing
                + gaussian_noise(&mut rng, self.noise_std);
            let revenue = self.base_cost
                + self.revenue_premium
                + self.revenue_swing * self.cost_amplitude * swing
                + gaussian_noise(&mut rng, self.noise_std);

            out.push(PeriodSignal::new(timestamp, cost, revenue));
        }
        Ok(out)
    }
}

/// Gaussian noise via Box-Muller.
fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}
