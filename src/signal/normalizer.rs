//! Collapses per-period market components into `cost_now` / `revenue_now`.
//!
//! Import cost is the system price plus network and policy charges. Export
//! value stacks every revenue stream the asset earns for one MWh delivered.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PeriodSignal;
use crate::error::SimError;

/// Raw cost and revenue components for one settlement period (£/MWh).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalComponents {
    #[serde(alias = "ts_halfhour")]
    pub timestamp: DateTime<Utc>,
    /// System (imbalance) price paid when importing.
    pub ssp_charge: f64,
    /// Distribution use-of-system charge for the period's time band.
    pub duos_charge: f64,
    /// Policy levies and other per-MWh pass-through charges.
    pub levies_per_mwh: f64,
    /// Contracted export price.
    pub ppa_price: f64,
    #[serde(default)]
    pub bm_revenue_per_mwh: f64,
    #[serde(default)]
    pub dc_revenue_per_mwh: f64,
    #[serde(default)]
    pub cm_revenue_per_mwh: f64,
    #[serde(default)]
    pub other_revenue_per_mwh: f64,
}

impl SignalComponents {
    /// All-in import cost.
    pub fn cost_now(&self) -> f64 {
        self.ssp_charge + self.duos_charge + self.levies_per_mwh
    }

    /// Stacked export revenue.
    pub fn revenue_now(&self) -> f64 {
        self.ppa_price
            + self.bm_revenue_per_mwh
            + self.dc_revenue_per_mwh
            + self.cm_revenue_per_mwh
            + self.other_revenue_per_mwh
    }

    pub fn to_signal(&self) -> PeriodSignal {
        PeriodSignal::new(self.timestamp, self.cost_now(), self.revenue_now())
    }
}

/// Normalizes a component series, preserving order and length.
pub fn normalize(components: &[SignalComponents]) -> Vec<PeriodSignal> {
    components.iter().map(SignalComponents::to_signal).collect()
}

/// Reads component rows from CSV with a header line.
///
/// The time column may be named `timestamp` or `ts_halfhour` (RFC 3339).
/// Revenue stream columns other than `ppa_price` are optional.
///
/// # Errors
///
/// Returns `SimError::Csv` on malformed rows or I/O failure.
pub fn read_components_csv<R: Read>(reader: R) -> Result<Vec<SignalComponents>, SimError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for record in rdr.deserialize() {
        rows.push(record?);
    }
    tracing::debug!(rows = rows.len(), "read signal components");
    Ok(rows)
}

/// Reads component rows from CSV and normalizes them into signals.
///
/// # Errors
///
/// Returns `SimError::Csv` on malformed rows or I/O failure.
pub fn read_signals_csv<R: Read>(reader: R) -> Result<Vec<PeriodSignal>, SimError> {
    Ok(normalize(&read_components_csv(reader)?))
}

/// Reads and normalizes a component CSV file.
///
/// # Errors
///
/// Returns `SimError::Csv` if the file cannot be opened or parsed.
pub fn read_signals_csv_path(path: &Path) -> Result<Vec<PeriodSignal>, SimError> {
    let file = File::open(path).map_err(csv::Error::from)?;
    read_signals_csv(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
ts_halfhour,ssp_charge,duos_charge,levies_per_mwh,ppa_price,bm_revenue_per_mwh,dc_revenue_per_mwh,cm_revenue_per_mwh,other_revenue_per_mwh
2025-01-06T00:00:00Z,45.0,0.11,98.15,150.0,5.0,8.5,5.14,0.0
2025-01-06T00:30:00Z,42.5,0.11,98.15,150.0,0.0,8.5,5.14,1.0
";

    #[test]
    fn components_sum_into_signals() {
        let signals = read_signals_csv(CSV.as_bytes()).unwrap();
        assert_eq!(signals.len(), 2);
        assert!((signals[0].cost_now - (45.0 + 0.11 + 98.15)).abs() < 1e-9);
        assert!((signals[0].revenue_now - (150.0 + 5.0 + 8.5 + 5.14)).abs() < 1e-9);
        assert!((signals[1].revenue_now - (150.0 + 8.5 + 5.14 + 1.0)).abs() < 1e-9);
    }

    #[test]
    fn optional_revenue_columns_default_to_zero() {
        let csv = "timestamp,ssp_charge,duos_charge,levies_per_mwh,ppa_price\n\
                   2025-01-06T00:00:00Z,30.0,2.05,1.5,150.0\n";
        let rows = read_components_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].revenue_now(), 150.0);
        assert!((rows[0].cost_now() - 33.55).abs() < 1e-9);
    }

    #[test]
    fn malformed_row_is_csv_error() {
        let csv = "timestamp,ssp_charge,duos_charge,levies_per_mwh,ppa_price\n\
                   not-a-time,30.0,2.05,1.5,150.0\n";
        assert!(matches!(
            read_components_csv(csv.as_bytes()),
            Err(SimError::Csv(_))
        ));
    }

    #[test]
    fn normalize_preserves_order() {
        let rows = read_components_csv(CSV.as_bytes()).unwrap();
        let signals = normalize(&rows);
        assert_eq!(signals[0].timestamp, rows[0].timestamp);
        assert_eq!(signals[1].timestamp, rows[1].timestamp);
    }

    #[test]
    fn csv_file_reads_into_signals() {
        let path = std::env::temp_dir()
            .join(format!("bess-dispatch-signals-{}.csv", std::process::id()));
        std::fs::write(&path, CSV).unwrap();
        let signals = read_signals_csv_path(&path);
        std::fs::remove_file(&path).unwrap();

        let signals = signals.unwrap();
        assert_eq!(signals, read_signals_csv(CSV.as_bytes()).unwrap());
    }

    #[test]
    fn missing_csv_file_is_csv_error() {
        let path = std::env::temp_dir().join("bess-dispatch-no-such-signals.csv");
        assert!(matches!(read_signals_csv_path(&path), Err(SimError::Csv(_))));
    }
}
