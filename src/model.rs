//! Core data types for the TES batch service.
//!
//! This module defines the shared domain model imported by all other modules:
//! sky conditions, therapy regimens, irradiance series, station references,
//! result table identifiers and the crate-wide error type. It contains no I/O.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Calendar constants
// ---------------------------------------------------------------------------

/// Slots in the normalized calendar. Leap years collapse onto it.
pub const DAYS_PER_YEAR: usize = 365;

pub const MONTHS_PER_YEAR: usize = 12;

/// Measured irradiance is per second; each sample covers one minute.
pub const SECONDS_PER_SAMPLE: f64 = 60.0;

// ---------------------------------------------------------------------------
// Irradiance bands
// ---------------------------------------------------------------------------

/// Which irradiance product a regimen is computed from.
///
/// The band tag is part of every measurement file name, e.g. `170312UVAmo.txt`
/// or `170312Erymo.txt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IrradianceBand {
    /// Unweighted UVA irradiance. Doses in the same units × seconds.
    #[serde(rename = "UVA")]
    Uva,
    /// Erythemally weighted irradiance. Doses in J/m².
    #[serde(rename = "Ery")]
    Erythemal,
}

impl IrradianceBand {
    pub fn file_tag(&self) -> &'static str {
        match self {
            IrradianceBand::Uva => "UVA",
            IrradianceBand::Erythemal => "Ery",
        }
    }
}

impl fmt::Display for IrradianceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_tag())
    }
}

// ---------------------------------------------------------------------------
// Sky conditions and regimens
// ---------------------------------------------------------------------------

/// A named attenuation applied to clear-sky irradiance.
///
/// `factor` must lie in (0, 1]; `config::RunConfig::validate` enforces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudCondition {
    pub name: String,
    pub factor: f64,
}

/// A therapy type: one band, an ordered list of dose targets and the label
/// used for each dose in result file names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TherapyRegimen {
    pub name: String,
    pub band: IrradianceBand,
    pub doses: Vec<f64>,
    pub dose_labels: Vec<String>,
    /// First component of every result file name for this regimen.
    pub file_prefix: String,
}

/// Clear, partly cloudy and overcast skies, in file-index order.
pub fn default_cloud_conditions() -> Vec<CloudCondition> {
    vec![
        CloudCondition { name: "Despejado".to_string(), factor: 1.0 },
        CloudCondition { name: "Medio nublado".to_string(), factor: 0.9 },
        CloudCondition { name: "Nublado".to_string(), factor: 0.6 },
    ]
}

/// Psoriasis (UVA) and phototype MED (erythemal) regimens.
pub fn default_regimens() -> Vec<TherapyRegimen> {
    vec![
        TherapyRegimen {
            name: "Psoriasis".to_string(),
            band: IrradianceBand::Uva,
            doses: vec![10_000.0, 15_000.0, 20_000.0, 30_000.0],
            dose_labels: ["Pso1", "Pso1_5", "Pso2", "Pso3"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            file_prefix: "dosis".to_string(),
        },
        TherapyRegimen {
            name: "MED".to_string(),
            band: IrradianceBand::Erythemal,
            doses: vec![200.0, 250.0, 300.0, 450.0, 600.0, 1000.0],
            dose_labels: ["I", "II", "III", "IV", "V", "VI"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            file_prefix: "Max".to_string(),
        },
    ]
}

// ---------------------------------------------------------------------------
// Stations and series
// ---------------------------------------------------------------------------

/// A monitoring station inside one year folder.
///
/// Flat-layout folders hold a single implicit station whose `name` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StationRef {
    pub folder: String,
    pub name: String,
}

impl StationRef {
    pub fn new(folder: &str, name: &str) -> Self {
        StationRef { folder: folder.to_string(), name: name.to_string() }
    }

    pub fn is_implicit(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for StationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_implicit() {
            write!(f, "{}", self.folder)
        } else {
            write!(f, "{}/{}", self.folder, self.name)
        }
    }
}

/// Per-minute irradiance for one station-day, starting at the configured
/// start hour. Zero means no light (night or no measurement).
#[derive(Debug, Clone, PartialEq)]
pub struct IrradianceSeries {
    values: Vec<f64>,
}

impl IrradianceSeries {
    pub fn new(values: Vec<f64>) -> Self {
        IrradianceSeries { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

// ---------------------------------------------------------------------------
// Result identifiers
// ---------------------------------------------------------------------------

/// Identifies one completed result table: a (regimen, dose, cloud) tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableId {
    pub regimen: String,
    pub file_prefix: String,
    pub dose_index: usize,
    pub dose_label: String,
    pub cloud_index: usize,
}

impl TableId {
    /// `<prefix>_<dose label>_<cloud index>.csv`
    pub fn file_name(&self) -> String {
        format!("{}_{}_{}.csv", self.file_prefix, self.dose_label, self.cloud_index)
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise while configuring, reading the archive or writing
/// results.
#[derive(Debug, Error)]
pub enum TesError {
    /// An expected station list or measurement file is absent.
    #[error("Missing data file: {}", .path.display())]
    MissingData { path: PathBuf },

    /// Malformed run parameters. Detected at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The configuration file could not be read or deserialized.
    #[error("Config file {}: {message}", .path.display())]
    ConfigFile { path: PathBuf, message: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A row or value in an archive file could not be parsed.
    #[error("Parse error in {} line {line}: {message}", .path.display())]
    Parse { path: PathBuf, line: usize, message: String },

    /// A measurement file ends before the search horizon.
    #[error("Short series in {}: expected {expected} rows, found {found}", .path.display())]
    ShortSeries { path: PathBuf, expected: usize, found: usize },

    /// A date token or day-of-year outside the calendar.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl TesError {
    /// Maps `NotFound` onto `MissingData` so the missing-data policy can see it.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            TesError::MissingData { path }
        } else {
            TesError::Io { path, source }
        }
    }

    pub fn is_missing_data(&self) -> bool {
        matches!(self, TesError::MissingData { .. })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_regimens_have_one_label_per_dose() {
        for regimen in default_regimens() {
            assert_eq!(
                regimen.doses.len(),
                regimen.dose_labels.len(),
                "regimen '{}' must label every dose",
                regimen.name
            );
        }
    }

    #[test]
    fn test_default_doses_are_ascending() {
        for regimen in default_regimens() {
            assert!(
                regimen.doses.windows(2).all(|w| w[0] < w[1]),
                "doses for '{}' should be strictly ascending",
                regimen.name
            );
        }
    }

    #[test]
    fn test_default_cloud_factors_in_unit_interval() {
        let clouds = default_cloud_conditions();
        assert_eq!(clouds.len(), 3);
        assert_eq!(clouds[0].factor, 1.0, "index 0 is the clear sky");
        for cloud in &clouds {
            assert!(cloud.factor > 0.0 && cloud.factor <= 1.0, "{} out of range", cloud.name);
        }
    }

    #[test]
    fn test_table_file_name_pattern() {
        let id = TableId {
            regimen: "MED".to_string(),
            file_prefix: "Max".to_string(),
            dose_index: 1,
            dose_label: "II".to_string(),
            cloud_index: 2,
        };
        assert_eq!(id.file_name(), "Max_II_2.csv");
    }

    #[test]
    fn test_implicit_station_displays_folder_only() {
        assert_eq!(StationRef::new("2016", "").to_string(), "2016");
        assert_eq!(StationRef::new("2017", "CCA").to_string(), "2017/CCA");
    }

    #[test]
    fn test_not_found_io_error_becomes_missing_data() {
        let err = TesError::from_io(
            "Data/2017/x.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.is_missing_data());

        let err = TesError::from_io(
            "Data/2017/x.txt",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(!err.is_missing_data());
    }
}
