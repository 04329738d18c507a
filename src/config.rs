//! Run configuration for the TES batch service.
//!
//! Parameters are read from a TOML file at startup and validated once; a run
//! never starts with an inconsistent hour window. Example:
//!
//! ```toml
//! start_hour = 7
//! end_hour = 18
//! cutoff_hour = 20
//! data_root = "Data"
//! data_folders = ["2015", "2016", "2017"]
//! flat_folders = ["2016"]
//! results_root = "Results"
//! missing_data = "abort"
//! ```
//!
//! `cloud_conditions` and `regimens` may be given as arrays of tables; when
//! absent the built-in sets from `model` are used.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::model::{
    default_cloud_conditions, default_regimens, CloudCondition, TesError, TherapyRegimen,
};

/// Environment variable consulted when no `--config` path is given.
pub const CONFIG_ENV_VAR: &str = "TES_CONFIG";

pub const DEFAULT_CONFIG_PATH: &str = "./tes.toml";

// ---------------------------------------------------------------------------
// Missing-data policy
// ---------------------------------------------------------------------------

/// What to do when a listed date has no measurement file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingDataPolicy {
    /// Fail the run on the first missing file.
    #[default]
    Abort,
    /// Log, count and skip the station-day.
    Skip,
}

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// First hour of the reporting window.
    pub start_hour: u32,
    /// Reporting window ends before this hour.
    pub end_hour: u32,
    /// Integration never looks past this hour.
    pub cutoff_hour: u32,
    pub data_root: PathBuf,
    /// Year folders under `data_root`, processed in this order.
    pub data_folders: Vec<String>,
    /// Year folders without per-station subdirectories.
    #[serde(default = "default_flat_folders")]
    pub flat_folders: Vec<String>,
    pub results_root: PathBuf,
    #[serde(default)]
    pub missing_data: MissingDataPolicy,
    /// Zero-based whitespace column holding irradiance in measurement files.
    #[serde(default = "default_measurement_column")]
    pub measurement_column: usize,
    #[serde(default = "default_cloud_conditions")]
    pub cloud_conditions: Vec<CloudCondition>,
    #[serde(default = "default_regimens")]
    pub regimens: Vec<TherapyRegimen>,
}

fn default_flat_folders() -> Vec<String> {
    vec!["2016".to_string()]
}

fn default_measurement_column() -> usize {
    1
}

impl RunConfig {
    /// A configuration with built-in regimens and sky conditions.
    pub fn new(
        start_hour: u32,
        end_hour: u32,
        cutoff_hour: u32,
        data_root: impl Into<PathBuf>,
        data_folders: Vec<String>,
        results_root: impl Into<PathBuf>,
    ) -> Self {
        RunConfig {
            start_hour,
            end_hour,
            cutoff_hour,
            data_root: data_root.into(),
            data_folders,
            flat_folders: default_flat_folders(),
            results_root: results_root.into(),
            missing_data: MissingDataPolicy::default(),
            measurement_column: default_measurement_column(),
            cloud_conditions: default_cloud_conditions(),
            regimens: default_regimens(),
        }
    }

    /// Minutes in the reporting window; one result row each.
    pub fn window_minutes(&self) -> usize {
        60 * (self.end_hour.saturating_sub(self.start_hour)) as usize
    }

    /// Minutes from the start hour to the cutoff hour.
    pub fn search_minutes(&self) -> usize {
        60 * (self.cutoff_hour.saturating_sub(self.start_hour)) as usize
    }

    /// Rows to skip after the header of a measurement file.
    pub fn leading_rows(&self) -> usize {
        60 * self.start_hour as usize
    }

    /// Checks every invariant the driver relies on.
    pub fn validate(&self) -> Result<(), TesError> {
        if self.end_hour <= self.start_hour {
            return Err(TesError::Configuration(format!(
                "end_hour ({}) must be after start_hour ({})",
                self.end_hour, self.start_hour
            )));
        }
        if self.cutoff_hour <= self.end_hour {
            return Err(TesError::Configuration(format!(
                "cutoff_hour ({}) must be after end_hour ({})",
                self.cutoff_hour, self.end_hour
            )));
        }
        if self.cutoff_hour > 24 {
            return Err(TesError::Configuration(format!(
                "cutoff_hour ({}) is past the end of the day",
                self.cutoff_hour
            )));
        }
        if self.data_folders.is_empty() {
            return Err(TesError::Configuration("data_folders is empty".to_string()));
        }
        if self.cloud_conditions.is_empty() {
            return Err(TesError::Configuration("no cloud conditions configured".to_string()));
        }
        for cloud in &self.cloud_conditions {
            if !(cloud.factor > 0.0 && cloud.factor <= 1.0) {
                return Err(TesError::Configuration(format!(
                    "cloud factor for '{}' must be in (0, 1], got {}",
                    cloud.name, cloud.factor
                )));
            }
        }
        if self.regimens.is_empty() {
            return Err(TesError::Configuration("no regimens configured".to_string()));
        }
        for regimen in &self.regimens {
            if regimen.doses.len() != regimen.dose_labels.len() {
                return Err(TesError::Configuration(format!(
                    "regimen '{}' has {} doses but {} labels",
                    regimen.name,
                    regimen.doses.len(),
                    regimen.dose_labels.len()
                )));
            }
            if regimen.doses.iter().any(|d| !(*d > 0.0) || !d.is_finite()) {
                return Err(TesError::Configuration(format!(
                    "regimen '{}' has a non-positive dose",
                    regimen.name
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Parses and validates a configuration from TOML text.
pub fn parse_config(toml_str: &str, origin: &Path) -> Result<RunConfig, TesError> {
    let config: RunConfig = toml::from_str(toml_str).map_err(|e| TesError::ConfigFile {
        path: origin.to_path_buf(),
        message: e.to_string(),
    })?;
    config.validate()?;
    Ok(config)
}

/// Reads, parses and validates the configuration file at `path`.
pub fn load_config(path: &Path) -> Result<RunConfig, TesError> {
    let contents = std::fs::read_to_string(path).map_err(|e| TesError::ConfigFile {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_config(&contents, path)
}

/// Resolves the config path: explicit argument, then `TES_CONFIG` (a `.env`
/// file is honored), then `./tes.toml`.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    dotenv::dotenv().ok();
    std::env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IrradianceBand;

    const MINIMAL: &str = r#"
        start_hour = 7
        end_hour = 18
        cutoff_hour = 20
        data_root = "Data"
        data_folders = ["2015", "2016", "2017"]
        results_root = "Results"
    "#;

    fn base() -> RunConfig {
        RunConfig::new(7, 18, 20, "Data", vec!["2017".to_string()], "Results")
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse_config(MINIMAL, Path::new("tes.toml")).expect("minimal config is valid");
        assert_eq!(config.window_minutes(), 660);
        assert_eq!(config.search_minutes(), 780);
        assert_eq!(config.leading_rows(), 420);
        assert_eq!(config.missing_data, MissingDataPolicy::Abort);
        assert_eq!(config.measurement_column, 1);
        assert_eq!(config.flat_folders, vec!["2016"]);
        assert_eq!(config.regimens.len(), 2);
        assert_eq!(config.cloud_conditions.len(), 3);
    }

    #[test]
    fn test_custom_regimen_and_policy_parse() {
        let text = format!(
            "{}\nmissing_data = \"skip\"\n\
             [[regimens]]\nname = \"Test\"\nband = \"Ery\"\ndoses = [250.0]\n\
             dose_labels = [\"II\"]\nfile_prefix = \"Max\"\n",
            MINIMAL
        );
        let config = parse_config(&text, Path::new("tes.toml")).expect("custom config is valid");
        assert_eq!(config.missing_data, MissingDataPolicy::Skip);
        assert_eq!(config.regimens.len(), 1);
        assert_eq!(config.regimens[0].band, IrradianceBand::Erythemal);
    }

    #[test]
    fn test_shipped_config_matches_builtin_sets() {
        let config = parse_config(include_str!("../tes.toml"), Path::new("tes.toml"))
            .expect("shipped tes.toml is valid");
        assert_eq!(config.cloud_conditions, default_cloud_conditions());
        assert_eq!(config.regimens, default_regimens());
    }

    #[test]
    fn test_end_before_start_is_rejected() {
        let mut config = base();
        config.end_hour = 7;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, TesError::Configuration(_)), "got {:?}", err);
    }

    #[test]
    fn test_cutoff_not_after_end_is_rejected() {
        let mut config = base();
        config.cutoff_hour = 18;
        assert!(config.validate().is_err(), "cutoff == end must be rejected");
    }

    #[test]
    fn test_cutoff_past_midnight_is_rejected() {
        let mut config = base();
        config.cutoff_hour = 25;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_label_mismatch_is_rejected() {
        let mut config = base();
        config.regimens[0].dose_labels.pop();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cloud_factor_out_of_range_is_rejected() {
        let mut config = base();
        config.cloud_conditions[1].factor = 0.0;
        assert!(config.validate().is_err());
        config.cloud_conditions[1].factor = 1.2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_reports_file() {
        let err = parse_config("start_hour = ", Path::new("broken.toml")).unwrap_err();
        assert!(err.to_string().contains("broken.toml"), "error should name the file: {}", err);
    }

    #[test]
    fn test_explicit_path_wins() {
        let path = resolve_config_path(Some(Path::new("/tmp/other.toml")));
        assert_eq!(path, PathBuf::from("/tmp/other.toml"));
    }
}
