//! Archive Verification Module
//!
//! Walks the configured year folders and stations and checks that every
//! listed date has a readable measurement file for each band the configured
//! regimens need. Run this before a long batch to see which stations would
//! trip the missing-data policy.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::config::RunConfig;
use crate::ingest::{DateListing, MeasurementSource};
use crate::logging::{self, Component};
use crate::model::{IrradianceBand, StationRef, TesError};

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub stations: Vec<StationVerification>,
    pub summary: VerificationSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub stations_total: usize,
    pub stations_complete: usize,
    pub stations_partial: usize,
    pub stations_failed: usize,
    pub station_days_listed: usize,
    pub files_missing: usize,
    pub files_unreadable: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationVerification {
    pub folder: String,
    pub station: String,
    pub status: VerificationStatus,
    pub dates_listed: usize,
    /// `<date><band>` for every absent measurement file.
    pub missing_files: Vec<String>,
    /// Files present but short, malformed or with a bad date token.
    pub unreadable_files: Vec<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VerificationStatus {
    Success,
    PartialSuccess,
    Failed,
}

// ============================================================================
// Station Verification
// ============================================================================

/// Checks one station's date list and measurement files.
pub fn verify_station<A>(
    archive: &A,
    station: &StationRef,
    bands: &[IrradianceBand],
) -> StationVerification
where
    A: DateListing + MeasurementSource,
{
    let mut result = StationVerification {
        folder: station.folder.clone(),
        station: station.name.clone(),
        status: VerificationStatus::Failed,
        dates_listed: 0,
        missing_files: Vec::new(),
        unreadable_files: Vec::new(),
        error_message: None,
    };

    let dates = match archive.dates(station) {
        Ok(dates) => dates,
        Err(e) => {
            result.error_message = Some(e.to_string());
            return result;
        }
    };
    result.dates_listed = dates.len();

    for token in &dates {
        if let Err(e) = crate::calendar::parse_date_token(token) {
            result.unreadable_files.push(token.clone());
            result.error_message.get_or_insert_with(|| e.to_string());
            continue;
        }
        for band in bands {
            match archive.series(station, token, *band) {
                Ok(_) => {}
                Err(TesError::MissingData { .. }) => {
                    result.missing_files.push(format!("{}{}", token, band));
                }
                Err(e) => {
                    result.unreadable_files.push(format!("{}{}", token, band));
                    result.error_message.get_or_insert_with(|| e.to_string());
                }
            }
        }
    }

    let problems = result.missing_files.len() + result.unreadable_files.len();
    result.status = if dates.is_empty() {
        VerificationStatus::Failed
    } else if problems == 0 {
        VerificationStatus::Success
    } else if problems < dates.len() * bands.len().max(1) {
        VerificationStatus::PartialSuccess
    } else {
        VerificationStatus::Failed
    };

    result
}

// ============================================================================
// Full Verification Runner
// ============================================================================

/// Bands used by the configured regimens, each once.
pub fn required_bands(config: &RunConfig) -> Vec<IrradianceBand> {
    let mut seen = BTreeSet::new();
    config
        .regimens
        .iter()
        .map(|r| r.band)
        .filter(|band| seen.insert(band.file_tag()))
        .collect()
}

pub fn run_full_verification<A>(config: &RunConfig, archive: &A) -> VerificationReport
where
    A: DateListing + MeasurementSource,
{
    let bands = required_bands(config);
    let mut report = VerificationReport {
        timestamp: Utc::now().to_rfc3339(),
        stations: Vec::new(),
        summary: VerificationSummary::default(),
    };

    for folder in &config.data_folders {
        println!("🔍 Verifying folder {}...", folder);
        let stations = match archive.stations(folder) {
            Ok(stations) => stations,
            Err(e) => {
                logging::log_archive_failure(folder, "list stations", &e);
                report.stations.push(StationVerification {
                    folder: folder.clone(),
                    station: String::new(),
                    status: VerificationStatus::Failed,
                    dates_listed: 0,
                    missing_files: Vec::new(),
                    unreadable_files: Vec::new(),
                    error_message: Some(e.to_string()),
                });
                report.summary.stations_total += 1;
                report.summary.stations_failed += 1;
                continue;
            }
        };

        for station in &stations {
            print!("  {} ... ", station);
            let result = verify_station(archive, station, &bands);

            match result.status {
                VerificationStatus::Success => {
                    println!("✓ OK ({} dates)", result.dates_listed);
                    report.summary.stations_complete += 1;
                }
                VerificationStatus::PartialSuccess => {
                    println!(
                        "⚠ Partial ({} missing, {} unreadable)",
                        result.missing_files.len(),
                        result.unreadable_files.len()
                    );
                    report.summary.stations_partial += 1;
                }
                VerificationStatus::Failed => {
                    println!("✗ FAILED: {}", result.error_message.as_deref().unwrap_or("no usable dates"));
                    report.summary.stations_failed += 1;
                }
            }

            report.summary.stations_total += 1;
            report.summary.station_days_listed += result.dates_listed;
            report.summary.files_missing += result.missing_files.len();
            report.summary.files_unreadable += result.unreadable_files.len();
            report.stations.push(result);
        }
    }

    report
}

/// Writes the report as pretty JSON.
pub fn save_report(report: &VerificationReport, path: &Path) -> Result<(), TesError> {
    let json = serde_json::to_string_pretty(report).map_err(|e| TesError::Io {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    std::fs::write(path, json).map_err(|e| TesError::from_io(path, e))?;
    logging::info(Component::System, None, &format!("Report saved to {}", path.display()));
    Ok(())
}

pub fn print_summary(report: &VerificationReport) {
    let s = &report.summary;
    println!("\n═══════════════════════════════════════════════════════════");
    println!("📊 ARCHIVE VERIFICATION SUMMARY");
    println!("═══════════════════════════════════════════════════════════");
    println!();
    println!("Stations:        {}/{} complete  ({} partial, {} failed)",
        s.stations_complete, s.stations_total, s.stations_partial, s.stations_failed);
    println!("Station-days:    {}", s.station_days_listed);
    println!("Missing files:   {}", s.files_missing);
    println!("Unreadable:      {}", s.files_unreadable);
    println!();

    let usable = s.stations_complete + s.stations_partial;
    let rate = if s.stations_total > 0 {
        (usable as f64 / s.stations_total as f64) * 100.0
    } else {
        0.0
    };

    println!("Usable Stations: {:.1}% ({}/{})", rate, usable, s.stations_total);
    println!("═══════════════════════════════════════════════════════════");
}

// ============================================================================
// Tests
// ============================================================================
