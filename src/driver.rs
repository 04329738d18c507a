//! Regimen driver: runs every (regimen, cloud, dose) tuple over the archive.
//!
//! Tables are emitted in regimen → cloud → dose order. Within one regimen
//! each station-day is read once and fed to the isolated accumulator of
//! every (cloud, dose) tuple; the accumulators never share state, so the
//! numbers are the same as scanning the archive once per tuple.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analysis::{integrate_day, reduce_and_fill, DoseAccumulator, FillStats};
use crate::calendar::token_to_day_of_year;
use crate::config::{MissingDataPolicy, RunConfig};
use crate::ingest::{DateListing, MeasurementSource};
use crate::logging::{self, Component};
use crate::model::{StationRef, TableId, TesError, TherapyRegimen};
use crate::output::ResultSink;

// ---------------------------------------------------------------------------
// Run summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub id: TableId,
    pub file_name: String,
    /// Station-day minutes that reached an observation.
    pub observations: u64,
    pub filled_from_month: usize,
    pub filled_from_all_time: usize,
    pub unfilled: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub tables: Vec<TableSummary>,
    /// Summed over regimens; each regimen reads its own band.
    pub station_days_read: usize,
    pub station_days_skipped: usize,
}

/// What one regimen pass contributed.
struct RegimenTally {
    read: usize,
    skipped: usize,
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

pub struct RegimenDriver<'a> {
    config: &'a RunConfig,
}

impl<'a> RegimenDriver<'a> {
    /// Fails with `Configuration` if the parameters are inconsistent.
    pub fn new(config: &'a RunConfig) -> Result<Self, TesError> {
        config.validate()?;
        Ok(RegimenDriver { config })
    }

    /// Computes and writes every table.
    pub fn run<A, S>(&self, archive: &A, sink: &mut S) -> Result<RunSummary, TesError>
    where
        A: DateListing + MeasurementSource,
        S: ResultSink,
    {
        let started_at = Utc::now();
        let mut tables = Vec::new();
        let mut read = 0;
        let mut skipped = 0;

        for regimen in &self.config.regimens {
            logging::info(
                Component::Engine,
                None,
                &format!("Computing TES for {} ({} band)", regimen.name, regimen.band),
            );
            let mut accumulators = self.fresh_accumulators(regimen);
            let tally = self.accumulate_regimen(archive, regimen, &mut accumulators)?;
            read += tally.read;
            skipped += tally.skipped;

            for (cloud_index, per_dose) in accumulators.into_iter().enumerate() {
                logging::info(
                    Component::Engine,
                    None,
                    &format!("Sky condition {}", self.config.cloud_conditions[cloud_index].name),
                );
                for (dose_index, accumulator) in per_dose.into_iter().enumerate() {
                    let id = TableId {
                        regimen: regimen.name.clone(),
                        file_prefix: regimen.file_prefix.clone(),
                        dose_index,
                        dose_label: regimen.dose_labels[dose_index].clone(),
                        cloud_index,
                    };
                    tables.push(self.finish_table(id, accumulator, sink)?);
                }
            }
        }

        logging::log_run_summary(tables.len(), read, skipped);

        Ok(RunSummary {
            started_at,
            finished_at: Utc::now(),
            tables,
            station_days_read: read,
            station_days_skipped: skipped,
        })
    }

    /// One empty accumulator per (cloud, dose), indexed `[cloud][dose]`.
    fn fresh_accumulators(&self, regimen: &TherapyRegimen) -> Vec<Vec<DoseAccumulator>> {
        let window = self.config.window_minutes();
        self.config
            .cloud_conditions
            .iter()
            .map(|_| regimen.doses.iter().map(|_| DoseAccumulator::new(window)).collect())
            .collect()
    }

    fn accumulate_regimen<A>(
        &self,
        archive: &A,
        regimen: &TherapyRegimen,
        accumulators: &mut [Vec<DoseAccumulator>],
    ) -> Result<RegimenTally, TesError>
    where
        A: DateListing + MeasurementSource,
    {
        let window = self.config.window_minutes();
        let search = self.config.search_minutes();
        let mut tally = RegimenTally { read: 0, skipped: 0 };

        for folder in &self.config.data_folders {
            let stations = match self.tolerate_missing(archive.stations(folder), folder, "list stations")? {
                Some(stations) => stations,
                None => continue,
            };

            for station in &stations {
                let context = station.to_string();
                let dates = match self.tolerate_missing(archive.dates(station), &context, "read date list")? {
                    Some(dates) => dates,
                    None => continue,
                };

                for token in &dates {
                    let day = token_to_day_of_year(token)?;
                    let series = match self.load_series(archive, station, token, regimen)? {
                        Some(series) => series,
                        None => {
                            tally.skipped += 1;
                            continue;
                        }
                    };
                    tally.read += 1;

                    for (cloud, per_dose) in self.config.cloud_conditions.iter().zip(accumulators.iter_mut()) {
                        for (dose, accumulator) in regimen.doses.iter().zip(per_dose.iter_mut()) {
                            let results = integrate_day(series.values(), *dose, cloud.factor, window, search);
                            accumulator.add_day(day, &results);
                        }
                    }
                }
            }
        }

        Ok(tally)
    }

    fn load_series<A: MeasurementSource>(
        &self,
        archive: &A,
        station: &StationRef,
        token: &str,
        regimen: &TherapyRegimen,
    ) -> Result<Option<crate::model::IrradianceSeries>, TesError> {
        let context = station.to_string();
        let operation = format!("load {} {}", token, regimen.band);
        self.tolerate_missing(archive.series(station, token, regimen.band), &context, &operation)
    }

    /// Applies the missing-data policy. `Ok(None)` means skip and carry on.
    ///
    /// Only skipped failures are logged here; a propagated error is reported
    /// once by the caller.
    fn tolerate_missing<T>(
        &self,
        result: Result<T, TesError>,
        context: &str,
        operation: &str,
    ) -> Result<Option<T>, TesError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_missing_data() && self.config.missing_data == MissingDataPolicy::Skip => {
                logging::log_archive_failure(context, operation, &err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn finish_table<S: ResultSink>(
        &self,
        id: TableId,
        accumulator: DoseAccumulator,
        sink: &mut S,
    ) -> Result<TableSummary, TesError> {
        let observations = accumulator.observation_count();
        let (table, stats): (_, FillStats) = reduce_and_fill(accumulator);

        if stats.unfilled > 0 {
            logging::warn(
                Component::Engine,
                Some(&id.file_name()),
                &format!("{} cells have no data at any level", stats.unfilled),
            );
        }

        sink.write_table(&id, &table, self.config.start_hour)?;

        Ok(TableSummary {
            file_name: id.file_name(),
            id,
            observations,
            filled_from_month: stats.from_month,
            filled_from_all_time: stats.from_all_time,
            unfilled: stats.unfilled,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
