//! Solar exposure time (TES) batch service.
//!
//! Computes, for every therapy regimen, dose level and sky condition, the
//! minutes of sun needed to reach the dose, pooled over a multi-year archive
//! of per-minute UV irradiance from many stations.
//!
//! Modules:
//! - `model`   : shared types and the error enum.
//! - `calendar`: 365-slot day-of-year calendar and table labels.
//! - `config`  : TOML run parameters and validation.
//! - `analysis`: dose integration, day accumulation, averaging, gap filling.
//! - `ingest`  : station archive access (dates and irradiance series).
//! - `output`  : result table sinks.
//! - `driver`  : regimen × cloud × dose orchestration.
//! - `verify`  : archive completeness checks.
//! - `logging` : console/file logger.

pub mod analysis;
pub mod calendar;
pub mod config;
pub mod driver;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod output;
pub mod verify;
