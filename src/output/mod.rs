//! Result table sinks.
//!
//! Submodules:
//! - `csv_table`: writes each finished table as a CSV file.

pub mod csv_table;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::analysis::TesMatrix;
use crate::model::{TableId, TesError};

pub use csv_table::CsvTableSink;

/// Receives one completed (regimen, dose, cloud) table at a time.
pub trait ResultSink {
    /// `start_hour` labels the rows.
    fn write_table(
        &mut self,
        id: &TableId,
        table: &TesMatrix,
        start_hour: u32,
    ) -> Result<(), TesError>;
}

/// Creates the results directory. An existing directory is not an error.
pub fn ensure_results_dir(path: &Path) -> Result<(), TesError> {
    match fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(TesError::Io { path: path.to_path_buf(), source: e }),
    }
}
