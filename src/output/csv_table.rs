//! CSV result tables.
//!
//! One file per (regimen, dose, cloud) tuple, named
//! `<prefix>_<dose label>_<cloud index>.csv`:
//!
//! ```text
//! Hour,01-01,01-02,...,12-31
//! 07:00,14.00,14.00,...,15.00
//! ...
//! ```

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::analysis::TesMatrix;
use crate::calendar::{hh_mm_label, mm_dd_label};
use crate::logging::{self, Component};
use crate::model::{DAYS_PER_YEAR, TableId, TesError};
use crate::output::ResultSink;

/// Written for cells that no fallback level could fill.
const UNFILLED_CELL: &str = "0.00";

/// Writes tables under a results directory.
#[derive(Debug, Clone)]
pub struct CsvTableSink {
    results_root: PathBuf,
    written: Vec<PathBuf>,
}

impl CsvTableSink {
    pub fn new(results_root: &Path) -> Self {
        CsvTableSink {
            results_root: results_root.to_path_buf(),
            written: Vec::new(),
        }
    }

    pub fn table_path(&self, id: &TableId) -> PathBuf {
        self.results_root.join(id.file_name())
    }

    /// Files written so far, in write order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl ResultSink for CsvTableSink {
    fn write_table(
        &mut self,
        id: &TableId,
        table: &TesMatrix,
        start_hour: u32,
    ) -> Result<(), TesError> {
        let path = self.table_path(id);
        let file = File::create(&path).map_err(|e| TesError::from_io(&path, e))?;
        write_table_to(file, table, start_hour)?;

        logging::debug(
            Component::Sink,
            Some(&id.file_name()),
            &format!("wrote {} rows", table.window_minutes()),
        );
        self.written.push(path);
        Ok(())
    }
}

/// Serializes a table: header row, then one `HH:MM` row per window minute.
pub fn write_table_to<W: Write>(
    writer: W,
    table: &TesMatrix,
    start_hour: u32,
) -> Result<(), TesError> {
    let mut writer = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(DAYS_PER_YEAR + 1);
    header.push("Hour".to_string());
    for day in 0..DAYS_PER_YEAR {
        header.push(mm_dd_label(day)?);
    }
    writer.write_record(&header)?;

    let mut record = Vec::with_capacity(DAYS_PER_YEAR + 1);
    for minute in 0..table.window_minutes() {
        record.clear();
        record.push(hh_mm_label(start_hour, minute));
        record.extend(table.row(minute).iter().map(|cell| match cell {
            Some(minutes) => format!("{:.2}", *minutes as f64),
            None => UNFILLED_CELL.to_string(),
        }));
        writer.write_record(&record)?;
    }

    writer.flush().map_err(|e| TesError::Io {
        path: PathBuf::from("<csv writer>"),
        source: e,
    })?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
