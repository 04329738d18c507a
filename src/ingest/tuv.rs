//! On-disk TUV archive.
//!
//! Layout under `data_root`:
//!
//! ```text
//! <folder>/Stations/<station>/datos.txt
//! <folder>/Stations/<station>/ResultadosTUV/<yymmdd><band>mo.txt
//! <flat folder>/datos.txt
//! <flat folder>/ResultadosTUV/<yymmdd><band>mo.txt
//! ```
//!
//! `datos.txt` has a header row and one station-day per row, date token in
//! the first column. Measurement files have a header row followed by one row
//! per minute of the day, whitespace separated.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::RunConfig;
use crate::ingest::{DateListing, MeasurementSource};
use crate::model::{IrradianceBand, IrradianceSeries, StationRef, TesError};

pub const STATIONS_DIR: &str = "Stations";
pub const MEASUREMENTS_DIR: &str = "ResultadosTUV";
pub const DATE_LIST_FILE: &str = "datos.txt";

/// Filesystem-backed `DateListing` and `MeasurementSource`.
#[derive(Debug, Clone)]
pub struct TuvArchive {
    data_root: PathBuf,
    flat_folders: Vec<String>,
    leading_rows: usize,
    search_minutes: usize,
    column: usize,
}

impl TuvArchive {
    pub fn from_config(config: &RunConfig) -> Self {
        TuvArchive {
            data_root: config.data_root.clone(),
            flat_folders: config.flat_folders.clone(),
            leading_rows: config.leading_rows(),
            search_minutes: config.search_minutes(),
            column: config.measurement_column,
        }
    }

    fn is_flat(&self, folder: &str) -> bool {
        self.flat_folders.iter().any(|f| f == folder)
    }

    /// Directory holding `datos.txt` and `ResultadosTUV/` for a station.
    pub fn station_dir(&self, station: &StationRef) -> PathBuf {
        if station.is_implicit() {
            self.data_root.join(&station.folder)
        } else {
            self.data_root
                .join(&station.folder)
                .join(STATIONS_DIR)
                .join(&station.name)
        }
    }

    pub fn date_list_path(&self, station: &StationRef) -> PathBuf {
        self.station_dir(station).join(DATE_LIST_FILE)
    }

    pub fn measurement_path(
        &self,
        station: &StationRef,
        date_token: &str,
        band: IrradianceBand,
    ) -> PathBuf {
        self.station_dir(station)
            .join(MEASUREMENTS_DIR)
            .join(format!("{}{}mo.txt", date_token, band.file_tag()))
    }
}

impl DateListing for TuvArchive {
    fn stations(&self, folder: &str) -> Result<Vec<StationRef>, TesError> {
        if self.is_flat(folder) {
            return Ok(vec![StationRef::new(folder, "")]);
        }

        let dir = self.data_root.join(folder).join(STATIONS_DIR);
        let entries = fs::read_dir(&dir).map_err(|e| TesError::from_io(&dir, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TesError::from_io(&dir, e))?;
            let is_dir = entry
                .file_type()
                .map_err(|e| TesError::from_io(entry.path(), e))?
                .is_dir();
            if is_dir {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();

        Ok(names.iter().map(|name| StationRef::new(folder, name)).collect())
    }

    fn dates(&self, station: &StationRef) -> Result<Vec<String>, TesError> {
        let path = self.date_list_path(station);
        let text = fs::read_to_string(&path).map_err(|e| TesError::from_io(&path, e))?;
        Ok(parse_date_list(&text))
    }
}

impl MeasurementSource for TuvArchive {
    fn series(
        &self,
        station: &StationRef,
        date_token: &str,
        band: IrradianceBand,
    ) -> Result<IrradianceSeries, TesError> {
        let path = self.measurement_path(station, date_token, band);
        let text = fs::read_to_string(&path).map_err(|e| TesError::from_io(&path, e))?;
        let values = parse_measurements(
            &text,
            &path,
            self.leading_rows,
            self.search_minutes,
            self.column,
        )?;
        Ok(IrradianceSeries::new(values))
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// First column of every non-blank row after the header.
pub fn parse_date_list(text: &str) -> Vec<String> {
    text.lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().next())
        .map(String::from)
        .collect()
}

/// Reads `count` values of `column` after the header and `leading_rows` rows.
pub fn parse_measurements(
    text: &str,
    path: &Path,
    leading_rows: usize,
    count: usize,
    column: usize,
) -> Result<Vec<f64>, TesError> {
    let mut values = Vec::with_capacity(count);

    for (idx, line) in text.lines().enumerate().skip(1 + leading_rows) {
        if values.len() == count {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        let line_no = idx + 1;
        let field = line.split_whitespace().nth(column).ok_or_else(|| TesError::Parse {
            path: path.to_path_buf(),
            line: line_no,
            message: format!("no column {}", column),
        })?;
        let value: f64 = field.parse().map_err(|_| TesError::Parse {
            path: path.to_path_buf(),
            line: line_no,
            message: format!("'{}' is not a number", field),
        })?;
        values.push(value);
    }

    if values.len() < count {
        return Err(TesError::ShortSeries {
            path: path.to_path_buf(),
            expected: count,
            found: values.len(),
        });
    }
    Ok(values)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn archive() -> TuvArchive {
        let mut config = RunConfig::new(1, 2, 3, "/data", vec!["2017".to_string()], "/out");
        config.flat_folders = vec!["2016".to_string()];
        TuvArchive::from_config(&config)
    }

    #[test]
    fn test_paths_for_station_layout() {
        let archive = archive();
        let station = StationRef::new("2017", "CCA");
        assert_eq!(
            archive.date_list_path(&station),
            PathBuf::from("/data/2017/Stations/CCA/datos.txt")
        );
        assert_eq!(
            archive.measurement_path(&station, "170312", IrradianceBand::Uva),
            PathBuf::from("/data/2017/Stations/CCA/ResultadosTUV/170312UVAmo.txt")
        );
    }

    #[test]
    fn test_paths_for_flat_layout() {
        let archive = archive();
        let station = StationRef::new("2016", "");
        assert_eq!(
            archive.measurement_path(&station, "160101", IrradianceBand::Erythemal),
            PathBuf::from("/data/2016/ResultadosTUV/160101Erymo.txt")
        );
    }

    #[test]
    fn test_flat_folder_lists_one_implicit_station() {
        let stations = archive().stations("2016").expect("flat folder needs no disk access");
        assert_eq!(stations, vec![StationRef::new("2016", "")]);
    }

    #[test]
    fn test_parse_date_list_skips_header_and_blanks() {
        let text = "fecha ozono aod\n170101 300 0.2\n\n170102 310 0.3\n";
        assert_eq!(parse_date_list(text), vec!["170101", "170102"]);
    }

    #[test]
    fn test_parse_measurements_skips_header_and_leading_rows() {
        let text = "min value\n0 9.0\n1 9.0\n2 0.5\n3 0.7\n4 0.9\n";
        let values = parse_measurements(text, Path::new("x"), 2, 3, 1).unwrap();
        assert_eq!(values, vec![0.5, 0.7, 0.9]);
    }

    #[test]
    fn test_parse_measurements_stops_at_count() {
        let text = "h\n0 1\n1 2\n2 3\n";
        let values = parse_measurements(text, Path::new("x"), 0, 2, 1).unwrap();
        assert_eq!(values, vec![1.0, 2.0]);
    }

    #[test]
    fn test_parse_measurements_short_file() {
        let text = "h\n0 1\n";
        let err = parse_measurements(text, Path::new("x"), 0, 5, 1).unwrap_err();
        assert!(
            matches!(err, TesError::ShortSeries { expected: 5, found: 1, .. }),
            "got {:?}",
            err
        );
    }

    #[test]
    fn test_parse_measurements_reports_bad_value_line() {
        let text = "h\n0 1\n1 abc\n";
        match parse_measurements(text, Path::new("x"), 0, 2, 1) {
            Err(TesError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {:?}", other),
        }
    }
}
