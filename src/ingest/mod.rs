//! Access to the station measurement archive.
//!
//! The driver only sees two small traits; where files live, and which year
//! folders have per-station subdirectories, is the archive's business.
//!
//! Submodules:
//! - `tuv`: the on-disk archive of TUV model output text files.

pub mod tuv;

use crate::model::{IrradianceBand, IrradianceSeries, StationRef, TesError};

/// Enumerates stations and the dates each one has measurements for.
pub trait DateListing {
    /// Stations of one year folder, in a stable order.
    fn stations(&self, folder: &str) -> Result<Vec<StationRef>, TesError>;

    /// `yymmdd` tokens listed for a station, in file order.
    fn dates(&self, station: &StationRef) -> Result<Vec<String>, TesError>;
}

/// Loads the irradiance series of one station-day.
pub trait MeasurementSource {
    /// Per-minute irradiance from the start hour, at least `search_minutes`
    /// long. A missing file is `TesError::MissingData`.
    fn series(
        &self,
        station: &StationRef,
        date_token: &str,
        band: IrradianceBand,
    ) -> Result<IrradianceSeries, TesError>;
}

pub use tuv::TuvArchive;
