//! Day-of-year accumulation of minutes-to-threshold.
//!
//! One `DoseAccumulator` exists per (regimen, dose, cloud) tuple. Each
//! station-day adds its per-minute results into the slot for its day-of-year;
//! sums and counts are plain additions, so contribution order never matters.

use crate::model::DAYS_PER_YEAR;

/// Running total for one (start minute, day-of-year) cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellTotal {
    pub sum: u64,
    pub count: u32,
}

/// Sum and count of minutes-to-threshold, keyed by (start minute, day).
#[derive(Debug, Clone, PartialEq)]
pub struct DoseAccumulator {
    window_minutes: usize,
    cells: Vec<CellTotal>,
}

impl DoseAccumulator {
    pub fn new(window_minutes: usize) -> Self {
        DoseAccumulator {
            window_minutes,
            cells: vec![CellTotal::default(); window_minutes * DAYS_PER_YEAR],
        }
    }

    pub fn window_minutes(&self) -> usize {
        self.window_minutes
    }

    fn index(&self, minute: usize, day: usize) -> usize {
        debug_assert!(minute < self.window_minutes && day < DAYS_PER_YEAR);
        minute * DAYS_PER_YEAR + day
    }

    /// Records one observation.
    pub fn add(&mut self, minute: usize, day: usize, minutes_to_threshold: u32) {
        let idx = self.index(minute, day);
        let cell = &mut self.cells[idx];
        cell.sum += minutes_to_threshold as u64;
        cell.count += 1;
    }

    /// Adds a whole station-day. `None` entries leave their cell untouched.
    ///
    /// Returns the number of observations recorded. Entries past the window
    /// are ignored.
    pub fn add_day(&mut self, day: usize, results: &[Option<u32>]) -> usize {
        let mut recorded = 0;
        for (minute, result) in results.iter().take(self.window_minutes).enumerate() {
            if let Some(minutes) = result {
                self.add(minute, day, *minutes);
                recorded += 1;
            }
        }
        recorded
    }

    pub fn get(&self, minute: usize, day: usize) -> CellTotal {
        self.cells[self.index(minute, day)]
    }

    /// Folds another accumulator of the same window into this one.
    pub fn merge(&mut self, other: &DoseAccumulator) {
        assert_eq!(
            self.window_minutes, other.window_minutes,
            "cannot merge accumulators with different windows"
        );
        for (mine, theirs) in self.cells.iter_mut().zip(&other.cells) {
            mine.sum += theirs.sum;
            mine.count += theirs.count;
        }
    }

    /// Total observations across every cell.
    pub fn observation_count(&self) -> u64 {
        self.cells.iter().map(|c| c.count as u64).sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
