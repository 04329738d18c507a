//! Averaging and gap filling.
//!
//! Pipeline for one (regimen, dose, cloud) tuple:
//!
//! 1. `reduce`: accumulator → per-cell mean, `floor(sum / count) + 1`.
//!    Cells without observations stay `None`.
//! 2. `monthly_means` / `all_time_means`: the same biased mean over the
//!    present cells of each month, and of the whole year, per start minute.
//! 3. `gap_fill`: each `None` cell takes its month's mean, else the
//!    all-time mean. Never skips a level.
//!
//! The `+ 1` after the integer division is part of the published tables and
//! applies at every level.

use crate::analysis::accumulator::DoseAccumulator;
use crate::calendar::month_table;
use crate::model::{DAYS_PER_YEAR, MONTHS_PER_YEAR};

/// Integer mean with the +1 rounding bias. `None` when `count` is zero.
pub fn biased_mean(sum: u64, count: u64) -> Option<u32> {
    if count == 0 {
        None
    } else {
        Some((sum / count + 1) as u32)
    }
}

// ---------------------------------------------------------------------------
// Result matrix
// ---------------------------------------------------------------------------

/// Minutes-to-threshold by (start minute, day-of-year). `None` marks a cell
/// with no data.
#[derive(Debug, Clone, PartialEq)]
pub struct TesMatrix {
    window_minutes: usize,
    cells: Vec<Option<u32>>,
}

impl TesMatrix {
    pub fn new(window_minutes: usize) -> Self {
        TesMatrix {
            window_minutes,
            cells: vec![None; window_minutes * DAYS_PER_YEAR],
        }
    }

    pub fn window_minutes(&self) -> usize {
        self.window_minutes
    }

    pub fn get(&self, minute: usize, day: usize) -> Option<u32> {
        self.cells[minute * DAYS_PER_YEAR + day]
    }

    pub fn set(&mut self, minute: usize, day: usize, value: Option<u32>) {
        self.cells[minute * DAYS_PER_YEAR + day] = value;
    }

    /// All 365 day cells for one start minute.
    pub fn row(&self, minute: usize) -> &[Option<u32>] {
        let start = minute * DAYS_PER_YEAR;
        &self.cells[start..start + DAYS_PER_YEAR]
    }

    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_none()).count()
    }
}

/// Mean per (start minute, month).
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyMeans {
    cells: Vec<Option<u32>>,
}

impl MonthlyMeans {
    pub fn get(&self, minute: usize, month: usize) -> Option<u32> {
        self.cells[minute * MONTHS_PER_YEAR + month]
    }
}

/// Mean per start minute over the whole year.
#[derive(Debug, Clone, PartialEq)]
pub struct AllTimeMeans {
    cells: Vec<Option<u32>>,
}

impl AllTimeMeans {
    pub fn get(&self, minute: usize) -> Option<u32> {
        self.cells[minute]
    }
}

// ---------------------------------------------------------------------------
// Reductions
// ---------------------------------------------------------------------------

/// Divides every accumulated cell by its count.
pub fn reduce(accumulator: DoseAccumulator) -> TesMatrix {
    let window = accumulator.window_minutes();
    let mut matrix = TesMatrix::new(window);
    for minute in 0..window {
        for day in 0..DAYS_PER_YEAR {
            let total = accumulator.get(minute, day);
            matrix.set(minute, day, biased_mean(total.sum, total.count as u64));
        }
    }
    matrix
}

/// Per-month means over the cells that have data.
pub fn monthly_means(matrix: &TesMatrix) -> MonthlyMeans {
    let months = month_table();
    let window = matrix.window_minutes();
    let mut cells = Vec::with_capacity(window * MONTHS_PER_YEAR);

    for minute in 0..window {
        let mut sums = [0u64; MONTHS_PER_YEAR];
        let mut counts = [0u64; MONTHS_PER_YEAR];
        for (day, value) in matrix.row(minute).iter().enumerate() {
            if let Some(v) = value {
                sums[months[day]] += *v as u64;
                counts[months[day]] += 1;
            }
        }
        cells.extend((0..MONTHS_PER_YEAR).map(|m| biased_mean(sums[m], counts[m])));
    }
    MonthlyMeans { cells }
}

/// Whole-year means over the cells that have data.
pub fn all_time_means(matrix: &TesMatrix) -> AllTimeMeans {
    let cells = (0..matrix.window_minutes())
        .map(|minute| {
            let (sum, count) = matrix
                .row(minute)
                .iter()
                .flatten()
                .fold((0u64, 0u64), |(s, c), v| (s + *v as u64, c + 1));
            biased_mean(sum, count)
        })
        .collect();
    AllTimeMeans { cells }
}

// ---------------------------------------------------------------------------
// Gap filling
// ---------------------------------------------------------------------------

/// Counts of how each cell of a finished table was obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillStats {
    pub from_month: usize,
    pub from_all_time: usize,
    /// Cells with no data at any level.
    pub unfilled: usize,
}

/// Fills missing cells: month first, then all-time.
pub fn gap_fill(
    mut matrix: TesMatrix,
    monthly: &MonthlyMeans,
    all_time: &AllTimeMeans,
) -> (TesMatrix, FillStats) {
    let months = month_table();
    let mut stats = FillStats::default();

    for minute in 0..matrix.window_minutes() {
        for day in 0..DAYS_PER_YEAR {
            if matrix.get(minute, day).is_some() {
                continue;
            }
            let filled = match monthly.get(minute, months[day]) {
                Some(v) => {
                    stats.from_month += 1;
                    Some(v)
                }
                None => match all_time.get(minute) {
                    Some(v) => {
                        stats.from_all_time += 1;
                        Some(v)
                    }
                    None => {
                        stats.unfilled += 1;
                        None
                    }
                },
            };
            matrix.set(minute, day, filled);
        }
    }
    (matrix, stats)
}

/// Reduction, fallback means and gap filling in one step.
///
/// Fallbacks are computed from the reduced matrix before any cell is filled.
pub fn reduce_and_fill(accumulator: DoseAccumulator) -> (TesMatrix, FillStats) {
    let reduced = reduce(accumulator);
    let monthly = monthly_means(&reduced);
    let all_time = all_time_means(&reduced);
    gap_fill(reduced, &monthly, &all_time)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::month_of;

    #[test]
    fn test_biased_mean() {
        assert_eq!(biased_mean(12, 2), Some(7));
        assert_eq!(biased_mean(11, 2), Some(6));
        assert_eq!(biased_mean(5, 1), Some(6));
        assert_eq!(biased_mean(0, 0), None);
    }

    #[test]
    fn test_reduce_two_stations_same_day() {
        // 5 and 7 minutes on day 0 → floor(12 / 2) + 1 = 7.
        let mut acc = DoseAccumulator::new(1);
        acc.add_day(0, &[Some(5)]);
        acc.add_day(0, &[Some(7)]);
        let matrix = reduce(acc);
        assert_eq!(matrix.get(0, 0), Some(7));
        assert_eq!(matrix.get(0, 1), None, "days without data stay missing");
    }

    #[test]
    fn test_monthly_means_only_use_present_days() {
        let mut matrix = TesMatrix::new(1);
        matrix.set(0, 0, Some(10)); // January
        matrix.set(0, 1, Some(13)); // January
        matrix.set(0, 40, Some(20)); // February
        let monthly = monthly_means(&matrix);
        assert_eq!(monthly.get(0, 0), Some(12)); // floor(23 / 2) + 1
        assert_eq!(monthly.get(0, 1), Some(21));
        assert_eq!(monthly.get(0, 2), None, "March has no data");
    }

    #[test]
    fn test_all_time_mean_guards_empty_minute() {
        let mut matrix = TesMatrix::new(2);
        matrix.set(0, 100, Some(9));
        let all_time = all_time_means(&matrix);
        assert_eq!(all_time.get(0), Some(10));
        assert_eq!(all_time.get(1), None);
    }

    #[test]
    fn test_missing_day_takes_month_mean() {
        // Day 10 has no data; the rest of January averages to 12.
        let mut matrix = TesMatrix::new(1);
        matrix.set(0, 0, Some(11));
        matrix.set(0, 20, Some(11));
        let monthly = monthly_means(&matrix);
        let all_time = all_time_means(&matrix);
        assert_eq!(monthly.get(0, month_of(10).unwrap()), Some(12));

        let (filled, stats) = gap_fill(matrix, &monthly, &all_time);
        assert_eq!(filled.get(0, 10), Some(12));
        assert_eq!(filled.missing_count(), 0);
        assert_eq!(stats.from_month, 31 - 2);
    }

    #[test]
    fn test_empty_month_falls_back_to_all_time() {
        let mut matrix = TesMatrix::new(1);
        matrix.set(0, 0, Some(4)); // January only
        matrix.set(0, 1, Some(8));
        let (filled, stats) = gap_fill(
            matrix.clone(),
            &monthly_means(&matrix),
            &all_time_means(&matrix),
        );
        // January: floor(12 / 2) + 1 = 7. All-time: same cells → 7.
        assert_eq!(filled.get(0, 5), Some(7));
        // June has nothing, so the all-time mean is used.
        assert_eq!(filled.get(0, 160), Some(7));
        assert_eq!(stats.from_all_time, DAYS_PER_YEAR - 31);
    }

    #[test]
    fn test_month_level_is_never_skipped() {
        let mut matrix = TesMatrix::new(1);
        matrix.set(0, 0, Some(2)); // January mean 3
        matrix.set(0, 200, Some(40)); // July mean 41
        let (filled, _) = gap_fill(
            matrix.clone(),
            &monthly_means(&matrix),
            &all_time_means(&matrix),
        );
        assert_eq!(filled.get(0, 15), Some(3), "January gap uses January");
        assert_eq!(filled.get(0, 190), Some(41), "July gap uses July");
        assert_eq!(filled.get(0, 100), Some(22), "April uses floor(42 / 2) + 1");
    }

    #[test]
    fn test_gap_fill_is_idempotent() {
        let mut acc = DoseAccumulator::new(2);
        acc.add_day(3, &[Some(30), None]);
        acc.add_day(70, &[Some(10), Some(50)]);
        let reduced = reduce(acc);
        let monthly = monthly_means(&reduced);
        let all_time = all_time_means(&reduced);

        let (once, _) = gap_fill(reduced, &monthly, &all_time);
        let (twice, stats) = gap_fill(once.clone(), &monthly, &all_time);
        assert_eq!(once, twice);
        assert_eq!(stats, FillStats::default(), "second pass must change nothing");
    }

    #[test]
    fn test_minute_without_any_light_stays_unfilled() {
        let mut acc = DoseAccumulator::new(2);
        acc.add_day(0, &[Some(5), None]);
        let (matrix, stats) = reduce_and_fill(acc);
        // The bias applies again at the fallback level: floor(6 / 1) + 1.
        assert_eq!(matrix.get(0, 0), Some(6));
        assert_eq!(matrix.get(0, 300), Some(7));
        assert_eq!(matrix.get(1, 300), None);
        assert_eq!(stats.unfilled, DAYS_PER_YEAR);
    }
}
