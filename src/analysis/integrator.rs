//! Dose integration: minutes of exposure until a dose target is reached.
//!
//! For a start minute `s`, irradiance is summed minute by minute
//! (`value × 60 s × cloud factor`) until the dose target is met or the
//! search horizon runs out. Three outcomes:
//!
//! | situation                               | result                        |
//! |-----------------------------------------|-------------------------------|
//! | no light at all before stopping         | `None` (no observation)       |
//! | target crossed at minute `i`            | `Some(i + 1 - s)`             |
//! | horizon exhausted, some light seen      | `Some(search_minutes - s)`    |
//!
//! Zero-valued minutes add nothing but do not stop the search.

use crate::model::SECONDS_PER_SAMPLE;

/// Minutes of exposure needed from `start_minute` to reach `dose_target`.
///
/// `series` holds per-minute irradiance beginning at the start hour. The scan
/// covers minutes `start_minute..search_minutes - 1`; minutes missing from a
/// short series count as no light.
pub fn integrate(
    series: &[f64],
    dose_target: f64,
    cloud_factor: f64,
    start_minute: usize,
    search_minutes: usize,
) -> Option<u32> {
    let horizon = search_minutes.saturating_sub(1);
    let mut dose = 0.0;

    for i in start_minute..horizon {
        let irradiance = series.get(i).copied().unwrap_or(0.0);
        if irradiance != 0.0 {
            dose += irradiance * SECONDS_PER_SAMPLE * cloud_factor;
        }
        if dose >= dose_target {
            return Some((i + 1 - start_minute) as u32);
        }
    }

    if dose == 0.0 {
        None
    } else {
        Some(search_minutes.saturating_sub(start_minute) as u32)
    }
}

/// Runs `integrate` for every start minute of the reporting window.
///
/// The returned vector has exactly `window_minutes` entries.
pub fn integrate_day(
    series: &[f64],
    dose_target: f64,
    cloud_factor: f64,
    window_minutes: usize,
    search_minutes: usize,
) -> Vec<Option<u32>> {
    (0..window_minutes)
        .map(|start| integrate(series, dose_target, cloud_factor, start, search_minutes))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
