//! Exposure-time computation for the TES service.
//!
//! This module holds all the arithmetic; it never touches the filesystem.
//!
//! Submodules:
//! - `integrator` : minutes to reach a dose from every start minute of a day.
//! - `accumulator`: pools station-day results by day-of-year.
//! - `reduction`  : biased means, monthly/all-time fallbacks, gap filling.

pub mod accumulator;
pub mod integrator;
pub mod reduction;

pub use accumulator::{CellTotal, DoseAccumulator};
pub use integrator::{integrate, integrate_day};
pub use reduction::{reduce_and_fill, FillStats, TesMatrix};
