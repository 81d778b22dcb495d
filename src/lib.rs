//! Small goal tracker. Goals get a target amount of hours, time is logged against them, and
//! progress is shown as per-goal totals and a date-indexed chart series.
//!

pub mod cli;
pub mod storage;
pub mod tracking;
pub mod utils;
