//! Goals, time entries and everything derived from them.
//!
//! [aggregation] and [chart] are pure functions over a snapshot of entries, they never fail and
//! never cache. [lifecycle] is the only place that writes, and the only place input is validated.

pub mod aggregation;
pub mod chart;
pub mod entities;
pub mod errors;
pub mod lifecycle;
