//! Instrument-specific clients.

pub mod eve;
pub mod sot;

pub use eve::EVEClient;
pub use sot::SOTClient;

use chrono::NaiveDate;

use crate::time::TimeRange;

/// False when the query's time range ends before `first_data`.
pub(crate) fn starts_in_time(range: &TimeRange, first_data: NaiveDate) -> bool {
    range.end().date() >= first_data
}
