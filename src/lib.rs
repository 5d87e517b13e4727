//! Solar map sequences and instrument archive scrapers.
//!
//! * [`map`] – observations with headers and masks, and [`map::MapSequence`]
//!   for shape/mask checks and `(rows, cols, N)` stacking.
//! * [`net`] – directory-listing clients that find archive files for a
//!   time range and instrument query.

pub mod config;
pub mod map;
pub mod net;
pub mod time;
