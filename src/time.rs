use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

/// Date-time layouts seen in solar headers and archive queries.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
    "%Y%m%dT%H%M%S",
    "%Y%m%d_%H%M%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    #[error("unrecognised time string {0:?}")]
    Parse(String),

    #[error("time range starts at {start} which is after its end {end}")]
    Reversed {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

/// Parse a time string in any of the common solar formats. Date-only
/// strings resolve to midnight; a trailing `Z` is ignored.
pub fn parse_time(s: &str) -> Result<NaiveDateTime, TimeError> {
    let trimmed = s.trim().trim_end_matches('Z');
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| TimeError::Parse(s.to_string()))
}

// ---------------------------------------------------------------------------
// TimeRange
// ---------------------------------------------------------------------------

/// Inclusive `[start, end]` interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, TimeError> {
        if start > end {
            return Err(TimeError::Reversed { start, end });
        }
        Ok(Self { start, end })
    }

    /// Build a range from two time strings, e.g. `("2016/1/1", "2016/1/2")`.
    pub fn parse(start: &str, end: &str) -> Result<Self, TimeError> {
        Self::new(parse_time(start)?, parse_time(end)?)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t <= self.end
    }

    /// Every calendar day from the start date to the end date, inclusive.
    pub fn days(&self) -> Vec<NaiveDate> {
        let last = self.end.date();
        self.start
            .date()
            .iter_days()
            .take_while(|d| *d <= last)
            .collect()
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_and_query_formats() {
        let expected = NaiveDate::from_ymd_opt(2016, 1, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        for s in [
            "2016-01-01T12:30:00",
            "2016-01-01 12:30:00.000",
            "2016/01/01 12:30",
            "2016-01-01T12:30:00Z",
            "20160101_123000",
        ] {
            assert_eq!(parse_time(s).unwrap(), expected, "{s}");
        }
        assert_eq!(
            parse_time("2016/1/2").unwrap().to_string(),
            "2016-01-02 00:00:00"
        );
        assert!(matches!(parse_time("yesterday"), Err(TimeError::Parse(_))));
    }

    #[test]
    fn days_are_inclusive_of_both_ends() {
        let range = TimeRange::parse("2015-12-31 23:00", "2016-01-02 00:10").unwrap();
        let days: Vec<String> = range.days().iter().map(|d| d.to_string()).collect();
        assert_eq!(days, ["2015-12-31", "2016-01-01", "2016-01-02"]);
    }

    #[test]
    fn rejects_reversed_range() {
        assert!(matches!(
            TimeRange::parse("2016-01-02", "2016-01-01"),
            Err(TimeError::Reversed { .. })
        ));
    }

    #[test]
    fn contains_is_inclusive() {
        let range = TimeRange::parse("2016-01-01 00:00", "2016-01-01 01:00").unwrap();
        assert!(range.contains(range.start()));
        assert!(range.contains(range.end()));
        assert!(!range.contains(parse_time("2016-01-01T01:00:01").unwrap()));
    }
}
