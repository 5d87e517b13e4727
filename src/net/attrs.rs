use std::fmt;

use crate::time::{TimeError, TimeRange};

/// One constraint of an archive query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryAttr {
    Time(TimeRange),
    Instrument(String),
    Level(Level),
    Source(String),
    Provider(String),
    Physobs(String),
}

/// The kind of a [`QueryAttr`], without its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttrKind {
    Time,
    Instrument,
    Level,
    Source,
    Provider,
    Physobs,
}

/// Processing level. Archives use both numbers and names such as `"0CS"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Level {
    Number(i64),
    Text(String),
}

impl Level {
    /// Numbers parse from text too; anything else is `None`.
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Level::Number(n) => Some(*n),
            Level::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl From<i64> for Level {
    fn from(n: i64) -> Self {
        Level::Number(n)
    }
}

impl From<&str> for Level {
    fn from(s: &str) -> Self {
        match s.trim().parse() {
            Ok(n) => Level::Number(n),
            Err(_) => Level::Text(s.to_string()),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Number(n) => write!(f, "{n}"),
            Level::Text(s) => write!(f, "{s}"),
        }
    }
}

impl QueryAttr {
    pub fn time(start: &str, end: &str) -> Result<Self, TimeError> {
        Ok(QueryAttr::Time(TimeRange::parse(start, end)?))
    }

    pub fn instrument(name: &str) -> Self {
        QueryAttr::Instrument(name.to_string())
    }

    pub fn level(level: impl Into<Level>) -> Self {
        QueryAttr::Level(level.into())
    }

    pub fn kind(&self) -> AttrKind {
        match self {
            QueryAttr::Time(_) => AttrKind::Time,
            QueryAttr::Instrument(_) => AttrKind::Instrument,
            QueryAttr::Level(_) => AttrKind::Level,
            QueryAttr::Source(_) => AttrKind::Source,
            QueryAttr::Provider(_) => AttrKind::Provider,
            QueryAttr::Physobs(_) => AttrKind::Physobs,
        }
    }

    pub fn as_time(&self) -> Option<&TimeRange> {
        match self {
            QueryAttr::Time(range) => Some(range),
            _ => None,
        }
    }
}
