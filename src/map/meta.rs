use std::fmt;

use indexmap::IndexMap;

// ---------------------------------------------------------------------------
// MetaValue – a single header card value
// ---------------------------------------------------------------------------

/// A dynamically-typed header value mirroring the FITS card types.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::String(s) => write!(f, "{s}"),
            MetaValue::Integer(i) => write!(f, "{i}"),
            MetaValue::Float(v) => write!(f, "{v}"),
            MetaValue::Bool(b) => write!(f, "{b}"),
            MetaValue::Null => write!(f, "<null>"),
        }
    }
}

impl MetaValue {
    /// Interpret the value as an `f64` (integers are widened).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetaValue::Float(v) => Some(*v),
            MetaValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        MetaValue::String(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        MetaValue::String(s)
    }
}

impl From<i64> for MetaValue {
    fn from(i: i64) -> Self {
        MetaValue::Integer(i)
    }
}

impl From<f64> for MetaValue {
    fn from(v: f64) -> Self {
        MetaValue::Float(v)
    }
}

impl From<bool> for MetaValue {
    fn from(b: bool) -> Self {
        MetaValue::Bool(b)
    }
}

// ---------------------------------------------------------------------------
// MetaDict – ordered, case-insensitive header
// ---------------------------------------------------------------------------

/// Observation header. Keys are stored lower-cased so `"INSTRUME"` and
/// `"instrume"` address the same card; insertion order is preserved.
///
/// Two headers are equal when they hold the same cards in the same order.
#[derive(Debug, Clone, Default)]
pub struct MetaDict {
    cards: IndexMap<String, MetaValue>,
}

impl PartialEq for MetaDict {
    fn eq(&self, other: &Self) -> bool {
        // IndexMap's own equality ignores order.
        self.cards.len() == other.cards.len() && self.cards.iter().eq(other.cards.iter())
    }
}

impl MetaDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a card, returning the previous value for that key.
    /// An existing key keeps its original position.
    pub fn insert(&mut self, key: &str, value: impl Into<MetaValue>) -> Option<MetaValue> {
        self.cards.insert(key.to_ascii_lowercase(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.cards.get(&key.to_ascii_lowercase())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(MetaValue::as_str)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(MetaValue::as_f64)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.cards.contains_key(&key.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Cards in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.cards.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cards.keys().map(String::as_str)
    }
}

impl<K: AsRef<str>, V: Into<MetaValue>> FromIterator<(K, V)> for MetaDict {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut meta = MetaDict::new();
        for (k, v) in iter {
            meta.insert(k.as_ref(), v);
        }
        meta
    }
}
