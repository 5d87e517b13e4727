use std::io;

use serde::Serialize;

use super::attrs::QueryAttr;
use super::NetError;
use crate::time::TimeRange;

/// Descriptors attached to every result of a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryMetadata {
    pub source: String,
    pub instrument: String,
    pub physobs: String,
    pub provider: String,
}

impl QueryMetadata {
    pub fn new(source: &str, instrument: &str, physobs: &str, provider: &str) -> Self {
        Self {
            source: source.to_string(),
            instrument: instrument.to_string(),
            physobs: physobs.to_string(),
            provider: provider.to_string(),
        }
    }

    /// `(key, value)` pairs in a fixed order.
    pub fn entries(&self) -> [(&'static str, &str); 4] {
        [
            ("source", &self.source),
            ("instrument", &self.instrument),
            ("physobs", &self.physobs),
            ("provider", &self.provider),
        ]
    }
}

/// One file found by a client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponseRow {
    pub client: String,
    pub url: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub source: String,
    pub instrument: String,
    pub physobs: String,
    pub provider: String,
}

/// Results of one client for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
    pub client: String,
    pub rows: Vec<QueryResponseRow>,
}

impl QueryResponse {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.url.as_str())
    }
}

/// Write the rows of several responses as one CSV table with a header.
pub fn write_csv<W: io::Write>(responses: &[QueryResponse], out: W) -> Result<(), NetError> {
    let mut writer = csv::Writer::from_writer(out);
    for row in responses.iter().flat_map(|r| r.rows.iter()) {
        writer.serialize(row)?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// An archive scraper for one instrument.
pub trait RetrievalClient {
    fn name(&self) -> &'static str;

    /// File URLs whose timestamps fall in `range`.
    fn get_urls_for_timerange(&self, range: &TimeRange) -> Result<Vec<String>, NetError>;

    fn make_query_metadata(&self) -> QueryMetadata;

    /// Whether this client should serve `query`.
    fn can_handle_query(&self, query: &[QueryAttr]) -> bool;

    /// Time covered by a file this client returned, when the URL encodes it.
    fn time_for_url(&self, _url: &str) -> Option<TimeRange> {
        None
    }

    /// Run `query`: its time range selects the files, every row carries the
    /// client metadata.
    fn search(&self, query: &[QueryAttr]) -> Result<QueryResponse, NetError> {
        let range = query
            .iter()
            .find_map(QueryAttr::as_time)
            .ok_or(NetError::MissingTime)?;
        let urls = self.get_urls_for_timerange(range)?;
        log::info!("{}: {} file(s) for {range}", self.name(), urls.len());

        let meta = self.make_query_metadata();
        let rows = urls
            .into_iter()
            .map(|url| {
                let time = self.time_for_url(&url);
                QueryResponseRow {
                    client: self.name().to_string(),
                    start: time.map(|t| t.start().to_string()),
                    end: time.map(|t| t.end().to_string()),
                    url,
                    source: meta.source.clone(),
                    instrument: meta.instrument.clone(),
                    physobs: meta.physobs.clone(),
                    provider: meta.provider.clone(),
                }
            })
            .collect();

        Ok(QueryResponse {
            client: self.name().to_string(),
            rows,
        })
    }
}
