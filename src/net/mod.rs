/// Archive retrieval: query attributes, listing scrapers and clients.
///
/// ```text
///   [QueryAttr]
///        │
///        ▼
///   ┌────────────────┐   can_handle_query
///   │ ClientRegistry  │ ─────────────────► matching clients
///   └────────────────┘
///        │ search
///        ▼
///   ┌──────────────────┐   one GET per listing   ┌───────┐
///   │ DirectoryScraper  │ ──────────────────────► │ Fetch │
///   └──────────────────┘                          └───────┘
///        │ anchor hrefs → ListingLayout::select
///        ▼
///   QueryResponse (file URLs + instrument metadata) → CSV
/// ```

pub mod attrs;
pub mod client;
pub mod http;
pub mod listing;
pub mod registry;
pub mod scraper;
pub mod sources;

pub use attrs::{AttrKind, Level, QueryAttr};
pub use client::{write_csv, QueryMetadata, QueryResponse, QueryResponseRow, RetrievalClient};
pub use http::{Fetch, HttpFetcher, MemoryFetcher};
pub use registry::ClientRegistry;
pub use scraper::{DirectoryScraper, ListingLayout};
pub use sources::{EVEClient, SOTClient};

use crate::time::TimeError;

/// Errors raised while querying archives.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error(transparent)]
    Time(#[from] TimeError),

    #[error("query has no time range")]
    MissingTime,

    #[error("no client can handle the query")]
    NoMatchingClient,

    #[error("writing CSV failed")]
    Csv(#[from] csv::Error),
}
