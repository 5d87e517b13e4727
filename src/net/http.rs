use std::collections::HashMap;
use std::time::Duration;

use super::NetError;
use crate::config::RetrievalConfig;

/// Source of listing pages.
pub trait Fetch: Send + Sync {
    /// GET `url` and return the body as text.
    fn get_text(&self, url: &str) -> Result<String, NetError>;
}

// ---------------------------------------------------------------------------
// Blocking HTTP
// ---------------------------------------------------------------------------

/// Blocking HTTP GET. No retries; a non-2xx status is an error.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(config: &RetrievalConfig) -> Result<Self, NetError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout_secs.map(Duration::from_secs))
            .build()
            .map_err(NetError::Client)?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn get_text(&self, url: &str) -> Result<String, NetError> {
        let http_err = |source| NetError::Http {
            url: url.to_string(),
            source,
        };

        let resp = self.client.get(url).send().map_err(http_err)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(NetError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        resp.text().map_err(http_err)
    }
}

// ---------------------------------------------------------------------------
// In-memory pages
// ---------------------------------------------------------------------------

/// Serves fixed pages by exact URL; anything else is a 404.
/// Used for offline mirrors and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    pages: HashMap<String, String>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }
}

impl Fetch for MemoryFetcher {
    fn get_text(&self, url: &str) -> Result<String, NetError> {
        self.pages.get(url).cloned().ok_or_else(|| NetError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}
