use std::sync::Arc;

use super::attrs::QueryAttr;
use super::client::{QueryResponse, RetrievalClient};
use super::http::{Fetch, HttpFetcher};
use super::sources::{EVEClient, SOTClient};
use super::NetError;
use crate::config::RetrievalConfig;

/// Picks the clients able to serve a query and runs them.
#[derive(Default)]
pub struct ClientRegistry {
    clients: Vec<Box<dyn RetrievalClient>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// SOT and EVE clients over blocking HTTP.
    pub fn with_default_clients(config: &RetrievalConfig) -> Result<Self, NetError> {
        let fetcher: Arc<dyn Fetch> = Arc::new(HttpFetcher::new(config)?);
        Ok(Self::with_fetcher(fetcher, config))
    }

    /// SOT and EVE clients over any fetcher.
    pub fn with_fetcher(fetcher: Arc<dyn Fetch>, config: &RetrievalConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SOTClient::new(Arc::clone(&fetcher), config)));
        registry.register(Box::new(EVEClient::new(fetcher, config)));
        registry
    }

    pub fn register(&mut self, client: Box<dyn RetrievalClient>) {
        self.clients.push(client);
    }

    pub fn clients(&self) -> impl Iterator<Item = &dyn RetrievalClient> {
        self.clients.iter().map(|c| c.as_ref())
    }

    /// Clients whose `can_handle_query` accepts `query`, in registration order.
    pub fn matching(&self, query: &[QueryAttr]) -> Vec<&dyn RetrievalClient> {
        self.clients()
            .filter(|c| c.can_handle_query(query))
            .collect()
    }

    /// One response per matching client. Any client error aborts the search.
    pub fn search(&self, query: &[QueryAttr]) -> Result<Vec<QueryResponse>, NetError> {
        let matching = self.matching(query);
        if matching.is_empty() {
            log::warn!("No client can handle {query:?}");
            return Err(NetError::NoMatchingClient);
        }
        matching.into_iter().map(|c| c.search(query)).collect()
    }
}
