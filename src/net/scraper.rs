use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;

use super::http::Fetch;
use super::listing::anchor_hrefs;
use super::NetError;
use crate::time::TimeRange;

/// Where an archive keeps its files and which listed links are wanted.
pub trait ListingLayout {
    /// URL of the directory listing holding the files for `day`.
    fn listing_url(&self, day: NaiveDate) -> String;

    /// File URL for `link`, found in the listing at `listing_url` while
    /// scanning `day`, if the link belongs to `range`.
    fn select(
        &self,
        listing_url: &str,
        day: NaiveDate,
        link: &str,
        range: &TimeRange,
    ) -> Option<String>;
}

/// Walks the calendar days of a range, fetching each distinct listing once
/// and keeping the links its layout selects.
pub struct DirectoryScraper<L> {
    layout: L,
    fetcher: Arc<dyn Fetch>,
}

impl<L: ListingLayout> DirectoryScraper<L> {
    pub fn new(layout: L, fetcher: Arc<dyn Fetch>) -> Self {
        Self { layout, fetcher }
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    /// File URLs for `range`, ordered by day then by listing order.
    ///
    /// Requests are sequential; the first failed fetch aborts the scan.
    pub fn file_urls(&self, range: &TimeRange) -> Result<Vec<String>, NetError> {
        let mut listings: HashMap<String, Vec<String>> = HashMap::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut urls = Vec::new();

        for day in range.days() {
            let listing_url = self.layout.listing_url(day);
            let links = match listings.entry(listing_url.clone()) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => {
                    log::debug!("Fetching listing {listing_url}");
                    let html = self.fetcher.get_text(&listing_url).map_err(|err| {
                        log::warn!("Listing {listing_url} failed: {err}");
                        err
                    })?;
                    e.insert(anchor_hrefs(&html))
                }
            };

            for link in links.iter() {
                if let Some(url) = self.layout.select(&listing_url, day, link, range) {
                    if seen.insert(url.clone()) {
                        urls.push(url);
                    }
                }
            }
        }

        log::debug!(
            "{} listing(s) scanned, {} file(s) kept for {range}",
            listings.len(),
            urls.len()
        );
        Ok(urls)
    }
}

/// `base` with exactly one trailing slash.
pub(crate) fn with_trailing_slash(base: &str) -> String {
    format!("{}/", base.trim_end_matches('/'))
}
