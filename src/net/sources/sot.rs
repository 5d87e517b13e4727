use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use super::starts_in_time;
use crate::config::RetrievalConfig;
use crate::net::attrs::QueryAttr;
use crate::net::client::{QueryMetadata, RetrievalClient};
use crate::net::http::Fetch;
use crate::net::scraper::{with_trailing_slash, DirectoryScraper, ListingLayout};
use crate::net::NetError;
use crate::time::TimeRange;

pub const SOT_BASE_URL: &str = "http://www.lmsal.com/solarsoft/hinode/level2hao/";

const INSTRUMENT: &str = "sot";
/// Spectro-polarimeter product directory inside each day.
const PRODUCT_DIR: &str = "SP3D";
/// First Hinode SOT/SP science data.
const FIRST_DATA: (i32, u32, u32) = (2006, 10, 25);
/// Timestamp layout embedded in the run directory names, `YYYYMMDD_HHMMSS/`.
const STAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Day layout of the HAO level-2 inversion archive:
/// `<base>/YYYY/MM/DD/SP3D/YYYYMMDD_HHMMSS/YYYYMMDD_HHMMSS.fits`.
#[derive(Debug, Clone)]
pub struct SotLayout {
    base_url: String,
}

impl SotLayout {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: with_trailing_slash(base_url),
        }
    }
}

impl ListingLayout for SotLayout {
    fn listing_url(&self, day: NaiveDate) -> String {
        format!("{}{}/{PRODUCT_DIR}/", self.base_url, day.format("%Y/%m/%d"))
    }

    fn select(
        &self,
        listing_url: &str,
        day: NaiveDate,
        link: &str,
        range: &TimeRange,
    ) -> Option<String> {
        let prefix = day.format("%Y%m%d").to_string();
        if !link.starts_with(&prefix) || !link.is_ascii() || link.len() < 16 {
            return None;
        }

        // `YYYYMMDD_HHMMSS/`: date at [-16..-8], time at [-7..-1].
        let n = link.len();
        let stamp = format!("{}{}", &link[n - 16..n - 8], &link[n - 7..n - 1]);
        if !stamp.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        // Fixed-width digit strings order like the numbers they spell, and
        // the range bounds are compared at whole-second precision.
        let start = range.start().format(STAMP_FORMAT).to_string();
        let end = range.end().format(STAMP_FORMAT).to_string();
        if stamp < start || stamp > end {
            return None;
        }

        Some(format!("{listing_url}{link}{}.fits", &link[..n - 1]))
    }
}

/// Hinode SOT/SP level-2 (HAO inversion) files from LMSAL.
pub struct SOTClient {
    scraper: DirectoryScraper<SotLayout>,
}

impl SOTClient {
    pub fn new(fetcher: Arc<dyn Fetch>, config: &RetrievalConfig) -> Self {
        Self {
            scraper: DirectoryScraper::new(SotLayout::new(&config.sot_base_url), fetcher),
        }
    }

    fn first_data() -> NaiveDate {
        let (y, m, d) = FIRST_DATA;
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
    }
}

impl RetrievalClient for SOTClient {
    fn name(&self) -> &'static str {
        "SOTClient"
    }

    fn get_urls_for_timerange(&self, range: &TimeRange) -> Result<Vec<String>, NetError> {
        self.scraper.file_urls(range)
    }

    fn make_query_metadata(&self) -> QueryMetadata {
        QueryMetadata::new("hao", INSTRUMENT, "vector_magnetic_field", "csac")
    }

    /// Serves queries made only of Time, Instrument and Level attributes
    /// that name the `sot` instrument.
    fn can_handle_query(&self, query: &[QueryAttr]) -> bool {
        let mut names_sot = false;
        for attr in query {
            match attr {
                QueryAttr::Instrument(name) => {
                    names_sot |= name.eq_ignore_ascii_case(INSTRUMENT);
                }
                QueryAttr::Time(range) => {
                    if !starts_in_time(range, Self::first_data()) {
                        return false;
                    }
                }
                QueryAttr::Level(_) => {}
                QueryAttr::Source(_) | QueryAttr::Provider(_) | QueryAttr::Physobs(_) => {
                    return false;
                }
            }
        }
        names_sot
    }

    /// Observation start of a run, from its `YYYYMMDD_HHMMSS.fits` name.
    fn time_for_url(&self, url: &str) -> Option<TimeRange> {
        let name = url.rsplit('/').next()?.strip_suffix(".fits")?;
        let t = NaiveDateTime::parse_from_str(name, "%Y%m%d_%H%M%S").ok()?;
        TimeRange::new(t, t).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::http::MemoryFetcher;

    const LISTING: &str = r#"<html><body><pre>
<a href="?C=N;O=D">Name</a>
<a href="/solarsoft/hinode/level2hao/2006/11/">Parent Directory</a>
<a href="20061125_093020/">20061125_093020/</a>
<a href="20061125_154320/">20061125_154320/</a>
<a href="20061125_235959/">20061125_235959/</a>
<a href="20061124_120000/">20061124_120000/</a>
<a href="20061125_notes/">20061125_notes/</a>
</pre></body></html>"#;

    fn client(fetcher: MemoryFetcher) -> SOTClient {
        SOTClient::new(Arc::new(fetcher), &RetrievalConfig::default())
    }

    #[test]
    fn listing_url_is_per_day() {
        let layout = SotLayout::new("http://host/level2hao");
        let day = NaiveDate::from_ymd_opt(2006, 11, 5).unwrap();
        assert_eq!(
            layout.listing_url(day),
            "http://host/level2hao/2006/11/05/SP3D/"
        );
    }

    #[test]
    fn keeps_runs_inside_the_range() {
        let listing = format!("{SOT_BASE_URL}2006/11/25/SP3D/");
        let sot = client(MemoryFetcher::new().with_page(&listing, LISTING));
        let range = TimeRange::parse("2006-11-25 09:30:20", "2006-11-25 15:43:20").unwrap();

        let urls = sot.get_urls_for_timerange(&range).unwrap();
        assert_eq!(
            urls,
            [
                format!("{listing}20061125_093020/20061125_093020.fits"),
                format!("{listing}20061125_154320/20061125_154320.fits"),
            ]
        );
    }

    #[test]
    fn range_end_is_inclusive_to_the_second() {
        let listing = format!("{SOT_BASE_URL}2006/11/25/SP3D/");
        let sot = client(MemoryFetcher::new().with_page(&listing, LISTING));
        let range = TimeRange::parse("2006-11-25 15:43:21", "2006-11-25T23:59:59.900").unwrap();
        let urls = sot.get_urls_for_timerange(&range).unwrap();
        assert_eq!(urls, [format!("{listing}20061125_235959/20061125_235959.fits")]);
    }

    #[test]
    fn every_day_of_the_range_is_fetched() {
        let sot = client(
            MemoryFetcher::new().with_page(&format!("{SOT_BASE_URL}2006/11/25/SP3D/"), LISTING),
        );
        let range = TimeRange::parse("2006-11-25", "2006-11-26").unwrap();
        assert!(matches!(
            sot.get_urls_for_timerange(&range),
            Err(NetError::Status { status: 404, .. })
        ));
    }

    #[test]
    fn can_handle_query_truth_table() {
        let sot = client(MemoryFetcher::new());
        let time = QueryAttr::time("2007-01-01", "2007-01-02").unwrap();

        assert!(sot.can_handle_query(&[time.clone(), QueryAttr::instrument("SOT")]));
        assert!(sot.can_handle_query(&[
            time.clone(),
            QueryAttr::instrument("sot"),
            QueryAttr::level(2i64),
        ]));
        assert!(sot.can_handle_query(&[QueryAttr::instrument("sot")]));
        assert!(!sot.can_handle_query(&[time.clone(), QueryAttr::instrument("eve")]));
        assert!(!sot.can_handle_query(&[time.clone()]));
        assert!(!sot.can_handle_query(&[
            time,
            QueryAttr::instrument("sot"),
            QueryAttr::Source("hinode".into()),
        ]));

        let before_launch = QueryAttr::time("2006-01-01", "2006-02-01").unwrap();
        assert!(!sot.can_handle_query(&[before_launch, QueryAttr::instrument("sot")]));
    }

    #[test]
    fn search_attaches_metadata_and_times() {
        let listing = format!("{SOT_BASE_URL}2006/11/25/SP3D/");
        let sot = client(MemoryFetcher::new().with_page(&listing, LISTING));
        let query = [
            QueryAttr::time("2006-11-25 09:00", "2006-11-25 10:00").unwrap(),
            QueryAttr::instrument("sot"),
        ];
        let response = sot.search(&query).unwrap();
        assert_eq!(response.len(), 1);
        let row = &response.rows[0];
        assert_eq!(row.client, "SOTClient");
        assert_eq!(row.source, "hao");
        assert_eq!(row.provider, "csac");
        assert_eq!(row.start.as_deref(), Some("2006-11-25 09:30:20"));
        assert_eq!(row.start, row.end);
    }

    #[test]
    fn search_without_time_is_an_error() {
        let sot = client(MemoryFetcher::new());
        assert!(matches!(
            sot.search(&[QueryAttr::instrument("sot")]),
            Err(NetError::MissingTime)
        ));
    }
}
