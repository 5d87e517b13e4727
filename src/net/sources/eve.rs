use std::sync::Arc;

use chrono::{Days, NaiveDate, NaiveTime};

use super::starts_in_time;
use crate::config::RetrievalConfig;
use crate::net::attrs::{Level, QueryAttr};
use crate::net::client::{QueryMetadata, RetrievalClient};
use crate::net::http::Fetch;
use crate::net::scraper::{with_trailing_slash, DirectoryScraper, ListingLayout};
use crate::net::NetError;
use crate::time::TimeRange;

pub const EVE_BASE_URL: &str =
    "http://lasp.colorado.edu/eve/data_access/evewebdata/quicklook/L0CS/SpWx/";

const INSTRUMENT: &str = "eve";
/// Daily file name inside each year directory.
const FILE_PATTERN: &str = "%Y%m%d_EVE_L0CS_DIODES_1m.txt";
/// First SDO/EVE quicklook data.
const FIRST_DATA: (i32, u32, u32) = (2010, 5, 1);

/// Year directories of daily files: `<base>/YYYY/YYYYMMDD_EVE_L0CS_DIODES_1m.txt`.
#[derive(Debug, Clone)]
pub struct EveLayout {
    base_url: String,
}

impl EveLayout {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: with_trailing_slash(base_url),
        }
    }
}

impl ListingLayout for EveLayout {
    fn listing_url(&self, day: NaiveDate) -> String {
        format!("{}{}/", self.base_url, day.format("%Y"))
    }

    /// Files are daily, so any file of a day in the range is kept whatever
    /// the time of day the range starts or ends.
    fn select(
        &self,
        listing_url: &str,
        day: NaiveDate,
        link: &str,
        _range: &TimeRange,
    ) -> Option<String> {
        let name = link.rsplit('/').next()?;
        let wanted = day.format(FILE_PATTERN).to_string();
        (name == wanted).then(|| format!("{listing_url}{name}"))
    }
}

/// SDO/EVE level 0CS one-minute diode irradiance from LASP.
///
/// Requests must name the `eve` instrument and level 0 (`0`, `"0"` or
/// `"0CS"`), and carry a time range.
pub struct EVEClient {
    scraper: DirectoryScraper<EveLayout>,
}

impl EVEClient {
    pub fn new(fetcher: Arc<dyn Fetch>, config: &RetrievalConfig) -> Self {
        Self {
            scraper: DirectoryScraper::new(EveLayout::new(&config.eve_base_url), fetcher),
        }
    }

    fn first_data() -> NaiveDate {
        let (y, m, d) = FIRST_DATA;
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
    }

    fn is_level_zero(level: &Level) -> bool {
        match level {
            Level::Text(s) if s.trim().eq_ignore_ascii_case("0cs") => true,
            other => other.as_number() == Some(0),
        }
    }
}

impl RetrievalClient for EVEClient {
    fn name(&self) -> &'static str {
        "EVEClient"
    }

    fn get_urls_for_timerange(&self, range: &TimeRange) -> Result<Vec<String>, NetError> {
        self.scraper.file_urls(range)
    }

    fn make_query_metadata(&self) -> QueryMetadata {
        QueryMetadata::new("SDO", INSTRUMENT, "irradiance", "LASP")
    }

    fn can_handle_query(&self, query: &[QueryAttr]) -> bool {
        let (mut has_time, mut has_instrument, mut has_level) = (false, false, false);
        for attr in query {
            match attr {
                QueryAttr::Time(range) => {
                    has_time = true;
                    if !starts_in_time(range, Self::first_data()) {
                        return false;
                    }
                }
                QueryAttr::Instrument(name) => {
                    has_instrument = true;
                    if !name.eq_ignore_ascii_case(INSTRUMENT) {
                        return false;
                    }
                }
                QueryAttr::Level(level) => {
                    has_level = true;
                    if !Self::is_level_zero(level) {
                        return false;
                    }
                }
                QueryAttr::Source(_) | QueryAttr::Provider(_) | QueryAttr::Physobs(_) => {}
            }
        }
        has_time && has_instrument && has_level
    }

    /// The whole day a file covers.
    fn time_for_url(&self, url: &str) -> Option<TimeRange> {
        let name = url.rsplit('/').next()?;
        let day = NaiveDate::parse_from_str(name, FILE_PATTERN).ok()?;
        let start = day.and_time(NaiveTime::MIN);
        let end = day.checked_add_days(Days::new(1))?.and_time(NaiveTime::MIN);
        TimeRange::new(start, end).ok()
    }
}
