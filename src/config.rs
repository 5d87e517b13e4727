use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::net::sources::eve::EVE_BASE_URL;
use crate::net::sources::sot::SOT_BASE_URL;

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "RUSTY_SUN_CONFIG";

// ---------------------------------------------------------------------------
// Retrieval settings
// ---------------------------------------------------------------------------

/// Archive locations and HTTP settings. Every field is optional in the file.
///
/// ```json
/// { "sot_base_url": "http://mirror/level2hao/", "timeout_secs": 30 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub sot_base_url: String,
    pub eve_base_url: String,
    pub user_agent: String,
    /// `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            sot_base_url: SOT_BASE_URL.to_string(),
            eve_base_url: EVE_BASE_URL.to_string(),
            user_agent: concat!("rusty-sun/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: None,
        }
    }
}

impl RetrievalConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// The file named by `RUSTY_SUN_CONFIG`, or the defaults when unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => {
                log::info!("Using config from {}", Path::new(&path).display());
                Self::load(Path::new(&path))
            }
            None => Ok(Self::default()),
        }
    }
}
