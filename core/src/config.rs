//! Client configuration, passed explicitly to `Session::new`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::client::{ErgastClient, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use crate::error::ApiError;

/// Response cache settings.
///
/// Disabling the cache is strongly discouraged: the upstream allows four
/// requests per second and two hundred per hour.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Existing directory the `ergast_cache` store is created in.
    pub directory: PathBuf,
    /// Entry lifetime in seconds. `None` keeps entries forever.
    pub expire_after_secs: Option<u64>,
    /// Remove every stored entry when the session is created.
    pub force_clear: bool,
}

impl CacheConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn expire_after(&self) -> Option<Duration> {
        self.expire_after_secs.map(Duration::from_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: PathBuf::from("."),
            expire_after_secs: Some(3600),
            force_clear: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Extra request headers, sent after the user agent.
    pub headers: BTreeMap<String, String>,
    pub cache: CacheConfig,
}

impl ClientConfig {
    /// Load a JSON configuration file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ApiError> {
        let data = fs::read_to_string(path).map_err(|e| ApiError::Config(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&data).map_err(|e| ApiError::Config(format!("{}: {e}", path.display())))
    }

    pub fn client(&self) -> ErgastClient {
        let mut client = ErgastClient::new(&self.base_url).with_user_agent(&self.user_agent);
        for (name, value) in &self.headers {
            client = client.with_header(name, value);
        }
        client
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: BTreeMap::new(),
            cache: CacheConfig::default(),
        }
    }
}
