use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use settee_types::Collection;

use crate::error::{StoreError, StoreResult};
use crate::types::{ReadOptions, WriteOptions};

/// Replica count used for quorum reads and writes when none is configured.
pub const DEFAULT_QUORUM_COUNT: u32 = 3;

/// Connection settings for the document database.
///
/// ```toml
/// url = "http://127.0.0.1:5984/main"
/// server_root = "127.0.0.1:5984"
///
/// [extra_databases]
/// users = "http://127.0.0.1:5984/main__users"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// URL of the main database.
    pub url: String,
    /// Additional databases addressed by a short postfix.
    pub extra_databases: BTreeMap<String, String>,
    /// Host of the database server; a Cloudant host enables quorum options.
    pub server_root: String,
    /// Replica count for quorum operations on clustered servers.
    pub quorum_count: Option<u32>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5984/settee".into(),
            extra_databases: BTreeMap::new(),
            server_root: "127.0.0.1:5984".into(),
            quorum_count: None,
        }
    }
}

impl StoreConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Load a TOML file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// URL of the main database, or of the extra database named `postfix`.
    pub fn database_url(&self, postfix: Option<&str>) -> StoreResult<&str> {
        match postfix {
            None => Ok(&self.url),
            Some(name) => self
                .extra_databases
                .get(name)
                .map(String::as_str)
                .ok_or_else(|| StoreError::UnknownDatabase(name.to_string())),
        }
    }

    /// Collection named by the last path segment of [`Self::database_url`].
    pub fn collection(&self, postfix: Option<&str>) -> StoreResult<Collection> {
        let url = self.database_url(postfix)?;
        url.trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty() && !name.contains(':'))
            .map(Collection::from)
            .ok_or_else(|| StoreError::Config(format!("no database name in {url}")))
    }

    /// Whether the server is a clustered (Cloudant/BigCouch) deployment.
    pub fn is_bigcouch(&self) -> bool {
        self.server_root.contains("cloudant")
    }

    pub fn quorum_count(&self) -> u32 {
        self.quorum_count.unwrap_or(DEFAULT_QUORUM_COUNT)
    }

    /// Write options forcing a quorum on clustered servers.
    pub fn safe_write_options(&self) -> WriteOptions {
        WriteOptions {
            quorum: self.is_bigcouch().then(|| self.quorum_count()),
        }
    }

    /// Read options forcing a quorum on clustered servers.
    pub fn safe_read_options(&self) -> ReadOptions {
        ReadOptions {
            quorum: self.is_bigcouch().then(|| self.quorum_count()),
        }
    }
}
