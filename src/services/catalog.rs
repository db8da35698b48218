//! Emby catalog loading and lookup
//!
//! The catalog is fetched once per run and turned into an in-memory index
//! keyed by identity key. It is never cached between runs.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::emby::{EmbyClient, EmbyItem};
use crate::config::{MatchStrategy, PathMapping};
use crate::error::CatalogError;

/// A movie the server already manages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub identity_key: String,
    pub display_name: String,
    pub year: Option<i32>,
}

/// Lookup from identity key to catalog entry
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    strategy: MatchStrategy,
    entries: HashMap<String, CatalogEntry>,
}

impl CatalogIndex {
    pub fn new(strategy: MatchStrategy) -> Self {
        Self {
            strategy,
            entries: HashMap::new(),
        }
    }

    /// Build an index from Emby items. Later items replace earlier ones with
    /// the same key; items that produce an empty key are dropped.
    pub fn from_items(
        items: &[EmbyItem],
        strategy: MatchStrategy,
        mapping: Option<&PathMapping>,
    ) -> Self {
        let mut index = Self::new(strategy);
        let mut dropped = 0usize;

        for item in items {
            let key = match strategy {
                MatchStrategy::Directory => {
                    let path = item.path.as_deref().unwrap_or_default();
                    let path = match mapping {
                        Some(m) => m.apply(path),
                        None => path.to_string(),
                    };
                    directory_key(parent_of(&path))
                }
                MatchStrategy::Title => title_key(&item.name),
            };

            if key.is_empty() {
                dropped += 1;
                continue;
            }

            index.insert(CatalogEntry {
                identity_key: key,
                display_name: item.name.clone(),
                year: item.production_year,
            });
        }

        if dropped > 0 {
            debug!(dropped, strategy = strategy.as_str(), "Skipped catalog items without a usable key");
        }
        index
    }

    pub fn insert(&mut self, entry: CatalogEntry) {
        self.entries.insert(entry.identity_key.clone(), entry);
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    pub fn get(&self, key: &str) -> Option<&CatalogEntry> {
        self.entries.get(key)
    }

    /// Find the entry a candidate with `key` corresponds to.
    ///
    /// Under the directory strategy a folder also matches when Emby keyed the
    /// movie on a folder below it (`Alien (1979)/Disc 1/alien.mkv`). When
    /// several nested folders match, the lowest key wins.
    pub fn lookup(&self, key: &str) -> Option<&CatalogEntry> {
        if let Some(entry) = self.entries.get(key) {
            return Some(entry);
        }
        if self.strategy != MatchStrategy::Directory || key.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .filter(|(k, _)| is_below(k, key))
            .min_by(|a, b| a.0.cmp(b.0))
            .map(|(_, entry)| entry)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Identity key for a directory: lower-cased path without trailing separators.
pub fn directory_key(path: &str) -> String {
    let trimmed = path.trim_end_matches(['/', '\\']);
    // Keep the root itself rather than collapsing it to ""
    let trimmed = if trimmed.is_empty() && !path.is_empty() { &path[..1] } else { trimmed };
    trimmed.to_lowercase()
}

/// Identity key for a local directory on this host.
pub fn directory_key_for(path: &Path) -> String {
    directory_key(&path.to_string_lossy())
}

/// Identity key for a title: trimmed and lower-cased.
pub fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Whether directory key `path` lies strictly inside directory key `dir`.
fn is_below(path: &str, dir: &str) -> bool {
    let dir = dir.trim_end_matches(['/', '\\']);
    path.strip_prefix(dir)
        .is_some_and(|rest| rest.len() > 1 && rest.starts_with(['/', '\\']))
}

/// Parent directory of a server path, accepting both `/` and `\` separators
/// since the server may run on another OS.
fn parent_of(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(0) => &path[..1],
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Result of loading the catalog. A failed load still yields an (empty)
/// index so the run can proceed, with the error kept for reporting.
#[derive(Debug)]
pub struct CatalogLoad {
    pub index: CatalogIndex,
    pub error: Option<CatalogError>,
}

/// Loads the Emby catalog into a [CatalogIndex]
pub struct CatalogLoader {
    server_url: String,
    api_key: String,
    strategy: MatchStrategy,
    mapping: Option<PathMapping>,
    timeout: Duration,
}

impl CatalogLoader {
    pub fn new(server_url: &str, api_key: &str, strategy: MatchStrategy) -> Self {
        Self {
            server_url: server_url.to_string(),
            api_key: api_key.to_string(),
            strategy,
            mapping: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_mapping(mut self, mapping: Option<PathMapping>) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch and index the catalog. Never fails: errors are logged and
    /// returned alongside an empty index.
    pub async fn load(&self) -> CatalogLoad {
        match self.try_load().await {
            Ok(index) => {
                info!(
                    entries = index.len(),
                    strategy = self.strategy.as_str(),
                    "Loaded Emby movie catalog"
                );
                CatalogLoad { index, error: None }
            }
            Err(e) => {
                error!(error = %e, url = %self.server_url, "Failed to load Emby catalog");
                CatalogLoad {
                    index: CatalogIndex::new(self.strategy),
                    error: Some(e),
                }
            }
        }
    }

    async fn try_load(&self) -> Result<CatalogIndex, CatalogError> {
        let client = EmbyClient::new(&self.server_url, &self.api_key, self.timeout)?;
        let items = client.fetch_movies().await?;
        Ok(CatalogIndex::from_items(&items, self.strategy, self.mapping.as_ref()))
    }
}
