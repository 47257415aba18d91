//! Catalog configuration.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for ingestion, persistence and search.
///
/// Every field has a default, so a JSON config file only needs the fields it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// SQLite database file. `:memory:` opens a private in-memory catalog.
    pub database_path: PathBuf,
    /// Rows per progress log line when replacing the catalog.
    pub insert_chunk_size: usize,
    /// Maximum results for any search query.
    pub search_limit: usize,
    /// Query prefix that selects exact-prefix lookup by block ID.
    pub prefix_marker: char,
    /// Minimum fuzzy score (0.0 to 1.0) for a search hit.
    pub fuzzy_threshold: f64,
    /// Scan archives in parallel.
    pub parallel_archives: bool,
    /// File extensions treated as archives, without the dot.
    pub archive_extensions: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("block-catalog.sqlite"),
            insert_chunk_size: 5000,
            search_limit: 50,
            prefix_marker: '@',
            fuzzy_threshold: 0.4,
            parallel_archives: true,
            archive_extensions: vec!["jar".to_string(), "zip".to_string()],
        }
    }
}

impl CatalogConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Config for a private in-memory catalog.
    pub fn in_memory() -> Self {
        Self::default().with_database_path(":memory:")
    }

    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }

    /// Set the insert chunk size. Zero is treated as one.
    pub fn with_insert_chunk_size(mut self, size: usize) -> Self {
        self.insert_chunk_size = size.max(1);
        self
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    pub fn with_prefix_marker(mut self, marker: char) -> Self {
        self.prefix_marker = marker;
        self
    }

    /// Set the fuzzy threshold, clamped to [0, 1].
    pub fn with_fuzzy_threshold(mut self, threshold: f64) -> Self {
        self.fuzzy_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_parallel_archives(mut self, parallel: bool) -> Self {
        self.parallel_archives = parallel;
        self
    }

    pub fn with_archive_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.archive_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the catalog lives in memory only.
    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == ":memory:"
    }
}
