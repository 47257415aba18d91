//! Error types for the block catalog.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using CatalogError.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Main error type for ingestion and catalog operations.
///
/// Entry-level problems never show up here; they are collected as
/// [`SkipReason`]s in the ingest report instead.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Failed to read or parse a ZIP archive.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Failed to parse JSON data.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An archive could not be opened or decoded. Only that archive is skipped.
    #[error("Unreadable archive {path:?}: {source}")]
    ArchiveRead {
        path: PathBuf,
        #[source]
        source: Box<CatalogError>,
    },

    /// The source directory of a batch could not be listed.
    #[error("Cannot list archive directory {path:?}: {source}")]
    ArchiveDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The catalog transaction failed; the previous catalog is untouched.
    #[error("Catalog persistence failed: {0}")]
    Persistence(#[from] rusqlite::Error),

    /// The catalog was committed but the search index could not be rebuilt.
    #[error("Search index rebuild failed after committing {committed} records: {source}")]
    IndexSync {
        committed: usize,
        #[source]
        source: rusqlite::Error,
    },

    /// The search index is out of date with the catalog.
    #[error("Search index is stale; run a new ingestion batch")]
    IndexStale,

    /// Another ingestion batch is already running against this catalog.
    #[error("An ingestion batch is already in progress")]
    BatchInProgress,

    /// A lock guarding shared state was poisoned by a panicking thread.
    #[error("Poisoned lock: {0}")]
    Poisoned(&'static str),
}

/// A structural problem found while validating a descriptor.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{field}: {message}")]
pub struct SchemaViolation {
    /// Dotted path of the offending field (e.g. `display.gui.scale`).
    pub field: String,
    pub message: String,
}

impl SchemaViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Why a single archive entry was excluded from the catalog.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The path matched a convention but its captures were empty.
    #[error("invalid identifier in path")]
    InvalidIdentifier,

    /// The entry bytes could not be read from the archive.
    #[error("unreadable entry: {0}")]
    Read(String),

    /// The entry is not valid JSON (or not UTF-8).
    #[error("malformed JSON: {0}")]
    Json(String),

    /// The JSON does not fit the descriptor shape.
    #[error("schema violation at {0}")]
    Schema(SchemaViolation),

    /// The descriptor has no `variants` mapping (or it is empty).
    #[error("no variants to resolve")]
    NoVariants,

    /// The representative state maps to an empty list of models.
    #[error("representative variant has no models")]
    EmptyVariantList,
}

impl From<SchemaViolation> for SkipReason {
    fn from(violation: SchemaViolation) -> Self {
        SkipReason::Schema(violation)
    }
}
