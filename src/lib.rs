//! # Block Catalog
//!
//! Builds a searchable catalog of blocks from Minecraft mod archives.
//!
//! ## Overview
//!
//! Every JAR/ZIP archive in a mods directory is scanned for block-state
//! descriptors (`assets/<mod>/blockstates/<block>.json`). Each descriptor's
//! state dimensions are classified, a representative model is chosen and its
//! texture is extracted as base64. Display names come from the archive's
//! `en_us` lang files. The resulting records replace a SQLite catalog in one
//! transaction, and a fuzzy index over the textured records is rebuilt.
//!
//! ## Quick Start
//!
//! ```ignore
//! use block_catalog::{CatalogConfig, CatalogService};
//!
//! let service = CatalogService::open(CatalogConfig::default())?;
//!
//! let report = service.ingest_directory("path/to/mods")?;
//! println!("{} blocks, {} skipped", report.committed, report.skip_count());
//!
//! // Fuzzy search by name or ID
//! let doors = service.search_blocks("oak door")?;
//!
//! // Exact-prefix lookup by block ID
//! let oak = service.search_blocks("@oak_")?;
//! ```
//!
//! ## Working with a single archive
//!
//! The lower-level pieces are usable on their own:
//!
//! ```ignore
//! use block_catalog::{ingest::scan_source, ModArchive};
//!
//! let mut archive = ModArchive::open("mods/create.jar")?;
//! let slug = archive.slug().to_string();
//! let scan = scan_source(&slug, &mut archive);
//! for record in &scan.records {
//!     println!("{} ({} states)", record.block_id, record.variants.len());
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod ingest;
pub mod resolver;
pub mod resource_pack;
pub mod service;
pub mod types;

// Re-export main types for convenience
pub use catalog::{CatalogStore, SearchIndex};
pub use config::CatalogConfig;
pub use error::{CatalogError, Result, SchemaViolation, SkipReason};
pub use ingest::{IngestReport, SkippedEntry};
pub use resolver::TextureOutcome;
pub use resource_pack::{AssetSource, MemoryArchive, ModArchive};
pub use service::{BlockDetails, CatalogService};
pub use types::{BlockKey, BlockRecord, VariantKind, VariantSpec};

/// Open a catalog service with the given configuration.
pub fn open_catalog(config: CatalogConfig) -> Result<CatalogService> {
    CatalogService::open(config)
}

/// List the archive slugs in a mods directory using the default extensions.
pub fn list_archive_slugs<P: AsRef<std::path::Path>>(dir: P) -> Result<Vec<String>> {
    let config = CatalogConfig::default();
    Ok(resource_pack::list_archives(dir, &config.archive_extensions)?
        .into_iter()
        .map(|a| a.slug)
        .collect())
}
