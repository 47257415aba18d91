//! The catalog service: ingestion, lookup and search behind one handle.

use crate::catalog::{CatalogStore, SearchIndex};
use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::ingest::{collect_directory, IngestReport};
use crate::resource_pack::{list_archives, parse_blockstate, AssetSource, ModArchive, ModelVariant};
use crate::types::{BlockKey, BlockRecord};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, RwLock, TryLockError};
use tracing::{debug, info, instrument, warn};

/// Owns the catalog store and search index for the lifetime of the
/// application.
///
/// The service is `Sync`; share it behind an `Arc` to use it from several
/// threads. Ingestion batches are serialized: a batch started while another
/// is running fails with [`CatalogError::BatchInProgress`].
pub struct CatalogService {
    config: CatalogConfig,
    store: Mutex<CatalogStore>,
    index: RwLock<SearchIndex>,
    batch: Mutex<()>,
}

/// Held for the duration of an ingestion batch.
pub struct BatchGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

/// Every state of a block with its model references, read back from the
/// source archive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDetails {
    pub record: BlockRecord,
    /// Whether the descriptor also carries multipart cases.
    pub multipart: bool,
    /// States in descriptor order.
    pub states: Vec<StateModels>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateModels {
    pub state: String,
    pub models: Vec<ModelVariant>,
}

impl CatalogService {
    /// Open the catalog named by `config` and warm up the search index from
    /// its textured records.
    pub fn open(config: CatalogConfig) -> Result<Self> {
        let store = if config.is_in_memory() {
            CatalogStore::open_in_memory()?
        } else {
            CatalogStore::open(&config.database_path)?
        };

        let mut index = SearchIndex::new(config.fuzzy_threshold);
        let indexed = index.rebuild(store.textured(None)?);
        debug!(indexed, database = %config.database_path.display(), "opened catalog");

        Ok(Self {
            config,
            store: Mutex::new(store),
            index: RwLock::new(index),
            batch: Mutex::new(()),
        })
    }

    /// Open a private in-memory catalog with default settings.
    pub fn open_in_memory() -> Result<Self> {
        Self::open(CatalogConfig::in_memory())
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Reserve the batch slot, failing if a batch is already running.
    pub fn begin_batch(&self) -> Result<BatchGuard<'_>> {
        match self.batch.try_lock() {
            Ok(guard) => Ok(BatchGuard { _guard: guard }),
            Err(TryLockError::WouldBlock) => Err(CatalogError::BatchInProgress),
            // Nothing is guarded; recover from poisoning
            Err(TryLockError::Poisoned(poisoned)) => Ok(BatchGuard {
                _guard: poisoned.into_inner(),
            }),
        }
    }

    /// Ingest every archive in `dir` and replace the catalog with the result.
    ///
    /// On success the report carries the committed count and per-entry
    /// diagnostics. A persistence failure leaves the previous catalog in
    /// place. If the catalog was committed but the search index could not
    /// be rebuilt, [`CatalogError::IndexSync`] is returned and fuzzy search
    /// reports [`CatalogError::IndexStale`] until the next good batch.
    #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn ingest_directory<P: AsRef<Path>>(&self, dir: P) -> Result<IngestReport> {
        let _batch = self.begin_batch()?;

        let batch = collect_directory(dir.as_ref(), &self.config)?;
        let mut report = batch.report;

        let committed = self
            .lock_store()?
            .replace_all(&batch.records, self.config.insert_chunk_size)?;
        report.committed = committed;

        report.indexed = self.rebuild_index().map_err(|e| match e {
            CatalogError::Persistence(source) => CatalogError::IndexSync { committed, source },
            other => other,
        })?;

        info!(
            committed = report.committed,
            indexed = report.indexed,
            skipped = report.skip_count(),
            failed_archives = report.failed_archives.len(),
            "ingestion batch committed"
        );
        Ok(report)
    }

    /// Rebuild the search index from the textured records in the catalog.
    ///
    /// On failure the index is emptied and flagged stale.
    pub fn rebuild_index(&self) -> Result<usize> {
        let records = self.lock_store()?.textured(None);
        let mut index = self
            .index
            .write()
            .map_err(|_| CatalogError::Poisoned("search index"))?;

        match records {
            Ok(records) => Ok(index.rebuild(records)),
            Err(e) => {
                warn!(error = %e, "search index rebuild failed; index marked stale");
                index.mark_stale();
                Err(e)
            }
        }
    }

    /// First record with the given block ID.
    pub fn get_block(&self, block_id: &str) -> Result<Option<BlockRecord>> {
        self.lock_store()?.find_by_block_id(block_id)
    }

    /// Record with the given composite key.
    pub fn get_block_by_key(&self, key: &BlockKey) -> Result<Option<BlockRecord>> {
        self.lock_store()?.get(key)
    }

    /// Search the catalog.
    ///
    /// - An empty query lists textured records.
    /// - A query starting with the prefix marker (`@` by default) lists
    ///   records whose block ID starts with the rest of the query.
    /// - Anything else is a fuzzy search over textured records.
    ///
    /// Every mode returns at most `search_limit` records.
    pub fn search_blocks(&self, query: &str) -> Result<Vec<BlockRecord>> {
        let query = query.trim();
        let limit = self.config.search_limit;

        if query.is_empty() {
            return self.lock_store()?.textured(Some(limit));
        }

        if let Some(prefix) = query.strip_prefix(self.config.prefix_marker) {
            return self.lock_store()?.find_by_prefix(prefix.trim(), limit);
        }

        let index = self
            .index
            .read()
            .map_err(|_| CatalogError::Poisoned("search index"))?;
        if index.is_stale() {
            return Err(CatalogError::IndexStale);
        }

        Ok(index
            .search(query, limit)
            .into_iter()
            .map(|hit| hit.record.clone())
            .collect())
    }

    /// Number of records in the catalog.
    pub fn count(&self) -> Result<usize> {
        self.lock_store()?.count()
    }

    /// Slugs of the archives in a mods directory.
    pub fn archive_slugs<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<String>> {
        Ok(list_archives(dir, &self.config.archive_extensions)?
            .into_iter()
            .map(|a| a.slug)
            .collect())
    }

    /// Re-read a block's descriptor from its source archive in `dir`.
    ///
    /// Returns `None` if the block, its archive or its descriptor is gone, or
    /// if the descriptor no longer validates.
    pub fn block_details<P: AsRef<Path>>(
        &self,
        dir: P,
        block_id: &str,
    ) -> Result<Option<BlockDetails>> {
        let Some(record) = self.get_block(block_id)? else {
            return Ok(None);
        };

        let Some(path) = self.find_archive(dir.as_ref(), &record.jar_slug) else {
            debug!(archive = %record.jar_slug, "source archive not found");
            return Ok(None);
        };

        let mut archive = ModArchive::open(&path).map_err(|e| CatalogError::ArchiveRead {
            path: path.clone(),
            source: Box::new(e),
        })?;

        let Some(data) = archive.read_entry(&record.entry_name)? else {
            debug!(entry = %record.entry_name, "descriptor no longer in archive");
            return Ok(None);
        };

        let descriptor = match parse_blockstate(&data) {
            Ok(descriptor) => descriptor,
            Err(reason) => {
                debug!(entry = %record.entry_name, reason = %reason, "descriptor no longer valid");
                return Ok(None);
            }
        };

        let states = descriptor
            .variants
            .iter()
            .flatten()
            .map(|(state, value)| StateModels {
                state: state.clone(),
                models: value.variants().into_iter().cloned().collect(),
            })
            .collect();

        Ok(Some(BlockDetails {
            record,
            multipart: descriptor.multipart,
            states,
        }))
    }

    /// Close the catalog database.
    pub fn close(self) -> Result<()> {
        self.store
            .into_inner()
            .map_err(|_| CatalogError::Poisoned("catalog store"))?
            .close()
    }

    fn find_archive(&self, dir: &Path, slug: &str) -> Option<PathBuf> {
        self.config
            .archive_extensions
            .iter()
            .map(|ext| dir.join(format!("{}.{}", slug, ext)))
            .find(|path| path.is_file())
    }

    fn lock_store(&self) -> Result<MutexGuard<'_, CatalogStore>> {
        self.store
            .lock()
            .map_err(|_| CatalogError::Poisoned("catalog store"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VariantSpec;

    fn record(block_id: &str, texture: Option<&str>) -> BlockRecord {
        BlockRecord {
            block_id: block_id.to_string(),
            mod_id: "m1".to_string(),
            block_name: None,
            jar_slug: "m1".to_string(),
            texture64: texture.map(str::to_string),
            entry_name: format!("assets/m1/blockstates/{}.json", block_id),
            variants: vec![VariantSpec::boolean("lit")],
        }
    }

    #[test]
    fn test_open_warms_index() {
        let dir = tempfile::tempdir().unwrap();
        let config = CatalogConfig::default().with_database_path(dir.path().join("c.sqlite"));

        {
            let mut store = CatalogStore::open(&config.database_path).unwrap();
            store
                .replace_all(&[record("lamp", Some("YQ==")), record("door", None)], 5000)
                .unwrap();
            store.close().unwrap();
        }

        let service = CatalogService::open(config).unwrap();
        assert_eq!(service.count().unwrap(), 2);
        let hits = service.search_blocks("lamp").unwrap();
        assert_eq!(hits.len(), 1);
        assert!(service.search_blocks("door").unwrap().is_empty());
        assert_eq!(service.get_block("door").unwrap().unwrap().block_id, "door");
        service.close().unwrap();
    }

    #[test]
    fn test_batch_guard_rejects_second_batch() {
        let service = CatalogService::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();

        {
            let _guard = service.begin_batch().unwrap();
            assert!(matches!(
                service.ingest_directory(dir.path()),
                Err(CatalogError::BatchInProgress)
            ));
        }

        let report = service.ingest_directory(dir.path()).unwrap();
        assert_eq!(report.committed, 0);
    }

    #[test]
    fn test_stale_index_is_reported() {
        let service = CatalogService::open_in_memory().unwrap();
        service.index.write().unwrap().mark_stale();

        assert!(matches!(
            service.search_blocks("door"),
            Err(CatalogError::IndexStale)
        ));
        // Catalog-backed modes still work
        assert!(service.search_blocks("").unwrap().is_empty());
        assert!(service.search_blocks("@do").unwrap().is_empty());

        service.rebuild_index().unwrap();
        assert!(service.search_blocks("door").unwrap().is_empty());
    }
}
