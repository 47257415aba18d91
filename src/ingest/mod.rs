//! Batch ingestion of mod archives.
//!
//! Every archive in a directory is scanned for block-state descriptors; each
//! descriptor is validated, resolved and named, and the results are
//! accumulated by block ID. Problems with a single entry or a single archive
//! never abort the batch; they are collected in the [`IngestReport`].

use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result, SkipReason};
use crate::resolver::{resolve_block, AssetResolver};
use crate::resource_pack::loader::ArchiveFile;
use crate::resource_pack::path::{classify, is_lang_file, AssetPath};
use crate::resource_pack::{list_archives, parse_blockstate, AssetSource, LangTable, ModArchive};
use crate::types::BlockRecord;
use indexmap::IndexMap;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// An archive entry that was excluded from the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEntry {
    /// Slug of the archive the entry belongs to.
    pub archive: String,
    pub entry: String,
    pub reason: SkipReason,
}

/// An archive that could not be opened.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedArchive {
    pub slug: String,
    pub message: String,
}

/// Result of scanning one archive.
#[derive(Debug, Clone, Default)]
pub struct ArchiveScan {
    pub slug: String,
    /// Records in entry order.
    pub records: Vec<BlockRecord>,
    pub skipped: Vec<SkippedEntry>,
    /// Count per texture resolution outcome.
    pub texture_outcomes: BTreeMap<&'static str, usize>,
    /// Number of lang keys merged.
    pub lang_keys: usize,
}

/// Diagnostics for one ingestion batch.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub archives_scanned: usize,
    pub failed_archives: Vec<FailedArchive>,
    /// Records handed to persistence after deduplication.
    pub records: usize,
    /// Records that replaced an earlier record with the same block ID.
    pub overwritten: usize,
    /// Records committed to the catalog. Zero until the batch is committed.
    pub committed: usize,
    /// Committed records with a texture, i.e. the size of the search index.
    pub indexed: usize,
    pub skipped: Vec<SkippedEntry>,
    pub texture_outcomes: BTreeMap<&'static str, usize>,
}

impl IngestReport {
    pub fn skip_count(&self) -> usize {
        self.skipped.len()
    }

    /// Skip counts grouped by reason kind.
    pub fn skip_summary(&self) -> BTreeMap<&'static str, usize> {
        let mut summary = BTreeMap::new();
        for skipped in &self.skipped {
            *summary.entry(skip_label(&skipped.reason)).or_insert(0) += 1;
        }
        summary
    }
}

fn skip_label(reason: &SkipReason) -> &'static str {
    match reason {
        SkipReason::InvalidIdentifier => "invalid_identifier",
        SkipReason::Read(_) => "read",
        SkipReason::Json(_) => "json",
        SkipReason::Schema(_) => "schema",
        SkipReason::NoVariants => "no_variants",
        SkipReason::EmptyVariantList => "empty_variant_list",
    }
}

/// The accumulated, deduplicated output of a batch, ready to commit.
#[derive(Debug, Clone, Default)]
pub struct IngestBatch {
    pub records: Vec<BlockRecord>,
    pub report: IngestReport,
}

/// Block records keyed by block ID. Later inserts win.
#[derive(Debug, Default)]
pub struct Accumulator {
    records: IndexMap<String, BlockRecord>,
    overwritten: usize,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the one it replaced.
    pub fn insert(&mut self, record: BlockRecord) -> Option<BlockRecord> {
        let previous = self.records.insert(record.block_id.clone(), record);
        if previous.is_some() {
            self.overwritten += 1;
        }
        previous
    }

    pub fn get(&self, block_id: &str) -> Option<&BlockRecord> {
        self.records.get(block_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn overwritten(&self) -> usize {
        self.overwritten
    }

    pub fn into_records(self) -> Vec<BlockRecord> {
        self.records.into_values().collect()
    }
}

/// Scan every archive in `dir` and accumulate the resolved blocks.
///
/// Only a directory that cannot be listed is an error.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn collect_directory(dir: &Path, config: &CatalogConfig) -> Result<IngestBatch> {
    let archives = list_archives(dir, &config.archive_extensions)?;
    debug!(count = archives.len(), "found archives");

    let scans: Vec<Result<ArchiveScan>> = if config.parallel_archives {
        archives.par_iter().map(scan_archive).collect()
    } else {
        archives.iter().map(scan_archive).collect()
    };

    let mut accumulator = Accumulator::new();
    let mut report = IngestReport::default();

    // Merge in archive-name order so last-write-wins is deterministic.
    for (archive, scan) in archives.iter().zip(scans) {
        let scan = match scan {
            Ok(scan) => scan,
            Err(e) => {
                warn!(archive = %archive.slug, error = %e, "skipping unreadable archive");
                report.failed_archives.push(FailedArchive {
                    slug: archive.slug.clone(),
                    message: e.to_string(),
                });
                continue;
            }
        };

        report.archives_scanned += 1;
        for (outcome, count) in scan.texture_outcomes {
            *report.texture_outcomes.entry(outcome).or_insert(0) += count;
        }
        report.skipped.extend(scan.skipped);
        for record in scan.records {
            accumulator.insert(record);
        }
    }

    report.records = accumulator.len();
    report.overwritten = accumulator.overwritten();

    info!(
        archives = report.archives_scanned,
        failed = report.failed_archives.len(),
        records = report.records,
        skipped = report.skip_count(),
        "scanned archive directory"
    );

    Ok(IngestBatch {
        records: accumulator.into_records(),
        report,
    })
}

/// Open an archive file and scan it.
#[instrument(skip_all, fields(archive = %archive.slug))]
pub fn scan_archive(archive: &ArchiveFile) -> Result<ArchiveScan> {
    let mut source = ModArchive::open(&archive.path).map_err(|e| CatalogError::ArchiveRead {
        path: archive.path.clone(),
        source: Box::new(e),
    })?;
    Ok(scan_source(&archive.slug, &mut source))
}

/// Scan an opened archive: merge its lang files, then resolve every
/// block-state descriptor it contains.
pub fn scan_source<S: AssetSource + ?Sized>(slug: &str, source: &mut S) -> ArchiveScan {
    let names = source.entry_names();
    let mut scan = ArchiveScan {
        slug: slug.to_string(),
        ..Default::default()
    };

    let mut lang = LangTable::new();
    for name in names.iter().filter(|n| is_lang_file(n)) {
        let merged = match source.read_entry(name) {
            Ok(Some(data)) => lang.merge_json(&data).map_err(|e| SkipReason::Json(e.to_string())),
            Ok(None) => continue,
            Err(e) => Err(SkipReason::Read(e.to_string())),
        };
        match merged {
            Ok(count) => scan.lang_keys += count,
            Err(reason) => scan.skip(name, reason),
        }
    }

    let mut assets = AssetResolver::new(source);

    for name in &names {
        let (mod_id, block_id) = match classify(name) {
            None | Some(Ok(AssetPath::Lang { .. })) => continue,
            Some(Ok(AssetPath::Blockstate { mod_id, block_id })) => (mod_id, block_id),
            Some(Err(reason)) => {
                scan.skip(name, reason);
                continue;
            }
        };

        let data = match assets.read_entry(name) {
            Ok(Some(data)) => data,
            Ok(None) => {
                scan.skip(name, SkipReason::Read("entry not found".to_string()));
                continue;
            }
            Err(e) => {
                scan.skip(name, SkipReason::Read(e.to_string()));
                continue;
            }
        };

        let resolved = parse_blockstate(&data)
            .and_then(|descriptor| resolve_block(&mut assets, mod_id, &descriptor));
        let block = match resolved {
            Ok(block) => block,
            Err(reason) => {
                scan.skip(name, reason);
                continue;
            }
        };

        *scan.texture_outcomes.entry(block.texture.label()).or_insert(0) += 1;

        scan.records.push(BlockRecord {
            block_id: block_id.to_string(),
            mod_id: mod_id.to_string(),
            block_name: lang.block_name(mod_id, block_id).map(str::to_string),
            jar_slug: slug.to_string(),
            texture64: block.texture.into_texture64(),
            entry_name: name.clone(),
            variants: block.variants,
        });
    }

    debug!(
        archive = %slug,
        records = scan.records.len(),
        skipped = scan.skipped.len(),
        lang_keys = scan.lang_keys,
        "scanned archive"
    );
    scan
}

impl ArchiveScan {
    fn skip(&mut self, entry: &str, reason: SkipReason) {
        debug!(archive = %self.slug, entry = %entry, reason = %reason, "skipping entry");
        self.skipped.push(SkippedEntry {
            archive: self.slug.clone(),
            entry: entry.to_string(),
            reason,
        });
    }
}
