//! Mod archive access and descriptor parsing.
//!
//! This module handles reading mod archives (ZIP/JAR files) and parsing the
//! resource pack assets they carry: blockstates, models, textures and lang files.

pub mod loader;
pub mod path;
pub mod blockstate;
pub mod model;
pub mod lang;
pub mod texture;

pub use blockstate::{parse_blockstate, BlockstateDescriptor, ModelVariant, VariantValue};
pub use lang::LangTable;
pub use loader::{list_archives, ModArchive};
pub use model::{parse_model, ModelDescriptor, RenderType};
pub use path::AssetPath;

use crate::error::Result;
use indexmap::IndexMap;

/// Read-only, path-indexed view of an archive.
///
/// Lookups take `&mut self` because ZIP readers seek on every read.
pub trait AssetSource {
    /// Names of all file entries, in archive order.
    fn entry_names(&self) -> Vec<String>;

    /// Bytes of the named entry, or `None` if there is no such entry.
    fn read_entry(&mut self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Whether the named entry exists.
    fn contains(&self, name: &str) -> bool {
        self.entry_names().iter().any(|n| n == name)
    }
}

/// An archive held entirely in memory. Entries keep insertion order.
#[derive(Debug, Default, Clone)]
pub struct MemoryArchive {
    entries: IndexMap<String, Vec<u8>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry.
    pub fn add(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.entries.insert(name.into(), data.into());
    }

    /// Builder form of [`add`](Self::add).
    pub fn with(mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.add(name, data);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AssetSource for MemoryArchive {
    fn entry_names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn read_entry(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(name).cloned())
    }

    fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

/// Drop a leading UTF-8 byte order mark, which some mod tooling writes.
pub(crate) fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
}
