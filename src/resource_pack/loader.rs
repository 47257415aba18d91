//! Mod archive loading from ZIP/JAR files.

use super::AssetSource;
use crate::error::{CatalogError, Result};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use zip::result::ZipError;
use zip::ZipArchive;

/// An opened mod archive.
///
/// Entry names are listed once at open time; entry bytes are read lazily.
pub struct ModArchive<R> {
    slug: String,
    archive: ZipArchive<R>,
    names: Vec<String>,
}

impl ModArchive<BufReader<File>> {
    /// Open an archive file. The slug is the file name without its extension.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::new(archive_slug(path), BufReader::new(file))
    }
}

impl ModArchive<Cursor<Vec<u8>>> {
    /// Open an archive already held in memory.
    pub fn from_bytes(slug: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        Self::new(slug.into(), Cursor::new(data))
    }
}

impl<R: Read + Seek> ModArchive<R> {
    fn new(slug: String, reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;

        let mut names = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let file = archive.by_index_raw(i)?;
            // Skip directories
            if file.is_dir() {
                continue;
            }
            names.push(file.name().to_string());
        }

        Ok(Self {
            slug,
            archive,
            names,
        })
    }

    /// Archive identifier (file name without extension).
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Number of file entries.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<R: Read + Seek> AssetSource for ModArchive<R> {
    fn entry_names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn read_entry(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(Some(data))
    }

    fn contains(&self, name: &str) -> bool {
        self.archive.index_for_name(name).is_some()
    }
}

/// An archive file found in a mods directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    pub slug: String,
    pub path: PathBuf,
}

/// List archive files in `dir` whose extension is one of `extensions`
/// (case-insensitive), sorted by file name.
pub fn list_archives<P: AsRef<Path>>(dir: P, extensions: &[String]) -> Result<Vec<ArchiveFile>> {
    let dir = dir.as_ref();
    let read_dir = std::fs::read_dir(dir).map_err(|source| CatalogError::ArchiveDirectory {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut archives = Vec::new();
    for entry in read_dir {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(e)))
            .unwrap_or(false);

        if matches {
            archives.push(ArchiveFile {
                slug: archive_slug(&path),
                path,
            });
        }
    }

    archives.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(archives)
}

/// File name without extension, e.g. `mods/create.jar` -> `create`.
pub fn archive_slug(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}
