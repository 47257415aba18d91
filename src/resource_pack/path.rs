//! Archive path conventions.
//!
//! Mod archives follow the resource pack layout `assets/{namespace}/{type}/{path}`.
//! Only two kinds of entry matter for the catalog: block-state descriptors and
//! the English lang file.

use crate::error::SkipReason;
use regex::Regex;
use std::sync::LazyLock;

static BLOCKSTATE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^assets/(?P<mod_id>[^/]*)/blockstates/(?P<block_id>[^/]*)\.json$")
        .expect("blockstate path pattern is valid")
});

static LANG_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^assets/(?P<mod_id>[^/]*)/lang/en_us\.json$").expect("lang path pattern is valid")
});

/// A recognized archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetPath<'a> {
    /// `assets/<modId>/blockstates/<blockId>.json`
    Blockstate { mod_id: &'a str, block_id: &'a str },
    /// `assets/<modId>/lang/en_us.json`
    Lang { mod_id: &'a str },
}

/// Classify an entry path.
///
/// Returns `None` for entries that follow neither convention, and
/// `Some(Err(..))` for paths that look like a descriptor but carry an empty
/// namespace or block ID.
pub fn classify(entry_name: &str) -> Option<Result<AssetPath<'_>, SkipReason>> {
    if let Some(caps) = BLOCKSTATE_PATH.captures(entry_name) {
        let mod_id = caps.name("mod_id").map(|m| m.as_str()).unwrap_or_default();
        let block_id = caps.name("block_id").map(|m| m.as_str()).unwrap_or_default();
        if mod_id.is_empty() || block_id.is_empty() {
            return Some(Err(SkipReason::InvalidIdentifier));
        }
        return Some(Ok(AssetPath::Blockstate { mod_id, block_id }));
    }

    if let Some(caps) = LANG_PATH.captures(entry_name) {
        let mod_id = caps.name("mod_id").map(|m| m.as_str()).unwrap_or_default();
        if mod_id.is_empty() {
            return Some(Err(SkipReason::InvalidIdentifier));
        }
        return Some(Ok(AssetPath::Lang { mod_id }));
    }

    None
}

/// Whether the entry is an English lang file.
pub fn is_lang_file(entry_name: &str) -> bool {
    LANG_PATH.is_match(entry_name)
}

/// Split a resource location into namespace and path, defaulting the
/// namespace to `default_namespace`.
///
/// `"m1:block/door"` -> `("m1", "block/door")`
/// `"block/door"` -> `(default_namespace, "block/door")`
pub fn parse_resource_location<'a>(
    resource_location: &'a str,
    default_namespace: &'a str,
) -> (&'a str, &'a str) {
    match resource_location.split_once(':') {
        Some((namespace, path)) => (namespace, path),
        None => (default_namespace, resource_location),
    }
}

/// Archive path of a model descriptor.
pub fn model_entry_path(namespace: &str, model_path: &str) -> String {
    format!("assets/{}/models/{}.json", namespace, model_path)
}

/// Archive path of a texture.
pub fn texture_entry_path(namespace: &str, texture_path: &str) -> String {
    format!("assets/{}/textures/{}.png", namespace, texture_path)
}
