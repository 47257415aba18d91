//! English lang files and block display names.

use super::strip_bom;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;

/// Translation keys merged from every `en_us.json` in one archive.
#[derive(Debug, Clone, Default)]
pub struct LangTable {
    entries: HashMap<String, String>,
}

impl LangTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a lang file. Non-string values are ignored.
    ///
    /// Returns the number of keys added or replaced.
    pub fn merge_json(&mut self, bytes: &[u8]) -> Result<usize, serde_json::Error> {
        let parsed: IndexMap<String, Value> = serde_json::from_slice(strip_bom(bytes))?;
        let mut count = 0;
        for (key, value) in parsed {
            if let Value::String(text) = value {
                self.entries.insert(key, text);
                count += 1;
            }
        }
        Ok(count)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|s| s.as_str())
    }

    /// Display name of a block, looked up as `block.<modId>.<blockId>`.
    pub fn block_name(&self, mod_id: &str, block_id: &str) -> Option<&str> {
        self.get(&block_translation_key(mod_id, block_id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Translation key for a block, e.g. `block.m1.door`.
pub fn block_translation_key(mod_id: &str, block_id: &str) -> String {
    format!("block.{}.{}", mod_id, block_id)
}
