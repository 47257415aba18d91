//! Shared types used throughout the library.

use serde::{Deserialize, Serialize};

/// Composite identity of a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockKey {
    pub block_id: String,
    pub mod_id: String,
}

impl BlockKey {
    pub fn new(block_id: impl Into<String>, mod_id: impl Into<String>) -> Self {
        Self {
            block_id: block_id.into(),
            mod_id: mod_id.into(),
        }
    }

    /// Resource location form, e.g. `m1:door`.
    pub fn location(&self) -> String {
        format!("{}:{}", self.mod_id, self.block_id)
    }
}

/// A resolved block as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    pub block_id: String,
    pub mod_id: String,
    /// Human-readable name from the archive's lang file.
    pub block_name: Option<String>,
    /// Source archive identifier (file name without extension).
    pub jar_slug: String,
    /// Base64-encoded PNG of the representative texture.
    pub texture64: Option<String>,
    /// Archive path of the block-state descriptor.
    pub entry_name: String,
    #[serde(default)]
    pub variants: Vec<VariantSpec>,
}

impl BlockRecord {
    pub fn key(&self) -> BlockKey {
        BlockKey::new(&self.block_id, &self.mod_id)
    }

    /// Display name, falling back to the block ID.
    pub fn display_name(&self) -> &str {
        self.block_name.as_deref().unwrap_or(&self.block_id)
    }

    pub fn has_texture(&self) -> bool {
        self.texture64.is_some()
    }
}

/// One state dimension of a block (e.g. `facing`) and its domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSpec {
    pub key: String,
    #[serde(flatten)]
    pub kind: VariantKind,
}

/// Domain of a state dimension, tagged by `type` when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VariantKind {
    /// `true` / `false`.
    Boolean,
    Number { values: Vec<f64> },
    String { values: Vec<String> },
}

impl VariantSpec {
    pub fn boolean(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: VariantKind::Boolean,
        }
    }

    pub fn number(key: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            key: key.into(),
            kind: VariantKind::Number { values },
        }
    }

    pub fn string(key: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            key: key.into(),
            kind: VariantKind::String { values },
        }
    }

    /// Number of distinct values in this dimension.
    pub fn cardinality(&self) -> usize {
        match &self.kind {
            VariantKind::Boolean => 2,
            VariantKind::Number { values } => values.len(),
            VariantKind::String { values } => values.len(),
        }
    }

    /// The value a viewer should start from: `false` for booleans, else the first value.
    pub fn default_value(&self) -> Option<String> {
        match &self.kind {
            VariantKind::Boolean => Some("false".to_string()),
            VariantKind::Number { values } => values.first().map(|v| v.to_string()),
            VariantKind::String { values } => values.first().cloned(),
        }
    }
}

/// Build the default state string for a block (e.g. `facing=north,open=false`).
pub fn default_state_string(variants: &[VariantSpec]) -> String {
    variants
        .iter()
        .filter_map(|v| v.default_value().map(|value| format!("{}={}", v.key, value)))
        .collect::<Vec<_>>()
        .join(",")
}
