//! Block-state descriptor parsing.
//!
//! Blockstates define how block properties map to model variants.
//! There are two formats: "variants" and "multipart". Only the variants map is
//! resolved; multipart is detected and otherwise ignored.

use super::strip_bom;
use crate::error::{SchemaViolation, SkipReason};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A block-state descriptor from `blockstates/*.json`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockstateDescriptor {
    /// State key (e.g. `facing=north,open=false`, or `""`) to model reference(s).
    /// Keeps the order of the source document.
    pub variants: Option<IndexMap<String, VariantValue>>,
    /// Whether a `multipart` array was present.
    pub multipart: bool,
}

impl<'de> Deserialize<'de> for BlockstateDescriptor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

impl BlockstateDescriptor {
    /// Validate a parsed JSON document against the block-state shape.
    ///
    /// Unknown fields are ignored.
    pub fn from_value(value: Value) -> Result<Self, SchemaViolation> {
        let Value::Object(mut root) = value else {
            return Err(SchemaViolation::new("$", "expected an object"));
        };

        let variants = match root.remove("variants") {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => {
                let mut parsed = IndexMap::with_capacity(map.len());
                for (key, value) in map {
                    let variant = VariantValue::from_value(value).map_err(|e| {
                        SchemaViolation::new(format!("variants.{}", key), e.to_string())
                    })?;
                    parsed.insert(key, variant);
                }
                Some(parsed)
            }
            Some(_) => {
                return Err(SchemaViolation::new("variants", "expected an object"));
            }
        };

        let multipart = match root.remove("multipart") {
            None | Some(Value::Null) => false,
            Some(Value::Array(cases)) => {
                if let Some(index) = cases.iter().position(|case| !case.is_object()) {
                    return Err(SchemaViolation::new(
                        format!("multipart[{}]", index),
                        "expected an object",
                    ));
                }
                true
            }
            Some(_) => {
                return Err(SchemaViolation::new("multipart", "expected an array"));
            }
        };

        Ok(Self {
            variants,
            multipart,
        })
    }

    /// Whether the descriptor has a default (`""`) state.
    pub fn has_default_state(&self) -> bool {
        self.variants
            .as_ref()
            .map(|v| v.contains_key(""))
            .unwrap_or(false)
    }
}

/// Parse and validate raw entry bytes as a block-state descriptor.
pub fn parse_blockstate(bytes: &[u8]) -> Result<BlockstateDescriptor, SkipReason> {
    let value: Value =
        serde_json::from_slice(strip_bom(bytes)).map_err(|e| SkipReason::Json(e.to_string()))?;
    Ok(BlockstateDescriptor::from_value(value)?)
}

/// A variant value can be a single model or an array of weighted models.
#[derive(Debug, Clone, PartialEq)]
pub enum VariantValue {
    Single(ModelVariant),
    Weighted(Vec<ModelVariant>),
}

impl VariantValue {
    fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Array(_) => Ok(VariantValue::Weighted(serde_json::from_value(value)?)),
            other => Ok(VariantValue::Single(serde_json::from_value(other)?)),
        }
    }

    /// The model used to represent this state: the value itself, or the
    /// first weighted alternative.
    pub fn primary(&self) -> Option<&ModelVariant> {
        match self {
            VariantValue::Single(v) => Some(v),
            VariantValue::Weighted(v) => v.first(),
        }
    }

    pub fn variants(&self) -> Vec<&ModelVariant> {
        match self {
            VariantValue::Single(v) => vec![v],
            VariantValue::Weighted(v) => v.iter().collect(),
        }
    }
}

/// A model variant reference with optional rotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVariant {
    /// Model resource location (e.g., "block/door" or "m1:block/door").
    pub model: String,
    /// X rotation in degrees.
    #[serde(default)]
    pub x: Option<f64>,
    /// Y rotation in degrees.
    #[serde(default)]
    pub y: Option<f64>,
    /// If true, UV coordinates don't rotate with the block.
    #[serde(default)]
    pub uvlock: bool,
    /// Weight for random selection (default 1).
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}
