//! Block model parsing.
//!
//! Only the texture bindings and the custom `loader` marker are consumed by
//! the catalog; geometry and display data are validated and carried along.

use super::strip_bom;
use crate::error::{SchemaViolation, SkipReason};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Maximum depth when following `#slot` texture references.
const MAX_TEXTURE_REFERENCE_DEPTH: usize = 10;

/// A parsed model descriptor from `models/*.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Custom render pipeline (e.g. `forge:obj`). Bypasses texture-map resolution.
    #[serde(default)]
    pub loader: Option<String>,

    #[serde(default)]
    pub render_type: RenderType,

    /// Parent model to inherit from.
    #[serde(default)]
    pub parent: Option<String>,

    /// Whether to use ambient occlusion.
    #[serde(default = "default_ao", rename = "ambientocclusion")]
    pub ambient_occlusion: bool,

    /// Display transforms per context (gui, ground, fixed, ...).
    #[serde(default)]
    pub display: Option<IndexMap<String, DisplayTransform>>,

    /// Texture slot name to texture reference, in document order.
    #[serde(default)]
    pub textures: Option<IndexMap<String, String>>,

    #[serde(default)]
    pub elements: Option<Vec<ModelElement>>,
}

fn default_ao() -> bool {
    true
}

/// Render layer requested by a model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RenderType {
    #[default]
    Solid,
    Cutout,
    CutoutMipped,
    CutoutMippedAll,
    Translucent,
    Tripwire,
    /// Any render type this crate does not know about.
    Other(String),
}

impl From<String> for RenderType {
    fn from(value: String) -> Self {
        let name = value.strip_prefix("minecraft:").unwrap_or(&value);
        match name {
            "solid" => RenderType::Solid,
            "cutout" => RenderType::Cutout,
            "cutout_mipped" => RenderType::CutoutMipped,
            "cutout_mipped_all" => RenderType::CutoutMippedAll,
            "translucent" => RenderType::Translucent,
            "tripwire" => RenderType::Tripwire,
            _ => RenderType::Other(value),
        }
    }
}

impl From<RenderType> for String {
    fn from(value: RenderType) -> Self {
        match value {
            RenderType::Solid => "minecraft:solid".to_string(),
            RenderType::Cutout => "minecraft:cutout".to_string(),
            RenderType::CutoutMipped => "minecraft:cutout_mipped".to_string(),
            RenderType::CutoutMippedAll => "minecraft:cutout_mipped_all".to_string(),
            RenderType::Translucent => "minecraft:translucent".to_string(),
            RenderType::Tripwire => "minecraft:tripwire".to_string(),
            RenderType::Other(other) => other,
        }
    }
}

/// Item display transform for one context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayTransform {
    #[serde(default)]
    pub rotation: Option<[f64; 3]>,
    /// Each component within [-80, 80].
    #[serde(default)]
    pub translation: Option<[f64; 3]>,
    /// Each component at most 4.
    #[serde(default)]
    pub scale: Option<[f64; 3]>,
}

/// A cuboid element within a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelElement {
    /// Minimum corner, each component within [-16, 32].
    pub from: [f64; 3],
    /// Maximum corner, each component within [-16, 32].
    pub to: [f64; 3],
    /// Whether this element receives shade.
    #[serde(default = "default_shade")]
    pub shade: bool,
}

fn default_shade() -> bool {
    true
}

impl ModelDescriptor {
    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), SchemaViolation> {
        if let Some(display) = &self.display {
            for (context, transform) in display {
                if let Some(translation) = transform.translation {
                    check_range(
                        &translation,
                        -80.0,
                        80.0,
                        &format!("display.{}.translation", context),
                    )?;
                }
                if let Some(scale) = transform.scale {
                    check_range(
                        &scale,
                        f64::NEG_INFINITY,
                        4.0,
                        &format!("display.{}.scale", context),
                    )?;
                }
            }
        }

        if let Some(elements) = &self.elements {
            for (i, element) in elements.iter().enumerate() {
                check_range(&element.from, -16.0, 32.0, &format!("elements[{}].from", i))?;
                check_range(&element.to, -16.0, 32.0, &format!("elements[{}].to", i))?;
            }
        }

        Ok(())
    }

    /// Whether this model is rendered by a custom loader.
    pub fn has_custom_loader(&self) -> bool {
        self.loader.is_some()
    }

    /// Follow a `#slot` reference through this model's textures.
    ///
    /// Direct paths are returned unchanged; dangling or cyclic references give `None`.
    pub fn resolve_texture<'a>(&'a self, reference: &'a str) -> Option<&'a str> {
        let textures = self.textures.as_ref();
        let mut current = reference;

        for _ in 0..MAX_TEXTURE_REFERENCE_DEPTH {
            let Some(slot) = current.strip_prefix('#') else {
                return Some(current);
            };
            current = textures?.get(slot)?.as_str();
        }

        None
    }
}

fn check_range(values: &[f64; 3], min: f64, max: f64, field: &str) -> Result<(), SchemaViolation> {
    for value in values {
        if *value < min || *value > max {
            let message = if min.is_finite() {
                format!("{} is outside [{}, {}]", value, min, max)
            } else {
                format!("{} is greater than {}", value, max)
            };
            return Err(SchemaViolation::new(field, message));
        }
    }
    Ok(())
}

/// Parse and validate raw entry bytes as a model descriptor.
pub fn parse_model(bytes: &[u8]) -> Result<ModelDescriptor, SkipReason> {
    let model: ModelDescriptor = serde_json::from_slice(strip_bom(bytes)).map_err(|e| {
        if e.is_syntax() || e.is_eof() {
            SkipReason::Json(e.to_string())
        } else {
            SkipReason::Schema(SchemaViolation::new("$", e.to_string()))
        }
    })?;
    model.validate()?;
    Ok(model)
}
