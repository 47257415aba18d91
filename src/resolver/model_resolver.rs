//! Model lookup and representative texture selection.

use crate::error::SkipReason;
use crate::resource_pack::path::{model_entry_path, parse_resource_location, texture_entry_path};
use crate::resource_pack::texture::{encode_texture, is_png};
use crate::resource_pack::{parse_model, AssetSource, ModelDescriptor};
use std::collections::HashMap;
use tracing::debug;

/// Texture slots tried in order before falling back to the first slot.
pub const TEXTURE_PRIORITY: [&str; 4] = ["all", "texture", "front", "side"];

/// How texture resolution ended for one block.
///
/// Only [`TextureOutcome::Resolved`] carries a texture; every other outcome
/// is an expected, non-fatal result.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureOutcome {
    Resolved { path: String, texture64: String },
    /// The referenced model is not in the archive.
    ModelMissing { path: String },
    /// The model failed validation.
    ModelInvalid { path: String, reason: SkipReason },
    /// The model is rendered by a custom loader; textures are not resolved.
    CustomLoader { loader: String },
    /// The model has no texture bindings.
    NoTextures,
    /// The selected slot points at a `#slot` that does not resolve.
    UnresolvedReference { reference: String },
    /// The selected texture is not in the archive.
    TextureMissing { path: String },
    /// An archive entry could not be read.
    ReadFailed { path: String, message: String },
}

impl TextureOutcome {
    pub fn texture64(&self) -> Option<&str> {
        match self {
            TextureOutcome::Resolved { texture64, .. } => Some(texture64),
            _ => None,
        }
    }

    pub fn into_texture64(self) -> Option<String> {
        match self {
            TextureOutcome::Resolved { texture64, .. } => Some(texture64),
            _ => None,
        }
    }

    /// Short label for diagnostics counters.
    pub fn label(&self) -> &'static str {
        match self {
            TextureOutcome::Resolved { .. } => "resolved",
            TextureOutcome::ModelMissing { .. } => "model_missing",
            TextureOutcome::ModelInvalid { .. } => "model_invalid",
            TextureOutcome::CustomLoader { .. } => "custom_loader",
            TextureOutcome::NoTextures => "no_textures",
            TextureOutcome::UnresolvedReference { .. } => "unresolved_reference",
            TextureOutcome::TextureMissing { .. } => "texture_missing",
            TextureOutcome::ReadFailed { .. } => "read_failed",
        }
    }
}

/// Resolves model references to textures within one archive.
///
/// Parsed models are cached, since many block states share a model.
pub struct AssetResolver<'a, S: AssetSource + ?Sized> {
    source: &'a mut S,
    cache: HashMap<String, Result<ModelDescriptor, SkipReason>>,
}

impl<'a, S: AssetSource + ?Sized> AssetResolver<'a, S> {
    pub fn new(source: &'a mut S) -> Self {
        Self {
            source,
            cache: HashMap::new(),
        }
    }

    /// Read an entry from the underlying archive.
    pub fn read_entry(&mut self, name: &str) -> crate::error::Result<Option<Vec<u8>>> {
        self.source.read_entry(name)
    }

    /// Resolve the representative texture for a model reference.
    ///
    /// `model_reference` may be namespaced (`m1:block/door`); bare references
    /// resolve under `mod_id`.
    pub fn resolve(&mut self, mod_id: &str, model_reference: &str) -> TextureOutcome {
        let (namespace, model_path) = parse_resource_location(model_reference, mod_id);
        let model_entry = model_entry_path(namespace, model_path);

        let model = match self.load_model(&model_entry) {
            Ok(Some(model)) => model,
            Ok(None) => return TextureOutcome::ModelMissing { path: model_entry },
            Err(ModelLoadError::Invalid(reason)) => {
                return TextureOutcome::ModelInvalid {
                    path: model_entry,
                    reason,
                }
            }
            Err(ModelLoadError::Read(message)) => {
                return TextureOutcome::ReadFailed {
                    path: model_entry,
                    message,
                }
            }
        };

        if let Some(loader) = &model.loader {
            debug!(model = %model_entry, loader = %loader, "model uses a custom loader; texture not resolved");
            return TextureOutcome::CustomLoader {
                loader: loader.clone(),
            };
        }

        let Some(selected) = select_texture(&model) else {
            return TextureOutcome::NoTextures;
        };

        let Some(reference) = model.resolve_texture(selected) else {
            return TextureOutcome::UnresolvedReference {
                reference: selected.to_string(),
            };
        };

        let (namespace, texture_path) = parse_resource_location(reference, mod_id);
        let texture_entry = texture_entry_path(namespace, texture_path);

        match self.source.read_entry(&texture_entry) {
            Ok(Some(data)) => {
                if !is_png(&data) {
                    debug!(texture = %texture_entry, "texture does not carry a PNG signature");
                }
                TextureOutcome::Resolved {
                    texture64: encode_texture(&data),
                    path: texture_entry,
                }
            }
            Ok(None) => TextureOutcome::TextureMissing {
                path: texture_entry,
            },
            Err(e) => TextureOutcome::ReadFailed {
                path: texture_entry,
                message: e.to_string(),
            },
        }
    }

    fn load_model(&mut self, entry: &str) -> Result<Option<ModelDescriptor>, ModelLoadError> {
        if let Some(cached) = self.cache.get(entry) {
            return cached.clone().map(Some).map_err(ModelLoadError::Invalid);
        }

        let data = match self.source.read_entry(entry) {
            Ok(Some(data)) => data,
            Ok(None) => return Ok(None),
            Err(e) => return Err(ModelLoadError::Read(e.to_string())),
        };

        let parsed = parse_model(&data);
        self.cache.insert(entry.to_string(), parsed.clone());
        parsed.map(Some).map_err(ModelLoadError::Invalid)
    }
}

enum ModelLoadError {
    Invalid(SkipReason),
    Read(String),
}

/// Pick the texture slot value that represents a model.
///
/// Slots are tried in [`TEXTURE_PRIORITY`] order, then the first slot in
/// document order.
pub fn select_texture(model: &ModelDescriptor) -> Option<&str> {
    let textures = model.textures.as_ref()?;

    TEXTURE_PRIORITY
        .iter()
        .filter_map(|slot| textures.get(*slot))
        .find(|value| !value.is_empty())
        .or_else(|| textures.values().next())
        .map(|value| value.as_str())
}
