//! Block state and asset resolution.
//!
//! This module turns a validated block-state descriptor into its state
//! dimensions and a representative texture.

pub mod model_resolver;
pub mod state_resolver;

pub use model_resolver::{AssetResolver, TextureOutcome};
pub use state_resolver::{resolve_states, ResolvedStates};

use crate::error::SkipReason;
use crate::resource_pack::{AssetSource, BlockstateDescriptor};
use crate::types::VariantSpec;

/// A block resolved from one descriptor, before naming and persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBlock {
    pub variants: Vec<VariantSpec>,
    /// State key the representative model came from.
    pub state_key: String,
    /// Representative model reference.
    pub model: String,
    pub texture: TextureOutcome,
}

/// Resolve a block's state dimensions and representative texture.
///
/// Only a descriptor without resolvable variants is an error; asset problems
/// are reported through [`ResolvedBlock::texture`].
pub fn resolve_block<S: AssetSource + ?Sized>(
    assets: &mut AssetResolver<'_, S>,
    mod_id: &str,
    descriptor: &BlockstateDescriptor,
) -> Result<ResolvedBlock, SkipReason> {
    let states = resolve_states(descriptor)?;
    let texture = assets.resolve(mod_id, &states.representative.model);

    Ok(ResolvedBlock {
        variants: states.variants,
        state_key: states.state_key.to_string(),
        model: states.representative.model.clone(),
        texture,
    })
}
