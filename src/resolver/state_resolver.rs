//! Block-state descriptor to state dimensions and representative model.

use crate::error::SkipReason;
use crate::resource_pack::{BlockstateDescriptor, ModelVariant, VariantValue};
use crate::types::VariantSpec;
use indexmap::{IndexMap, IndexSet};

/// The state space of a block and the model chosen to represent it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStates<'a> {
    /// One entry per state dimension, in first-seen order.
    pub variants: Vec<VariantSpec>,
    /// State key the representative model was taken from.
    pub state_key: &'a str,
    /// Model reference used for texture resolution.
    pub representative: &'a ModelVariant,
}

/// Resolve a descriptor's state dimensions and representative model.
///
/// A `""` state short-circuits to that state with no dimensions. Otherwise
/// every state key is decomposed into dimensions, and the representative is
/// the first state in document order. That choice is positional, not a
/// semantic default.
pub fn resolve_states(descriptor: &BlockstateDescriptor) -> Result<ResolvedStates<'_>, SkipReason> {
    let variants = descriptor.variants.as_ref().ok_or(SkipReason::NoVariants)?;

    if let Some((state_key, value)) = variants.get_key_value("") {
        return Ok(ResolvedStates {
            variants: Vec::new(),
            state_key: state_key.as_str(),
            representative: primary(value)?,
        });
    }

    let (state_key, value) = variants.first().ok_or(SkipReason::NoVariants)?;

    Ok(ResolvedStates {
        variants: collect_dimensions(variants.keys().map(|k| k.as_str())),
        state_key: state_key.as_str(),
        representative: primary(value)?,
    })
}

fn primary(value: &VariantValue) -> Result<&ModelVariant, SkipReason> {
    value.primary().ok_or(SkipReason::EmptyVariantList)
}

/// Decompose state keys (`a=1,b=x`) into one entry per dimension.
pub fn collect_dimensions<'a>(state_keys: impl IntoIterator<Item = &'a str>) -> Vec<VariantSpec> {
    let mut observed: IndexMap<&str, IndexSet<&str>> = IndexMap::new();

    for state_key in state_keys {
        for (name, value) in split_state_key(state_key) {
            observed.entry(name).or_default().insert(value);
        }
    }

    observed
        .into_iter()
        .map(|(name, values)| classify_dimension(name, &values))
        .collect()
}

/// Split a state key into `(name, value)` pairs.
///
/// A fragment without `=` is a dimension with an empty value.
pub fn split_state_key(state_key: &str) -> impl Iterator<Item = (&str, &str)> {
    state_key
        .split(',')
        .filter(|fragment| !state_key.is_empty() || !fragment.is_empty())
        .map(|fragment| fragment.split_once('=').unwrap_or((fragment, "")))
}

/// Classify a dimension from its observed values: boolean, then numeric, then string.
pub fn classify_dimension(name: &str, values: &IndexSet<&str>) -> VariantSpec {
    if values.iter().all(|v| *v == "true" || *v == "false") {
        return VariantSpec::boolean(name);
    }

    let numbers: Option<Vec<f64>> = values.iter().map(|v| parse_number(v)).collect();
    if let Some(numbers) = numbers {
        let mut distinct: Vec<f64> = Vec::with_capacity(numbers.len());
        for n in numbers {
            if !distinct.contains(&n) {
                distinct.push(n);
            }
        }
        return VariantSpec::number(name, distinct);
    }

    VariantSpec::string(name, values.iter().map(|v| v.to_string()).collect())
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}
