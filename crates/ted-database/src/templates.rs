//! Expansion of templated variable definitions.
//!
//! Pass one replicates every definition whose key contains a tag token such
//! as `{Tech IDs}` once per tag item. Pass two fills semantic tokens
//! (`{default currency}`, `{primary output}`, `{default flow unit ...}`).
//! Definitions with a token left after both passes are dropped.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::settings::Settings;
use crate::tags::{Tag, TagAttributes, Tags};
use crate::types::FlowType;

pub const PARENT_VARIABLE_TOKEN: &str = "{parent variable}";

/// Attribute map of one definition, e.g. `default_unit`, `flow_id`.
pub type DefinitionAttributes = BTreeMap<String, String>;

#[derive(Debug, Clone)]
struct Pending {
    key: String,
    attributes: DefinitionAttributes,
    context: TagAttributes,
}

/// Lookup tables available to the second substitution pass.
#[derive(Debug, Clone, Copy)]
pub struct TemplateInputs<'a> {
    pub tags: &'a Tags,
    pub settings: &'a Settings,
    pub flow_types: &'a BTreeMap<String, FlowType>,
}

/// Expands tag templates and semantic tokens in raw definitions.
pub fn expand_definitions(
    raw: BTreeMap<String, DefinitionAttributes>,
    inputs: TemplateInputs<'_>,
) -> BTreeMap<String, DefinitionAttributes> {
    let mut pending: Vec<Pending> = raw
        .into_iter()
        .map(|(key, attributes)| Pending {
            key,
            attributes,
            context: TagAttributes::new(),
        })
        .collect();

    let mut tagged = Vec::new();
    while let Some(definition) = pending.pop() {
        match first_tag(&definition.key, inputs.tags) {
            Some((position, tag)) => pending.extend(replicate(&definition, position, tag)),
            None => tagged.push(definition),
        }
    }

    let mut expanded = BTreeMap::new();
    let mut dropped = 0usize;
    for definition in tagged {
        let resolved = substitute_semantic(definition, inputs);
        if let Some(token) = unresolved_token(&resolved.key, &resolved.attributes) {
            warn!(
                variable = %resolved.key,
                token = %token,
                "dropping variable definition with unresolved placeholder"
            );
            dropped += 1;
            continue;
        }
        expanded.insert(resolved.key, resolved.attributes);
    }
    debug!(definitions = expanded.len(), dropped, "expanded variable definitions");
    expanded
}

/// Earliest tag token occurring in `key`.
fn first_tag<'t>(key: &str, tags: &'t Tags) -> Option<(usize, &'t Tag)> {
    tags.values()
        .filter_map(|tag| key.find(&tag.token()).map(|position| (position, tag)))
        .min_by_key(|(position, _)| *position)
}

fn replicate(definition: &Pending, position: usize, tag: &Tag) -> Vec<Pending> {
    let token = tag.token();
    let parent = definition.key[..position].trim_end_matches('|');
    tag.items
        .iter()
        .map(|(item_id, item_attributes)| {
            let attributes = definition
                .attributes
                .iter()
                .map(|(name, value)| {
                    let value = value
                        .replace(&token, item_id)
                        .replace(PARENT_VARIABLE_TOKEN, parent);
                    (name.clone(), value)
                })
                .collect();
            let mut context = definition.context.clone();
            context.extend(item_attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
            Pending {
                key: definition.key.replace(&token, item_id),
                attributes,
                context,
            }
        })
        .collect()
}

fn substitute_semantic(mut definition: Pending, inputs: TemplateInputs<'_>) -> Pending {
    let flow = definition
        .attributes
        .get("flow_id")
        .or_else(|| definition.context.get("flow_id"))
        .and_then(|id| inputs.flow_types.get(id));

    let mut replacements: Vec<(&str, String)> = vec![(
        "{default currency}",
        inputs.settings.default_currency.clone(),
    )];
    if let Some(output) = definition.context.get("primary_output") {
        replacements.push(("{primary output}", output.clone()));
    }
    if let Some(flow) = flow {
        if let Some(unit) = &flow.default_unit {
            replacements.push(("{default flow unit full}", unit.clone()));
            replacements.push(("{default flow unit}", unit.clone()));
        }
        if let Some(raw) = flow.unit_raw() {
            replacements.push(("{default flow unit raw}", raw.to_string()));
        }
        replacements.push(("{default flow unit variant}", flow.unit_variant().to_string()));
    }

    let apply = |text: &str| {
        replacements
            .iter()
            .fold(text.to_string(), |acc, (token, value)| acc.replace(token, value))
    };
    definition.key = apply(&definition.key);
    for value in definition.attributes.values_mut() {
        *value = apply(value);
    }
    definition
}

fn unresolved_token(key: &str, attributes: &DefinitionAttributes) -> Option<String> {
    std::iter::once(key)
        .chain(attributes.values().map(String::as_str))
        .find_map(placeholder)
}

fn placeholder(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let end = text[start..].find('}')?;
    Some(text[start..=start + end].to_string())
}
