//! Tags used to expand templated variable definitions.
//!
//! A tag is a named list of items. `Flow IDs` and `Tech IDs` are built from
//! the type tables; further tags come from `definitions/tag/<Name>.yml`.

use std::collections::BTreeMap;

use serde_yaml::Value;
use ted_model::{Result, TedError};
use tracing::debug;

use crate::database::{Database, yaml_files};
use crate::types::{FlowType, TechType};
use crate::yaml::{read_yaml, scalar_to_string};

pub const FLOW_IDS: &str = "Flow IDs";
pub const TECH_IDS: &str = "Tech IDs";

/// Attributes an item contributes to the definitions expanded from it.
pub type TagAttributes = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tag {
    pub name: String,
    pub items: BTreeMap<String, TagAttributes>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: BTreeMap::new(),
        }
    }

    pub fn with_item(mut self, id: impl Into<String>, attributes: TagAttributes) -> Self {
        self.items.insert(id.into(), attributes);
        self
    }

    /// Placeholder text for this tag, e.g. `{Flow IDs}`.
    pub fn token(&self) -> String {
        format!("{{{}}}", self.name)
    }
}

pub type Tags = BTreeMap<String, Tag>;

/// `Flow IDs` and `Tech IDs` built from the type tables.
pub fn builtin_tags(
    flow_types: &BTreeMap<String, FlowType>,
    tech_types: &BTreeMap<String, TechType>,
) -> Tags {
    let flows = flow_types.keys().fold(Tag::new(FLOW_IDS), |tag, id| {
        tag.with_item(id, TagAttributes::from([("flow_id".to_string(), id.clone())]))
    });
    let techs = tech_types.values().fold(Tag::new(TECH_IDS), |tag, tech| {
        let mut attributes = TagAttributes::from([("tech_id".to_string(), tech.id.clone())]);
        if let Some(output) = &tech.primary_output {
            attributes.insert("primary_output".to_string(), output.clone());
        }
        tag.with_item(&tech.id, attributes)
    });
    Tags::from([(FLOW_IDS.to_string(), flows), (TECH_IDS.to_string(), techs)])
}

/// Built-in tags merged with every database's tag files.
///
/// A tag file named like an existing tag adds to (and overrides) its items.
pub fn load_tags(
    databases: &[Database],
    flow_types: &BTreeMap<String, FlowType>,
    tech_types: &BTreeMap<String, TechType>,
) -> Result<Tags> {
    let mut tags = builtin_tags(flow_types, tech_types);
    for db in databases {
        let dir = db.tag_definitions_dir();
        for path in yaml_files(&dir).map_err(|e| TedError::io(&dir, e))? {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let raw: BTreeMap<String, Value> = read_yaml(&path)?;
            let tag = tags.entry(name.clone()).or_insert_with(|| Tag::new(&name));
            for (id, attrs) in raw {
                tag.items.insert(id, attributes_from(&attrs));
            }
            debug!(database = %db.id, tag = %name, items = tag.items.len(), "loaded tag");
        }
    }
    Ok(tags)
}

fn attributes_from(value: &Value) -> TagAttributes {
    let Value::Mapping(mapping) = value else {
        return TagAttributes::new();
    };
    mapping
        .iter()
        .filter_map(|(key, value)| Some((scalar_to_string(key)?, scalar_to_string(value)?)))
        .collect()
}
