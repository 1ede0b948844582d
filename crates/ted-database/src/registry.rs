//! Catalog of variable definitions keyed by fully qualified path.

use std::collections::BTreeMap;

use serde_yaml::Value;
use ted_model::{Result, TedError, VariableSpec};
use tracing::{debug, info};

use crate::database::{Database, yaml_files};
use crate::templates::{DefinitionAttributes, TemplateInputs, expand_definitions};
use crate::yaml::{read_yaml, scalar_to_string};

#[derive(Debug, Clone, Default)]
pub struct VariableRegistry {
    variables: BTreeMap<String, VariableSpec>,
}

impl VariableRegistry {
    pub fn from_specs(specs: impl IntoIterator<Item = VariableSpec>) -> Self {
        Self {
            variables: specs
                .into_iter()
                .map(|spec| (spec.name.clone(), spec))
                .collect(),
        }
    }

    /// Reads `definitions/variable/*.yml` of every database and expands templates.
    ///
    /// Later databases override earlier ones for the same raw key.
    pub fn load(databases: &[Database], inputs: TemplateInputs<'_>) -> Result<Self> {
        let raw = load_raw_definitions(databases)?;
        let raw_count = raw.len();
        let expanded = expand_definitions(raw, inputs);
        let registry = Self {
            variables: expanded
                .into_iter()
                .map(|(name, attributes)| {
                    let spec = spec_from_attributes(&name, &attributes);
                    (name, spec)
                })
                .collect(),
        };
        info!(
            raw = raw_count,
            variables = registry.len(),
            "built variable registry"
        );
        Ok(registry)
    }

    pub fn get(&self, path: &str) -> Option<&VariableSpec> {
        self.variables.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.variables.contains_key(path)
    }

    /// The parent itself and every variable below it, in path order.
    pub fn resolve(&self, parent: &str) -> Vec<&VariableSpec> {
        self.variables
            .range(parent.to_string()..)
            .take_while(|(name, _)| name.starts_with(parent))
            .map(|(_, spec)| spec)
            .filter(|spec| spec.is_under(parent))
            .collect()
    }

    pub fn default_unit(&self, path: &str) -> Option<&str> {
        self.get(path)?.default_unit.as_deref()
    }

    pub fn default_reference(&self, path: &str) -> Option<&str> {
        self.get(path)?.default_reference.as_deref()
    }

    pub fn flow_id(&self, path: &str) -> Option<&str> {
        self.get(path)?.flow_id.as_deref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariableSpec> {
        self.variables.values()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

fn load_raw_definitions(
    databases: &[Database],
) -> Result<BTreeMap<String, DefinitionAttributes>> {
    let mut raw = BTreeMap::new();
    for db in databases {
        let dir = db.variable_definitions_dir();
        for path in yaml_files(&dir).map_err(|e| TedError::io(&dir, e))? {
            let definitions: BTreeMap<String, Value> = read_yaml(&path)?;
            debug!(
                database = %db.id,
                path = %path.display(),
                definitions = definitions.len(),
                "read variable definitions"
            );
            for (key, value) in definitions {
                raw.insert(key, definition_attributes(&value));
            }
        }
    }
    Ok(raw)
}

fn definition_attributes(value: &Value) -> DefinitionAttributes {
    let Value::Mapping(mapping) = value else {
        return DefinitionAttributes::new();
    };
    mapping
        .iter()
        .filter_map(|(key, value)| Some((scalar_to_string(key)?, scalar_to_string(value)?)))
        .collect()
}

fn spec_from_attributes(name: &str, attributes: &DefinitionAttributes) -> VariableSpec {
    let get = |key: &str| attributes.get(key).filter(|v| !v.is_empty()).cloned();
    VariableSpec {
        name: name.to_string(),
        description: get("description"),
        default_unit: get("default_unit"),
        flow_id: get("flow_id"),
        default_reference: get("default_reference"),
        entry_type: get("type"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> VariableRegistry {
        VariableRegistry::from_specs([
            VariableSpec::new("Tech|Electrolysis|CAPEX").with_unit("EUR_2024"),
            VariableSpec::new("Tech|Electrolysis|Input|Electricity")
                .with_unit("MWh")
                .with_flow("Electricity"),
            VariableSpec::new("Tech|Electrolysis2|CAPEX"),
            VariableSpec::new("Tech|Steel|CAPEX"),
        ])
    }

    #[test]
    fn resolve_stops_at_segment_boundary() {
        let registry = registry();
        let names: Vec<&str> = registry
            .resolve("Tech|Electrolysis")
            .iter()
            .map(|spec| spec.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["Tech|Electrolysis|CAPEX", "Tech|Electrolysis|Input|Electricity"]
        );
    }

    #[test]
    fn lookups_by_full_path() {
        let registry = registry();
        assert_eq!(registry.default_unit("Tech|Electrolysis|CAPEX"), Some("EUR_2024"));
        assert_eq!(
            registry.flow_id("Tech|Electrolysis|Input|Electricity"),
            Some("Electricity")
        );
        assert_eq!(registry.default_reference("Tech|Steel|CAPEX"), None);
        assert!(!registry.contains("Tech|Steel|OPEX"));
    }
}
