use serde::{Deserialize, Serialize};

/// A variable definition keyed by its fully qualified path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_unit: Option<String>,
    #[serde(default)]
    pub flow_id: Option<String>,
    /// Fully qualified path of the default reference variable.
    #[serde(default)]
    pub default_reference: Option<String>,
    #[serde(default)]
    pub entry_type: Option<String>,
}

impl VariableSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            default_unit: None,
            flow_id: None,
            default_reference: None,
            entry_type: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.default_unit = Some(unit.into());
        self
    }

    pub fn with_flow(mut self, flow_id: impl Into<String>) -> Self {
        self.flow_id = Some(flow_id.into());
        self
    }

    pub fn with_default_reference(mut self, reference: impl Into<String>) -> Self {
        self.default_reference = Some(reference.into());
        self
    }

    /// Whether `path` is this variable or lies below it.
    pub fn is_under(&self, parent: &str) -> bool {
        self.name == parent
            || self
                .name
                .strip_prefix(parent)
                .is_some_and(|rest| rest.starts_with('|'))
    }
}
