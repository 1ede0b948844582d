//! Flow and technology type tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ted_model::Result;
use tracing::debug;

use crate::csv_utils::{optional, read_keyed_rows};
use crate::database::Database;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowType {
    pub id: String,
    pub name: String,
    /// May carry a variant after `;`, e.g. `MWh;LHV`.
    pub default_unit: Option<String>,
}

impl FlowType {
    /// Unit before the `;` variant marker.
    pub fn unit_raw(&self) -> Option<&str> {
        self.default_unit
            .as_deref()
            .map(|unit| unit.split_once(';').map_or(unit, |(raw, _)| raw))
    }

    /// Variant after `;`, empty when there is none.
    pub fn unit_variant(&self) -> &str {
        self.default_unit
            .as_deref()
            .and_then(|unit| unit.split_once(';'))
            .map_or("", |(_, variant)| variant)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechType {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub class: Option<String>,
    /// Flow id of the technology's main product.
    pub primary_output: Option<String>,
}

/// Flow types of all databases; later databases override earlier ids.
pub fn load_flow_types(databases: &[Database]) -> Result<BTreeMap<String, FlowType>> {
    let mut flow_types = BTreeMap::new();
    for db in databases {
        let path = db.flow_types_path();
        if !path.is_file() {
            continue;
        }
        for (id, row) in read_keyed_rows(&path)? {
            let flow = FlowType {
                name: optional(&row, "name").unwrap_or_else(|| id.clone()),
                default_unit: optional(&row, "default_unit"),
                id: id.clone(),
            };
            flow_types.insert(id, flow);
        }
        debug!(database = %db.id, count = flow_types.len(), "loaded flow types");
    }
    Ok(flow_types)
}

/// Technology types of all databases; later databases override earlier ids.
pub fn load_tech_types(databases: &[Database]) -> Result<BTreeMap<String, TechType>> {
    let mut tech_types = BTreeMap::new();
    for db in databases {
        let path = db.tech_types_path();
        if !path.is_file() {
            continue;
        }
        for (id, row) in read_keyed_rows(&path)? {
            let tech = TechType {
                name: optional(&row, "name").unwrap_or_else(|| id.clone()),
                description: optional(&row, "description"),
                class: optional(&row, "class"),
                primary_output: optional(&row, "primary_output"),
                id: id.clone(),
            };
            tech_types.insert(id, tech);
        }
        debug!(database = %db.id, count = tech_types.len(), "loaded tech types");
    }
    Ok(tech_types)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_unit_variant() {
        let flow = FlowType {
            id: "h2".to_string(),
            name: "Hydrogen".to_string(),
            default_unit: Some("MWh;LHV".to_string()),
        };
        assert_eq!(flow.unit_raw(), Some("MWh"));
        assert_eq!(flow.unit_variant(), "LHV");
    }

    #[test]
    fn later_database_overrides_flow_type() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(
            first.path().join("flow_types.csv"),
            "id,name,default_unit\nh2,Hydrogen,MWh;LHV\nelec,Electricity,MWh\n",
        )
        .unwrap();
        std::fs::write(
            second.path().join("flow_types.csv"),
            "id,name,default_unit\nh2,Hydrogen,t\n",
        )
        .unwrap();

        let databases = vec![
            Database::new("first", first.path()),
            Database::new("second", second.path()),
        ];
        let flows = load_flow_types(&databases).unwrap();
        assert_eq!(flows.len(), 2);
        assert_eq!(flows["h2"].default_unit.as_deref(), Some("t"));
        assert_eq!(flows["elec"].default_unit.as_deref(), Some("MWh"));
    }
}
