//! Read-only state shared by every pipeline run.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use ted_model::Result;
use ted_units::{UnitCache, UnitConverter};
use tracing::{info, info_span};

use crate::database::Database;
use crate::registry::VariableRegistry;
use crate::settings::Settings;
use crate::tags::load_tags;
use crate::templates::TemplateInputs;
use crate::types::{FlowType, TechType, load_flow_types, load_tech_types};

/// Settings, databases, registry and converter, built once per session.
///
/// Wrap in an `Arc` to share between datasets.
#[derive(Debug, Clone)]
pub struct Context {
    pub settings: Settings,
    pub databases: Vec<Database>,
    pub registry: VariableRegistry,
    pub converter: UnitConverter,
    pub flow_types: BTreeMap<String, FlowType>,
    pub tech_types: BTreeMap<String, TechType>,
}

impl Context {
    /// Context with default settings and no databases.
    pub fn new(registry: VariableRegistry, converter: UnitConverter) -> Self {
        Self {
            settings: Settings::default(),
            databases: Vec::new(),
            registry,
            converter,
            flow_types: BTreeMap::new(),
            tech_types: BTreeMap::new(),
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_database(mut self, database: Database) -> Self {
        self.databases.push(database);
        self
    }

    /// Loads type tables, tags, variable definitions and the unit cache.
    pub fn load(settings: Settings) -> Result<Self> {
        let span = info_span!("context_load", databases = settings.databases.len());
        let _guard = span.enter();
        let start = Instant::now();

        let databases: Vec<Database> = settings.databases.iter().map(Database::from).collect();
        let flow_types = load_flow_types(&databases)?;
        let tech_types = load_tech_types(&databases)?;
        let tags = load_tags(&databases, &flow_types, &tech_types)?;
        let registry = VariableRegistry::load(
            &databases,
            TemplateInputs {
                tags: &tags,
                settings: &settings,
                flow_types: &flow_types,
            },
        )?;
        let converter = match &settings.unit_cache {
            Some(path) => UnitConverter::from_cache(UnitCache::load(path)?),
            None => UnitConverter::identity(),
        };

        info!(
            flow_types = flow_types.len(),
            tech_types = tech_types.len(),
            variables = registry.len(),
            duration_ms = start.elapsed().as_millis(),
            "context ready"
        );
        Ok(Self {
            settings,
            databases,
            registry,
            converter,
            flow_types,
            tech_types,
        })
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Databases to read, in registration order. None selects all.
    pub fn databases_for(&self, include: Option<&[String]>) -> Vec<&Database> {
        self.databases
            .iter()
            .filter(|db| include.is_none_or(|ids| ids.contains(&db.id)))
            .collect()
    }
}
