//! Database provider for techno-economic data.
//!
//! Resolves database roots, loads settings, flow and technology types, tags,
//! variable definitions, field definitions and masks, and bundles them into
//! a [`Context`].

pub mod context;
pub mod csv_utils;
pub mod database;
pub mod fields;
pub mod masks;
pub mod registry;
pub mod settings;
pub mod tags;
pub mod templates;
pub mod types;
pub mod yaml;

pub use context::Context;
pub use database::{Database, path_segments};
pub use fields::{FieldSet, load_field_set, merge_field_sets};
pub use masks::load_masks;
pub use registry::VariableRegistry;
pub use settings::{CONFIG_ENV_VAR, DatabaseEntry, Settings};
pub use tags::{FLOW_IDS, TECH_IDS, Tag, Tags};
pub use types::{FlowType, TechType};
