//! Column definitions and the per-scope table schema.
//!
//! Field columns form a closed set: region, period, source, plus custom
//! fields declared by the database for a parent variable. Every field is
//! either a case field (alternatives, averaged) or a component field
//! (additive parts, summed).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Wildcard cell value: the row stands for every value of the field domain.
pub const WILDCARD: &str = "*";
/// Component fields use this for "not split into components".
pub const NOT_SPECIFIED: &str = "#";

pub const COL_PARENT_VARIABLE: &str = "parent_variable";
pub const COL_REGION: &str = "region";
pub const COL_PERIOD: &str = "period";
pub const COL_VARIABLE: &str = "variable";
pub const COL_REFERENCE_VARIABLE: &str = "reference_variable";
pub const COL_VALUE: &str = "value";
pub const COL_UNCERTAINTY: &str = "uncertainty";
pub const COL_UNIT: &str = "unit";
pub const COL_REFERENCE_VALUE: &str = "reference_value";
pub const COL_REFERENCE_UNIT: &str = "reference_unit";
pub const COL_COMMENT: &str = "comment";
pub const COL_SOURCE: &str = "source";
pub const COL_SOURCE_DETAIL: &str = "source_detail";

/// Case fields hold alternatives; component fields hold additive parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Case,
    Component,
}

impl FieldType {
    /// Cell value used when the column is absent from a raw file.
    pub fn default_value(self) -> &'static str {
        match self {
            FieldType::Case => WILDCARD,
            FieldType::Component => NOT_SPECIFIED,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Case => "case",
            FieldType::Component => "component",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Region,
    Period,
    Source,
    Custom,
}

/// A field column: region, period, source or a database-defined custom field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub field_type: FieldType,
    pub kind: FieldKind,
    /// Allowed codes mapped to their descriptions. None for uncoded fields.
    pub codes: Option<BTreeMap<String, String>>,
}

impl FieldDefinition {
    pub fn region() -> Self {
        Self {
            id: COL_REGION.to_string(),
            name: "Region".to_string(),
            description: "Geographical region the entry applies to".to_string(),
            field_type: FieldType::Case,
            kind: FieldKind::Region,
            codes: None,
        }
    }

    pub fn period() -> Self {
        Self {
            id: COL_PERIOD.to_string(),
            name: "Period".to_string(),
            description: "Year the entry applies to".to_string(),
            field_type: FieldType::Case,
            kind: FieldKind::Period,
            codes: None,
        }
    }

    pub fn source() -> Self {
        Self {
            id: COL_SOURCE.to_string(),
            name: "Source".to_string(),
            description: "Citation key of the reporting source".to_string(),
            field_type: FieldType::Case,
            kind: FieldKind::Source,
            codes: None,
        }
    }

    pub fn custom(
        id: impl Into<String>,
        name: impl Into<String>,
        field_type: FieldType,
        codes: Option<BTreeMap<String, String>>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            field_type,
            kind: FieldKind::Custom,
            codes,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_coded(&self) -> bool {
        self.codes.is_some()
    }

    pub fn is_custom(&self) -> bool {
        self.kind == FieldKind::Custom
    }

    /// Cell value used when the column is absent from a raw file.
    pub fn default_value(&self) -> &'static str {
        match self.kind {
            FieldKind::Region | FieldKind::Period => WILDCARD,
            FieldKind::Source => "",
            FieldKind::Custom => self.field_type.default_value(),
        }
    }

    /// Whether `value` may appear in this column.
    ///
    /// Coded case fields accept their codes and `*`; coded component fields
    /// additionally accept `#`. Periods must be numeric or `*`.
    pub fn is_allowed(&self, value: &str) -> bool {
        if value == WILDCARD {
            return true;
        }
        match self.kind {
            FieldKind::Period => value.trim().parse::<f64>().is_ok(),
            FieldKind::Region | FieldKind::Source | FieldKind::Custom => match &self.codes {
                Some(codes) => {
                    codes.contains_key(value)
                        || (self.field_type == FieldType::Component && value == NOT_SPECIFIED)
                }
                None => !value.trim().is_empty(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Text,
    Float,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnKind {
    Variable,
    Unit,
    Value,
    Comment,
    Field(FieldDefinition),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub data_type: DataType,
    pub required: bool,
    pub kind: ColumnKind,
}

impl ColumnDefinition {
    fn base(id: &str, name: &str, data_type: DataType, required: bool, kind: ColumnKind) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            data_type,
            required,
            kind,
        }
    }

    pub fn field(field: FieldDefinition) -> Self {
        Self {
            id: field.id.clone(),
            name: field.name.clone(),
            description: field.description.clone(),
            data_type: DataType::Text,
            required: false,
            kind: ColumnKind::Field(field),
        }
    }

    pub fn comment(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            data_type: DataType::Text,
            required: false,
            kind: ColumnKind::Comment,
        }
    }

    pub fn as_field(&self) -> Option<&FieldDefinition> {
        match &self.kind {
            ColumnKind::Field(field) => Some(field),
            _ => None,
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, ColumnKind::Comment)
    }
}

/// Ordered column set for one parent-variable scope.
///
/// Order: custom fields, base columns, custom comment columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    columns: Vec<ColumnDefinition>,
}

impl TableSchema {
    pub fn new(custom_fields: Vec<FieldDefinition>, custom_comments: Vec<ColumnDefinition>) -> Self {
        let mut columns: Vec<ColumnDefinition> = custom_fields
            .into_iter()
            .map(ColumnDefinition::field)
            .collect();
        columns.extend(base_columns());
        columns.extend(custom_comments);
        Self { columns }
    }

    /// Schema without any custom fields or comments.
    pub fn base() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn column_ids(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.id.as_str())
    }

    pub fn column(&self, id: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|column| column.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.column(id).is_some()
    }

    /// All field columns in schema order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.columns.iter().filter_map(ColumnDefinition::as_field)
    }

    pub fn custom_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields().filter(|field| field.is_custom())
    }

    pub fn field(&self, id: &str) -> Option<&FieldDefinition> {
        self.fields().find(|field| field.id == id)
    }

    pub fn comment_ids(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|column| column.is_comment())
            .map(|column| column.id.as_str())
            .collect()
    }

    /// Copy of the schema with the given columns removed.
    pub fn without_columns(&self, ids: &[&str]) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .filter(|column| !ids.contains(&column.id.as_str()))
                .cloned()
                .collect(),
        }
    }
}

fn base_columns() -> Vec<ColumnDefinition> {
    vec![
        ColumnDefinition::field(FieldDefinition::region()),
        ColumnDefinition::field(FieldDefinition::period()),
        ColumnDefinition::base(COL_VARIABLE, "Variable", DataType::Text, true, ColumnKind::Variable),
        ColumnDefinition::base(
            COL_REFERENCE_VARIABLE,
            "Reference Variable",
            DataType::Text,
            false,
            ColumnKind::Variable,
        ),
        ColumnDefinition::base(COL_VALUE, "Value", DataType::Float, true, ColumnKind::Value),
        ColumnDefinition::base(
            COL_UNCERTAINTY,
            "Uncertainty",
            DataType::Float,
            false,
            ColumnKind::Value,
        ),
        ColumnDefinition::base(COL_UNIT, "Unit", DataType::Text, false, ColumnKind::Unit),
        ColumnDefinition::base(
            COL_REFERENCE_VALUE,
            "Reference Value",
            DataType::Float,
            false,
            ColumnKind::Value,
        ),
        ColumnDefinition::base(
            COL_REFERENCE_UNIT,
            "Reference Unit",
            DataType::Text,
            false,
            ColumnKind::Unit,
        ),
        ColumnDefinition::comment(COL_COMMENT, "Comment"),
        ColumnDefinition::field(FieldDefinition::source()),
        ColumnDefinition::comment(COL_SOURCE_DETAIL, "Source Detail"),
    ]
}
