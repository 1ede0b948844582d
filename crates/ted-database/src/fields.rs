//! Custom field and comment definitions from `fields/<path>.yml`.
//!
//! ```yaml
//! fields:
//!   size:
//!     name: Plant size
//!     type: case
//!     coded: true
//!     codes:
//!       Small: below 10 MW
//!       Large: above 100 MW
//! comments:
//!   note:
//!     name: Note
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;
use ted_model::{ColumnDefinition, FieldDefinition, FieldType, Result, TableSchema, TedError};

use crate::database::Database;
use crate::yaml::read_yaml;

#[derive(Debug, Deserialize)]
struct RawFieldFile {
    #[serde(default)]
    fields: BTreeMap<String, RawField>,
    #[serde(default)]
    comments: BTreeMap<String, RawComment>,
}

#[derive(Debug, Deserialize)]
struct RawField {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    field_type: FieldType,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    coded: bool,
    #[serde(default)]
    codes: Option<BTreeMap<String, Option<String>>>,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Fields and comments declared by one definition file.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSet {
    /// Where the definitions came from, used in collision errors.
    pub origin: String,
    pub fields: Vec<FieldDefinition>,
    pub comments: Vec<ColumnDefinition>,
}

impl FieldSet {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            fields: Vec::new(),
            comments: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }
}

/// Loads the field set of `parent_variable`, if the database defines one.
pub fn load_field_set(db: &Database, parent_variable: &str) -> Result<Option<FieldSet>> {
    let path = db.fields_path(parent_variable);
    if !path.is_file() {
        return Ok(None);
    }
    let raw: RawFieldFile = read_yaml(&path)?;
    Ok(Some(field_set_from_raw(raw, path)))
}

fn field_set_from_raw(raw: RawFieldFile, path: PathBuf) -> FieldSet {
    let fields = raw
        .fields
        .into_iter()
        .map(|(id, field)| {
            let codes = (field.coded || field.codes.is_some()).then(|| {
                field
                    .codes
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(code, description)| (code, description.unwrap_or_default()))
                    .collect()
            });
            let name = field.name.unwrap_or_else(|| id.clone());
            FieldDefinition::custom(id, name, field.field_type, codes)
                .with_description(field.description.unwrap_or_default())
        })
        .collect();
    let comments = raw
        .comments
        .into_iter()
        .map(|(id, comment)| {
            let name = comment.name.unwrap_or_else(|| id.clone());
            let mut column = ColumnDefinition::comment(id, name);
            column.description = comment.description.unwrap_or_default();
            column
        })
        .collect();
    FieldSet {
        origin: path.display().to_string(),
        fields,
        comments,
    }
}

/// Merges field sets into one schema.
///
/// The same field id defined differently by two sets is a collision. Custom
/// ids may not shadow base columns.
pub fn merge_field_sets(sets: &[FieldSet]) -> Result<TableSchema> {
    let base = TableSchema::base();
    let mut fields: BTreeMap<&str, (&FieldDefinition, &str)> = BTreeMap::new();
    let mut order: Vec<&FieldDefinition> = Vec::new();
    let mut comments: Vec<ColumnDefinition> = Vec::new();

    for set in sets {
        for field in &set.fields {
            if base.contains(&field.id) {
                return Err(TedError::InvalidDefinition {
                    message: format!(
                        "custom field '{}' in {} shadows a base column",
                        field.id, set.origin
                    ),
                });
            }
            match fields.get(field.id.as_str()) {
                Some((existing, origin)) if *existing != field => {
                    return Err(TedError::FieldCollision {
                        field: field.id.clone(),
                        first: (*origin).to_string(),
                        second: set.origin.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    fields.insert(&field.id, (field, &set.origin));
                    order.push(field);
                }
            }
        }
        for comment in &set.comments {
            if !base.contains(&comment.id) && !comments.iter().any(|c| c.id == comment.id) {
                comments.push(comment.clone());
            }
        }
    }

    Ok(TableSchema::new(order.into_iter().cloned().collect(), comments))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(codes: &[&str]) -> FieldDefinition {
        let codes = codes
            .iter()
            .map(|c| (c.to_string(), String::new()))
            .collect();
        FieldDefinition::custom("size", "Plant size", FieldType::Case, Some(codes))
    }

    #[test]
    fn identical_definitions_merge() {
        let sets = vec![
            FieldSet::new("a.yml").with_field(size(&["Small", "Large"])),
            FieldSet::new("b.yml").with_field(size(&["Small", "Large"])),
        ];
        let schema = merge_field_sets(&sets).unwrap();
        assert_eq!(schema.custom_fields().count(), 1);
    }

    #[test]
    fn differing_definitions_collide() {
        let sets = vec![
            FieldSet::new("a.yml").with_field(size(&["Small", "Large"])),
            FieldSet::new("b.yml").with_field(size(&["Small"])),
        ];
        let err = merge_field_sets(&sets).unwrap_err();
        assert!(matches!(
            err,
            TedError::FieldCollision { ref field, ref first, ref second }
                if field == "size" && first == "a.yml" && second == "b.yml"
        ));
    }

    #[test]
    fn parses_field_file() {
        let dir = tempfile::tempdir().unwrap();
        let fields_dir = dir.path().join("fields/Tech");
        std::fs::create_dir_all(&fields_dir).unwrap();
        std::fs::write(
            fields_dir.join("Electrolysis.yml"),
            "fields:\n  subtech:\n    type: case\n    coded: true\n    codes:\n      AEL: Alkaline\n      PEM: Proton exchange membrane\n  component:\n    name: Component\n    type: component\ncomments:\n  note:\n    name: Note\n",
        )
        .unwrap();

        let db = Database::new("public", dir.path());
        let set = load_field_set(&db, "Tech|Electrolysis").unwrap().unwrap();
        assert_eq!(set.fields.len(), 2);
        let subtech = set.fields.iter().find(|f| f.id == "subtech").unwrap();
        assert!(subtech.is_allowed("PEM"));
        assert!(!subtech.is_allowed("SOEC"));
        let component = set.fields.iter().find(|f| f.id == "component").unwrap();
        assert_eq!(component.field_type, FieldType::Component);
        assert!(!component.is_coded());
        assert_eq!(set.comments[0].id, "note");

        assert!(load_field_set(&db, "Tech|Steel").unwrap().is_none());
    }
}
