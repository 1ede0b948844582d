//! Mask definitions from `masks/<path>.yml`.
//!
//! ```yaml
//! - name: Prefer recent sources
//!   where:
//!     variable: "*|CAPEX"
//!   use:
//!     - source: Smith2023
//!     - source: Jones2021
//!   weight: [2, 1]
//!   other: 0
//! ```

use std::path::Path;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use ted_model::{Condition, Mask, MaskWeight, Result, Selector, TedError};
use tracing::debug;

use crate::database::Database;
use crate::yaml::{read_yaml, scalar_list, scalar_to_string};

#[derive(Debug, Deserialize)]
struct RawMask {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "where")]
    where_: Option<Mapping>,
    #[serde(default, rename = "use")]
    use_: Option<Value>,
    #[serde(default)]
    weight: Option<MaskWeight>,
    #[serde(default)]
    other: Option<f64>,
}

/// Masks the database defines for `parent_variable`, in file order.
pub fn load_masks(db: &Database, parent_variable: &str) -> Result<Vec<Mask>> {
    let path = db.masks_path(parent_variable);
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let raw: Vec<RawMask> = read_yaml(&path)?;
    let masks = raw
        .into_iter()
        .enumerate()
        .map(|(index, mask)| mask_from_raw(mask, index, &path))
        .collect::<Result<Vec<_>>>()?;
    debug!(database = %db.id, path = %path.display(), masks = masks.len(), "loaded masks");
    Ok(masks)
}

fn mask_from_raw(raw: RawMask, index: usize, path: &Path) -> Result<Mask> {
    let name = raw
        .name
        .unwrap_or_else(|| format!("{}#{index}", path.display()));
    let where_ = raw.where_.as_ref().map(selector).unwrap_or_default();
    let use_ = match raw.use_ {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Mapping(mapping)) => vec![selector(&mapping)],
        Some(Value::Sequence(items)) => items
            .iter()
            .map(|item| match item {
                Value::Mapping(mapping) => Ok(selector(mapping)),
                _ => Err(TedError::InvalidMask {
                    message: format!("mask '{name}' in {}: use entries must be mappings", path.display()),
                }),
            })
            .collect::<Result<Vec<_>>>()?,
        Some(_) => {
            return Err(TedError::InvalidMask {
                message: format!("mask '{name}' in {}: use must be a mapping or list", path.display()),
            });
        }
    };
    Mask::new(name, where_, use_, raw.weight.unwrap_or_default(), raw.other)
}

fn selector(mapping: &Mapping) -> Selector {
    Selector::new(
        mapping
            .iter()
            .filter_map(|(column, patterns)| {
                Some(Condition::new(scalar_to_string(column)?, scalar_list(patterns)))
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_masks(contents: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let masks_dir = dir.path().join("masks/Tech");
        std::fs::create_dir_all(&masks_dir).unwrap();
        std::fs::write(masks_dir.join("Electrolysis.yml"), contents).unwrap();
        dir
    }

    #[test]
    fn parses_list_weights() {
        let dir = write_masks(
            "- name: prefer\n  where:\n    variable: \"*CAPEX\"\n  use:\n    - source: A\n    - source: [B, C]\n  weight: [2, 1]\n  other: 0\n",
        );
        let db = Database::new("public", dir.path());
        let masks = load_masks(&db, "Tech|Electrolysis").unwrap();
        assert_eq!(masks.len(), 1);
        let mask = &masks[0];
        assert_eq!(mask.use_.len(), 2);
        assert_eq!(mask.use_[1].conditions[0].patterns, vec!["B", "C"]);
        assert_eq!(mask.weight_at(0), 2.0);
        assert_eq!(mask.other, 0.0);
    }

    #[test]
    fn mismatched_weights_are_rejected() {
        let dir = write_masks("- use:\n    - source: A\n  weight: [1, 2, 3]\n");
        let db = Database::new("public", dir.path());
        assert!(matches!(
            load_masks(&db, "Tech|Electrolysis"),
            Err(TedError::InvalidMask { .. })
        ));
    }
}
