//! YAML helpers shared by the definition loaders.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_yaml::Value;
use ted_model::{Result, TedError};

/// Reads and deserializes one YAML file.
pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = std::fs::File::open(path).map_err(|e| TedError::io(path, e))?;
    serde_yaml::from_reader(file).map_err(|e| TedError::parse(path, e))
}

/// Renders a scalar as text. Mappings, sequences and null yield None.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// A scalar or a sequence of scalars, as a list of strings.
pub fn scalar_list(value: &Value) -> Vec<String> {
    match value {
        Value::Sequence(items) => items.iter().filter_map(scalar_to_string).collect(),
        other => scalar_to_string(other).into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_scalars() {
        assert_eq!(scalar_to_string(&Value::from(2030)), Some("2030".to_string()));
        assert_eq!(scalar_to_string(&Value::Null), None);
        let list: Value = serde_yaml::from_str("[A, 2]").unwrap();
        assert_eq!(scalar_list(&list), vec!["A".to_string(), "2".to_string()]);
    }
}
