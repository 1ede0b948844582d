//! Workspace settings loaded from `ted.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use ted_model::{Result, TedError};
use tracing::debug;

/// Environment variable overriding the settings file location.
pub const CONFIG_ENV_VAR: &str = "TED_CONFIG";

/// Settings file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "ted.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseEntry {
    pub id: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Substituted for `{default currency}` in variable definitions.
    pub default_currency: String,
    /// Periods selected when a caller requests none.
    pub default_periods: Vec<i32>,
    /// CSV with pre-computed unit conversion factors.
    pub unit_cache: Option<PathBuf>,
    /// Databases in registration order. Later entries override earlier ones.
    pub databases: Vec<DatabaseEntry>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_currency: "EUR_2024".to_string(),
            default_periods: vec![2030, 2040, 2050],
            unit_cache: None,
            databases: Vec::new(),
        }
    }
}

impl Settings {
    /// Parses a settings file. Relative paths resolve against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| TedError::io(path, e))?;
        let mut settings: Settings = toml::from_str(&text).map_err(|e| TedError::parse(path, e))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        settings.resolve_paths(base);
        debug!(
            path = %path.display(),
            databases = settings.databases.len(),
            "loaded settings"
        );
        Ok(settings)
    }

    /// Loads from `explicit`, then `TED_CONFIG`, then `./ted.toml`.
    ///
    /// Falls back to defaults when no file is found and none was requested.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::load(Path::new(&path));
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.is_file() {
            return Self::load(local);
        }
        Ok(Self::default())
    }

    fn resolve_paths(&mut self, base: &Path) {
        if let Some(cache) = &self.unit_cache
            && cache.is_relative()
        {
            self.unit_cache = Some(base.join(cache));
        }
        for entry in &mut self.databases {
            if entry.path.is_relative() {
                entry.path = base.join(&entry.path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_fields_missing() {
        let settings: Settings = toml::from_str("default_currency = \"USD_2020\"").unwrap();
        assert_eq!(settings.default_currency, "USD_2020");
        assert_eq!(settings.default_periods, vec![2030, 2040, 2050]);
        assert!(settings.databases.is_empty());
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ted.toml");
        std::fs::write(
            &path,
            "unit_cache = \"cache/units.csv\"\n\n[[databases]]\nid = \"public\"\npath = \"db\"\n",
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.unit_cache, Some(dir.path().join("cache/units.csv")));
        assert_eq!(settings.databases[0].path, dir.path().join("db"));
    }

    #[test]
    fn malformed_settings_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ted.toml");
        std::fs::write(&path, "default_periods = \"soon\"").unwrap();
        assert!(matches!(Settings::load(&path), Err(TedError::Parse { .. })));
    }
}
