//! Database root layout.
//!
//! ```text
//! <root>/
//!   tedfs/<Parent>/<Variable>.csv
//!   fields/<Parent>/<Variable>.yml
//!   masks/<Parent>/<Variable>.yml
//!   definitions/variable/*.yml
//!   definitions/tag/*.yml
//!   flow_types.csv
//!   tech_types.csv
//! ```

use std::path::{Path, PathBuf};

use crate::settings::DatabaseEntry;

/// Splits a variable path into its `|`-separated segments.
pub fn path_segments(variable: &str) -> impl Iterator<Item = &str> {
    variable.split('|').filter(|segment| !segment.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Database {
    pub id: String,
    pub root: PathBuf,
}

impl Database {
    pub fn new(id: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            root: root.into(),
        }
    }

    pub fn tedfs_dir(&self) -> PathBuf {
        self.root.join("tedfs")
    }

    /// Raw data file for a parent variable.
    pub fn tedf_path(&self, parent_variable: &str) -> PathBuf {
        with_extension(&self.tedfs_dir(), parent_variable, "csv")
    }

    /// Directory holding the files nested below a parent variable.
    pub fn tedf_dir(&self, parent_variable: &str) -> PathBuf {
        path_segments(parent_variable).fold(self.tedfs_dir(), |dir, seg| dir.join(seg))
    }

    pub fn fields_path(&self, parent_variable: &str) -> PathBuf {
        with_extension(&self.root.join("fields"), parent_variable, "yml")
    }

    pub fn masks_path(&self, parent_variable: &str) -> PathBuf {
        with_extension(&self.root.join("masks"), parent_variable, "yml")
    }

    pub fn variable_definitions_dir(&self) -> PathBuf {
        self.root.join("definitions").join("variable")
    }

    pub fn tag_definitions_dir(&self) -> PathBuf {
        self.root.join("definitions").join("tag")
    }

    pub fn flow_types_path(&self) -> PathBuf {
        self.root.join("flow_types.csv")
    }

    pub fn tech_types_path(&self) -> PathBuf {
        self.root.join("tech_types.csv")
    }
}

impl From<&DatabaseEntry> for Database {
    fn from(entry: &DatabaseEntry) -> Self {
        Self::new(entry.id.clone(), entry.path.clone())
    }
}

fn with_extension(base: &Path, variable: &str, extension: &str) -> PathBuf {
    let mut path = path_segments(variable).fold(base.to_path_buf(), |dir, seg| dir.join(seg));
    // Segments may contain dots, so append instead of set_extension.
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(extension);
    path.set_file_name(name);
    path
}

/// YAML files directly inside `dir`, sorted. Missing directory yields none.
pub(crate) fn yaml_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !dir.is_dir() {
        return Ok(files);
    }
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == "yml" || ext == "yaml");
        if path.is_file() && is_yaml {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_variable_paths_to_files() {
        let db = Database::new("public", "/data/public");
        assert_eq!(
            db.tedf_path("Tech|Electrolysis"),
            PathBuf::from("/data/public/tedfs/Tech/Electrolysis.csv")
        );
        assert_eq!(
            db.fields_path("Tech|Electrolysis"),
            PathBuf::from("/data/public/fields/Tech/Electrolysis.yml")
        );
        assert_eq!(
            db.tedf_dir("Tech|Electrolysis"),
            PathBuf::from("/data/public/tedfs/Tech/Electrolysis")
        );
    }

    #[test]
    fn keeps_dots_in_segment_names() {
        let db = Database::new("public", "/db");
        assert_eq!(
            db.tedf_path("Tech|Steel v1.2"),
            PathBuf::from("/db/tedfs/Tech/Steel v1.2.csv")
        );
    }
}
