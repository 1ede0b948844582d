//! TEDF file discovery for a parent variable.

use std::path::{Path, PathBuf};

use ted_database::{Database, path_segments};
use ted_model::{Result, TedError, join_path};
use tracing::debug;

/// A data file and the parent variable its rows belong to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DiscoveredFile {
    pub database_id: String,
    pub parent_variable: String,
    pub path: PathBuf,
}

/// Files contributing to `parent_variable` in one database.
///
/// Ancestor files come first (outermost to innermost), then the exact file,
/// then files nested below the same-named directory in path order.
pub fn discover_files(db: &Database, parent_variable: &str) -> Result<Vec<DiscoveredFile>> {
    let segments: Vec<&str> = path_segments(parent_variable).collect();
    let mut found = Vec::new();

    for depth in 1..=segments.len() {
        let scope = segments[..depth].join("|");
        let path = db.tedf_path(&scope);
        if path.is_file() {
            found.push(DiscoveredFile {
                database_id: db.id.clone(),
                parent_variable: scope,
                path,
            });
        }
    }

    let nested_root = db.tedf_dir(parent_variable);
    let mut nested = Vec::new();
    collect_nested(&nested_root, &mut nested)?;
    nested.sort();
    for path in nested {
        let Some(relative) = relative_variable(&nested_root, &path) else {
            continue;
        };
        found.push(DiscoveredFile {
            database_id: db.id.clone(),
            parent_variable: join_path(parent_variable, &relative),
            path,
        });
    }

    debug!(
        database = %db.id,
        parent_variable,
        files = found.len(),
        "discovered data files"
    );
    Ok(found)
}

fn collect_nested(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    let entries = std::fs::read_dir(dir).map_err(|e| TedError::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| TedError::io(dir, e))?.path();
        if path.is_dir() {
            collect_nested(&path, out)?;
        } else if is_csv(&path) {
            out.push(path);
        }
    }
    Ok(())
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// `A/B/C.csv` relative to `root` becomes `A|B|C`.
fn relative_variable(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    let last = parts.last_mut()?;
    if let Some(stem) = last.strip_suffix(".csv").or_else(|| last.strip_suffix(".CSV")) {
        *last = stem.to_string();
    }
    Some(parts.join("|"))
}
