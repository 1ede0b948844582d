//! Tests for TEDF file discovery.

use std::fs;
use std::path::Path;

use ted_database::Database;
use ted_ingest::discover_files;

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).expect("create dir");
    fs::write(&path, "variable,value\n").expect("write file");
}

#[test]
fn discovers_ancestor_exact_and_nested_files() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "tedfs/Tech.csv");
    touch(dir.path(), "tedfs/Tech/Electrolysis.csv");
    touch(dir.path(), "tedfs/Tech/Electrolysis/PEM.csv");
    touch(dir.path(), "tedfs/Tech/Electrolysis/Stack/Membrane.csv");
    touch(dir.path(), "tedfs/Tech/Electrolysis/notes.txt");
    touch(dir.path(), "tedfs/Tech/Steel.csv");

    let db = Database::new("public", dir.path());
    let files = discover_files(&db, "Tech|Electrolysis").expect("discover");
    let parents: Vec<&str> = files.iter().map(|f| f.parent_variable.as_str()).collect();
    assert_eq!(
        parents,
        vec![
            "Tech",
            "Tech|Electrolysis",
            "Tech|Electrolysis|PEM",
            "Tech|Electrolysis|Stack|Membrane",
        ]
    );
    assert!(files.iter().all(|f| f.database_id == "public"));
}

#[test]
fn missing_scope_yields_nothing() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "tedfs/Tech/Steel.csv");

    let db = Database::new("public", dir.path());
    let files = discover_files(&db, "Tech|Electrolysis").expect("discover");
    assert!(files.is_empty());
}
