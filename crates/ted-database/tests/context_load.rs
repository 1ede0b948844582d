//! Loading a complete context from an on-disk database.

use std::fs;
use std::path::Path;

use ted_database::{Context, Settings};

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn seed_database(root: &Path) {
    write(
        root,
        "flow_types.csv",
        "id,name,default_unit\nHydrogen,Hydrogen,MWh;LHV\nElectricity,Electricity,MWh\n",
    );
    write(
        root,
        "tech_types.csv",
        "id,name,description,class,primary_output\nElectrolysis,Electrolysis,Water electrolysis,conversion,Hydrogen\n",
    );
    write(
        root,
        "definitions/variable/tech.yml",
        r#"
Tech|{Tech IDs}|CAPEX:
  description: Capital expenditure
  default_unit: "{default currency}"
  default_reference: "{parent variable}|{Tech IDs}|Output Capacity|{primary output}"
Tech|{Tech IDs}|Input|{Flow IDs}:
  default_unit: "{default flow unit raw}"
  flow_id: "{Flow IDs}"
  default_reference: "Tech|{Tech IDs}|Output|{primary output}"
Tech|{Tech IDs}|Broken:
  default_unit: "{no such token}"
"#,
    );
}

// ============================================================================
// Context::load
// ============================================================================

#[test]
fn loads_registry_from_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    seed_database(&dir.path().join("public"));
    write(dir.path(), "units.csv", "from,to,ft,factor\nkW,MW,,0.001\n");
    write(
        dir.path(),
        "ted.toml",
        "default_currency = \"USD_2020\"\nunit_cache = \"units.csv\"\n\n[[databases]]\nid = \"public\"\npath = \"public\"\n",
    );

    let settings = Settings::load(&dir.path().join("ted.toml")).unwrap();
    let ctx = Context::load(settings).unwrap();

    assert_eq!(ctx.flow_types.len(), 2);
    assert_eq!(ctx.tech_types["Electrolysis"].primary_output.as_deref(), Some("Hydrogen"));

    let registry = &ctx.registry;
    assert_eq!(registry.default_unit("Tech|Electrolysis|CAPEX"), Some("USD_2020"));
    assert_eq!(
        registry.default_reference("Tech|Electrolysis|CAPEX"),
        Some("Tech|Electrolysis|Output Capacity|Hydrogen")
    );
    assert_eq!(registry.default_unit("Tech|Electrolysis|Input|Hydrogen"), Some("MWh"));
    assert_eq!(
        registry.flow_id("Tech|Electrolysis|Input|Electricity"),
        Some("Electricity")
    );
    assert!(!registry.contains("Tech|Electrolysis|Broken"));
    assert_eq!(registry.resolve("Tech|Electrolysis").len(), 3);

    let factor = ctx.converter.convert(Some("kW"), Some("MW"), None).unwrap();
    assert_eq!(factor, 0.001);
}

#[test]
fn later_database_overrides_definitions() {
    let dir = tempfile::tempdir().unwrap();
    seed_database(&dir.path().join("public"));
    write(
        &dir.path().join("private"),
        "definitions/variable/tech.yml",
        "Tech|{Tech IDs}|CAPEX:\n  default_unit: EUR_2020\n",
    );
    write(
        dir.path(),
        "ted.toml",
        "[[databases]]\nid = \"public\"\npath = \"public\"\n\n[[databases]]\nid = \"private\"\npath = \"private\"\n",
    );

    let settings = Settings::load(&dir.path().join("ted.toml")).unwrap();
    let ctx = Context::load(settings).unwrap();

    assert_eq!(ctx.registry.default_unit("Tech|Electrolysis|CAPEX"), Some("EUR_2020"));
    assert_eq!(ctx.registry.default_reference("Tech|Electrolysis|CAPEX"), None);

    let include = vec!["private".to_string()];
    let selected = ctx.databases_for(Some(&include));
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].id, "private");
    assert_eq!(ctx.databases_for(None).len(), 2);
}
