use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ted_database::{Context, VariableRegistry};
use ted_ingest::RecordFile;
use ted_model::{FieldDefinition, FieldType, NOT_SPECIFIED, TableSchema, TedError, VariableSpec, WILDCARD};
use ted_units::{UnitCache, UnitConverter};

const PARENT: &str = "Tech|Electrolysis";

fn schema() -> Arc<TableSchema> {
    let subtech = FieldDefinition::custom(
        "subtech",
        "Subtechnology",
        FieldType::Case,
        Some(BTreeMap::from([
            ("AEL".to_string(), "Alkaline".to_string()),
            ("PEM".to_string(), "Proton exchange membrane".to_string()),
        ])),
    );
    let component = FieldDefinition::custom("component", "Component", FieldType::Component, None);
    Arc::new(TableSchema::new(vec![subtech, component], Vec::new()))
}

fn context() -> Context {
    let registry = VariableRegistry::from_specs([
        VariableSpec::new("Tech|Electrolysis|CAPEX").with_unit("EUR_2024"),
        VariableSpec::new("Tech|Electrolysis|Output Capacity|Hydrogen").with_unit("kW"),
        VariableSpec::new("Tech|Electrolysis|Input|Electricity")
            .with_unit("MWh")
            .with_flow("Electricity"),
    ]);
    let converter = UnitConverter::from_cache(
        UnitCache::new()
            .with("EUR_2020", "EUR_2024", None, 1.2)
            .with("MW", "kW", None, 1000.0),
    );
    Context::new(registry, converter)
}

fn write_file(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("Electrolysis.csv");
    fs::write(&path, contents).expect("write file");
    path
}

// ============================================================================
// read
// ============================================================================

#[test]
fn fills_missing_columns_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "variable,value,unit,source\nCAPEX,1000,EUR_2024/kW,Smith2023\n",
    );

    let file = RecordFile::read(PARENT, schema(), &path).expect("read");
    assert_eq!(file.len(), 1);
    let row = &file.rows[0];
    assert_eq!(row.parent_variable, PARENT);
    assert_eq!(row.variable, "CAPEX");
    assert_eq!(row.value, 1000.0);
    assert_eq!(row.field("subtech"), Some(WILDCARD));
    assert_eq!(row.field("component"), Some(NOT_SPECIFIED));
    assert_eq!(row.field("period"), Some(WILDCARD));
    assert_eq!(row.field("region"), Some(WILDCARD));
    assert_eq!(row.field("source"), Some("Smith2023"));
    assert_eq!(row.reference_value, None);
}

#[test]
fn rejects_unknown_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "variable,value,colour\nCAPEX,1000,red\n");

    let err = RecordFile::read(PARENT, schema(), &path).unwrap_err();
    assert!(err.is_schema_error());
    assert!(matches!(err, TedError::UnknownColumn { ref column, .. } if column == "colour"));
}

#[test]
fn rejects_unparseable_number() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "variable,value\nCAPEX,1000\nCAPEX,lots\n");

    let err = RecordFile::read(PARENT, schema(), &path).unwrap_err();
    assert!(matches!(err, TedError::InvalidCell { row: 2, ref column, .. } if column == "value"));
}

#[test]
fn writes_columns_in_schema_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "source,unit,value,variable,period\nSmith2023,EUR_2024/kW,1000,CAPEX,2030\n",
    );
    let file = RecordFile::read(PARENT, schema(), &path).expect("read");

    let out = dir.path().join("out.csv");
    file.write(&out).expect("write");
    let written = fs::read_to_string(&out).unwrap();
    let mut lines = written.lines();
    assert_eq!(
        lines.next(),
        Some(
            "subtech,component,region,period,variable,reference_variable,value,uncertainty,unit,reference_value,reference_unit,comment,source,source_detail"
        )
    );
    assert_eq!(
        lines.next(),
        Some("*,#,*,2030,CAPEX,,1000,,EUR_2024/kW,,,,Smith2023,")
    );

    let reread = RecordFile::read(PARENT, schema(), &out).expect("reread");
    assert_eq!(reread.rows, file.rows);
}

// ============================================================================
// check
// ============================================================================

#[test]
fn check_reports_row_issues() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "subtech,variable,reference_variable,value,unit,reference_value,reference_unit\n\
         PEM,CAPEX,Output Capacity|Hydrogen,1000,EUR_2020,1,MW\n\
         SOEC,CAPEX,,1000,,,\n\
         AEL,OPEX,,5,EUR_2024,,\n\
         AEL,Input|Electricity,,50,GJ,2,\n",
    );
    let file = RecordFile::read(PARENT, schema(), &path).expect("read");
    let issues = file.check(&context());

    let summary: Vec<(usize, &str)> = issues
        .iter()
        .map(|issue| (issue.row, issue.column.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (1, "unit"),
            (1, "subtech"),
            (2, "variable"),
            (3, "reference_variable"),
            (3, "unit"),
        ]
    );
    assert!(issues[4].message.contains("'GJ'"));
}
