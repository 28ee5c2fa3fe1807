#[path = "../common/mod.rs"]
mod common;

use std::fs;

use eelhole::catalog::{Catalog, Manifest, ManifestError, SemanticType, UnknownTable};
use rstest::rstest;

#[test]
fn test_catalog_merges_packages() {
    let catalog = common::catalog();

    assert_eq!(catalog.len(), 4);
    assert_eq!(catalog.packages(), vec!["landscape", "pudl"]);

    let names: Vec<&str> = catalog.list_tables().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["fuel_receipts", "generators", "landscape_cover", "plants_eia"]
    );
}

#[test]
fn test_lookup_table_columns() {
    let catalog = common::catalog();
    let plants = catalog.lookup_table("plants_eia").unwrap();

    assert_eq!(plants.package.as_deref(), Some("pudl"));
    assert_eq!(plants.primary_key, vec!["plant_id", "report_date"]);

    let types: Vec<(&str, SemanticType)> = plants
        .columns
        .iter()
        .map(|c| (c.name.as_str(), c.semantic_type))
        .collect();
    assert_eq!(
        types,
        vec![
            ("plant_id", SemanticType::Number),
            ("name", SemanticType::String),
            ("report_date", SemanticType::Date),
            ("capacity_mw", SemanticType::Number),
            ("fuel_type", SemanticType::Categorical),
            ("updated_at", SemanticType::Timestamp),
        ]
    );
    assert_eq!(
        plants.column("name").and_then(|c| c.description.as_deref()),
        Some("Plant name")
    );
}

#[test]
fn test_title_stands_in_for_missing_description() {
    let catalog = common::catalog();
    let generators = catalog.lookup_table("generators").unwrap();

    assert_eq!(generators.description.as_deref(), Some("Generator attributes"));
    assert_eq!(generators.primary_key, vec!["generator_id"]);
}

#[test]
fn test_lookup_unknown_table() {
    let catalog = common::catalog();
    assert_eq!(
        catalog.lookup_table("plants").unwrap_err(),
        UnknownTable("plants".to_string())
    );
    // Names are case-sensitive
    assert!(catalog.lookup_table("PLANTS_EIA").is_err());
}

#[test]
fn test_duplicate_table_across_packages() {
    let pudl = Manifest::from_json_str(common::PUDL_MANIFEST).unwrap();
    let err = Catalog::from_manifests(&[pudl.clone(), pudl]).unwrap_err();
    assert!(matches!(err, ManifestError::DuplicateTable(name) if name == "plants_eia"));
}

#[rstest]
#[case::bad_name(
    r#"{"resources": [{"name": "plants eia", "schema": {"fields": []}}]}"#,
    "Invalid table name"
)]
#[case::empty_name(r#"{"resources": [{"name": " "}]}"#, "empty name")]
#[case::duplicate_column(
    r#"{"resources": [{"name": "t", "schema": {"fields": [{"name": "a"}, {"name": "a"}]}}]}"#,
    "Duplicate column 'a'"
)]
#[case::unknown_type(
    r#"{"resources": [{"name": "t", "schema": {"fields": [{"name": "geom", "type": "geopoint"}]}}]}"#,
    "Unknown type 'geopoint'"
)]
#[case::unknown_primary_key(
    r#"{"resources": [{"name": "t", "schema": {"fields": [{"name": "a"}], "primaryKey": "b"}}]}"#,
    "unknown column 'b'"
)]
fn test_invalid_manifest(#[case] json: &str, #[case] expected: &str) {
    let manifest = Manifest::from_json_str(json).unwrap();
    let err = Catalog::load(&manifest).unwrap_err();
    assert!(
        err.to_string().contains(expected),
        "expected '{}' in '{}'",
        expected,
        err
    );
}

#[test]
fn test_from_paths_reads_json_and_toml() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("pudl.json");
    let toml_path = dir.path().join("landscape.toml");
    fs::write(&json_path, common::PUDL_MANIFEST).unwrap();
    fs::write(&toml_path, common::LANDSCAPE_MANIFEST).unwrap();

    let catalog = Catalog::from_paths(&[json_path, toml_path]).unwrap();
    assert_eq!(catalog.len(), 4);
    assert_eq!(
        catalog
            .lookup_table("landscape_cover")
            .unwrap()
            .package
            .as_deref(),
        Some("landscape")
    );
}

#[test]
fn test_from_paths_errors() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("missing.json");
    assert!(matches!(
        Catalog::from_paths(&[&missing]).unwrap_err(),
        ManifestError::Io { .. }
    ));

    let yaml = dir.path().join("pudl.yaml");
    fs::write(&yaml, "resources: []").unwrap();
    assert!(matches!(
        Catalog::from_paths(&[&yaml]).unwrap_err(),
        ManifestError::UnsupportedFormat(_)
    ));

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{\"resources\": [").unwrap();
    assert!(matches!(
        Catalog::from_paths(&[&broken]).unwrap_err(),
        ManifestError::Json(_)
    ));
}
