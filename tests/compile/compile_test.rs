#[path = "../common/mod.rs"]
mod common;

use eelhole::compile::{CompileError, CompileOptions};
use eelhole::filter::{BindValue, Filter, ValidationError};
use rstest::rstest;
use sqlparser::dialect::DuckDbDialect;
use sqlparser::parser::Parser;

fn assert_parses(sql: &str) {
    if let Err(e) = Parser::parse_sql(&DuckDbDialect {}, sql) {
        panic!("invalid DuckDB SQL: {}\n{}", e, sql);
    }
}

fn filters(json: &str) -> Vec<Filter> {
    Filter::parse_list(json).unwrap()
}

#[test]
fn test_capacity_filter_scenario() {
    let spec = common::compiler()
        .compile(
            "plants_eia",
            &filters(
                r#"[{"fieldName": "capacity_mw", "fieldType": "number",
                     "operation": "greaterThan", "value": 100}]"#,
            ),
            1,
            10,
        )
        .unwrap();

    assert_eq!(
        spec.statement,
        "SELECT\n  *\nFROM READ_PARQUET('data/plants_eia.parquet')\nWHERE \"capacity_mw\" > ?\nLIMIT 10 OFFSET 0"
    );
    assert_eq!(
        spec.count_statement,
        "SELECT\n  COUNT(*)\nFROM READ_PARQUET('data/plants_eia.parquet')\nWHERE \"capacity_mw\" > ?"
    );
    assert_eq!(spec.values, vec![BindValue::Int(100)]);
    assert_eq!(
        serde_json::to_value(&spec.values).unwrap(),
        serde_json::json!([100])
    );

    assert_parses(&spec.statement);
    assert_parses(&spec.count_statement);
}

#[test]
fn test_every_column_type_together() {
    let spec = common::compiler_with(
        CompileOptions::default().with_base_location("https://example.org/pudl/nightly/"),
    )
    .compile(
        "plants_eia",
        &filters(
            r#"[
                {"fieldName": "name", "fieldType": "string", "operation": "contains", "value": "Plant"},
                {"fieldName": "report_date", "fieldType": "date", "operation": "inRange",
                 "value": "2020-01-01", "valueTo": "2020-12-31T00:00:00"},
                {"fieldName": "fuel_type", "fieldType": "categorical", "operation": "in",
                 "value": ["coal", "gas"]},
                {"fieldName": "updated_at", "fieldType": "timestamp",
                 "operation": "greaterThanOrEqual", "value": "2024-01-01T00:00:00Z"},
                {"fieldName": "capacity_mw", "fieldType": "number", "operation": "notBlank"}
            ]"#,
        ),
        3,
        100,
    )
    .unwrap();

    insta::assert_snapshot!(spec.statement, @r###"
    SELECT
      *
    FROM READ_PARQUET('https://example.org/pudl/nightly/plants_eia.parquet')
    WHERE CONTAINS(LOWER("name"), LOWER(?)) AND "report_date" BETWEEN CAST(? AS DATE) AND CAST(? AS DATE) AND "fuel_type" IN (?, ?) AND "updated_at" >= EPOCH_MS(CAST(? AS BIGINT)) AND "capacity_mw" IS NOT NULL
    LIMIT 100 OFFSET 200
    "###);

    assert_eq!(
        spec.values,
        vec![
            BindValue::Text("Plant".into()),
            BindValue::Text("2020-01-01".into()),
            BindValue::Text("2020-12-31".into()),
            BindValue::Text("coal".into()),
            BindValue::Text("gas".into()),
            BindValue::Int(1_704_067_200_000),
        ]
    );
    assert_eq!(spec.statement.matches('?').count(), spec.values.len());
    assert_eq!(spec.count_statement.matches('?').count(), spec.values.len());

    assert_parses(&spec.statement);
    assert_parses(&spec.count_statement);
}

#[test]
fn test_repeated_column_filters_are_anded() {
    let spec = common::compiler()
        .compile(
            "plants_eia",
            &filters(
                r#"[
                    {"fieldName": "capacity_mw", "fieldType": "number", "operation": "greaterThan", "value": 10},
                    {"fieldName": "capacity_mw", "fieldType": "number", "operation": "lessThan", "value": 500.5}
                ]"#,
            ),
            1,
            10,
        )
        .unwrap();

    assert!(spec
        .statement
        .contains("WHERE \"capacity_mw\" > ? AND \"capacity_mw\" < ?\n"));
    assert_eq!(
        spec.values,
        vec![BindValue::Int(10), BindValue::Float(500.5)]
    );
}

#[test]
fn test_values_never_enter_statement_text() {
    let spec = common::compiler()
        .compile(
            "plants_eia",
            &filters(
                r#"[{"fieldName": "name", "fieldType": "string", "operation": "equals",
                     "value": "x'); DROP TABLE plants_eia; --"}]"#,
            ),
            1,
            10,
        )
        .unwrap();

    assert!(!spec.statement.contains("DROP"));
    assert!(!spec.count_statement.contains("DROP"));
    assert_eq!(
        spec.values,
        vec![BindValue::Text("x'); DROP TABLE plants_eia; --".into())]
    );
}

#[test]
fn test_primary_key_ordering() {
    let spec = common::compiler_with(CompileOptions::default().with_order_by_primary_key(true))
        .compile("generators", &[], 2, 25)
        .unwrap();

    insta::assert_snapshot!(spec.statement, @r###"
    SELECT
      *
    FROM READ_PARQUET('data/generators.parquet')
    WHERE true
    ORDER BY "generator_id"
    LIMIT 25 OFFSET 25
    "###);
    assert_parses(&spec.statement);

    // Tables without a primary key keep engine order
    let spec = common::compiler_with(CompileOptions::default().with_order_by_primary_key(true))
        .compile("landscape_cover", &[], 1, 25)
        .unwrap();
    assert!(!spec.statement.contains("ORDER BY"));
}

#[test]
fn test_unknown_table() {
    let err = common::compiler()
        .compile("plants_eia_v2", &[], 1, 10)
        .unwrap_err();
    assert!(matches!(err, CompileError::UnknownTable(ref t) if t.0 == "plants_eia_v2"));
    assert_eq!(err.to_string(), "Unknown table: plants_eia_v2");
}

#[rstest]
#[case::unknown_field(
    r#"[{"fieldName": "nameplate", "fieldType": "string", "operation": "equals", "value": "x"}]"#,
    "Unknown field 'nameplate'"
)]
#[case::type_mismatch(
    r#"[{"fieldName": "capacity_mw", "fieldType": "string", "operation": "equals", "value": "x"}]"#,
    "is number, but the filter declares string"
)]
#[case::unsupported_operation(
    r#"[{"fieldName": "capacity_mw", "fieldType": "number", "operation": "contains", "value": 1}]"#,
    "Operation 'contains' is not valid for number field 'capacity_mw'"
)]
#[case::missing_value(
    r#"[{"fieldName": "capacity_mw", "fieldType": "number", "operation": "equals"}]"#,
    "requires a value"
)]
#[case::between_without_value_to(
    r#"[{"fieldName": "report_date", "fieldType": "date", "operation": "between", "value": "2020-01-01"}]"#,
    "requires valueTo"
)]
#[case::bad_date(
    r#"[{"fieldName": "report_date", "fieldType": "date", "operation": "equals", "value": "last tuesday"}]"#,
    "is not an ISO date"
)]
#[case::empty_in_list(
    r#"[{"fieldName": "fuel_type", "fieldType": "categorical", "operation": "in", "value": []}]"#,
    "empty value list"
)]
fn test_invalid_filter(#[case] json: &str, #[case] expected: &str) {
    let err = common::compiler()
        .compile("plants_eia", &filters(json), 1, 10)
        .unwrap_err();
    assert!(matches!(err, CompileError::Validation(_)), "{:?}", err);
    assert!(
        err.to_string().contains(expected),
        "expected '{}' in '{}'",
        expected,
        err
    );
}

#[rstest]
#[case(0, 10, ValidationError::InvalidPage(0))]
#[case(-3, 10, ValidationError::InvalidPage(-3))]
#[case(1, 0, ValidationError::InvalidPerPage(0))]
#[case(1, -1, ValidationError::InvalidPerPage(-1))]
fn test_invalid_page(#[case] page: i64, #[case] per_page: i64, #[case] expected: ValidationError) {
    let err = common::compiler()
        .compile("plants_eia", &[], page, per_page)
        .unwrap_err();
    assert_eq!(err, CompileError::Validation(expected));
}

#[test]
fn test_unknown_operation_is_malformed() {
    let err = Filter::parse_list(
        r#"[{"fieldName": "name", "fieldType": "string", "operation": "fuzzy", "value": "x"}]"#,
    )
    .unwrap_err();
    assert!(matches!(err, ValidationError::MalformedFilters(_)));
}
