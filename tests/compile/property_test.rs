#[path = "../common/mod.rs"]
mod common;

use eelhole::catalog::SemanticType;
use eelhole::filter::{Filter, Operation, Value};
use proptest::prelude::*;

fn number_filter() -> impl Strategy<Value = Filter> {
    (
        prop_oneof![
            Just(Operation::Equals),
            Just(Operation::NotEqual),
            Just(Operation::GreaterThan),
            Just(Operation::GreaterThanOrEqual),
            Just(Operation::LessThan),
            Just(Operation::LessThanOrEqual),
        ],
        -1_000i64..1_000,
    )
        .prop_map(|(op, n)| Filter::new("capacity_mw", SemanticType::Number, op).with_value(n))
}

fn range_filter() -> impl Strategy<Value = Filter> {
    (2000i32..2030, 2000i32..2030).prop_map(|(a, b)| {
        Filter::new("report_date", SemanticType::Date, Operation::Between)
            .with_value(format!("{}-01-01", a).as_str())
            .with_value_to(format!("{}-12-31", b).as_str())
    })
}

fn text_filter() -> impl Strategy<Value = Filter> {
    (
        prop_oneof![
            Just(Operation::Equals),
            Just(Operation::NotEqual),
            Just(Operation::Contains),
            Just(Operation::NotContains),
            Just(Operation::StartsWith),
            Just(Operation::EndsWith),
        ],
        "[a-zA-Z' ;-]{0,12}",
    )
        .prop_map(|(op, s)| Filter::new("name", SemanticType::String, op).with_value(s.as_str()))
}

fn category_filter() -> impl Strategy<Value = Filter> {
    prop::collection::vec("[a-z]{1,6}", 1..5).prop_map(|items| {
        let values: Vec<Value> = items.into_iter().map(Value::Text).collect();
        Filter::new("fuel_type", SemanticType::Categorical, Operation::In)
            .with_value(Value::List(values))
    })
}

fn timestamp_filter() -> impl Strategy<Value = Filter> {
    (0i64..4_000_000_000_000).prop_map(|ms| {
        Filter::new("updated_at", SemanticType::Timestamp, Operation::LessThan).with_value(ms)
    })
}

fn blank_filter() -> impl Strategy<Value = Filter> {
    prop_oneof![Just(Operation::Blank), Just(Operation::NotBlank)]
        .prop_map(|op| Filter::new("report_date", SemanticType::Date, op))
}

fn any_filter() -> impl Strategy<Value = Filter> {
    prop_oneof![
        number_filter(),
        range_filter(),
        text_filter(),
        category_filter(),
        timestamp_filter(),
        blank_filter(),
    ]
}

proptest! {
    #[test]
    fn prop_values_match_placeholders(
        filters in prop::collection::vec(any_filter(), 0..6),
        page in 1i64..1_000,
        per_page in 1i64..10_000,
    ) {
        let spec = common::compiler()
            .compile("plants_eia", &filters, page, per_page)
            .unwrap();

        prop_assert_eq!(spec.statement.matches('?').count(), spec.values.len());
        prop_assert_eq!(spec.count_statement.matches('?').count(), spec.values.len());
    }

    #[test]
    fn prop_limit_offset_follow_page(page in 1i64..100_000, per_page in 1i64..1_000_000) {
        let spec = common::compiler()
            .compile("plants_eia", &[], page, per_page)
            .unwrap();

        let expected = format!("\nLIMIT {} OFFSET {}", per_page, (page - 1) * per_page);
        prop_assert!(spec.statement.ends_with(&expected), "{}", spec.statement);
        prop_assert!(!spec.count_statement.contains("LIMIT"));
        prop_assert!(!spec.count_statement.contains("OFFSET"));
    }

    #[test]
    fn prop_compile_is_deterministic(
        filters in prop::collection::vec(any_filter(), 0..6),
        page in 1i64..50,
    ) {
        let compiler = common::compiler();
        let first = compiler.compile("plants_eia", &filters, page, 100).unwrap();
        let second = compiler.compile("plants_eia", &filters, page, 100).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_compiled_sql_parses(filters in prop::collection::vec(any_filter(), 0..4)) {
        use sqlparser::dialect::DuckDbDialect;
        use sqlparser::parser::Parser;

        let spec = common::compiler().compile("plants_eia", &filters, 1, 10).unwrap();
        let dialect = DuckDbDialect {};
        prop_assert!(Parser::parse_sql(&dialect, &spec.statement).is_ok());
        prop_assert!(Parser::parse_sql(&dialect, &spec.count_statement).is_ok());
    }
}
