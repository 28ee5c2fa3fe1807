#![cfg(feature = "server")]

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use eelhole::config::QuerySettings;
use eelhole::web::{router, AppState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> axum::Router {
    app_with(QuerySettings::default())
}

fn app_with(settings: QuerySettings) -> axum::Router {
    let state = AppState::new(common::catalog(), settings).unwrap();
    router(Arc::new(state))
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// Percent-encode a query parameter value.
fn encode(s: &str) -> String {
    s.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect()
}

#[tokio::test]
async fn test_search_includes_columns() {
    let (status, body) = get(app(), "/api/search?q=plant").await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["table"], "plants_eia");
    assert_eq!(results[0]["matched_on"], "name_prefix");
    assert_eq!(results[0]["columns"][3]["name"], "capacity_mw");
    assert_eq!(results[0]["columns"][3]["semantic_type"], "number");
    assert_eq!(results[1]["table"], "fuel_receipts");
    assert_eq!(results[1]["matched_on"], "description");
}

#[tokio::test]
async fn test_search_package_scope() {
    let (status, body) = get(app(), "/api/search?q=&package=landscape").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"results": [{
            "table": "landscape_cover",
            "description": "Land cover classes by county",
            "matched_on": null,
            "columns": [
                {"name": "county", "semantic_type": "string"},
                {"name": "cover_class", "semantic_type": "categorical"}
            ]
        }]})
    );
}

#[tokio::test]
async fn test_autocomplete() {
    let (status, body) = get(app(), "/api/autocomplete?q=cap&variants=b").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"suggestions": ["name:capacity_factor", "name:capacity_mw", "landscape_cover"]})
    );
}

#[tokio::test]
async fn test_query_compiles_filters() {
    let filters = r#"[{"fieldName":"capacity_mw","fieldType":"number","operation":"greaterThan","value":100}]"#;
    let uri = format!(
        "/api/query?name=plants_eia&filters={}&page=1&perPage=10",
        encode(filters)
    );
    let (status, body) = get(app(), &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "statement": "SELECT\n  *\nFROM READ_PARQUET('data/plants_eia.parquet')\nWHERE \"capacity_mw\" > ?\nLIMIT 10 OFFSET 0",
            "count_statement": "SELECT\n  COUNT(*)\nFROM READ_PARQUET('data/plants_eia.parquet')\nWHERE \"capacity_mw\" > ?",
            "values": [100]
        })
    );
}

#[tokio::test]
async fn test_query_defaults_to_preview_page() {
    let (status, body) = get(app(), "/api/query?name=generators").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["statement"]
        .as_str()
        .unwrap()
        .ends_with("LIMIT 10000 OFFSET 0"));
    assert_eq!(body["values"], json!([]));
}

#[tokio::test]
async fn test_query_export_page_size_is_the_ceiling() {
    let (status, _) = get(app(), "/api/query?name=generators&perPage=1000000").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(app(), "/api/query?name=generators&perPage=1000001").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation_error");
    assert_eq!(
        body["message"],
        "Page size 1000001 exceeds the maximum of 1000000"
    );
}

#[tokio::test]
async fn test_query_errors() {
    let (status, body) = get(app(), "/api/query?name=nope").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"kind": "unknown_table", "message": "Unknown table: nope"})
    );

    let (status, body) = get(app(), "/api/query?name=plants_eia&page=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation_error");

    let uri = format!("/api/query?name=plants_eia&filters={}", encode("[{"));
    let (status, body) = get(app(), &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation_error");

    let (status, body) = get(app(), "/api/query?name=plants_eia&page=first").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation_error");

    let (status, body) = get(app(), "/api/query").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation_error");
}

#[tokio::test]
async fn test_query_uses_configured_location() {
    let settings = QuerySettings {
        base_location: "s3://pudl/nightly".to_string(),
        order_by_primary_key: true,
        ..QuerySettings::default()
    };
    let (status, body) = get(app_with(settings), "/api/query?name=generators&perPage=5").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["statement"],
        "SELECT\n  *\nFROM READ_PARQUET('s3://pudl/nightly/generators.parquet')\nWHERE true\nORDER BY \"generator_id\"\nLIMIT 5 OFFSET 0"
    );
}
