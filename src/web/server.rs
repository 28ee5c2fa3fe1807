//! Axum web server for eelhole
//!
//! Serves search, autocomplete and query compilation to the browser grid.
//! The grid runs the compiled statements itself; this server never touches
//! the data files.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::catalog::{Catalog, ColumnDescriptor};
use crate::compile::{QueryCompiler, QuerySpec};
use crate::config::{QuerySettings, SettingsError};
use crate::error::{Error, ErrorBody, ErrorKind};
use crate::filter::{Filter, ValidationError};
use crate::search::{MatchKind, SearchIndex, SearchScope};

/// Application state shared across handlers
#[derive(Debug)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub index: SearchIndex,
    pub compiler: QueryCompiler,
    pub settings: QuerySettings,
}

impl AppState {
    /// Index `catalog` and prepare a compiler from the query settings.
    pub fn new(catalog: Catalog, settings: QuerySettings) -> Result<Self, SettingsError> {
        let catalog = Arc::new(catalog);
        let index = SearchIndex::new(&catalog);
        let compiler = QueryCompiler::new(Arc::clone(&catalog), settings.compile_options()?);
        Ok(Self {
            catalog,
            index,
            compiler,
            settings,
        })
    }
}

/// Build the axum router with all routes
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/search", get(search))
        .route("/api/autocomplete", get(autocomplete))
        .route("/api/query", get(compile_query))
        .layer(cors)
        .with_state(state)
}

/// Start the web server
pub async fn serve(state: Arc<AppState>, bind: &str) -> Result<(), Box<dyn std::error::Error>> {
    let tables = state.catalog.len();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(addr = %listener.local_addr()?, tables, "eelhole listening");

    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Errors
// ============================================================================

/// An error rendered as `{kind, message}` with a matching status code.
#[derive(Debug)]
pub struct ApiError(ErrorBody);

impl<E: Into<Error>> From<E> for ApiError {
    fn from(err: E) -> Self {
        ApiError(err.into().body())
    }
}

impl ApiError {
    fn rejected(rejection: QueryRejection) -> Self {
        ApiError(ErrorBody {
            kind: ErrorKind::Validation,
            message: rejection.body_text(),
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.kind.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        if status.is_server_error() {
            tracing::error!(kind = %self.0.kind, message = %self.0.message, "request failed");
        }
        (status, Json(self.0)).into_response()
    }
}

// ============================================================================
// Search API
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    package: Option<String>,
}

#[derive(Serialize)]
struct SearchResult {
    table: String,
    description: Option<String>,
    matched_on: Option<MatchKind>,
    columns: Vec<ColumnDescriptor>,
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

/// GET /api/search - Rank tables for the main search box
async fn search(
    State(state): State<Arc<AppState>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Query(params) = params.map_err(ApiError::rejected)?;
    let scope = match params.package {
        Some(package) if !package.is_empty() => SearchScope::Package(package),
        _ => SearchScope::All,
    };

    let results = state
        .index
        .search_scoped(&params.q, &scope)
        .into_iter()
        .map(|hit| {
            let table = state.catalog.lookup_table(&hit.table)?;
            Ok(SearchResult {
                columns: table.columns.clone(),
                table: hit.table,
                description: hit.description,
                matched_on: hit.matched_on,
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    tracing::debug!(q = %params.q, hits = results.len(), "search");
    Ok(Json(SearchResponse { results }))
}

// ============================================================================
// Autocomplete API
// ============================================================================

#[derive(Debug, Deserialize)]
struct AutocompleteParams {
    #[serde(default)]
    q: String,
    /// Client experiment bucket; recorded, never interpreted.
    variants: Option<String>,
}

#[derive(Serialize)]
struct AutocompleteResponse {
    suggestions: Vec<String>,
}

/// GET /api/autocomplete - Suggest table and column names
async fn autocomplete(
    State(state): State<Arc<AppState>>,
    params: Result<Query<AutocompleteParams>, QueryRejection>,
) -> Result<Json<AutocompleteResponse>, ApiError> {
    let Query(params) = params.map_err(ApiError::rejected)?;
    let suggestions = state.index.autocomplete(&params.q);
    tracing::debug!(
        q = %params.q,
        variants = params.variants.as_deref().unwrap_or(""),
        suggestions = suggestions.len(),
        "autocomplete"
    );
    Ok(Json(AutocompleteResponse { suggestions }))
}

// ============================================================================
// Query API
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryParams {
    name: String,
    /// JSON array of filters.
    filters: Option<String>,
    page: Option<i64>,
    per_page: Option<i64>,
}

/// GET /api/query - Compile grid filters for one page of a table
async fn compile_query(
    State(state): State<Arc<AppState>>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> Result<Json<QuerySpec>, ApiError> {
    let Query(params) = params.map_err(ApiError::rejected)?;

    let page = params.page.unwrap_or(1);
    let per_page = params
        .per_page
        .unwrap_or(state.settings.preview_page_size as i64);
    let max = state.settings.export_page_size;
    if u64::try_from(per_page).is_ok_and(|n| n > max) {
        return Err(ValidationError::PageSizeTooLarge { per_page, max }.into());
    }

    let filters = match params.filters.as_deref() {
        Some(json) if !json.trim().is_empty() => Filter::parse_list(json)?,
        _ => Vec::new(),
    };

    let spec = state
        .compiler
        .compile(&params.name, &filters, page, per_page)?;

    tracing::info!(
        event = state.settings.page_kind(per_page).event(),
        table = %params.name,
        filters = filters.len(),
        page,
        per_page,
        "compiled query"
    );
    Ok(Json(spec))
}
