//! Compilation of grid filters into parameterized DuckDB statements.
//!
//! ```text
//! table name ─▶ Catalog lookup ─▶ location (base/name.ext)
//! filters    ─▶ Predicate::resolve (per filter) ─▶ AND ─▶ WHERE
//! page/size  ─▶ LIMIT per_page OFFSET (page-1)*per_page
//!            ─▶ QuerySpec { statement, count_statement, values }
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use eelhole::catalog::{Catalog, Manifest, SemanticType};
//! use eelhole::compile::{CompileOptions, QueryCompiler};
//! use eelhole::filter::{Filter, Operation};
//!
//! let manifest = Manifest::from_json_str(r#"{"resources": [{
//!     "name": "plants_eia",
//!     "schema": {"fields": [{"name": "capacity_mw", "type": "number"}]}
//! }]}"#).unwrap();
//! let catalog = Arc::new(Catalog::load(&manifest).unwrap());
//!
//! let compiler = QueryCompiler::new(catalog, CompileOptions::default());
//! let filters = vec![
//!     Filter::new("capacity_mw", SemanticType::Number, Operation::GreaterThan).with_value(100i64),
//! ];
//! let spec = compiler.compile("plants_eia", &filters, 1, 10).unwrap();
//! assert_eq!(spec.values.len(), 1);
//! assert!(spec.statement.ends_with("LIMIT 10 OFFSET 0"));
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, TableDescriptor, UnknownTable};
use crate::filter::{BindValue, Filter, Predicate, ValidationError};
use crate::sql::expr::{col, count_star, lit_bool, ExprExt};
use crate::sql::query::{OrderByExpr, Query, TableRef};
use crate::sql::Dialect;

/// Table function used to scan a data file.
const SCAN_FUNCTION: &str = "read_parquet";

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during compilation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    UnknownTable(#[from] UnknownTable),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CompileResult<T> = Result<T, CompileError>;

// ============================================================================
// Options
// ============================================================================

/// Options for compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOptions {
    /// SQL dialect to generate.
    pub dialect: Dialect,
    /// Directory or URL prefix holding one file per table.
    pub base_location: String,
    /// Data file extension, without the dot.
    pub file_extension: String,
    /// Sort by the table's primary key instead of engine order.
    pub order_by_primary_key: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::DuckDb,
            base_location: "data".to_string(),
            file_extension: "parquet".to_string(),
            order_by_primary_key: false,
        }
    }
}

impl CompileOptions {
    /// Set the SQL dialect.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_base_location(mut self, base_location: impl Into<String>) -> Self {
        self.base_location = base_location.into();
        self
    }

    pub fn with_file_extension(mut self, file_extension: impl Into<String>) -> Self {
        self.file_extension = file_extension.into();
        self
    }

    pub fn with_order_by_primary_key(mut self, enabled: bool) -> Self {
        self.order_by_primary_key = enabled;
        self
    }

    /// File location of a catalog table: `<base>/<name>.<ext>`.
    pub fn location_for(&self, table: &TableDescriptor) -> String {
        let base = self.base_location.trim_end_matches('/');
        let ext = self.file_extension.trim_start_matches('.');
        if base.is_empty() {
            format!("{}.{}", table.name, ext)
        } else {
            format!("{}/{}.{}", base, table.name, ext)
        }
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// A query for the client-side engine to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Filtered, paginated data statement.
    pub statement: String,
    /// Row count for the same filter, without pagination.
    pub count_statement: String,
    /// One value per placeholder, shared by both statements.
    pub values: Vec<BindValue>,
}

// ============================================================================
// Compiler
// ============================================================================

/// Compiles filters against a shared catalog.
#[derive(Debug, Clone)]
pub struct QueryCompiler {
    catalog: Arc<Catalog>,
    options: CompileOptions,
}

impl QueryCompiler {
    pub fn new(catalog: Arc<Catalog>, options: CompileOptions) -> Self {
        Self { catalog, options }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile `filters` on `table_name` into a data statement for one page
    /// and a matching count statement.
    ///
    /// Filters are ANDed in order; their values are returned in the same
    /// order as the placeholders they fill.
    pub fn compile(
        &self,
        table_name: &str,
        filters: &[Filter],
        page: i64,
        per_page: i64,
    ) -> CompileResult<QuerySpec> {
        let table = self.catalog.lookup_table(table_name)?;
        let (limit, offset) = page_window(page, per_page)?;

        let predicates = filters
            .iter()
            .map(|f| Predicate::resolve(f, table))
            .collect::<Result<Vec<_>, _>>()?;
        let values: Vec<BindValue> = predicates.iter().flat_map(Predicate::values).collect();

        let condition = predicates
            .iter()
            .map(Predicate::to_expr)
            .reduce(|acc, expr| acc.and(expr))
            .unwrap_or_else(|| lit_bool(true));

        let source = TableRef::scan(SCAN_FUNCTION, &self.options.location_for(table));

        let mut data = Query::new()
            .select_star()
            .from(source.clone())
            .filter(condition.clone());
        if self.options.order_by_primary_key && !table.primary_key.is_empty() {
            data = data.order_by(
                table
                    .primary_key
                    .iter()
                    .map(|c| OrderByExpr::new(col(c)))
                    .collect(),
            );
        }
        let data = data.limit(limit).offset(offset);

        let count = Query::new()
            .select(vec![count_star()])
            .from(source)
            .filter(condition);

        let dialect = self.options.dialect;
        let data_tokens = data.to_tokens_for_dialect(dialect);
        let count_tokens = count.to_tokens_for_dialect(dialect);

        for (label, tokens) in [("statement", &data_tokens), ("count_statement", &count_tokens)] {
            let placeholders = tokens.placeholder_count();
            if placeholders != values.len() {
                return Err(CompileError::Internal(format!(
                    "{} has {} placeholders but {} values were bound",
                    label,
                    placeholders,
                    values.len()
                )));
            }
        }

        Ok(QuerySpec {
            statement: data_tokens.serialize(dialect),
            count_statement: count_tokens.serialize(dialect),
            values,
        })
    }
}

/// LIMIT and OFFSET for a 1-based page.
fn page_window(page: i64, per_page: i64) -> Result<(u64, u64), ValidationError> {
    if page < 1 {
        return Err(ValidationError::InvalidPage(page));
    }
    if per_page < 1 {
        return Err(ValidationError::InvalidPerPage(per_page));
    }
    let offset = (page - 1)
        .checked_mul(per_page)
        .ok_or(ValidationError::OffsetOverflow { page, per_page })?;
    Ok((per_page as u64, offset as u64))
}
