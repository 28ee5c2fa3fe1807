//! SQL Dialect definitions and formatting rules.
//!
//! This module provides a trait-based abstraction for SQL dialect differences.
//! Each dialect implements `SqlDialect` to handle its specific syntax:
//!
//! - Identifier quoting: `"` (ANSI/DuckDB)
//! - Bind parameter syntax: `?` vs `$n`
//! - Pagination: LIMIT/OFFSET
//! - Boolean literals: true/false vs 1/0
//!
//! Compiled statements are executed by DuckDB (embedded in the browser), so
//! DuckDB is the only member of [`Dialect`]. The trait defaults follow ANSI
//! SQL so another engine only has to override what differs.
//!
//! # Usage
//!
//! ```
//! use eelhole::sql::dialect::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::DuckDb;
//! assert_eq!(dialect.quote_identifier("capacity_mw"), "\"capacity_mw\"");
//! ```

mod duckdb;
pub mod helpers;

pub use duckdb::DuckDb;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::token::TokenStream;
use super::types::DataType;

/// SQL dialect trait - defines how SQL constructs are rendered.
///
/// Implementations handle dialect-specific syntax differences.
/// The default implementations follow ANSI SQL where possible.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifier and Literal Quoting
    // =========================================================================

    /// Quote an identifier (a column name).
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string literal.
    ///
    /// Single quotes with `''` for escaping.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    /// Format a boolean literal.
    fn format_bool(&self, b: bool) -> &'static str;

    // =========================================================================
    // Parameters
    // =========================================================================

    /// Positional bind parameter marker.
    fn placeholder(&self) -> &'static str {
        "?"
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    /// Emit LIMIT/OFFSET or equivalent pagination clause.
    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_standard(limit, offset)
    }

    // =========================================================================
    // Types
    // =========================================================================

    /// Emit the name of a CAST target type.
    fn emit_data_type(&self, dt: DataType) -> &'static str {
        helpers::emit_data_type_ansi(dt)
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    DuckDb,
}

impl Dialect {
    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::DuckDb => &DuckDb,
        }
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        self.dialect().format_bool(b)
    }

    fn placeholder(&self) -> &'static str {
        self.dialect().placeholder()
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        self.dialect().emit_limit_offset(limit, offset)
    }

    fn emit_data_type(&self, dt: DataType) -> &'static str {
        self.dialect().emit_data_type(dt)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "duckdb" => Ok(Dialect::DuckDb),
            other => Err(format!("unsupported SQL dialect: {}", other)),
        }
    }
}
