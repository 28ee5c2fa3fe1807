//! # eelhole
//!
//! Catalog search and filter-to-SQL compilation for a browser data grid.
//!
//! ## Architecture
//!
//! The server never reads data. It answers catalog questions and hands the
//! browser a parameterized DuckDB statement to run itself:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │            Data-package manifests (JSON / TOML)          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [catalog]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Catalog (tables, columns, semantic types)         │
//! └─────────────────────────────────────────────────────────┘
//!                │                            │
//!                ▼ [search]                   ▼ [compile]
//! ┌───────────────────────────┐  ┌──────────────────────────┐
//! │  SearchIndex              │  │  QueryCompiler           │
//! │  search / autocomplete    │  │  filters ─▶ Predicate    │
//! └───────────────────────────┘  │  ─▶ Query ─▶ TokenStream │
//!                                └──────────────────────────┘
//!                                             │
//!                                             ▼
//!                        QuerySpec { statement, count_statement, values }
//! ```

pub mod catalog;
pub mod compile;
pub mod config;
pub mod error;
pub mod filter;
pub mod search;
pub mod sql;

#[cfg(feature = "server")]
pub mod web;

pub use error::{Error, ErrorKind, Result};

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::catalog::{Catalog, ColumnDescriptor, Manifest, SemanticType, TableDescriptor};
    pub use crate::compile::{CompileOptions, QueryCompiler, QuerySpec};
    pub use crate::config::Settings;
    pub use crate::error::{Error, ErrorKind};
    pub use crate::filter::{BindValue, Filter, Operation, Value};
    pub use crate::search::{SearchHit, SearchIndex, SearchScope};
    pub use crate::sql::{Dialect, SqlDialect};
}
