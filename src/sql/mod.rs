//! SQL generation module.
//!
//! This module provides a type-safe SQL builder used to render compiled
//! filters. It includes:
//!
//! - [`query`] - SELECT query builder
//! - [`expr`] - Expression AST and builder DSL
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations
//! - [`types`] - CAST target types

pub mod dialect;
pub mod expr;
pub mod query;
pub mod token;
pub mod types;


// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, SqlDialect};
pub use expr::{
    cast, col, count_star, func, lit_bool, lit_int, lit_str, placeholder, star, BinaryOperator,
    Expr, ExprExt, Literal, UnaryOperator,
};
pub use query::{LimitOffset, OrderByExpr, Query, TableRef};
pub use token::{Token, TokenStream};
pub use types::DataType;
