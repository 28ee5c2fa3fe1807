//! SQL-level data types used as CAST targets.

use std::fmt;

/// SQL-level data type.
///
/// Only the types filter values are cast to are modelled; column types come
/// from the Parquet files themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Calendar date (`DATE`).
    Date,
    /// 64-bit signed integer (`BIGINT`).
    BigInt,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Date => write!(f, "DATE"),
            DataType::BigInt => write!(f, "BIGINT"),
        }
    }
}
