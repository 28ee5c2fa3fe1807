//! Client filters and their validated predicate form.
//!
//! A [`Filter`] is what the data grid sends: a field, the field's declared
//! type, an operation name and one or two loosely typed values. Resolving a
//! filter against a [`TableDescriptor`] produces a [`Predicate`], a closed
//! set of shapes that each render to SQL with bind parameters only.
//!
//! ```text
//! Filter (JSON) ──resolve──▶ Predicate ──to_expr──▶ Expr (placeholders)
//!                                 └──────values───▶ Vec<BindValue>
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{SemanticType, TableDescriptor};
use crate::sql::expr::{cast, col, func, placeholder, Expr, ExprExt};
use crate::sql::types::DataType;

// ============================================================================
// Errors
// ============================================================================

/// A request that cannot be compiled as given.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Unknown field '{field}' in table '{table}'")]
    UnknownField { table: String, field: String },

    #[error("Field '{field}' is {actual}, but the filter declares {declared}")]
    TypeMismatch {
        field: String,
        declared: SemanticType,
        actual: SemanticType,
    },

    #[error("Operation '{operation}' is not valid for {field_type} field '{field}'")]
    UnsupportedOperation {
        field: String,
        field_type: SemanticType,
        operation: Operation,
    },

    #[error("Filter on '{field}' requires a value")]
    MissingValue { field: String },

    #[error("Range filter on '{field}' requires valueTo")]
    MissingValueTo { field: String },

    #[error("Invalid value for {field_type} field '{field}': {reason}")]
    InvalidValue {
        field: String,
        field_type: SemanticType,
        reason: String,
    },

    #[error("Filter on '{field}' has an empty value list")]
    EmptyList { field: String },

    #[error("Page must be at least 1, got {0}")]
    InvalidPage(i64),

    #[error("Page size must be at least 1, got {0}")]
    InvalidPerPage(i64),

    #[error("Page {page} with page size {per_page} is out of range")]
    OffsetOverflow { page: i64, per_page: i64 },

    #[error("Page size {per_page} exceeds the maximum of {max}")]
    PageSizeTooLarge { per_page: i64, max: u64 },

    #[error("Malformed filters: {0}")]
    MalformedFilters(String),
}

// ============================================================================
// Operations
// ============================================================================

/// Filter operation names as sent by the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "String")]
pub enum Operation {
    Equals,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Between,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    In,
    Blank,
    NotBlank,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Equals => "equals",
            Operation::NotEqual => "notEqual",
            Operation::GreaterThan => "greaterThan",
            Operation::GreaterThanOrEqual => "greaterThanOrEqual",
            Operation::LessThan => "lessThan",
            Operation::LessThanOrEqual => "lessThanOrEqual",
            Operation::Between => "between",
            Operation::Contains => "contains",
            Operation::NotContains => "notContains",
            Operation::StartsWith => "startsWith",
            Operation::EndsWith => "endsWith",
            Operation::In => "in",
            Operation::Blank => "blank",
            Operation::NotBlank => "notBlank",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    /// Case-insensitive; `_` and `-` are ignored and `inRange` means `between`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "equals" => Ok(Operation::Equals),
            "notequal" => Ok(Operation::NotEqual),
            "greaterthan" => Ok(Operation::GreaterThan),
            "greaterthanorequal" => Ok(Operation::GreaterThanOrEqual),
            "lessthan" => Ok(Operation::LessThan),
            "lessthanorequal" => Ok(Operation::LessThanOrEqual),
            "between" | "inrange" => Ok(Operation::Between),
            "contains" => Ok(Operation::Contains),
            "notcontains" => Ok(Operation::NotContains),
            "startswith" => Ok(Operation::StartsWith),
            "endswith" => Ok(Operation::EndsWith),
            "in" => Ok(Operation::In),
            "blank" => Ok(Operation::Blank),
            "notblank" => Ok(Operation::NotBlank),
            _ => Err(format!("unknown filter operation '{}'", s)),
        }
    }
}

impl TryFrom<String> for Operation {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ============================================================================
// Filter
// ============================================================================

/// A loosely typed filter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
}

impl Value {
    fn describe(&self) -> &'static str {
        match self {
            Value::Bool(_) => "a boolean",
            Value::Int(_) => "an integer",
            Value::Float(_) => "a number",
            Value::Text(_) => "a string",
            Value::List(_) => "a list",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

/// One column filter from the grid.
///
/// Field names are camelCase on the wire; snake_case is accepted too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    #[serde(alias = "field_name")]
    pub field_name: String,
    #[serde(alias = "field_type")]
    pub field_type: SemanticType,
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, alias = "value_to", skip_serializing_if = "Option::is_none")]
    pub value_to: Option<Value>,
}

impl Filter {
    pub fn new(field_name: &str, field_type: SemanticType, operation: Operation) -> Self {
        Self {
            field_name: field_name.to_string(),
            field_type,
            operation,
            value: None,
            value_to: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_value_to(mut self, value: impl Into<Value>) -> Self {
        self.value_to = Some(value.into());
        self
    }

    /// Parse the JSON array the grid sends.
    pub fn parse_list(json: &str) -> Result<Vec<Filter>, ValidationError> {
        serde_json::from_str(json).map_err(|e| ValidationError::MalformedFilters(e.to_string()))
    }
}

// ============================================================================
// Bind values
// ============================================================================

/// A literal bound to one placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BindValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for BindValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindValue::Bool(b) => write!(f, "{}", b),
            BindValue::Int(n) => write!(f, "{}", n),
            BindValue::Float(x) => write!(f, "{}", x),
            BindValue::Text(s) => write!(f, "{}", s),
        }
    }
}

// ============================================================================
// Predicates
// ============================================================================

/// Case-insensitive string tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    Equals,
    NotEqual,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
}

/// Ordered comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// How an ordered value is presented to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordered {
    /// Bound as is.
    Number,
    /// Bound as `YYYY-MM-DD`, compared through `CAST(? AS DATE)`.
    Date,
    /// Bound as epoch milliseconds, compared through `epoch_ms(CAST(? AS BIGINT))`.
    Timestamp,
}

/// A validated filter. Every variant knows its SQL shape and its bind values.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Text {
        column: String,
        matcher: TextMatch,
        value: String,
    },
    Compare {
        column: String,
        kind: Ordered,
        comparison: Comparison,
        value: BindValue,
    },
    Between {
        column: String,
        kind: Ordered,
        low: BindValue,
        high: BindValue,
    },
    Category {
        column: String,
        negated: bool,
        value: BindValue,
    },
    OneOf {
        column: String,
        values: Vec<BindValue>,
    },
    Null {
        column: String,
        negated: bool,
    },
}

impl Predicate {
    /// Check `filter` against `table` and build its predicate.
    pub fn resolve(filter: &Filter, table: &TableDescriptor) -> Result<Predicate, ValidationError> {
        let column = table.column(&filter.field_name).ok_or_else(|| {
            ValidationError::UnknownField {
                table: table.name.clone(),
                field: filter.field_name.clone(),
            }
        })?;
        if filter.field_type != column.semantic_type {
            return Err(ValidationError::TypeMismatch {
                field: column.name.clone(),
                declared: filter.field_type,
                actual: column.semantic_type,
            });
        }

        let name = column.name.clone();
        let ty = column.semantic_type;
        let input = FilterInput { filter, ty };

        use Operation as Op;
        use SemanticType as T;
        let predicate = match (ty, filter.operation) {
            (_, Op::Blank) => Predicate::Null {
                column: name,
                negated: false,
            },
            (_, Op::NotBlank) => Predicate::Null {
                column: name,
                negated: true,
            },

            (T::String, op @ (Op::Equals
            | Op::NotEqual
            | Op::Contains
            | Op::NotContains
            | Op::StartsWith
            | Op::EndsWith)) => Predicate::Text {
                column: name,
                matcher: match op {
                    Op::Equals => TextMatch::Equals,
                    Op::NotEqual => TextMatch::NotEqual,
                    Op::Contains => TextMatch::Contains,
                    Op::NotContains => TextMatch::NotContains,
                    Op::StartsWith => TextMatch::StartsWith,
                    _ => TextMatch::EndsWith,
                },
                value: input.text(input.required()?)?,
            },

            (T::Number | T::Date | T::Timestamp, Op::Between) => {
                let kind = ordered(ty);
                let high = filter
                    .value_to
                    .as_ref()
                    .ok_or_else(|| ValidationError::MissingValueTo {
                        field: filter.field_name.clone(),
                    })?;
                Predicate::Between {
                    column: name,
                    kind,
                    low: input.ordered(kind, input.required()?)?,
                    high: input.ordered(kind, high)?,
                }
            }

            (T::Number | T::Date | T::Timestamp, op @ (Op::Equals
            | Op::NotEqual
            | Op::GreaterThan
            | Op::GreaterThanOrEqual
            | Op::LessThan
            | Op::LessThanOrEqual)) => {
                let kind = ordered(ty);
                Predicate::Compare {
                    column: name,
                    kind,
                    comparison: match op {
                        Op::Equals => Comparison::Eq,
                        Op::NotEqual => Comparison::Ne,
                        Op::GreaterThan => Comparison::Gt,
                        Op::GreaterThanOrEqual => Comparison::Gte,
                        Op::LessThan => Comparison::Lt,
                        _ => Comparison::Lte,
                    },
                    value: input.ordered(kind, input.required()?)?,
                }
            }

            (T::Categorical, op @ (Op::Equals | Op::NotEqual)) => Predicate::Category {
                column: name,
                negated: op == Op::NotEqual,
                value: input.scalar(input.required()?)?,
            },

            (T::Categorical, Op::In) => {
                let items = match input.required()? {
                    Value::List(items) => items,
                    other => return Err(input.invalid(format!("expected a list, got {}", other.describe()))),
                };
                if items.is_empty() {
                    return Err(ValidationError::EmptyList {
                        field: filter.field_name.clone(),
                    });
                }
                Predicate::OneOf {
                    column: name,
                    values: items
                        .iter()
                        .map(|v| input.scalar(v))
                        .collect::<Result<_, _>>()?,
                }
            }

            (_, operation) => {
                return Err(ValidationError::UnsupportedOperation {
                    field: filter.field_name.clone(),
                    field_type: ty,
                    operation,
                })
            }
        };

        Ok(predicate)
    }

    /// Column this predicate tests.
    pub fn column(&self) -> &str {
        match self {
            Predicate::Text { column, .. }
            | Predicate::Compare { column, .. }
            | Predicate::Between { column, .. }
            | Predicate::Category { column, .. }
            | Predicate::OneOf { column, .. }
            | Predicate::Null { column, .. } => column,
        }
    }

    /// Values for this predicate's placeholders, in placeholder order.
    pub fn values(&self) -> Vec<BindValue> {
        match self {
            Predicate::Text { value, .. } => vec![BindValue::Text(value.clone())],
            Predicate::Compare { value, .. } | Predicate::Category { value, .. } => {
                vec![value.clone()]
            }
            Predicate::Between { low, high, .. } => vec![low.clone(), high.clone()],
            Predicate::OneOf { values, .. } => values.clone(),
            Predicate::Null { .. } => Vec::new(),
        }
    }

    /// SQL expression with one placeholder per bind value.
    pub fn to_expr(&self) -> Expr {
        match self {
            Predicate::Text {
                column, matcher, ..
            } => {
                let lhs = func("lower", vec![col(column)]);
                let rhs = func("lower", vec![placeholder()]);
                match matcher {
                    TextMatch::Equals => lhs.eq(rhs),
                    TextMatch::NotEqual => lhs.ne(rhs),
                    TextMatch::Contains => func("contains", vec![lhs, rhs]),
                    TextMatch::NotContains => func("contains", vec![lhs, rhs]).not(),
                    TextMatch::StartsWith => func("starts_with", vec![lhs, rhs]),
                    TextMatch::EndsWith => func("ends_with", vec![lhs, rhs]),
                }
            }
            Predicate::Compare {
                column,
                kind,
                comparison,
                ..
            } => {
                let lhs = col(column);
                let rhs = bound_placeholder(*kind);
                match comparison {
                    Comparison::Eq => lhs.eq(rhs),
                    Comparison::Ne => lhs.ne(rhs),
                    Comparison::Gt => lhs.gt(rhs),
                    Comparison::Gte => lhs.gte(rhs),
                    Comparison::Lt => lhs.lt(rhs),
                    Comparison::Lte => lhs.lte(rhs),
                }
            }
            Predicate::Between { column, kind, .. } => {
                col(column).between(bound_placeholder(*kind), bound_placeholder(*kind))
            }
            Predicate::Category {
                column, negated, ..
            } => {
                if *negated {
                    col(column).ne(placeholder())
                } else {
                    col(column).eq(placeholder())
                }
            }
            Predicate::OneOf { column, values } => {
                col(column).in_list(vec![placeholder(); values.len()])
            }
            Predicate::Null { column, negated } => {
                if *negated {
                    col(column).is_not_null()
                } else {
                    col(column).is_null()
                }
            }
        }
    }
}

fn ordered(ty: SemanticType) -> Ordered {
    match ty {
        SemanticType::Date => Ordered::Date,
        SemanticType::Timestamp => Ordered::Timestamp,
        _ => Ordered::Number,
    }
}

fn bound_placeholder(kind: Ordered) -> Expr {
    match kind {
        Ordered::Number => placeholder(),
        Ordered::Date => cast(placeholder(), DataType::Date),
        Ordered::Timestamp => func("epoch_ms", vec![cast(placeholder(), DataType::BigInt)]),
    }
}

// ============================================================================
// Value coercion
// ============================================================================

/// A filter being resolved against its column type.
struct FilterInput<'a> {
    filter: &'a Filter,
    ty: SemanticType,
}

impl<'a> FilterInput<'a> {
    fn required(&self) -> Result<&'a Value, ValidationError> {
        self.filter
            .value
            .as_ref()
            .ok_or_else(|| ValidationError::MissingValue {
                field: self.filter.field_name.clone(),
            })
    }

    fn invalid(&self, reason: String) -> ValidationError {
        ValidationError::InvalidValue {
            field: self.filter.field_name.clone(),
            field_type: self.ty,
            reason,
        }
    }

    fn text(&self, value: &Value) -> Result<String, ValidationError> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            Value::Int(n) => Ok(n.to_string()),
            Value::Float(x) => Ok(x.to_string()),
            other => Err(self.invalid(format!("expected a string, got {}", other.describe()))),
        }
    }

    fn scalar(&self, value: &Value) -> Result<BindValue, ValidationError> {
        match value {
            Value::Text(s) => Ok(BindValue::Text(s.clone())),
            Value::Int(n) => Ok(BindValue::Int(*n)),
            Value::Float(x) => Ok(BindValue::Float(*x)),
            Value::Bool(b) => Ok(BindValue::Bool(*b)),
            Value::List(_) => Err(self.invalid("expected a single value, got a list".into())),
        }
    }

    fn ordered(&self, kind: Ordered, value: &Value) -> Result<BindValue, ValidationError> {
        match kind {
            Ordered::Number => self.number(value),
            Ordered::Date => self.date(value),
            Ordered::Timestamp => self.timestamp(value),
        }
    }

    fn number(&self, value: &Value) -> Result<BindValue, ValidationError> {
        match value {
            Value::Int(n) => Ok(BindValue::Int(*n)),
            Value::Float(x) if x.is_finite() => Ok(BindValue::Float(*x)),
            Value::Text(s) => {
                let s = s.trim();
                if let Ok(n) = s.parse::<i64>() {
                    Ok(BindValue::Int(n))
                } else {
                    match s.parse::<f64>() {
                        Ok(x) if x.is_finite() => Ok(BindValue::Float(x)),
                        _ => Err(self.invalid(format!("'{}' is not a number", s))),
                    }
                }
            }
            other => Err(self.invalid(format!("expected a number, got {}", other.describe()))),
        }
    }

    fn date(&self, value: &Value) -> Result<BindValue, ValidationError> {
        match value {
            Value::Text(s) => parse_date(s.trim())
                .map(|d| BindValue::Text(d.format("%Y-%m-%d").to_string()))
                .ok_or_else(|| self.invalid(format!("'{}' is not an ISO date", s))),
            other => Err(self.invalid(format!("expected a date string, got {}", other.describe()))),
        }
    }

    fn timestamp(&self, value: &Value) -> Result<BindValue, ValidationError> {
        match value {
            Value::Int(ms) => Ok(BindValue::Int(*ms)),
            Value::Float(x) if x.is_finite() && x.fract() == 0.0 => {
                // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
                if *x >= i64::MIN as f64 && *x < i64::MAX as f64 {
                    Ok(BindValue::Int(*x as i64))
                } else {
                    Err(self.invalid(format!("{} is out of range for epoch milliseconds", x)))
                }
            }
            Value::Text(s) => {
                let s = s.trim();
                if let Ok(ms) = s.parse::<i64>() {
                    return Ok(BindValue::Int(ms));
                }
                parse_datetime(s)
                    .map(|dt| BindValue::Int(dt.timestamp_millis()))
                    .ok_or_else(|| self.invalid(format!("'{}' is not a timestamp", s)))
            }
            other => Err(self.invalid(format!(
                "expected epoch milliseconds or a timestamp string, got {}",
                other.describe()
            ))),
        }
    }
}

const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// An ISO date, or the date part of a full timestamp.
fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(s).map(|dt| dt.date_naive()))
}

/// RFC 3339, a naive ISO-8601 datetime (read as UTC) or a bare date at midnight.
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
