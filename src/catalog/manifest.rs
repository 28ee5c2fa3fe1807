//! Data-package manifests.
//!
//! A manifest is a Frictionless-style data package: a package `name` and a
//! list of `resources`, each with a table schema. Manifests are read from
//! JSON or TOML and converted into [`TableDescriptor`]s.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{ColumnDescriptor, SemanticType, TableDescriptor};

/// Table names end up in file paths and SQL string literals.
static TABLE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

// ============================================================================
// Errors
// ============================================================================

/// Errors raised while reading or validating a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON manifest: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOML manifest: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported manifest format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("Resource with an empty name")]
    EmptyTableName,

    #[error("Invalid table name '{0}': only letters, digits, '_' and '-' are allowed")]
    InvalidTableName(String),

    #[error("Duplicate table: {0}")]
    DuplicateTable(String),

    #[error("Table '{table}' has a field with an empty name")]
    EmptyColumnName { table: String },

    #[error("Duplicate column '{column}' in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("Unknown type '{type_name}' for column '{column}' in table '{table}'")]
    UnknownType {
        table: String,
        column: String,
        type_name: String,
    },

    #[error("Primary key of table '{table}' references unknown column '{column}'")]
    UnknownPrimaryKey { table: String, column: String },
}

pub type ManifestResult<T> = Result<T, ManifestError>;

// ============================================================================
// Serialized form
// ============================================================================

/// A data package.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

/// One table of a data package.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub schema: Schema,
}

/// Table schema of a resource.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(
        default,
        rename = "primaryKey",
        alias = "primary_key",
        skip_serializing_if = "Option::is_none"
    )]
    pub primary_key: Option<PrimaryKey>,
}

/// Frictionless allows a single column name or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKey {
    Single(String),
    Composite(Vec<String>),
}

impl PrimaryKey {
    fn columns(&self) -> Vec<String> {
        match self {
            PrimaryKey::Single(name) => vec![name.clone()],
            PrimaryKey::Composite(names) => names.clone(),
        }
    }
}

/// A column of a resource schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_field_type() -> String {
    "string".to_string()
}

// ============================================================================
// Loading
// ============================================================================

impl Manifest {
    pub fn from_json_str(s: &str) -> ManifestResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_toml_str(s: &str) -> ManifestResult<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read a manifest file; the format follows the extension
    /// (`.json`, or `.toml`).
    pub fn from_path<P: AsRef<Path>>(path: P) -> ManifestResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let manifest = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&content)?,
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::from_toml_str(&content)?,
            _ => return Err(ManifestError::UnsupportedFormat(path.to_path_buf())),
        };

        tracing::debug!(
            path = %path.display(),
            package = manifest.name.as_deref().unwrap_or("-"),
            resources = manifest.resources.len(),
            "read manifest"
        );
        Ok(manifest)
    }

    /// Validate every resource and convert it into a table descriptor.
    pub fn to_tables(&self) -> ManifestResult<Vec<TableDescriptor>> {
        let mut seen = HashSet::new();
        let mut tables = Vec::with_capacity(self.resources.len());

        for resource in &self.resources {
            let table = resource.to_table(self.name.as_deref())?;
            if !seen.insert(table.name.clone()) {
                return Err(ManifestError::DuplicateTable(table.name));
            }
            tables.push(table);
        }

        Ok(tables)
    }
}

impl Resource {
    fn to_table(&self, package: Option<&str>) -> ManifestResult<TableDescriptor> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ManifestError::EmptyTableName);
        }
        if !TABLE_NAME.is_match(name) {
            return Err(ManifestError::InvalidTableName(name.to_string()));
        }

        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(self.schema.fields.len());
        for field in &self.schema.fields {
            let column = field.name.trim();
            if column.is_empty() {
                return Err(ManifestError::EmptyColumnName {
                    table: name.to_string(),
                });
            }
            if !seen.insert(column) {
                return Err(ManifestError::DuplicateColumn {
                    table: name.to_string(),
                    column: column.to_string(),
                });
            }
            let semantic_type = field.field_type.parse::<SemanticType>().map_err(|_| {
                ManifestError::UnknownType {
                    table: name.to_string(),
                    column: column.to_string(),
                    type_name: field.field_type.clone(),
                }
            })?;
            columns.push(ColumnDescriptor {
                name: column.to_string(),
                semantic_type,
                description: non_empty(field.description.as_deref()),
            });
        }

        let primary_key = self
            .schema
            .primary_key
            .as_ref()
            .map(PrimaryKey::columns)
            .unwrap_or_default();
        if let Some(missing) = primary_key.iter().find(|pk| !seen.contains(pk.as_str())) {
            return Err(ManifestError::UnknownPrimaryKey {
                table: name.to_string(),
                column: missing.clone(),
            });
        }

        // Some packages only carry a useful title.
        let description =
            non_empty(self.description.as_deref()).or_else(|| non_empty(self.title.as_deref()));

        Ok(TableDescriptor {
            name: name.to_string(),
            package: non_empty(package),
            description,
            columns,
            primary_key,
        })
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
