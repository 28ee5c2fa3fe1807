//! Dataset catalog.
//!
//! The catalog is the read-only registry of every browsable table and its
//! columns. It is built once from one or more data-package manifests and is
//! the only source of identifiers and file locations the query compiler
//! will ever emit.
//!
//! ```
//! use eelhole::catalog::{Catalog, Manifest};
//!
//! let manifest = Manifest::from_json_str(r#"{
//!     "name": "pudl",
//!     "resources": [{
//!         "name": "plants_eia",
//!         "description": "Plant-level data",
//!         "schema": { "fields": [{ "name": "capacity_mw", "type": "number" }] }
//!     }]
//! }"#).unwrap();
//!
//! let catalog = Catalog::load(&manifest).unwrap();
//! assert!(catalog.lookup_table("plants_eia").is_ok());
//! ```

pub mod manifest;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use manifest::{Manifest, ManifestError, ManifestResult};

// ============================================================================
// Types
// ============================================================================

/// How a column's values are filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum SemanticType {
    String,
    Number,
    Date,
    Timestamp,
    Categorical,
}

impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::String => "string",
            SemanticType::Number => "number",
            SemanticType::Date => "date",
            SemanticType::Timestamp => "timestamp",
            SemanticType::Categorical => "categorical",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SemanticType {
    type Err = String;

    /// Accepts the semantic names plus the Frictionless field types that map
    /// onto them.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" => Ok(SemanticType::String),
            "number" | "integer" | "year" => Ok(SemanticType::Number),
            "date" => Ok(SemanticType::Date),
            "timestamp" | "datetime" => Ok(SemanticType::Timestamp),
            "categorical" | "boolean" => Ok(SemanticType::Categorical),
            other => Err(format!("unknown field type '{}'", other)),
        }
    }
}

impl TryFrom<String> for SemanticType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A column of a browsable table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub semantic_type: SemanticType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A browsable table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDescriptor {
    pub name: String,
    /// Data package the table was loaded from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub columns: Vec<ColumnDescriptor>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,
}

impl TableDescriptor {
    /// Find a column by exact name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Lookup of a table name the catalog does not know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown table: {0}")]
pub struct UnknownTable(pub String);

// ============================================================================
// Catalog
// ============================================================================

/// Immutable registry of tables keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: BTreeMap<String, TableDescriptor>,
}

impl Catalog {
    /// Build a catalog from a single manifest.
    pub fn load(manifest: &Manifest) -> ManifestResult<Self> {
        Self::from_manifests(std::slice::from_ref(manifest))
    }

    /// Build a catalog from several manifests.
    ///
    /// Table names must be unique across all of them.
    pub fn from_manifests(manifests: &[Manifest]) -> ManifestResult<Self> {
        let mut tables = BTreeMap::new();
        for manifest in manifests {
            for table in manifest.to_tables()? {
                if tables.contains_key(&table.name) {
                    return Err(ManifestError::DuplicateTable(table.name));
                }
                tables.insert(table.name.clone(), table);
            }
        }
        Ok(Self { tables })
    }

    /// Read every manifest path and merge them.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> ManifestResult<Self> {
        let manifests = paths
            .iter()
            .map(Manifest::from_path)
            .collect::<ManifestResult<Vec<_>>>()?;
        Self::from_manifests(&manifests)
    }

    pub fn lookup_table(&self, name: &str) -> Result<&TableDescriptor, UnknownTable> {
        self.tables
            .get(name)
            .ok_or_else(|| UnknownTable(name.to_string()))
    }

    /// All tables, ordered by name.
    pub fn list_tables(&self) -> impl Iterator<Item = &TableDescriptor> {
        self.tables.values()
    }

    /// Distinct package names, ordered.
    pub fn packages(&self) -> Vec<&str> {
        let mut packages: Vec<&str> = self
            .tables
            .values()
            .filter_map(|t| t.package.as_deref())
            .collect();
        packages.sort_unstable();
        packages.dedup();
        packages
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
