//! TOML-based configuration for eelhole.
//!
//! Supports a config file (eelhole.toml) with environment variable expansion
//! in paths and locations.
//!
//! Example configuration:
//! ```toml
//! [catalog]
//! manifests = ["${EELHOLE_DATA}/pudl.json", "./ferc1_xbrl.toml"]
//!
//! [query]
//! dialect = "duckdb"
//! base_location = "https://example.org/pudl/nightly"
//! file_extension = "parquet"
//! order_by_primary_key = false
//! preview_page_size = 10000
//! export_page_size = 1000000
//!
//! [server]
//! bind = "127.0.0.1:8080"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::compile::CompileOptions;
use crate::sql::Dialect;

/// Rows per page when previewing a table in the grid.
pub const DEFAULT_PREVIEW_PAGE_SIZE: u64 = 10_000;

/// Rows per page when exporting a filtered table to CSV.
pub const DEFAULT_EXPORT_PAGE_SIZE: u64 = 1_000_000;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Where the catalog comes from.
    pub catalog: CatalogSettings,

    /// Query compilation.
    pub query: QuerySettings,

    /// HTTP server.
    pub server: ServerSettings,
}

/// Catalog configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Manifest files (JSON or TOML), loaded in order.
    pub manifests: Vec<String>,
}

impl CatalogSettings {
    /// Manifest paths with environment variables expanded.
    pub fn manifest_paths(&self) -> Result<Vec<PathBuf>, SettingsError> {
        self.manifests
            .iter()
            .map(|m| expand_env_vars(m).map(PathBuf::from))
            .collect()
    }
}

/// Query compilation configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct QuerySettings {
    /// SQL dialect of the client-side engine.
    pub dialect: Dialect,

    /// Directory or URL prefix holding one data file per table
    /// (supports ${ENV_VAR} expansion).
    pub base_location: String,

    /// Data file extension.
    pub file_extension: String,

    /// Sort pages by primary key instead of engine order.
    pub order_by_primary_key: bool,

    /// Page size of an interactive preview.
    pub preview_page_size: u64,

    /// Largest page size a request may ask for (CSV export).
    pub export_page_size: u64,
}

impl Default for QuerySettings {
    fn default() -> Self {
        let options = CompileOptions::default();
        Self {
            dialect: options.dialect,
            base_location: options.base_location,
            file_extension: options.file_extension,
            order_by_primary_key: options.order_by_primary_key,
            preview_page_size: DEFAULT_PREVIEW_PAGE_SIZE,
            export_page_size: DEFAULT_EXPORT_PAGE_SIZE,
        }
    }
}

/// What a page size says about the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Preview,
    Export,
    Other,
}

impl PageKind {
    /// Log event name.
    pub fn event(&self) -> &'static str {
        match self {
            PageKind::Preview => "duckdb_preview",
            PageKind::Export => "duckdb_csv",
            PageKind::Other => "duckdb_other",
        }
    }
}

impl QuerySettings {
    /// Compiler options with the base location expanded.
    pub fn compile_options(&self) -> Result<CompileOptions, SettingsError> {
        Ok(CompileOptions::default()
            .with_dialect(self.dialect)
            .with_base_location(expand_env_vars(&self.base_location)?)
            .with_file_extension(self.file_extension.clone())
            .with_order_by_primary_key(self.order_by_primary_key))
    }

    /// Classify a requested page size.
    pub fn page_kind(&self, per_page: i64) -> PageKind {
        match u64::try_from(per_page) {
            Ok(n) if n == self.preview_page_size => PageKind::Preview,
            Ok(n) if n == self.export_page_size => PageKind::Export,
            _ => PageKind::Other,
        }
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.preview_page_size == 0 || self.export_page_size == 0 {
            return Err(SettingsError::InvalidConfig(
                "page sizes must be at least 1".to_string(),
            ));
        }
        if self.preview_page_size > self.export_page_size {
            return Err(SettingsError::InvalidConfig(format!(
                "preview_page_size ({}) exceeds export_page_size ({})",
                self.preview_page_size, self.export_page_size
            )));
        }
        if self.file_extension.trim_start_matches('.').is_empty() {
            return Err(SettingsError::InvalidConfig(
                "file_extension must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address to listen on.
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

impl Settings {
    /// Parse settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.query.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `EELHOLE_CONFIG`
    /// 2. `./eelhole.toml`
    /// 3. `~/.config/eelhole/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        // Check environment variable first
        if let Ok(path) = env::var("EELHOLE_CONFIG") {
            return Self::from_file(&path);
        }

        // Check local directory
        let local_config = PathBuf::from("eelhole.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        // Check user config directory
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("eelhole").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        // Return defaults if no config file found
        Ok(Settings::default())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.next_if_eq(&'{').is_some() {
            // ${VAR}
            while let Some(ch) = chars.next_if(|&ch| ch != '}') {
                var_name.push(ch);
            }
            chars.next(); // consume '}'
        } else {
            // $VAR (ends at non-alphanumeric/underscore)
            while let Some(ch) = chars.next_if(|&ch| ch.is_alphanumeric() || ch == '_') {
                var_name.push(ch);
            }
            if var_name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
