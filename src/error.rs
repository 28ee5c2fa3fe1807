//! Crate-level error type.
//!
//! Each module owns its own error enum; [`Error`] gathers them for callers
//! that cross module boundaries (the CLI and the HTTP layer) and maps each to
//! a stable [`ErrorKind`] string.

use serde::Serialize;

use crate::catalog::{ManifestError, UnknownTable};
use crate::compile::CompileError;
use crate::config::SettingsError;
use crate::filter::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    UnknownTable(#[from] UnknownTable),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<CompileError> for Error {
    fn from(err: CompileError) -> Self {
        match err {
            CompileError::UnknownTable(e) => Error::UnknownTable(e),
            CompileError::Validation(e) => Error::Validation(e),
            CompileError::Internal(msg) => Error::Internal(msg),
        }
    }
}

/// Stable classification of an [`Error`] for clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    #[serde(rename = "manifest_error")]
    Manifest,
    #[serde(rename = "configuration_error")]
    Configuration,
    UnknownTable,
    #[serde(rename = "validation_error")]
    Validation,
    #[serde(rename = "internal_error")]
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Manifest => "manifest_error",
            ErrorKind::Configuration => "configuration_error",
            ErrorKind::UnknownTable => "unknown_table",
            ErrorKind::Validation => "validation_error",
            ErrorKind::Internal => "internal_error",
        }
    }

    /// Whether the caller, rather than the service, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ErrorKind::UnknownTable | ErrorKind::Validation)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Manifest(_) => ErrorKind::Manifest,
            Error::Settings(_) => ErrorKind::Configuration,
            Error::UnknownTable(_) => ErrorKind::UnknownTable,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Serializable `{kind, message}` body.
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// Error payload returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}
