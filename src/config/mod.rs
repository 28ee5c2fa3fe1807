//! Configuration module for eelhole.
//!
//! Handles manifest locations, query compilation options, page-size ceilings
//! and the server bind address.

mod settings;

pub use settings::{
    expand_env_vars, CatalogSettings, PageKind, QuerySettings, ServerSettings, Settings,
    SettingsError, DEFAULT_EXPORT_PAGE_SIZE, DEFAULT_PREVIEW_PAGE_SIZE,
};
