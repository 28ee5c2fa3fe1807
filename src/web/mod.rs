//! HTTP API for eelhole
//!
//! Exposes search, autocomplete and query compilation to the browser grid.

#[cfg(feature = "server")]
mod server;

#[cfg(feature = "server")]
pub use server::*;
