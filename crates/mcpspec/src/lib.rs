//! Core library for `mcpspec`: the YAML spec document, its file store, and the
//! by-name reconcile of fetched MCP tool listings.

pub mod catalog;
pub mod document;
pub mod error;
pub mod reconcile;
pub mod store;

pub use catalog::{ServerIdentity, ToolCatalog};
pub use document::{EXTENSION_KEY, SpecDocument};
pub use error::McpSpecError;
pub use reconcile::{
    LOCAL_TOOL_FIELDS, ReconcileReport, Reconciled, reconcile, reconcile_catalog,
};
