//! MCP client side of `mcpspec`: connects to a server over streamable HTTP and
//! reads its tool listing and declared capabilities.

mod client;
mod error;
pub mod headers;
pub mod transport;

pub use crate::client::{
    FetchOptions, build_http_client, fetch_catalog, fetch_with_transport, parse_endpoint,
};
pub use crate::error::{FetchError, Result};
pub use crate::headers::{DEFAULT_HEADERS, header_map, parse_header, with_defaults};
pub use reqwest::StatusCode;
pub use reqwest::header::HeaderMap;
