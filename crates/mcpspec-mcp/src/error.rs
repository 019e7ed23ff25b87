use reqwest::StatusCode;
use rmcp::service::ServiceError;
use thiserror::Error;

/// Failures while connecting to or reading from the remote MCP server.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid server URL `{url}`: {reason}")]
    InvalidEndpoint { url: String, reason: String },
    #[error("invalid header `{name}`: {reason}")]
    InvalidHeader { name: String, reason: String },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("HTTP request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("server responded with HTTP {status}")]
    Status { status: StatusCode },
    #[error("malformed message from server: {0}")]
    Decode(String),
    #[error("failed to connect to MCP server: {0}")]
    Connect(String),
    #[error("failed to list tools: {0}")]
    ListTools(#[source] ServiceError),
    #[error("server did not report its capabilities")]
    MissingServerInfo,
    #[error("failed to encode server response: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FetchError>;
