use std::fmt;

use thiserror::Error;

/// Errors raised while loading, reconciling, or persisting a spec document.
#[derive(Debug, Error)]
pub enum McpSpecError {
    #[error("document error: {0}")]
    Document(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_yaml::Error> for McpSpecError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for McpSpecError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl McpSpecError {
    pub fn context<T: fmt::Display>(self, ctx: T) -> Self {
        match self {
            McpSpecError::Document(msg) => McpSpecError::Document(format!("{ctx}: {msg}")),
            McpSpecError::Serialization(msg) => {
                McpSpecError::Serialization(format!("{ctx}: {msg}"))
            }
            McpSpecError::Io(err) => {
                McpSpecError::Io(std::io::Error::new(err.kind(), format!("{ctx}: {err}")))
            }
        }
    }
}
