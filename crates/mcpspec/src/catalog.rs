use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Snapshot of what a remote MCP server reported during one fetch.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCatalog {
    /// Tool descriptors in the order the server listed them.
    pub tools: Vec<Value>,
    /// Capabilities declared by the server during the initialize handshake.
    pub capabilities: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerIdentity>,
}

/// Implementation details the server reported about itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerIdentity {
    pub name: String,
    pub version: String,
    pub protocol_version: String,
}

impl ToolCatalog {
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools
            .iter()
            .filter_map(|tool| tool.get("name").and_then(Value::as_str))
            .collect()
    }
}
