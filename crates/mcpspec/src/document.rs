use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::McpSpecError;

/// Top-level key holding the MCP extension block.
pub const EXTENSION_KEY: &str = "x-mcp";
pub const SERVERS_KEY: &str = "servers";
pub const TOOLS_KEY: &str = "tools";
pub const CAPABILITIES_KEY: &str = "capabilities";

/// Document format version written into synthesized skeletons.
pub const OPENAPI_VERSION: &str = "3.1.0";

/// OpenAPI-style document describing an MCP server and its tools.
///
/// The document is kept as an ordered YAML mapping so keys the tool does not
/// manage survive a load/save cycle untouched and in their original order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecDocument {
    root: Mapping,
}

impl SpecDocument {
    /// Default document used when no file exists yet.
    pub fn skeleton() -> Self {
        let info = mapping([
            ("title", Value::from("Example MCP API")),
            (
                "description",
                Value::from("API specification generated from MCP server tool listings"),
            ),
            ("version", Value::from("1.0.0")),
            ("termsOfService", Value::from("https://example.com/terms/")),
            (
                "contact",
                mapping([
                    ("name", Value::from("API Support")),
                    ("url", Value::from("https://www.example.com/support")),
                    ("email", Value::from("support@example.com")),
                ]),
            ),
        ]);

        let root = [
            ("openapi", Value::from(OPENAPI_VERSION)),
            ("info", info),
            ("paths", Value::Mapping(Mapping::new())),
            (
                "components",
                mapping([("securitySchemes", Value::Mapping(Mapping::new()))]),
            ),
            ("security", Value::Sequence(Vec::new())),
        ]
        .into_iter()
        .map(|(key, value)| (Value::from(key), value))
        .collect();

        Self { root }
    }

    /// Wraps a parsed YAML value. `null` (an empty file) becomes an empty document.
    pub fn from_value(value: Value) -> Result<Self, McpSpecError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Mapping(root) => Ok(Self { root }),
            other => Err(McpSpecError::Document(format!(
                "top level must be a mapping, found {}",
                kind_of(&other)
            ))),
        }
    }

    pub fn parse(text: &str) -> Result<Self, McpSpecError> {
        let value: Value = serde_yaml::from_str(text)
            .map_err(|err| McpSpecError::Document(format!("invalid YAML: {err}")))?;
        Self::from_value(value)
    }

    pub fn to_yaml(&self) -> Result<String, McpSpecError> {
        Ok(serde_yaml::to_string(&self.root)?)
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.root
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    pub fn title(&self) -> Option<&str> {
        self.root.get("info")?.get("title")?.as_str()
    }

    pub fn info_version(&self) -> Option<&str> {
        self.root.get("info")?.get("version")?.as_str()
    }

    /// URLs of the `servers` entries, in document order.
    pub fn server_urls(&self) -> Vec<&str> {
        self.root
            .get(SERVERS_KEY)
            .and_then(Value::as_sequence)
            .map(|servers| {
                servers
                    .iter()
                    .filter_map(|server| server.get("url").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn extension(&self) -> Option<&Mapping> {
        self.root.get(EXTENSION_KEY).and_then(Value::as_mapping)
    }

    pub fn tools(&self) -> &[Value] {
        self.extension()
            .and_then(|ext| ext.get(TOOLS_KEY))
            .and_then(Value::as_sequence)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn tool(&self, name: &str) -> Option<&Mapping> {
        self.tools()
            .iter()
            .filter_map(Value::as_mapping)
            .find(|tool| tool_name(tool) == Some(name))
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools()
            .iter()
            .filter_map(Value::as_mapping)
            .filter_map(tool_name)
            .collect()
    }

    pub fn capabilities(&self) -> Option<&Value> {
        self.extension()?.get(CAPABILITIES_KEY)
    }

    /// Appends `{url}` to `servers` unless an entry already carries that URL.
    ///
    /// Returns `true` when the entry was appended.
    pub fn ensure_server(&mut self, url: &str) -> Result<bool, McpSpecError> {
        let servers = sequence_mut(
            section_mut(&mut self.root, SERVERS_KEY, || Value::Sequence(Vec::new())),
            SERVERS_KEY,
        )?;

        let known = servers
            .iter()
            .any(|server| server.get("url").and_then(Value::as_str) == Some(url));
        if known {
            return Ok(false);
        }

        servers.push(mapping([("url", Value::from(url))]));
        Ok(true)
    }

    /// Returns the extension block, creating an empty one when absent.
    pub fn extension_mut(&mut self) -> Result<&mut Mapping, McpSpecError> {
        match section_mut(&mut self.root, EXTENSION_KEY, || {
            Value::Mapping(Mapping::new())
        }) {
            Value::Mapping(ext) => Ok(ext),
            other => Err(McpSpecError::Document(format!(
                "`{EXTENSION_KEY}` must be a mapping, found {}",
                kind_of(other)
            ))),
        }
    }
}

/// Reads the `name` of a tool entry.
pub fn tool_name(tool: &Mapping) -> Option<&str> {
    tool.get("name").and_then(Value::as_str)
}

/// Returns the value under `key`, replacing a missing or `null` entry with `default()`.
pub(crate) fn section_mut<'a>(
    map: &'a mut Mapping,
    key: &str,
    default: impl FnOnce() -> Value,
) -> &'a mut Value {
    let slot = map.entry(Value::from(key)).or_insert(Value::Null);
    if slot.is_null() {
        *slot = default();
    }
    slot
}

pub(crate) fn sequence_mut<'a>(
    value: &'a mut Value,
    label: &str,
) -> Result<&'a mut Vec<Value>, McpSpecError> {
    match value {
        Value::Sequence(seq) => Ok(seq),
        other => Err(McpSpecError::Document(format!(
            "`{label}` must be a sequence, found {}",
            kind_of(other)
        ))),
    }
}

pub(crate) fn mapping<const N: usize>(entries: [(&str, Value); N]) -> Value {
    Value::Mapping(
        entries
            .into_iter()
            .map(|(key, value)| (Value::from(key), value))
            .collect(),
    )
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
