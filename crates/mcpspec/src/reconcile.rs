//! Merges a fetched tool listing into a [`SpecDocument`].
//!
//! The merge is fetch-driven: the new tool list is exactly the fetched list,
//! with the locally curated fields of same-named prior entries carried over.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::catalog::ToolCatalog;
use crate::document::{
    CAPABILITIES_KEY, SpecDocument, TOOLS_KEY, kind_of, section_mut, sequence_mut, tool_name,
};
use crate::error::McpSpecError;

/// Tool fields owned by the document rather than the remote server.
pub const LOCAL_TOOL_FIELDS: [&str; 2] = ["tags", "security"];

/// Outcome of a reconcile pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Reconciled {
    pub document: SpecDocument,
    pub report: ReconcileReport,
}

/// Summary of what a reconcile pass changed, for console output and logs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// No prior document existed and the default skeleton was used.
    pub created: bool,
    pub server_added: bool,
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
    pub tool_count: usize,
}

pub fn reconcile_catalog(
    existing: Option<SpecDocument>,
    server_url: &str,
    catalog: &ToolCatalog,
) -> Result<Reconciled, McpSpecError> {
    reconcile(existing, server_url, &catalog.tools, &catalog.capabilities)
}

/// Folds `fetched_tools` and `fetched_capabilities` into `existing`, or into a
/// fresh skeleton when there is no prior document.
pub fn reconcile(
    existing: Option<SpecDocument>,
    server_url: &str,
    fetched_tools: &[serde_json::Value],
    fetched_capabilities: &serde_json::Value,
) -> Result<Reconciled, McpSpecError> {
    let fetched = fetched_tools
        .iter()
        .enumerate()
        .map(|(index, tool)| FetchedTool::from_json(index, tool))
        .collect::<Result<Vec<_>, _>>()?;
    let capabilities = serde_yaml::to_value(fetched_capabilities)?;

    let created = existing.is_none();
    let mut document = existing.unwrap_or_else(SpecDocument::skeleton);
    let server_added = document.ensure_server(server_url)?;

    let extension = document.extension_mut()?;
    let tools_slot = section_mut(extension, TOOLS_KEY, || Value::Sequence(Vec::new()));
    let prior = std::mem::take(sequence_mut(tools_slot, TOOLS_KEY)?);

    let prior_by_name: HashMap<&str, &Mapping> = prior
        .iter()
        .filter_map(Value::as_mapping)
        .filter_map(|tool| tool_name(tool).map(|name| (name, tool)))
        .collect();

    let mut report = ReconcileReport {
        created,
        server_added,
        ..ReconcileReport::default()
    };
    let mut merged: Vec<Mapping> = Vec::with_capacity(fetched.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for tool in fetched {
        let previous = prior_by_name.get(tool.name.as_str()).copied();
        let entry = enrich(tool.fields, previous);

        if let Some(&index) = positions.get(&tool.name) {
            merged[index] = entry;
            continue;
        }

        if previous.is_some() {
            report.updated.push(tool.name.clone());
        } else {
            report.added.push(tool.name.clone());
        }
        positions.insert(tool.name, merged.len());
        merged.push(entry);
    }

    let mut seen_removed = HashSet::new();
    for name in prior
        .iter()
        .filter_map(Value::as_mapping)
        .filter_map(tool_name)
    {
        if !positions.contains_key(name) && seen_removed.insert(name) {
            report.removed.push(name.to_string());
        }
    }
    report.tool_count = merged.len();

    extension.insert(
        Value::from(TOOLS_KEY),
        Value::Sequence(merged.into_iter().map(Value::Mapping).collect()),
    );
    extension.insert(Value::from(CAPABILITIES_KEY), capabilities);

    Ok(Reconciled { document, report })
}

struct FetchedTool {
    name: String,
    fields: Mapping,
}

impl FetchedTool {
    fn from_json(index: usize, tool: &serde_json::Value) -> Result<Self, McpSpecError> {
        let fields = match serde_yaml::to_value(tool)? {
            Value::Mapping(fields) => fields,
            other => {
                return Err(McpSpecError::Document(format!(
                    "fetched tool #{index} must be an object, found {}",
                    kind_of(&other)
                )));
            }
        };

        let name = tool_name(&fields)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| McpSpecError::Document(format!("fetched tool #{index} has no name")))?
            .to_string();

        Ok(Self { name, fields })
    }
}

/// Remote fields win; `tags`/`security` come from `previous` exactly as stored.
fn enrich(fields: Mapping, previous: Option<&Mapping>) -> Mapping {
    let mut entry: Mapping = fields
        .into_iter()
        .filter(|(key, _)| {
            !key
                .as_str()
                .is_some_and(|key| LOCAL_TOOL_FIELDS.contains(&key))
        })
        .collect();

    if let Some(previous) = previous {
        for field in LOCAL_TOOL_FIELDS {
            if let Some(value) = previous.get(field) {
                entry.insert(Value::from(field), value.clone());
            }
        }
    }
    entry
}
