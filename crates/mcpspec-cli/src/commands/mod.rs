use mcpspec::{ReconcileReport, ServerIdentity};
use serde::Serialize;

use crate::error::ExitStatus;

pub mod sync;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandResult {
    Synced {
        path: String,
        dry_run: bool,
        report: ReconcileReport,
        capabilities: serde_json::Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        server: Option<ServerIdentity>,
        /// Rendered YAML, only populated for dry runs.
        #[serde(skip_serializing_if = "Option::is_none")]
        document: Option<String>,
    },
}

impl CommandResult {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            CommandResult::Synced { .. } => ExitStatus::Ok,
        }
    }
}
