use std::process::ExitCode;

use serde_json::json;

use crate::commands::CommandResult;
use crate::error::{CliError, ExitStatus};

pub enum OutputFormat {
    Text,
    Json,
}

/// Renders a `CommandResult` as human-readable text or a single JSON object and
/// converts it into the process exit code.
pub fn emit_result(result: CommandResult, format: OutputFormat) -> Result<ExitCode, CliError> {
    match format {
        OutputFormat::Text => print_text(&result)?,
        OutputFormat::Json => print_json(&result),
    };
    Ok(ExitCode::from(result.exit_status().code()))
}

fn print_text(result: &CommandResult) -> Result<(), CliError> {
    print!("{}", render_text(result)?);
    Ok(())
}

fn render_text(result: &CommandResult) -> Result<String, CliError> {
    let mut out = String::new();
    match result {
        CommandResult::Synced {
            path,
            dry_run,
            report,
            capabilities,
            server,
            document,
        } => {
            let pretty = serde_json::to_string_pretty(capabilities)
                .map_err(|err| CliError::new(err.to_string(), ExitStatus::Software))?;
            push_line(&mut out, "Server capabilities:");
            push_line(&mut out, &pretty);

            if let Some(server) = server {
                push_line(
                    &mut out,
                    &format!(
                        "Server: {} {} (protocol {})",
                        server.name, server.version, server.protocol_version
                    ),
                );
            }

            if let Some(document) = document {
                out.push_str(document);
            }

            let action = if report.created { "create" } else { "update" };
            let summary = if *dry_run {
                format!("Dry run: would {action} {path} with {} tools", report.tool_count)
            } else {
                format!("Successfully {action}d {path} with {} tools", report.tool_count)
            };
            push_line(&mut out, &summary);

            push_names(&mut out, "added", &report.added);
            push_names(&mut out, "updated", &report.updated);
            push_names(&mut out, "removed", &report.removed);
            if report.server_added {
                push_line(&mut out, "  server entry appended");
            }
        }
    }
    Ok(out)
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

fn push_names(out: &mut String, label: &str, names: &[String]) {
    if !names.is_empty() {
        push_line(out, &format!("  {label}: {}", names.join(", ")));
    }
}

fn print_json(result: &CommandResult) {
    let payload = json!(result);
    println!("{payload}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpspec::ReconcileReport;
    use serde_json::json;

    fn synced(created: bool, dry_run: bool) -> CommandResult {
        CommandResult::Synced {
            path: "openapi.yaml".to_string(),
            dry_run,
            report: ReconcileReport {
                created,
                server_added: created,
                added: vec!["search".to_string()],
                tool_count: 1,
                ..ReconcileReport::default()
            },
            capabilities: json!({ "tools": {} }),
            server: None,
            document: dry_run.then(|| "openapi: 3.1.0\n".to_string()),
        }
    }

    #[test]
    fn missing_document_reports_created() {
        let text = render_text(&synced(true, false)).unwrap();
        assert!(text.starts_with("Server capabilities:\n"), "{text}");
        assert!(text.contains("Successfully created openapi.yaml with 1 tools"), "{text}");
        assert!(text.contains("  added: search"), "{text}");
        assert!(text.contains("  server entry appended"), "{text}");
    }

    #[test]
    fn existing_document_reports_updated() {
        let text = render_text(&synced(false, false)).unwrap();
        assert!(text.contains("Successfully updated openapi.yaml with 1 tools"), "{text}");
        assert!(!text.contains("server entry appended"), "{text}");
    }

    #[test]
    fn dry_run_prints_document_and_would_wording() {
        let text = render_text(&synced(true, true)).unwrap();
        assert!(text.contains("openapi: 3.1.0\n"), "{text}");
        assert!(text.contains("Dry run: would create openapi.yaml with 1 tools"), "{text}");
        assert!(!text.contains("Successfully"), "{text}");
    }
}
