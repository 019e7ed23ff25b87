use std::path::PathBuf;
use std::time::Duration;

use clap::ArgMatches;
use mcpspec::{Reconciled, reconcile_catalog, store};
use mcpspec_mcp::{FetchOptions, HeaderMap, fetch_catalog, header_map, parse_endpoint};
use url::Url;

use crate::commands::CommandResult;
use crate::error::{CliError, ExitStatus};

/// Everything one sync pass needs, resolved from the command line before any I/O.
#[derive(Clone, Debug)]
pub struct SyncRequest {
    pub document_path: PathBuf,
    /// URL exactly as given, recorded in `servers`.
    pub server_url: String,
    pub endpoint: Url,
    /// Caller headers, malformed entries already dropped.
    pub headers: HeaderMap,
    pub settle_delay: Duration,
    pub dry_run: bool,
}

impl SyncRequest {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, CliError> {
        let document_path = matches
            .get_one::<PathBuf>("openapi-file")
            .cloned()
            .ok_or_else(|| CliError::new("missing --openapi-file", ExitStatus::Usage))?;
        let server_url = matches
            .get_one::<String>("server-url")
            .cloned()
            .ok_or_else(|| CliError::new("missing --server-url", ExitStatus::Usage))?;
        let endpoint = parse_endpoint(&server_url)?;
        let headers = header_map(matches.get_many::<String>("header").unwrap_or_default())?;
        let settle_ms = matches.get_one::<u64>("settle-ms").copied().unwrap_or(0);

        Ok(Self {
            document_path,
            server_url,
            endpoint,
            headers,
            settle_delay: Duration::from_millis(settle_ms),
            dry_run: matches.get_flag("dry-run"),
        })
    }
}

/// Fetches the server catalog, folds it into the document, and persists the result.
pub async fn run(request: &SyncRequest) -> Result<CommandResult, CliError> {
    let options = FetchOptions::new(request.endpoint.clone())
        .with_headers(request.headers.clone())
        .with_settle_delay(request.settle_delay);
    let catalog = fetch_catalog(&options).await?;

    let existing = store::load(&request.document_path)?;
    let Reconciled { document, report } =
        reconcile_catalog(existing, &request.server_url, &catalog)?;

    tracing::info!(
        path = %request.document_path.display(),
        created = report.created,
        server_added = report.server_added,
        added = ?report.added,
        updated = ?report.updated,
        removed = ?report.removed,
        "reconciled tool listing"
    );

    let rendered = if request.dry_run {
        Some(document.to_yaml()?)
    } else {
        store::save(&request.document_path, &document)?;
        None
    };

    Ok(CommandResult::Synced {
        path: request.document_path.display().to_string(),
        dry_run: request.dry_run,
        report,
        capabilities: catalog.capabilities,
        server: catalog.server,
        document: rendered,
    })
}
