use std::time::Duration;

use mcpspec::{ServerIdentity, ToolCatalog};
use reqwest::header::HeaderMap;
use rmcp::service::RunningService;
use rmcp::transport::IntoTransport;
use rmcp::{RoleClient, ServiceExt};
use url::Url;

use crate::error::{FetchError, Result};
use crate::headers::with_defaults;
use crate::transport;

/// Connection settings for one fetch.
#[derive(Clone, Debug)]
pub struct FetchOptions {
    pub endpoint: Url,
    /// Headers sent on every request, defaults included.
    pub headers: HeaderMap,
    /// Fixed wait after the handshake completes and before the first read.
    pub settle_delay: Duration,
}

impl FetchOptions {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            headers: with_defaults(HeaderMap::new()),
            settle_delay: Duration::ZERO,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = with_defaults(headers);
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}

/// Parses an absolute `http` or `https` endpoint URL.
pub fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|err| FetchError::InvalidEndpoint {
        url: raw.to_string(),
        reason: err.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::InvalidEndpoint {
            url: raw.to_string(),
            reason: format!("unsupported scheme `{other}`, expected http or https"),
        }),
    }
}

/// Builds the HTTP client used by the streamable HTTP transport.
pub fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .build()
        .map_err(FetchError::HttpClient)
}

/// Connects to `options.endpoint` over streamable HTTP and reads its catalog.
///
/// When the HTTP session itself failed, that failure is reported instead of
/// the closed-connection error rmcp observes as a consequence.
pub async fn fetch_catalog(options: &FetchOptions) -> Result<ToolCatalog> {
    let client = build_http_client()?;
    let (channel, worker) =
        transport::spawn(client, options.endpoint.clone(), options.headers.clone());

    tracing::info!(endpoint = %options.endpoint, "connecting to MCP server");
    let result = fetch_with_transport(channel, options.settle_delay).await;

    let session = match worker.await {
        Ok(session) => session,
        Err(err) => {
            tracing::warn!(error = %err, "HTTP transport task did not finish");
            Ok(())
        }
    };

    match (result, session) {
        (Err(FetchError::Connect(_)), Err(cause)) => Err(FetchError::Connect(cause.to_string())),
        (Err(_), Err(cause)) => Err(cause),
        (result, _) => result,
    }
}

/// Runs the handshake over `transport`, reads the tool listing and the server
/// capabilities, then closes the connection whether or not the reads succeeded.
pub async fn fetch_with_transport<T, E, A>(
    transport: T,
    settle_delay: Duration,
) -> Result<ToolCatalog>
where
    T: IntoTransport<RoleClient, E, A>,
    E: std::error::Error + Send + Sync + 'static,
{
    let service = ()
        .serve(transport)
        .await
        .map_err(|err| FetchError::Connect(err.to_string()))?;
    tracing::debug!("MCP handshake complete");

    if !settle_delay.is_zero() {
        tracing::debug!(delay_ms = settle_delay.as_millis() as u64, "waiting before first read");
        tokio::time::sleep(settle_delay).await;
    }

    let result = read_catalog(&service).await;

    match service.cancel().await {
        Ok(reason) => tracing::debug!(?reason, "MCP connection closed"),
        Err(err) => tracing::warn!(error = %err, "failed to close MCP connection cleanly"),
    }

    result
}

async fn read_catalog(service: &RunningService<RoleClient, ()>) -> Result<ToolCatalog> {
    let info = service.peer_info().ok_or(FetchError::MissingServerInfo)?;
    let capabilities = serde_json::to_value(&info.capabilities)?;
    let protocol_version = serde_json::to_value(&info.protocol_version)?
        .as_str()
        .unwrap_or_default()
        .to_string();
    let server = ServerIdentity {
        name: info.server_info.name.clone(),
        version: info.server_info.version.clone(),
        protocol_version,
    };

    let listed = service
        .list_all_tools()
        .await
        .map_err(FetchError::ListTools)?;
    let tools = listed
        .iter()
        .map(serde_json::to_value)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    tracing::info!(
        server = %server.name,
        version = %server.version,
        tools = tools.len(),
        "fetched tool catalog"
    );

    Ok(ToolCatalog {
        tools,
        capabilities,
        server: Some(server),
    })
}
