//! Client side of the MCP streamable HTTP transport.
//!
//! A worker task owns the HTTP session. rmcp talks to it through a pair of
//! unbounded channels: every message rmcp sends is POSTed to the endpoint, and
//! whatever the server answers (a JSON body or an SSE stream) is pushed back as
//! incoming messages. The caller's headers are applied last on every request.

use futures::StreamExt;
use futures::channel::mpsc;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use rmcp::RoleClient;
use rmcp::service::{RxJsonRpcMessage, TxJsonRpcMessage};
use serde_json::Value;
use tokio::task::JoinHandle;
use url::Url;

use crate::error::{FetchError, Result};

const SESSION_HEADER: &str = "mcp-session-id";
const PROTOCOL_HEADER: &str = "mcp-protocol-version";
const EVENT_STREAM: &str = "text/event-stream";

/// The (sink, stream) pair handed to rmcp's `serve`.
pub type ChannelTransport = (
    mpsc::UnboundedSender<TxJsonRpcMessage<RoleClient>>,
    mpsc::UnboundedReceiver<RxJsonRpcMessage<RoleClient>>,
);

/// Starts the HTTP worker for `endpoint`.
///
/// The worker runs until rmcp drops or closes its sink, then ends the session.
/// It resolves to the first HTTP failure it hit, if any.
pub fn spawn(
    client: Client,
    endpoint: Url,
    headers: HeaderMap,
) -> (ChannelTransport, JoinHandle<Result<()>>) {
    let (outgoing_tx, outgoing_rx) = mpsc::unbounded();
    let (incoming_tx, incoming_rx) = mpsc::unbounded();

    let session = HttpSession {
        client,
        endpoint,
        headers,
        session_id: None,
        protocol_version: None,
        incoming: incoming_tx,
    };
    let worker = tokio::spawn(session.run(outgoing_rx));

    ((outgoing_tx, incoming_rx), worker)
}

struct HttpSession {
    client: Client,
    endpoint: Url,
    headers: HeaderMap,
    session_id: Option<HeaderValue>,
    protocol_version: Option<HeaderValue>,
    incoming: mpsc::UnboundedSender<RxJsonRpcMessage<RoleClient>>,
}

impl HttpSession {
    async fn run(
        mut self,
        mut outgoing: mpsc::UnboundedReceiver<TxJsonRpcMessage<RoleClient>>,
    ) -> Result<()> {
        let mut outcome = Ok(());
        while let Some(message) = outgoing.next().await {
            if let Err(err) = self.post(&message).await {
                tracing::warn!(endpoint = %self.endpoint, error = %err, "MCP request failed");
                outcome = Err(err);
                break;
            }
        }

        // rmcp sees the incoming stream end and fails any pending request.
        self.incoming.close_channel();
        self.end_session().await;
        outcome
    }

    async fn post(&mut self, message: &TxJsonRpcMessage<RoleClient>) -> Result<()> {
        let message = serde_json::to_value(message)?;
        let expects_reply = message.get("method").is_some() && message.get("id").is_some();
        let body = serde_json::to_vec(&message)?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(self.request_headers())
            .body(body)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status });
        }
        if let Some(session_id) = response.headers().get(SESSION_HEADER) {
            self.session_id = Some(session_id.clone());
        }
        if status == StatusCode::ACCEPTED || !expects_reply {
            return Ok(());
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if content_type.starts_with(EVENT_STREAM) {
            self.read_event_stream(response).await
        } else {
            let body = response.bytes().await.map_err(FetchError::Transport)?;
            let reply = serde_json::from_slice(&body)
                .map_err(|err| FetchError::Decode(err.to_string()))?;
            self.deliver(reply).map(|_| ())
        }
    }

    /// Forwards SSE events until the reply to the request has been delivered.
    async fn read_event_stream(&mut self, response: Response) -> Result<()> {
        let mut body = response.bytes_stream();
        let mut buffer = Vec::new();

        while let Some(chunk) = body.next().await {
            buffer.extend_from_slice(&chunk.map_err(FetchError::Transport)?);
            while let Some((end, consumed)) = event_boundary(&buffer) {
                let event: Vec<u8> = buffer.drain(..consumed).take(end).collect();
                let Some(data) = event_data(&String::from_utf8_lossy(&event)) else {
                    continue;
                };
                let message =
                    serde_json::from_str(&data).map_err(|err| FetchError::Decode(err.to_string()))?;
                if self.deliver(message)? {
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Hands one server message to rmcp. Returns whether it was a reply.
    fn deliver(&mut self, message: Value) -> Result<bool> {
        let is_reply = message.get("method").is_none();
        if self.protocol_version.is_none() {
            self.protocol_version = message
                .pointer("/result/protocolVersion")
                .and_then(Value::as_str)
                .and_then(|version| HeaderValue::from_str(version).ok());
        }

        let message: RxJsonRpcMessage<RoleClient> =
            serde_json::from_value(message).map_err(|err| FetchError::Decode(err.to_string()))?;
        if self.incoming.unbounded_send(message).is_err() {
            tracing::debug!("MCP client stopped listening, dropping server message");
        }
        Ok(is_reply)
    }

    async fn end_session(&self) {
        if self.session_id.is_none() {
            return;
        }
        let request = self
            .client
            .delete(self.endpoint.clone())
            .headers(self.request_headers());
        match request.send().await {
            Ok(response) => tracing::debug!(status = %response.status(), "MCP session ended"),
            Err(err) => tracing::debug!(error = %err, "failed to end MCP session"),
        }
    }

    fn request_headers(&self) -> HeaderMap {
        request_headers(
            &self.headers,
            self.session_id.as_ref(),
            self.protocol_version.as_ref(),
        )
    }
}

/// Session headers first, then the caller's map, which replaces any name it shares.
fn request_headers(
    caller: &HeaderMap,
    session_id: Option<&HeaderValue>,
    protocol_version: Option<&HeaderValue>,
) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(caller.len() + 2);
    if let Some(session_id) = session_id {
        headers.insert(SESSION_HEADER, session_id.clone());
    }
    if let Some(version) = protocol_version {
        headers.insert(PROTOCOL_HEADER, version.clone());
    }
    headers.extend(caller.clone());
    headers
}

/// Finds the blank line ending the first SSE event in `buffer`.
///
/// Returns the length of the event and the number of bytes to consume with it.
fn event_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    buffer.iter().enumerate().find_map(|(index, byte)| {
        if *byte != b'\n' {
            return None;
        }
        match &buffer[index + 1..] {
            [b'\n', ..] => Some((index, index + 2)),
            [b'\r', b'\n', ..] => Some((index, index + 3)),
            _ => None,
        }
    })
}

/// Joins the `data:` lines of one SSE event.
fn event_data(event: &str) -> Option<String> {
    let lines: Vec<&str> = event
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.strip_prefix(' ').unwrap_or(data))
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}
