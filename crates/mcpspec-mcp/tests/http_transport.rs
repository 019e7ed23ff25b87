use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use mcpspec_mcp::{FetchError, FetchOptions, fetch_catalog, header_map, parse_endpoint};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

const SESSION: &str = "session-7f3a";

/// One HTTP request as the stub server saw it.
#[derive(Clone, Debug)]
struct Recorded {
    method: String,
    rpc_method: Option<String>,
    headers: HashMap<String, String>,
}

type Log = Arc<Mutex<Vec<Recorded>>>;
type Reply = fn(&str, &Value) -> String;

/// Serves plain HTTP/1.1 on a loopback port, answering each request with `reply`.
async fn spawn_stub(reply: Reply) -> std::io::Result<(String, Log)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let url = format!("http://{}/mcp", listener.local_addr()?);
    let log = Log::default();

    let recorded = Arc::clone(&log);
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let recorded = Arc::clone(&recorded);
            tokio::spawn(async move {
                let _ = serve_connection(stream, recorded, reply).await;
            });
        }
    });

    Ok((url, log))
}

async fn serve_connection(stream: TcpStream, log: Log, reply: Reply) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream);
    loop {
        let mut request_line = String::new();
        if reader.read_line(&mut request_line).await? == 0 {
            return Ok(());
        }
        let method = request_line
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string();

        let mut headers = HashMap::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).await?;
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
            }
        }

        let length = headers
            .get("content-length")
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(0);
        let mut body = vec![0; length];
        reader.read_exact(&mut body).await?;
        let message: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

        log.lock().unwrap().push(Recorded {
            method: method.clone(),
            rpc_method: message["method"].as_str().map(str::to_string),
            headers,
        });

        let response = reply(&method, &message);
        reader.get_mut().write_all(response.as_bytes()).await?;
    }
}

fn http_response(status: &str, headers: &[(&str, &str)], body: &str) -> String {
    let mut response = format!("HTTP/1.1 {status}\r\nContent-Length: {}\r\n", body.len());
    for (name, value) in headers {
        response.push_str(&format!("{name}: {value}\r\n"));
    }
    response.push_str("\r\n");
    response.push_str(body);
    response
}

/// Answers `initialize` with JSON and `tools/list` with an SSE stream.
fn mcp_reply(method: &str, message: &Value) -> String {
    if method == "DELETE" {
        return http_response("200 OK", &[], "");
    }

    let id = message["id"].clone();
    match message["method"].as_str() {
        Some("initialize") => {
            let body = json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {
                    "protocolVersion": "2025-06-18",
                    "capabilities": { "tools": { "listChanged": false } },
                    "serverInfo": { "name": "stub-http", "version": "0.3.0" }
                }
            });
            http_response(
                "200 OK",
                &[("Content-Type", "application/json"), ("Mcp-Session-Id", SESSION)],
                &body.to_string(),
            )
        }
        Some("tools/list") => {
            let body = json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {
                    "tools": [
                        { "name": "search", "description": "Search the index", "inputSchema": { "type": "object" } },
                        { "name": "echo", "description": "Echo the input back", "inputSchema": { "type": "object" } }
                    ]
                }
            });
            let events = format!(": connected\n\nevent: message\ndata: {body}\n\n");
            http_response("200 OK", &[("Content-Type", "text/event-stream")], &events)
        }
        _ => http_response("202 Accepted", &[], ""),
    }
}

fn unavailable_reply(_method: &str, _message: &Value) -> String {
    http_response("503 Service Unavailable", &[], "")
}

fn find<'a>(requests: &'a [Recorded], rpc_method: &str) -> &'a Recorded {
    requests
        .iter()
        .find(|request| request.rpc_method.as_deref() == Some(rpc_method))
        .unwrap_or_else(|| panic!("no {rpc_method} request in {requests:?}"))
}

#[tokio::test]
async fn caller_headers_reach_the_server_unchanged() -> Result<(), Box<dyn std::error::Error>> {
    let (url, log) = spawn_stub(mcp_reply).await?;
    let headers = header_map([
        "Accept: application/json",
        "Content-Type: application/json; charset=utf-8",
        "Authorization: Bearer secret",
    ])?;
    let options = FetchOptions::new(parse_endpoint(&url)?).with_headers(headers);

    let catalog = fetch_catalog(&options).await?;
    assert_eq!(catalog.tool_names(), vec!["search", "echo"]);

    let requests = log.lock().unwrap().clone();
    let initialize = find(&requests, "initialize");
    assert_eq!(initialize.headers["accept"], "application/json");
    assert_eq!(
        initialize.headers["content-type"],
        "application/json; charset=utf-8"
    );
    assert_eq!(initialize.headers["authorization"], "Bearer secret");
    assert!(!initialize.headers.contains_key("mcp-session-id"));

    let listing = find(&requests, "tools/list");
    assert_eq!(listing.headers["accept"], "application/json");
    assert_eq!(listing.headers["authorization"], "Bearer secret");
    assert_eq!(listing.headers["mcp-session-id"], SESSION);
    assert_eq!(listing.headers["mcp-protocol-version"], "2025-06-18");
    Ok(())
}

#[tokio::test]
async fn default_headers_are_sent_when_caller_supplies_none()
-> Result<(), Box<dyn std::error::Error>> {
    let (url, log) = spawn_stub(mcp_reply).await?;
    let options = FetchOptions::new(parse_endpoint(&url)?);

    let catalog = fetch_catalog(&options).await?;
    assert_eq!(catalog.tools.len(), 2);
    let server = catalog.server.expect("server identity should be reported");
    assert_eq!(server.name, "stub-http");
    assert_eq!(catalog.capabilities["tools"]["listChanged"], false);

    let requests = log.lock().unwrap().clone();
    let initialize = find(&requests, "initialize");
    assert_eq!(
        initialize.headers["accept"],
        "application/json, text/event-stream"
    );
    assert_eq!(initialize.headers["content-type"], "application/json");
    Ok(())
}

#[tokio::test]
async fn session_is_ended_after_the_fetch() -> Result<(), Box<dyn std::error::Error>> {
    let (url, log) = spawn_stub(mcp_reply).await?;

    fetch_catalog(&FetchOptions::new(parse_endpoint(&url)?)).await?;

    let requests = log.lock().unwrap().clone();
    let delete = requests
        .iter()
        .find(|request| request.method == "DELETE")
        .expect("session should be ended with DELETE");
    assert_eq!(delete.headers["mcp-session-id"], SESSION);
    Ok(())
}

#[tokio::test]
async fn error_status_fails_the_connection() -> Result<(), Box<dyn std::error::Error>> {
    let (url, _log) = spawn_stub(unavailable_reply).await?;

    let err = fetch_catalog(&FetchOptions::new(parse_endpoint(&url)?))
        .await
        .expect_err("503 should fail the handshake");

    assert!(matches!(err, FetchError::Connect(_)), "{err}");
    assert!(err.to_string().contains("503"), "{err}");
    Ok(())
}
