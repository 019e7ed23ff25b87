//! `"Key: Value"` header arguments, turned into the `HeaderMap` sent on every
//! request to the MCP server.

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};

use crate::error::{FetchError, Result};

const SEPARATOR: &str = ": ";

/// Headers the streamable HTTP transport needs, used unless the caller supplies them.
pub const DEFAULT_HEADERS: [(HeaderName, &str); 2] = [
    (header::ACCEPT, "application/json, text/event-stream"),
    (header::CONTENT_TYPE, "application/json"),
];

/// Splits a `"Key: Value"` string on the first `": "`.
///
/// Returns `None` when the separator is missing or either side is empty.
pub fn parse_header(raw: &str) -> Option<(&str, &str)> {
    let (name, value) = raw.split_once(SEPARATOR)?;
    if name.is_empty() || value.is_empty() {
        return None;
    }
    Some((name, value))
}

/// Builds a header map from raw `"Key: Value"` strings.
///
/// Malformed entries are skipped. A later entry replaces an earlier one with the
/// same (case-insensitive) name. Names or values that cannot be sent over HTTP
/// are rejected with [`FetchError::InvalidHeader`].
pub fn header_map<I, S>(raw: I) -> Result<HeaderMap>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut headers = HeaderMap::new();
    for entry in raw {
        let entry = entry.as_ref();
        let Some((name, value)) = parse_header(entry) else {
            tracing::debug!(header = %entry, "ignoring malformed header");
            continue;
        };

        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|err| FetchError::InvalidHeader {
                name: name.to_string(),
                reason: err.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|err| FetchError::InvalidHeader {
            name: name.to_string(),
            reason: err.to_string(),
        })?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

/// Adds each of [`DEFAULT_HEADERS`] the caller has not already supplied.
pub fn with_defaults(mut headers: HeaderMap) -> HeaderMap {
    for (name, value) in DEFAULT_HEADERS {
        headers
            .entry(name)
            .or_insert(HeaderValue::from_static(value));
    }
    headers
}
