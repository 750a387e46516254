//! Incoming request, parsed from the raw stream.
//!
//! Parsing is strictly sequential: request line, headers up to the blank
//! line, then exactly `content-length` body bytes. No chunked encoding, no
//! keep-alive, no query-string handling.

use std::collections::HashMap;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::error::RequestError;
use crate::handler::Params;

/// One parsed request.
#[derive(Debug)]
pub(crate) struct Request {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) headers: HashMap<String, String>,
    pub(crate) body: Vec<u8>,
}

impl Request {
    /// Reads the request line and headers from `reader`. The body is left
    /// unread until [`read_body`](Request::read_body).
    ///
    /// Returns [`RequestError::Closed`] when the peer sent nothing usable as a
    /// request line, so the caller can drop the connection silently.
    pub(crate) async fn read_head<R: AsyncBufRead + Unpin>(
        reader: &mut R,
    ) -> Result<Self, RequestError> {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Err(RequestError::Closed);
        }
        let (method, path) = parse_request_line(&line).ok_or(RequestError::Closed)?;

        let headers = read_headers(reader).await?;
        Ok(Self { method, path, headers, body: Vec::new() })
    }

    /// Reads exactly `content-length` bytes, or nothing without the header.
    pub(crate) async fn read_body<R: AsyncBufRead + Unpin>(
        &mut self,
        reader: &mut R,
    ) -> Result<(), RequestError> {
        let Some(len) = self.headers.get("content-length") else {
            return Ok(());
        };
        let len = parse_content_length(len)?;

        // Allocation follows the bytes received, not the header.
        let mut body = Vec::new();
        (&mut *reader).take(len as u64).read_to_end(&mut body).await?;
        if body.len() < len {
            return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
        }
        self.body = body;
        Ok(())
    }

    /// Decodes the body as a JSON object. An empty body is an empty mapping.
    pub(crate) fn json_body(&self) -> Result<Params, RequestError> {
        if self.body.is_empty() {
            return Ok(Params::new());
        }
        match serde_json::from_slice(&self.body) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(other) => Err(RequestError::InvalidJson(format!(
                "expected a JSON object, got {}",
                kind(&other)
            ))),
            Err(e) => Err(RequestError::InvalidJson(e.to_string())),
        }
    }

    #[cfg(test)]
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Method and path are the first two whitespace-separated tokens. The
/// version token, if any, is ignored.
fn parse_request_line(line: &str) -> Option<(String, String)> {
    let mut parts = line.split_whitespace();
    let method = parts.next()?;
    let path = parts.next()?;
    Some((method.to_owned(), path.to_owned()))
}

/// Only ASCII digits, surrounded by optional whitespace. `+5` and `-1` are
/// rejected.
fn parse_content_length(raw: &str) -> Result<usize, RequestError> {
    let digits = raw.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RequestError::BadRequest("invalid content-length"));
    }
    digits
        .parse()
        .map_err(|_| RequestError::BadRequest("invalid content-length"))
}

/// Reads header lines until a blank line or end of stream.
///
/// Keys are lower-cased and a repeated key overwrites the earlier value.
/// Lines without `": "` are skipped. Header bytes need not be UTF-8
/// (obs-text); invalid sequences are replaced.
async fn read_headers<R: AsyncBufRead + Unpin>(
    reader: &mut R,
) -> Result<HashMap<String, String>, RequestError> {
    let mut headers = HashMap::new();
    let mut raw = Vec::new();
    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw).await? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&raw);
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(": ") {
            headers.insert(key.to_ascii_lowercase(), value.to_owned());
        }
    }
    Ok(headers)
}

fn kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
