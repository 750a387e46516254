//! Outgoing JSON reply and the [`IntoReply`] conversion trait.
//!
//! A handler returns anything that implements [`IntoReply`]: a bare
//! [`serde_json::Value`] means `200 OK`, a `(value, status)` pair sets the
//! status explicitly.
//!
//! ```rust
//! use serde_json::json;
//! use tinyroute::{IntoReply, Status};
//!
//! let r = json!({ "ok": true }).into_reply();
//! assert_eq!(r.status(), Status::OK);
//!
//! let r = (json!({ "error": "missing name" }), 400u16).into_reply();
//! assert_eq!(r.status(), Status::BAD_REQUEST);
//! ```

use serde_json::{Value, json};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::status::Status;

/// A status code and the JSON value that becomes the response body.
#[derive(Clone, Debug, PartialEq)]
pub struct Reply {
    status: Status,
    body: Value,
}

impl Reply {
    pub fn new(status: impl Into<Status>, body: Value) -> Self {
        Self { status: status.into(), body }
    }

    /// `200 OK` with `body`.
    pub fn ok(body: Value) -> Self {
        Self::new(Status::OK, body)
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub(crate) fn not_found() -> Self {
        Self::new(Status::NOT_FOUND, json!({ "error": "Not Found" }))
    }

    pub(crate) fn invalid_json(details: &str) -> Self {
        Self::new(
            Status::BAD_REQUEST,
            json!({ "error": "Invalid JSON", "details": details }),
        )
    }

    pub(crate) fn bad_request(details: &str) -> Self {
        Self::new(
            Status::BAD_REQUEST,
            json!({ "error": "Bad Request", "details": details }),
        )
    }

    pub(crate) fn internal_error() -> Self {
        Self::new(
            Status::INTERNAL_SERVER_ERROR,
            json!({ "error": "Internal Server Error" }),
        )
    }

    /// Serializes the full response: status line, the two fixed headers,
    /// blank line, body. Nothing else is ever written.
    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let body = self.body.to_string();
        let mut out = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n",
            self.status,
            body.len(),
        )
        .into_bytes();
        out.extend_from_slice(body.as_bytes());
        out
    }

    pub(crate) async fn write_to<W: AsyncWrite + Unpin>(
        &self,
        writer: &mut W,
    ) -> std::io::Result<()> {
        writer.write_all(&self.to_bytes()).await?;
        writer.flush().await
    }
}

/// Conversion into a [`Reply`].
///
/// Implemented for the shapes a handler naturally produces. `Result` lets a
/// handler use `?` and still answer with its own error payload:
///
/// ```rust
/// use serde_json::{Value, json};
/// use tinyroute::{Params, Status};
///
/// fn create(params: Params) -> Result<(Value, Status), (Value, Status)> {
///     let name = params
///         .get("name")
///         .ok_or((json!({ "error": "name is required" }), Status::BAD_REQUEST))?;
///     Ok((json!({ "status": "created", "name": name }), Status::CREATED))
/// }
/// ```
pub trait IntoReply {
    fn into_reply(self) -> Reply;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Reply {
        self
    }
}

impl IntoReply for Value {
    fn into_reply(self) -> Reply {
        Reply::ok(self)
    }
}

impl IntoReply for (Value, Status) {
    fn into_reply(self) -> Reply {
        Reply::new(self.1, self.0)
    }
}

impl IntoReply for (Value, u16) {
    fn into_reply(self) -> Reply {
        Reply::new(self.1, self.0)
    }
}

impl<T: IntoReply, E: IntoReply> IntoReply for Result<T, E> {
    fn into_reply(self) -> Reply {
        match self {
            Ok(v) => v.into_reply(),
            Err(e) => e.into_reply(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_value_is_200() {
        let r = json!([1, 2, 3]).into_reply();
        assert_eq!(r.status(), Status::OK);
        assert_eq!(r.body(), &json!([1, 2, 3]));
    }

    #[test]
    fn pair_is_used_verbatim() {
        let r = (json!({ "status": "created" }), Status::CREATED).into_reply();
        assert_eq!(r.status().code(), 201);
        assert_eq!(r.body(), &json!({ "status": "created" }));

        let r = (Value::Null, 503u16).into_reply();
        assert_eq!(r.status(), Status::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn result_picks_either_side() {
        let ok: Result<Value, (Value, Status)> = Ok(json!(1));
        assert_eq!(ok.into_reply().status(), Status::OK);

        let err: Result<Value, (Value, Status)> = Err((json!("nope"), Status::CONFLICT));
        let r = err.into_reply();
        assert_eq!(r.status().code(), 409);
        assert_eq!(r.body(), &json!("nope"));
    }

    #[test]
    fn wire_layout_is_exact() {
        let bytes = Reply::not_found().to_bytes();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "HTTP/1.1 404 Not Found\r\n\
             Content-Type: application/json\r\n\
             Content-Length: 21\r\n\
             \r\n\
             {\"error\":\"Not Found\"}"
        );
    }

    #[test]
    fn content_length_counts_bytes_not_chars() {
        let r = Reply::ok(json!("héllo"));
        let text = String::from_utf8(r.to_bytes()).unwrap();
        // "héllo" in quotes is 8 bytes.
        assert!(text.contains("Content-Length: 8\r\n"));
    }

    #[test]
    fn invalid_json_payload_shape() {
        let r = Reply::invalid_json("expected value at line 1 column 1");
        assert_eq!(r.status(), Status::BAD_REQUEST);
        assert_eq!(r.body()["error"], "Invalid JSON");
        assert_eq!(r.body()["details"], "expected value at line 1 column 1");
    }

    #[tokio::test]
    async fn write_to_emits_to_bytes() {
        let reply = Reply::ok(json!({ "a": 1 }));
        let mut buf = Vec::new();
        reply.write_to(&mut buf).await.unwrap();
        assert_eq!(buf, reply.to_bytes());
    }
}
