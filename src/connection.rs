//! Per-connection request lifecycle.
//!
//! One connection carries exactly one request:
//!
//! ```text
//! read request ─► decode JSON ─► route ─► merge params ─► handler ─► write ─► close
//!      │               │            │                        │
//!   aborted          400          404                 panic → 500
//! ```
//!
//! Every step returns a value; the reply is picked by matching on it. The
//! stream is dropped (closed) when [`handle`] returns, whatever the outcome.

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tracing::{debug, error, info, warn};

use crate::error::RequestError;
use crate::method::Method;
use crate::request::Request;
use crate::response::Reply;
use crate::router::Router;

/// Serves the single request on `stream` and returns once the response is
/// written (or the connection turned out to be unusable).
pub(crate) async fn handle<S>(stream: S, peer: SocketAddr, router: Arc<Router>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let id = correlation_id();
    let mut stream = BufReader::new(stream);

    let mut req = match Request::read_head(&mut stream).await {
        Ok(req) => req,
        Err(e) => {
            debug!(%id, %peer, "connection aborted: {e}");
            return;
        }
    };
    info!(%id, method = %req.method, path = %req.path, %peer, "accepted request");

    let reply = match req.read_body(&mut stream).await {
        Ok(()) => respond(&id, req, &router).await,
        Err(RequestError::BadRequest(details)) => {
            warn!(%id, details, "bad request");
            Reply::bad_request(details)
        }
        Err(e) => {
            debug!(%id, "connection aborted: {e}");
            return;
        }
    };

    match reply.write_to(stream.get_mut()).await {
        Ok(()) => info!(%id, status = reply.status().code(), "response"),
        Err(e) => debug!(%id, "response write failed: {e}"),
    }
}

/// Steps 5 to 9: decode, route, merge, invoke, normalize.
async fn respond(id: &str, req: Request, router: &Router) -> Reply {
    let mut params = match req.json_body() {
        Ok(params) => params,
        Err(e) => {
            error!(%id, details = %e, "JSON parse error");
            return Reply::invalid_json(&e.to_string());
        }
    };

    // An unknown method token has no route table and can never match.
    let found = req
        .method
        .parse::<Method>()
        .ok()
        .and_then(|method| router.lookup(method, &req.path));
    let Some((handler, path_params)) = found else {
        warn!(%id, "route not found");
        return Reply::not_found();
    };

    // Path parameters go in last so they win on collision.
    for (name, value) in path_params {
        params.insert(name, Value::String(value));
    }

    // Handlers are synchronous and may block. A panic stays inside the
    // blocking task and surfaces here as a `JoinError`.
    match tokio::task::spawn_blocking(move || handler.call(params)).await {
        Ok(reply) => reply,
        Err(e) => {
            error!(%id, "handler panicked: {e}");
            Reply::internal_error()
        }
    }
}

/// Short opaque id tying together the log events of one connection.
fn correlation_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

    use super::*;
    use crate::handler::Params;
    use crate::status::Status;

    fn peer() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 40000))
    }

    /// Sends `raw`, half-closes, and returns everything the server wrote.
    async fn exchange(router: Router, raw: &str) -> String {
        let (mut client, server) = duplex(64 * 1024);
        let task = tokio::spawn(handle(server, peer(), Arc::new(router)));

        client.write_all(raw.as_bytes()).await.unwrap();
        client.shutdown().await.unwrap();

        let mut out = String::new();
        client.read_to_string(&mut out).await.unwrap();
        task.await.unwrap();
        out
    }

    fn split_response(raw: &str) -> (&str, Value) {
        let (head, body) = raw.split_once("\r\n\r\n").unwrap();
        (head, serde_json::from_str(body).unwrap())
    }

    fn users() -> Router {
        Router::new().get("/users/:id", |p: Params| json!({ "user_id": p["id"] }))
    }

    #[tokio::test]
    async fn serves_path_param_route() {
        let out = exchange(users(), "GET /users/42 HTTP/1.1\r\nHost: x\r\n\r\n").await;
        assert_eq!(
            out,
            "HTTP/1.1 200 OK\r\n\
             Content-Type: application/json\r\n\
             Content-Length: 16\r\n\
             \r\n\
             {\"user_id\":\"42\"}"
        );
    }

    #[tokio::test]
    async fn unmatched_route_is_404() {
        let out = exchange(users(), "GET /missing HTTP/1.1\r\n\r\n").await;
        let (head, body) = split_response(&out);
        assert!(head.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert_eq!(body, json!({ "error": "Not Found" }));
    }

    #[tokio::test]
    async fn unknown_method_is_404() {
        let out = exchange(users(), "BREW /users/42 HTTP/1.1\r\n\r\n").await;
        assert!(out.starts_with("HTTP/1.1 404 "));
    }

    #[tokio::test]
    async fn malformed_json_is_400_even_without_route() {
        let out = exchange(
            Router::new(),
            "POST /nowhere HTTP/1.1\r\nContent-Length: 4\r\n\r\n{bad",
        )
        .await;
        let (head, body) = split_response(&out);
        assert!(head.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert_eq!(body["error"], "Invalid JSON");
        assert!(body["details"].is_string());
    }

    #[tokio::test]
    async fn invalid_content_length_is_400() {
        let out = exchange(users(), "POST /x HTTP/1.1\r\nContent-Length: abc\r\n\r\n").await;
        let (head, body) = split_response(&out);
        assert!(head.starts_with("HTTP/1.1 400 "));
        assert_eq!(body, json!({ "error": "Bad Request", "details": "invalid content-length" }));
    }

    #[tokio::test]
    async fn path_params_override_body_fields() {
        let router = Router::new().post("/items/:id", |p: Params| Value::Object(p));
        let body = r#"{"id":"from-body","name":"widget"}"#;
        let raw = format!(
            "POST /items/7 HTTP/1.1\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );
        let out = exchange(router, &raw).await;
        let (_, body) = split_response(&out);
        assert_eq!(body, json!({ "id": "7", "name": "widget" }));
    }

    #[tokio::test]
    async fn handler_status_is_used() {
        let router = Router::new().post("/items", |_: Params| (json!({ "ok": true }), Status::CREATED));
        let out = exchange(router, "POST /items HTTP/1.1\r\n\r\n").await;
        assert!(out.starts_with("HTTP/1.1 201 Created\r\n"));
    }

    #[tokio::test]
    async fn handler_panic_is_500() {
        let router = Router::new().get("/boom", |_: Params| -> Value { panic!("boom") });
        let out = exchange(router, "GET /boom HTTP/1.1\r\n\r\n").await;
        let (head, body) = split_response(&out);
        assert!(head.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert_eq!(body, json!({ "error": "Internal Server Error" }));
    }

    #[tokio::test]
    async fn silent_close_sends_nothing() {
        assert_eq!(exchange(users(), "").await, "");
        assert_eq!(exchange(users(), "GARBAGE\r\n").await, "");
    }

    #[tokio::test]
    async fn truncated_body_sends_nothing() {
        let out = exchange(users(), "POST /x HTTP/1.1\r\nContent-Length: 50\r\n\r\n{}").await;
        assert_eq!(out, "");
    }

    #[derive(Clone, Default)]
    struct LogBuf(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// The `id=` value of the first log line containing `message`.
    fn logged_id(logs: &str, message: &str) -> Option<String> {
        let line = logs.lines().find(|l| l.contains(message))?;
        let (_, rest) = line.split_once(" id=")?;
        Some(rest.chars().take(8).collect())
    }

    #[tokio::test]
    async fn bad_request_logs_accept_and_response_with_one_id() {
        let buf = LogBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let out = exchange(users(), "POST /x HTTP/1.1\r\nContent-Length: +5\r\n\r\n{}").await;
        assert!(out.starts_with("HTTP/1.1 400 "));

        let logs = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        let accepted = logged_id(&logs, "accepted request").expect("accept event");
        let response = logged_id(&logs, "response").expect("response event");
        assert_eq!(accepted, response);
        assert!(logs.contains("method=POST"));
    }

    #[test]
    fn correlation_ids_are_short_and_fresh() {
        let a = correlation_id();
        let b = correlation_id();
        assert_eq!(a.len(), 8);
        assert_ne!(a, b);
    }
}
