//! # tinyroute
//!
//! A tiny HTTP/1.1 server for internal tools: path-parameter routing, JSON
//! in, JSON out, one request per connection.
//!
//! ## What it does
//!
//! - Routes per method over an ordered list of patterns (`/users/:id`); the
//!   first match wins
//! - Decodes the request body as a JSON object and merges path parameters
//!   into it
//! - Runs a synchronous handler and writes its result as `application/json`
//! - One tokio task per connection, one request per connection, then close
//!
//! ## What it does not
//!
//! No TLS, no query-string parsing, no chunked or streaming bodies, no
//! keep-alive, no middleware. Put a proxy in front if you need those.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use serde_json::{Value, json};
//! use tinyroute::{Params, Router, Status};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tinyroute::Error> {
//!     let app = Router::new()
//!         .get("/users/:id", get_user)
//!         .post("/items", create_item);
//!
//!     tinyroute::start(3000, app).await
//! }
//!
//! fn get_user(params: Params) -> Value {
//!     json!({ "user_id": params["id"] })
//! }
//!
//! fn create_item(params: Params) -> (Value, Status) {
//!     if !params.contains_key("name") {
//!         return (json!({ "error": "name is required" }), Status::BAD_REQUEST);
//!     }
//!     (json!({ "status": "created", "item": params }), Status::CREATED)
//! }
//! ```
//!
//! ## Logging
//!
//! Every connection emits [`tracing`] events tagged with a short `id`:
//! `accepted request`, `response`, `route not found`, `JSON parse error`.
//! Install any subscriber to see them, e.g. `tracing_subscriber::fmt::init()`.

mod connection;
mod error;
mod handler;
mod method;
mod pattern;
mod request;
mod response;
mod router;
mod server;
mod status;

pub use error::Error;
pub use handler::{Handler, Params};
pub use method::{Method, UnknownMethod};
pub use pattern::PARAM_PREFIX;
pub use response::{IntoReply, Reply};
pub use router::Router;
pub use server::{Server, start};
pub use status::Status;
