//! Request router.
//!
//! One ordered route list per HTTP method, scanned linearly. The first
//! pattern that structurally matches wins; there is no specificity ranking,
//! so registration order is precedence.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::pattern::Pattern;

struct Route {
    pattern: Pattern,
    handler: BoxedHandler,
}

/// The application route table.
///
/// Build it once at startup and hand it to [`Server::serve`](crate::Server::serve),
/// which takes ownership, so no route can be added after the server starts
/// accepting. Each registration call returns `self` so they chain naturally.
pub struct Router {
    routes: HashMap<Method, Vec<Route>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Segments starting with `:` are path parameters; they reach the handler
    /// as JSON strings under the segment name:
    ///
    /// ```rust
    /// use serde_json::json;
    /// use tinyroute::{Method, Params, Router};
    ///
    /// Router::new()
    ///     .on(Method::Get, "/users/:id", |p: Params| json!({ "user_id": p["id"] }))
    ///     .on(Method::Delete, "/users/:id", |_: Params| json!(null));
    /// ```
    ///
    /// Registration never fails. Duplicate or overlapping patterns are kept;
    /// the earlier one simply shadows the later one.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        debug!(%method, path, "route registered");
        self.routes.entry(method).or_default().push(Route {
            pattern: Pattern::compile(path),
            handler: handler.into_boxed_handler(),
        });
        self
    }

    /// Shorthand for [`on`](Router::on) with [`Method::Get`].
    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Get, path, handler)
    }

    /// Shorthand for [`on`](Router::on) with [`Method::Post`].
    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Post, path, handler)
    }

    /// Number of registered routes across all methods.
    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First route for `method` whose pattern matches `path`, with the
    /// extracted path parameters.
    pub(crate) fn lookup(
        &self,
        method: Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        self.routes.get(&method)?.iter().find_map(|route| {
            let params = route.pattern.matches(path)?;
            Some((Arc::clone(&route.handler), params))
        })
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
