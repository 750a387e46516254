//! Handler trait and type erasure.
//!
//! # How handlers are stored
//!
//! The router holds handlers of *different* closure types in one
//! `HashMap<Method, Vec<Route>>`, so each handler is erased behind a
//! `dyn ErasedHandler` and shared as an `Arc`:
//!
//! ```text
//! |params: Params| json!({ "id": params["id"] })   ← user writes this
//!        ↓ router.get("/users/:id", …)
//! handler.into_boxed_handler()                      ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(f))                            ← stored as BoxedHandler
//!        ↓
//! handler.call(params)  on a blocking thread        ← one vtable dispatch
//!        ↓
//! f(params).into_reply()                            ← Reply { status, body }
//! ```
//!
//! Handlers are plain synchronous functions. They may block (a database call,
//! a file read); the connection task runs them on tokio's blocking pool.
//! State a handler needs is captured by the closure when it is registered.

use std::sync::Arc;

use crate::response::{IntoReply, Reply};

/// The merged parameter mapping handed to every handler.
///
/// Decoded JSON body fields plus path parameters (as JSON strings). Path
/// parameters are merged last, so they win on key collision.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, params: Params) -> Reply;
}

/// A type-erased handler shared across concurrent connections.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is satisfied by any function or
/// closure with the shape:
///
/// ```text
/// Fn(Params) -> impl IntoReply
/// ```
///
/// The trait is sealed so the blanket impl below is the only one.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, R> private::Sealed for F
where
    F: Fn(Params) -> R + Send + Sync + 'static,
    R: IntoReply,
{
}

impl<F, R> Handler for F
where
    F: Fn(Params) -> R + Send + Sync + 'static,
    R: IntoReply,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

struct FnHandler<F>(F);

impl<F, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Params) -> R + Send + Sync,
    R: IntoReply,
{
    fn call(&self, params: Params) -> Reply {
        (self.0)(params).into_reply()
    }
}
