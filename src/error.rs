//! Error types.

/// The error type returned by tinyroute's fallible operations.
///
/// Application-level failures (404, 400, a handler's own error payload) are
/// JSON replies, not `Error`s. This type surfaces infrastructure failures:
/// binding the listener or reading its local address.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Why reading a request stopped short of a routable request.
///
/// `Closed` and `Io` end the connection without a reply; the other variants
/// are answered with a 400.
#[derive(Debug, thiserror::Error)]
pub(crate) enum RequestError {
    #[error("connection closed before a request line was received")]
    Closed,

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    BadRequest(&'static str),

    #[error("{0}")]
    InvalidJson(String),
}
