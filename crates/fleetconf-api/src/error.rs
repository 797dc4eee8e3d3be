// ── Transport error types ──
//
// Everything that can go wrong between us and a remote builder endpoint.
// Domain-level meaning (which builder, what to tell the device) is added
// by `fleetconf-core`.

use thiserror::Error;

/// Errors raised by [`BuilderClient`](crate::BuilderClient).
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP request could not be sent or the connection failed.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint URL could not be parsed or joined.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The auth token is not a valid header value.
    #[error("invalid auth token: {message}")]
    InvalidToken { message: String },

    /// The builder answered with a non-success status.
    #[error("builder returned HTTP {status}: {message}")]
    Builder { status: u16, message: String },

    /// The builder answered 2xx but the body was not a valid `BuildResponse`.
    #[error("failed to decode builder response: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Whether the failure was a client-side request timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }
}
