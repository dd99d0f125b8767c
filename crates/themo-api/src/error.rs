use thiserror::Error;

/// Top-level error type for the `themo-api` crate.
///
/// Every failure is surfaced verbatim to the caller: the library performs
/// no retries, backoff, or rate limiting, so retry policy lives with the
/// application.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed (wrong credentials, missing token in the login
    /// response, or a 401 on any later call).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The session was closed with [`ThemoClient::close`] and can no
    /// longer issue requests.
    ///
    /// [`ThemoClient::close`]: crate::ThemoClient::close
    #[error("Session closed")]
    SessionClosed,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Vendor API ──────────────────────────────────────────────────
    /// Non-success HTTP status from the Themo API, with the response
    /// body captured as the message.
    #[error("Themo API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Schedule name not present on the device.
    #[error("Unknown schedule: {name}")]
    UnknownSchedule { name: String },
}

impl Error {
    /// Returns `true` if this error indicates auth has expired
    /// and re-authentication might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}
