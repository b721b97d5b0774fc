//! Login error types.

use voidcloud_api::ApiError;
use voidcloud_system::KeyringError;

/// Errors produced by the login handshake.
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("missing server")]
    MissingServer,

    #[error("missing runtime")]
    MissingRuntime,

    #[error("missing keyring")]
    MissingKeyring,

    #[error("invalid server url {url}: {source}")]
    InvalidServer {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to start login callback server: {0}")]
    Listen(#[source] std::io::Error),

    #[error("missing jwt in callback")]
    MissingToken,

    #[error("login timed out")]
    TimedOut,

    #[error("unexpected response: {0}")]
    Request(#[from] ApiError),

    #[error("unauthorized")]
    Unauthorized,

    #[error("unexpected status code {0}")]
    UnexpectedStatus(u16),

    #[error("unexpected JSON response: {0}")]
    UnexpectedJson(#[source] serde_json::Error),

    #[error("failed to save credentials: {0}")]
    Keyring(#[from] KeyringError),
}

impl LoginError {
    /// True when nobody completed the browser login before the deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut)
    }
}
