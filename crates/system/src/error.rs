//! Credential storage errors.

/// Errors produced while writing to or deleting from a keyring.
#[derive(Debug, thiserror::Error)]
pub enum KeyringError {
    #[error("keyring error: {0}")]
    Backend(#[from] ::keyring::Error),
}
