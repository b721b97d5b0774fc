//! Login for the Void Cloud command line client.
//!
//! # Handshake
//!
//! 1. **Reuse**: a token already in the keyring is validated and, if the
//!    platform accepts it, returned without any browser interaction
//! 2. **Listen**: an ephemeral callback server is bound on `127.0.0.1:0`
//! 3. **Browse**: the platform login page is opened with the callback URL
//! 4. **Wait**: first of token, callback error or timeout wins
//! 5. **Validate**: the token is checked against `account/me` and persisted

mod callback;
pub mod error;
pub mod login;
pub mod types;

pub use error::LoginError;
pub use login::{DEFAULT_LOGIN_TIMEOUT, LoginCommand, login, login_url, whoami};
pub use types::User;
