//! The login command.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;
use voidcloud_api::constants::{PARAM_CLI, PARAM_JWT, PARAM_ORIGIN};
use voidcloud_api::StatusCode;
use voidcloud_api::{Client, Transport};
use voidcloud_system::{Keyring, Runtime};

use crate::callback::CallbackServer;
use crate::error::LoginError;
use crate::types::User;

/// How long the user has to finish logging in through the browser.
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(2 * 60);

/// Route that reports the identity behind a token.
const ME_ROUTE: &str = "account/me";

/// Everything a login needs.
#[derive(Clone, Default)]
pub struct LoginCommand {
    /// Platform endpoint, e.g. `https://play.void.dev/`.
    pub server: String,
    pub runtime: Option<Arc<dyn Runtime>>,
    pub keyring: Option<Arc<dyn Keyring>>,
    /// `None` (or zero) means [`DEFAULT_LOGIN_TIMEOUT`].
    pub timeout: Option<Duration>,
}

impl LoginCommand {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            ..Self::default()
        }
    }

    pub fn with_runtime(mut self, runtime: Arc<dyn Runtime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn with_keyring(mut self, keyring: Arc<dyn Keyring>) -> Self {
        self.keyring = Some(keyring);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Logs in, returning the platform identity.
///
/// A token already in the keyring is reused if the platform still accepts
/// it; otherwise it is deleted and the browser handshake runs. On success
/// the validated token is stored under [`PARAM_JWT`].
pub async fn login(cmd: &LoginCommand) -> Result<User, LoginError> {
    if cmd.server.is_empty() {
        return Err(LoginError::MissingServer);
    }
    let runtime = cmd.runtime.as_deref().ok_or(LoginError::MissingRuntime)?;
    let keyring = cmd.keyring.as_deref().ok_or(LoginError::MissingKeyring)?;
    let endpoint = Url::parse(&cmd.server).map_err(|source| LoginError::InvalidServer {
        url: cmd.server.clone(),
        source,
    })?;
    let timeout = cmd
        .timeout
        .filter(|t| !t.is_zero())
        .unwrap_or(DEFAULT_LOGIN_TIMEOUT);

    if let Some(jwt) = keyring.get(PARAM_JWT) {
        match validate(&cmd.server, &jwt).await {
            Ok(user) => {
                info!(user = user.id, "stored token accepted");
                return Ok(user);
            }
            Err(e) => {
                warn!(error = %e, "stored token rejected, logging in again");
                if let Err(e) = keyring.del(PARAM_JWT) {
                    warn!(error = %e, "failed to delete stored token");
                }
            }
        }
    }

    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    let mut server = CallbackServer::start().await?;

    let url = login_url(&endpoint, &server.callback_url());
    debug!(%url, "launching browser login");
    runtime.open(&url);

    let outcome = server.wait(deadline.as_mut()).await;
    server.stop().await;
    let jwt = outcome?;

    let user = validate(&cmd.server, &jwt).await?;
    keyring.set(PARAM_JWT, &jwt)?;

    info!(user = user.id, "logged in");
    Ok(user)
}

/// The platform login page URL that redirects back to `callback`.
pub fn login_url(endpoint: &Url, callback: &str) -> String {
    let mut url = endpoint.clone();
    url.set_path("login");
    url.set_fragment(None);
    url.query_pairs_mut()
        .clear()
        .append_pair(PARAM_CLI, "true")
        .append_pair(PARAM_ORIGIN, callback);
    url.into()
}

/// Asks the platform who the transport's token belongs to.
pub async fn whoami(transport: &dyn Transport) -> Result<User, LoginError> {
    let resp = transport.get(ME_ROUTE).await?;

    match resp.status {
        StatusCode::OK => {}
        StatusCode::UNAUTHORIZED => return Err(LoginError::Unauthorized),
        status => return Err(LoginError::UnexpectedStatus(status.as_u16())),
    }

    resp.json::<User>().map_err(LoginError::UnexpectedJson)
}

async fn validate(server: &str, jwt: &str) -> Result<User, LoginError> {
    let client = Client::new(server, jwt)?;
    whoami(&client).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use voidcloud_api::{ApiError, Response, ResponseFuture};

    /// Transport that answers every GET with a canned response.
    struct CannedTransport {
        status: StatusCode,
        body: &'static str,
    }

    impl Transport for CannedTransport {
        fn get(&self, route: &str) -> ResponseFuture<'_> {
            assert_eq!(route, ME_ROUTE);
            let resp = Response::new(self.status, self.body);
            Box::pin(async move { Ok(resp) })
        }

        fn post(&self, _route: &str, _body: Vec<u8>) -> ResponseFuture<'_> {
            unreachable!("login never posts")
        }

        fn post_json(&self, _route: &str, _body: &serde_json::Value) -> ResponseFuture<'_> {
            unreachable!("login never posts")
        }

        fn post_file(&self, _route: &str, _path: &Path, _len: u64) -> ResponseFuture<'_> {
            unreachable!("login never uploads")
        }
    }

    /// Transport whose requests never reach a server.
    struct BrokenTransport;

    impl Transport for BrokenTransport {
        fn get(&self, _route: &str) -> ResponseFuture<'_> {
            Box::pin(async {
                Err(ApiError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                )))
            })
        }

        fn post(&self, _route: &str, _body: Vec<u8>) -> ResponseFuture<'_> {
            self.get("")
        }

        fn post_json(&self, _route: &str, _body: &serde_json::Value) -> ResponseFuture<'_> {
            self.get("")
        }

        fn post_file(&self, _route: &str, _path: &Path, _len: u64) -> ResponseFuture<'_> {
            self.get("")
        }
    }

    #[tokio::test]
    async fn whoami_ok() {
        let transport = CannedTransport {
            status: StatusCode::OK,
            body: r#"{"id":100,"name":"Jake"}"#,
        };
        let user = whoami(&transport).await.unwrap();
        assert_eq!(user.id, 100);
        assert_eq!(user.name, "Jake");
    }

    #[tokio::test]
    async fn whoami_unauthorized() {
        let transport = CannedTransport {
            status: StatusCode::UNAUTHORIZED,
            body: "",
        };
        let err = whoami(&transport).await.unwrap_err();
        assert_eq!(err.to_string(), "unauthorized");
    }

    #[tokio::test]
    async fn whoami_unexpected_status() {
        let transport = CannedTransport {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom",
        };
        let err = whoami(&transport).await.unwrap_err();
        assert_eq!(err.to_string(), "unexpected status code 500");
    }

    #[tokio::test]
    async fn whoami_invalid_json() {
        let transport = CannedTransport {
            status: StatusCode::OK,
            body: "invalid JSON",
        };
        let err = whoami(&transport).await.unwrap_err();
        assert!(matches!(err, LoginError::UnexpectedJson(_)));
        assert!(err.to_string().starts_with("unexpected JSON response: "));
    }

    #[tokio::test]
    async fn whoami_transport_error() {
        let err = whoami(&BrokenTransport).await.unwrap_err();
        assert!(matches!(err, LoginError::Request(_)));
        assert!(err.to_string().starts_with("unexpected response: "));
    }

    #[test]
    fn login_url_carries_callback() {
        let endpoint = Url::parse("https://test.void.dev/").unwrap();
        let url = login_url(&endpoint, "http://127.0.0.1:4321/callback");
        assert_eq!(
            url,
            "https://test.void.dev/login?cli=true&origin=http%3A%2F%2F127.0.0.1%3A4321%2Fcallback"
        );
    }

    #[test]
    fn login_url_replaces_path_and_query() {
        let endpoint = Url::parse("https://test.void.dev/app/?x=1#frag").unwrap();
        let url = login_url(&endpoint, "http://127.0.0.1:1/callback");
        assert_eq!(
            url,
            "https://test.void.dev/login?cli=true&origin=http%3A%2F%2F127.0.0.1%3A1%2Fcallback"
        );
    }

    #[test]
    fn builder_sets_fields() {
        let cmd = LoginCommand::new("https://test.void.dev/")
            .with_keyring(Arc::new(voidcloud_system::MemoryKeyring::new()))
            .with_timeout(Duration::from_secs(5));
        assert_eq!(cmd.server, "https://test.void.dev/");
        assert!(cmd.keyring.is_some());
        assert!(cmd.runtime.is_none());
        assert_eq!(cmd.timeout, Some(Duration::from_secs(5)));
    }
}
