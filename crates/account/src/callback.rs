//! Ephemeral HTTP server that receives the token from the browser.
//!
//! Binds `127.0.0.1:0`, serves a single `/callback` route and hands the
//! first token (or the first malformed callback) to the waiting login.

use std::net::Ipv4Addr;
use std::pin::Pin;
use std::time::Duration;

use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Sleep;
use tracing::{debug, info, warn};
use voidcloud_api::constants::CONTENT_TYPE_HTML;

use crate::error::LoginError;

pub(crate) const CALLBACK_PATH: &str = "/callback";

/// How long in-flight callback responses get to finish on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

const LOGIN_SUCCESS_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <title>Login Complete</title>
  <style>
    body {
      font-family: sans-serif;
      text-align: center;
      padding-top: 50px;
    }
  </style>
  <script>
  history.replaceState(null, '', location.pathname)
  </script>
</head>
<body>
  <h2>Login Successful</h2>
  <p>You can now close this window</p>
</body>
</html>
"#;

/// Form accepted by the callback route, from the query string or body.
#[derive(Debug, Deserialize)]
struct CallbackForm {
    jwt: Option<String>,
}

#[derive(Clone)]
struct CallbackState {
    token_tx: mpsc::Sender<String>,
    error_tx: mpsc::Sender<LoginError>,
}

/// A running callback server.
///
/// Dropping it aborts the server task; [`stop`](Self::stop) shuts it down
/// gracefully and waits until the listener is closed.
pub(crate) struct CallbackServer {
    port: u16,
    token_rx: mpsc::Receiver<String>,
    error_rx: mpsc::Receiver<LoginError>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl CallbackServer {
    /// Binds the loopback listener and starts serving.
    pub(crate) async fn start() -> Result<Self, LoginError> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .map_err(LoginError::Listen)?;
        let port = listener.local_addr().map_err(LoginError::Listen)?.port();

        // Single slot each: only the first signal matters.
        let (token_tx, token_rx) = mpsc::channel(1);
        let (error_tx, error_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let router = Router::new()
            .route(CALLBACK_PATH, get(callback).post(callback))
            .with_state(CallbackState { token_tx, error_tx });

        let task = tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = served {
                warn!(error = %e, "login callback server failed");
            }
        });

        info!(port, "login callback server listening");

        Ok(Self {
            port,
            token_rx,
            error_rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub(crate) fn port(&self) -> u16 {
        self.port
    }

    /// The URL the platform login page must redirect back to.
    pub(crate) fn callback_url(&self) -> String {
        format!("http://127.0.0.1:{}{CALLBACK_PATH}", self.port)
    }

    /// Waits for the first of: a token, a callback error, the deadline.
    pub(crate) async fn wait(&mut self, deadline: Pin<&mut Sleep>) -> Result<String, LoginError> {
        tokio::select! {
            Some(jwt) = self.token_rx.recv() => Ok(jwt),
            Some(err) = self.error_rx.recv() => Err(err),
            _ = deadline => Err(LoginError::TimedOut),
        }
    }

    /// Shuts the server down and waits until the listener is gone.
    pub(crate) async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(mut task) = self.task.take() {
            if tokio::time::timeout(SHUTDOWN_GRACE, &mut task).await.is_err() {
                debug!(port = self.port, "callback server did not drain in time, aborting");
                task.abort();
                let _ = task.await;
            }
        }
        debug!(port = self.port, "login callback server stopped");
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn callback(
    State(state): State<CallbackState>,
    query: Result<Query<CallbackForm>, QueryRejection>,
    form: Result<Form<CallbackForm>, FormRejection>,
) -> Response {
    // A POST body wins over the query string.
    let from_body = form.ok().and_then(|Form(form)| form.jwt);
    let from_query = query.ok().and_then(|Query(form)| form.jwt);
    let jwt = [from_body, from_query]
        .into_iter()
        .flatten()
        .find(|jwt| !jwt.is_empty());

    match jwt {
        Some(jwt) => {
            if state.token_tx.try_send(jwt).is_err() {
                debug!("login token already received, ignoring callback");
            }
            (
                StatusCode::OK,
                [(CONTENT_TYPE, CONTENT_TYPE_HTML)],
                LOGIN_SUCCESS_PAGE,
            )
                .into_response()
        }
        None => {
            warn!("login callback without a token");
            let _ = state.error_tx.try_send(LoginError::MissingToken);
            (StatusCode::BAD_REQUEST, "Missing JWT").into_response()
        }
    }
}
