//! End-to-end deploys against an in-process platform.

use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path as RoutePath, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use tempfile::TempDir;
use tokio::net::TcpListener;
use voidcloud_api::Client;
use voidcloud_api::constants::HEADER_X_DEPLOY_ID;
use voidcloud_crypto::blake3_str;
use voidcloud_share::{DeployCommand, DeployEntry, DeployError, deploy};

const TEST_TOKEN: &str = "personal-access-token";
const TEST_DEPLOY_URL: &str = "https://test.void.dev/void/snakes/latest";

const FIRST: (&str, &str) = ("path/to/first.txt", "first");
const SECOND: (&str, &str) = ("path/to/second.txt", "second");
const THIRD: (&str, &str) = ("path/to/third.txt", "third");

/// Which of the submitted entries the platform claims to be missing.
#[derive(Clone, Copy)]
enum Wants {
    All,
    Last,
}

#[derive(Clone)]
struct Platform {
    wants: Wants,
    manifests: Arc<Mutex<Vec<Vec<DeployEntry>>>>,
    uploads: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    activated: Arc<Mutex<bool>>,
}

impl Platform {
    fn new(wants: Wants) -> Self {
        Self {
            wants,
            manifests: Arc::default(),
            uploads: Arc::default(),
            activated: Arc::default(),
        }
    }

    fn uploaded_paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = self
            .uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.clone())
            .collect();
        paths.sort();
        paths
    }
}

fn assert_bearer(headers: &HeaderMap) {
    assert_eq!(
        headers["authorization"].to_str().unwrap(),
        format!("Bearer {TEST_TOKEN}")
    );
}

async fn start(
    State(platform): State<Platform>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    assert_bearer(&headers);
    let manifest: Vec<DeployEntry> = serde_json::from_slice(&body).unwrap();
    platform.manifests.lock().unwrap().push(manifest.clone());

    let incremental = match platform.wants {
        Wants::All => manifest,
        Wants::Last => manifest.into_iter().last().into_iter().collect(),
    };
    (
        StatusCode::ACCEPTED,
        [(HEADER_X_DEPLOY_ID, "42")],
        axum::Json(incremental),
    )
        .into_response()
}

async fn upload(
    State(platform): State<Platform>,
    RoutePath(path): RoutePath<String>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    assert_bearer(&headers);
    assert_eq!(
        headers["content-length"].to_str().unwrap(),
        body.len().to_string()
    );
    platform.uploads.lock().unwrap().push((path, body.to_vec()));
    StatusCode::OK
}

async fn activate(State(platform): State<Platform>, headers: HeaderMap) -> Response {
    assert_bearer(&headers);
    *platform.activated.lock().unwrap() = true;
    axum::Json(serde_json::json!({
        "DeployID": 42,
        "Slug": "latest",
        "URL": TEST_DEPLOY_URL,
    }))
    .into_response()
}

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://127.0.0.1:{port}/")
}

async fn platform(wants: Wants) -> (Platform, String) {
    let platform = Platform::new(wants);
    let router = Router::new()
        .route("/api/void/snakes/deploy", post(start))
        .route("/api/void/snakes/deploy/42/activate", post(activate))
        .route("/api/void/snakes/deploy/42/upload/*path", post(upload))
        .with_state(platform.clone());
    let server = serve(router).await;
    (platform, server)
}

fn tree(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (rel, content) in files {
        let path = dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
    dir
}

fn entry((path, content): (&str, &str)) -> DeployEntry {
    DeployEntry {
        path: path.to_string(),
        blake3: blake3_str(content),
        content_length: content.len() as u64,
    }
}

fn command(server: &str, path: &Path) -> (DeployCommand, Arc<Mutex<Vec<String>>>) {
    let client = Client::new(server, TEST_TOKEN).unwrap();
    let dispatched = Arc::new(Mutex::new(Vec::new()));
    let cmd = DeployCommand::new(Arc::new(client), "void", "snakes", path).on_upload({
        let dispatched = dispatched.clone();
        move |deploy_id, path| {
            assert_eq!(deploy_id, 42);
            dispatched.lock().unwrap().push(path.to_string());
        }
    });
    (cmd, dispatched)
}

#[tokio::test]
async fn full_deploy() {
    let dir = tree(&[FIRST, SECOND, THIRD]);
    let (platform, server) = platform(Wants::All).await;
    let (cmd, dispatched) = command(&server, dir.path());

    let result = deploy(&cmd).await.unwrap();

    let expected = vec![entry(FIRST), entry(SECOND), entry(THIRD)];
    assert_eq!(result.deploy_id, 42);
    assert_eq!(result.slug, "latest");
    assert_eq!(result.url, TEST_DEPLOY_URL);
    assert_eq!(result.manifest, expected);
    assert_eq!(*platform.manifests.lock().unwrap(), [expected]);

    assert_eq!(
        *dispatched.lock().unwrap(),
        ["path/to/first.txt", "path/to/second.txt", "path/to/third.txt"]
    );
    assert_eq!(
        platform.uploaded_paths(),
        ["path/to/first.txt", "path/to/second.txt", "path/to/third.txt"]
    );
    for (path, bytes) in platform.uploads.lock().unwrap().iter() {
        let expected = [FIRST, SECOND, THIRD]
            .into_iter()
            .find(|(p, _)| *p == path.as_str())
            .unwrap()
            .1;
        assert_eq!(bytes, expected.as_bytes());
    }
    assert!(*platform.activated.lock().unwrap());
}

#[tokio::test]
async fn incremental_deploy() {
    let dir = tree(&[FIRST, SECOND, THIRD]);
    let (platform, server) = platform(Wants::Last).await;
    let (cmd, dispatched) = command(&server, dir.path());

    let result = deploy(&cmd).await.unwrap();

    assert_eq!(
        result.manifest,
        [entry(FIRST), entry(SECOND), entry(THIRD)]
    );
    assert_eq!(*dispatched.lock().unwrap(), ["path/to/third.txt"]);
    assert_eq!(platform.uploaded_paths(), ["path/to/third.txt"]);
}

#[tokio::test]
async fn sensitive_files_never_leave() {
    let dir = tree(&[
        (".ssh", "secret"),
        (".env", "secret"),
        (".git", "secret"),
        FIRST,
    ]);
    let (platform, server) = platform(Wants::All).await;
    let (cmd, dispatched) = command(&server, dir.path());

    let result = deploy(&cmd).await.unwrap();

    assert_eq!(result.manifest, [entry(FIRST)]);
    assert_eq!(*platform.manifests.lock().unwrap(), [vec![entry(FIRST)]]);
    assert_eq!(*dispatched.lock().unwrap(), ["path/to/first.txt"]);
    assert_eq!(platform.uploaded_paths(), ["path/to/first.txt"]);
}

#[tokio::test]
async fn rejected_deploy_reports_status_and_body() {
    let router = Router::new().route(
        "/api/void/snakes/deploy",
        post(|headers: HeaderMap, body: Bytes| async move {
            assert_bearer(&headers);
            assert_eq!(&body[..], b"[]");
            (StatusCode::BAD_REQUEST, "uh oh, manifest was empty")
        }),
    );
    let server = serve(router).await;
    let dir = TempDir::new().unwrap();
    let (cmd, dispatched) = command(&server, dir.path());

    let err = deploy(&cmd).await.unwrap_err();

    assert!(matches!(err, DeployError::StartStatus { status: 400, .. }));
    assert_eq!(
        err.to_string(),
        "unexpected status code 400: uh oh, manifest was empty"
    );
    assert!(dispatched.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_activation_reports_route() {
    let router = Router::new()
        .route(
            "/api/void/snakes/deploy",
            post(|| async { (StatusCode::ACCEPTED, [(HEADER_X_DEPLOY_ID, "42")], "[]") }),
        )
        .route(
            "/api/void/snakes/deploy/42/activate",
            post(|| async { (StatusCode::CONFLICT, "already active") }),
        );
    let server = serve(router).await;
    let dir = tree(&[FIRST]);
    let (cmd, _) = command(&server, dir.path());

    let err = deploy(&cmd).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "failed to activate void/snakes/deploy/42/activate: status code 409: already active"
    );
}

#[tokio::test]
async fn labelled_deploy_uses_label_route() {
    let router = Router::new().route(
        "/api/void/snakes/deploy/beta",
        post(|| async { (StatusCode::BAD_REQUEST, "labelled") }),
    );
    let server = serve(router).await;
    let dir = TempDir::new().unwrap();
    let (cmd, _) = command(&server, dir.path());

    let err = deploy(&cmd.with_label("beta")).await.unwrap_err();
    assert_eq!(err.to_string(), "unexpected status code 400: labelled");
}
