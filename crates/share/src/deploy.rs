//! The deploy command.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use voidcloud_api::constants::HEADER_X_DEPLOY_ID;
use voidcloud_api::{StatusCode, Transport, route};

use crate::error::{DeployError, UploadError};
use crate::manifest::build_manifest;
use crate::types::{DeployEntry, DeployResult};

/// Maximum number of uploads in flight at once.
pub const UPLOAD_CONCURRENCY: usize = 8;

/// Called once the server has chosen which files it needs:
/// `(deploy_id, full manifest, incremental set)`.
pub type OnStarted = Arc<dyn Fn(i64, &[DeployEntry], &[DeployEntry]) + Send + Sync>;

/// Called as each upload is dispatched: `(deploy_id, path)`.
pub type OnUpload = Arc<dyn Fn(i64, &str) + Send + Sync>;

/// Everything a deploy needs.
#[derive(Clone, Default)]
pub struct DeployCommand {
    pub transport: Option<Arc<dyn Transport>>,
    pub org: String,
    pub game: String,
    /// Optional deployment label; empty deploys to the default slot.
    pub label: String,
    /// Directory to deploy.
    pub path: PathBuf,
    pub on_started: Option<OnStarted>,
    pub on_upload: Option<OnUpload>,
}

impl DeployCommand {
    pub fn new(
        transport: Arc<dyn Transport>,
        org: impl Into<String>,
        game: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            transport: Some(transport),
            org: org.into(),
            game: game.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn on_started(
        mut self,
        f: impl Fn(i64, &[DeployEntry], &[DeployEntry]) + Send + Sync + 'static,
    ) -> Self {
        self.on_started = Some(Arc::new(f));
        self
    }

    pub fn on_upload(mut self, f: impl Fn(i64, &str) + Send + Sync + 'static) -> Self {
        self.on_upload = Some(Arc::new(f));
        self
    }

    fn deploy_route(&self, deploy_id: i64, tail: &[&str]) -> String {
        let id = deploy_id.to_string();
        let head = [self.org.as_str(), self.game.as_str(), "deploy", id.as_str()];
        route(head.iter().chain(tail))
    }
}

/// Deploys `cmd.path` and activates it.
///
/// The full manifest is always submitted; only the files the server asks
/// for are uploaded. Every upload runs to completion even when others fail,
/// and activation only happens when all of them succeeded.
pub async fn deploy(cmd: &DeployCommand) -> Result<DeployResult, DeployError> {
    let transport = cmd.transport.clone().ok_or(DeployError::MissingTransport)?;
    if cmd.org.is_empty() {
        return Err(DeployError::MissingOrganization);
    }
    if cmd.game.is_empty() {
        return Err(DeployError::MissingGame);
    }
    if cmd.path.as_os_str().is_empty() {
        return Err(DeployError::MissingPath);
    }

    let metadata = tokio::fs::metadata(&cmd.path)
        .await
        .map_err(|_| DeployError::NotFound(cmd.path.clone()))?;
    if !metadata.is_dir() {
        return Err(DeployError::NotADirectory(cmd.path.clone()));
    }

    let manifest = manifest_blocking(&cmd.path).await?;
    debug!(path = %cmd.path.display(), files = manifest.len(), "manifest built");

    let (deploy_id, incremental) = start(transport.as_ref(), cmd, &manifest).await?;
    info!(
        deploy_id,
        files = manifest.len(),
        uploads = incremental.len(),
        "deploy started"
    );

    if let Some(on_started) = &cmd.on_started {
        on_started(deploy_id, &manifest, &incremental);
    }

    upload_all(&transport, cmd, deploy_id, &manifest, &incremental).await?;

    let mut result = activate(transport.as_ref(), cmd, deploy_id).await?;
    result.manifest = manifest;

    info!(deploy_id, url = %result.url, "deploy activated");
    Ok(result)
}

/// Builds the manifest on the blocking pool; hashing is CPU and disk bound.
async fn manifest_blocking(root: &Path) -> Result<Vec<DeployEntry>, DeployError> {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || build_manifest(&root))
        .await
        .map_err(|e| DeployError::Io(std::io::Error::other(e)))?
}

async fn start(
    transport: &dyn Transport,
    cmd: &DeployCommand,
    manifest: &[DeployEntry],
) -> Result<(i64, Vec<DeployEntry>), DeployError> {
    let route = route([cmd.org.as_str(), cmd.game.as_str(), "deploy", cmd.label.as_str()]);
    let body = serde_json::to_value(manifest)?;
    let resp = transport.post_json(&route, &body).await?;

    if resp.status != StatusCode::ACCEPTED {
        return Err(DeployError::StartStatus {
            status: resp.status.as_u16(),
            body: resp.text(),
        });
    }

    let deploy_id = parse_deploy_id(resp.header(HEADER_X_DEPLOY_ID))?;
    let incremental = resp
        .json::<Option<Vec<DeployEntry>>>()?
        .unwrap_or_default();
    Ok((deploy_id, incremental))
}

fn parse_deploy_id(header: Option<&str>) -> Result<i64, DeployError> {
    let value = header.ok_or_else(|| {
        DeployError::InvalidDeployId(format!("no {HEADER_X_DEPLOY_ID} header"))
    })?;
    value
        .trim()
        .parse::<i64>()
        .map_err(|e| DeployError::InvalidDeployId(format!("{value:?}: {e}")))
}

async fn upload_all(
    transport: &Arc<dyn Transport>,
    cmd: &DeployCommand,
    deploy_id: i64,
    manifest: &[DeployEntry],
    incremental: &[DeployEntry],
) -> Result<(), DeployError> {
    let semaphore = Arc::new(Semaphore::new(UPLOAD_CONCURRENCY));
    let mut uploads = JoinSet::new();
    let mut failures = Vec::new();

    // The server only names files; what gets read and how long it is comes
    // from the local walk.
    let walked: HashMap<&str, &DeployEntry> =
        manifest.iter().map(|e| (e.path.as_str(), e)).collect();

    for requested in incremental {
        let Some(&entry) = walked.get(requested.path.as_str()) else {
            warn!(
                deploy_id,
                path = %requested.path,
                "server requested a file outside the manifest"
            );
            failures.push(UploadError::NotInManifest(requested.path.clone()));
            continue;
        };

        // Never closed, so acquiring only fails if the pool is torn down.
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| DeployError::Io(std::io::Error::other(e)))?;

        if let Some(on_upload) = &cmd.on_upload {
            on_upload(deploy_id, &entry.path);
        }

        let transport = Arc::clone(transport);
        let route = cmd.deploy_route(deploy_id, &["upload", entry.path.as_str()]);
        let file = cmd.path.join(&entry.path);
        let path = entry.path.clone();
        let content_length = entry.content_length;

        uploads.spawn(async move {
            let _permit = permit;
            upload(transport.as_ref(), path, route, &file, content_length).await
        });
    }

    while let Some(joined) = uploads.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(deploy_id, error = %e, "upload failed");
                failures.push(e);
            }
            Err(e) => {
                warn!(deploy_id, error = %e, "upload task aborted");
                failures.push(UploadError::Aborted(e.to_string()));
            }
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(DeployError::Upload {
            failures,
            total: incremental.len(),
        })
    }
}

async fn upload(
    transport: &dyn Transport,
    path: String,
    route: String,
    file: &Path,
    content_length: u64,
) -> Result<(), UploadError> {
    debug!(%path, content_length, "uploading");
    match transport.post_file(&route, file, content_length).await {
        Ok(resp) if resp.status == StatusCode::OK => Ok(()),
        Ok(resp) => Err(UploadError::Status {
            path,
            route,
            status: resp.status.as_u16(),
        }),
        Err(source) => Err(UploadError::Transport {
            path,
            route,
            source,
        }),
    }
}

async fn activate(
    transport: &dyn Transport,
    cmd: &DeployCommand,
    deploy_id: i64,
) -> Result<DeployResult, DeployError> {
    let route = cmd.deploy_route(deploy_id, &["activate"]);
    let resp = transport.post(&route, Vec::new()).await?;

    if resp.status != StatusCode::OK {
        return Err(DeployError::ActivateStatus {
            route,
            status: resp.status.as_u16(),
            body: resp.text(),
        });
    }

    Ok(resp.json::<DeployResult>()?)
}
