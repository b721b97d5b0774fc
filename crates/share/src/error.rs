//! Deploy error types.

use std::path::PathBuf;

use voidcloud_api::ApiError;

/// Errors produced by a deploy.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("missing api client")]
    MissingTransport,

    #[error("missing organization")]
    MissingOrganization,

    #[error("missing game")]
    MissingGame,

    #[error("missing path")]
    MissingPath,

    #[error("directory not found {}", .0.display())]
    NotFound(PathBuf),

    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// A file or directory could not be read while building the manifest.
    #[error("{}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unexpected JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("missing or invalid deployID: {0}")]
    InvalidDeployId(String),

    #[error("unexpected status code {status}: {body}")]
    StartStatus { status: u16, body: String },

    /// One or more uploads failed; every failure is kept.
    #[error("{} of {} uploads failed: {}", .failures.len(), .total, join_messages(.failures))]
    Upload {
        failures: Vec<UploadError>,
        total: usize,
    },

    #[error("failed to activate {route}: status code {status}: {body}")]
    ActivateStatus {
        route: String,
        status: u16,
        body: String,
    },
}

impl DeployError {
    /// The individual upload failures, empty for any other error.
    pub fn upload_failures(&self) -> &[UploadError] {
        match self {
            Self::Upload { failures, .. } => failures,
            _ => &[],
        }
    }
}

/// A single file that did not make it to the server.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("failed to upload to {route}: {source}")]
    Transport {
        path: String,
        route: String,
        #[source]
        source: ApiError,
    },

    #[error("failed to upload to {route}: status code {status}")]
    Status {
        path: String,
        route: String,
        status: u16,
    },

    /// The server asked for a file the local walk never produced.
    #[error("refusing to upload {0}: not in the deploy manifest")]
    NotInManifest(String),

    /// The upload task died before reporting back.
    #[error("upload aborted: {0}")]
    Aborted(String),
}

impl UploadError {
    /// Manifest path of the file, when known.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Transport { path, .. } | Self::Status { path, .. } => Some(path),
            Self::NotInManifest(path) => Some(path),
            Self::Aborted(_) => None,
        }
    }
}

fn join_messages(failures: &[UploadError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
