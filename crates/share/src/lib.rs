//! Deploys a local directory to a Void Cloud game.
//!
//! # Pipeline
//!
//! 1. **Manifest**: walk the directory and fingerprint every file
//! 2. **Start**: submit the full manifest, receive the files the server lacks
//! 3. **Upload**: send only those files, at most eight at a time
//! 4. **Activate**: make the deployment live
//!
//! Sensitive files (base names ending in `.ssh`, `.git` or `.env`) never
//! leave the machine.

pub mod deploy;
pub mod error;
pub mod manifest;
pub mod types;

pub use deploy::{DeployCommand, OnStarted, OnUpload, UPLOAD_CONCURRENCY, deploy};
pub use error::{DeployError, UploadError};
pub use manifest::{build_manifest, is_excluded};
pub use types::{DeployEntry, DeployResult};
