//! Manifest construction.
//!
//! Recursively walks a directory in lexicographic order and fingerprints
//! every regular file, with relative paths normalized to forward slashes.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};
use voidcloud_crypto::blake3_file;

use crate::error::DeployError;
use crate::types::DeployEntry;

/// Base-name suffixes of files that are never uploaded.
const EXCLUDED_SUFFIXES: [&str; 3] = [".ssh", ".git", ".env"];

/// True when a file with this base name must stay local.
pub fn is_excluded(name: &str) -> bool {
    EXCLUDED_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Walks `root` and returns one entry per uploadable file.
///
/// Entries are ordered by the walk, which visits directory entries sorted
/// by name, so the same tree always yields the same manifest. Symbolic
/// links to files are hashed through the link; linked directories are not
/// followed.
///
/// Files and directories whose names are not valid UTF-8 are skipped.
pub fn build_manifest(root: &Path) -> Result<Vec<DeployEntry>, DeployError> {
    let mut manifest = Vec::new();
    walk_dir(root, "", &mut manifest)?;
    Ok(manifest)
}

fn walk_dir(current: &Path, prefix: &str, manifest: &mut Vec<DeployEntry>) -> Result<(), DeployError> {
    let mut entries = fs::read_dir(current)
        .map_err(walk_err(current))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(walk_err(current))?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        // Manifest paths are JSON strings; a name that is not UTF-8 has no
        // faithful spelling there.
        let Ok(name) = entry.file_name().into_string() else {
            warn!(path = %path.display(), "skipping file with non UTF-8 name");
            continue;
        };
        let rel_path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };

        let file_type = entry.file_type().map_err(walk_err(&path))?;
        if file_type.is_dir() {
            walk_dir(&path, &rel_path, manifest)?;
            continue;
        }

        // Follows symlinks, unlike `file_type`.
        let metadata = fs::metadata(&path).map_err(walk_err(&path))?;
        if !metadata.is_file() {
            continue;
        }
        if is_excluded(&name) {
            debug!(path = %rel_path, "skipping excluded file");
            continue;
        }

        let blake3 = blake3_file(&path).map_err(walk_err(&path))?;
        manifest.push(DeployEntry {
            path: rel_path,
            blake3,
            content_length: metadata.len(),
        });
    }

    Ok(())
}

fn walk_err(path: &Path) -> impl FnOnce(std::io::Error) -> DeployError {
    let path = path.to_path_buf();
    move |source| DeployError::Walk { path, source }
}
