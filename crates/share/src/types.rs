//! Wire types exchanged with the deploy routes.

use serde::{Deserialize, Deserializer, Serialize};

/// Fingerprint of one file in a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployEntry {
    /// Path relative to the deployment root, always `/`-separated.
    pub path: String,
    /// Lowercase hex BLAKE3 digest of the contents.
    pub blake3: String,
    #[serde(rename = "contentLength")]
    pub content_length: u64,
}

/// An activated deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployResult {
    #[serde(rename = "DeployID", alias = "deployID", alias = "deployId")]
    pub deploy_id: i64,
    #[serde(rename = "Slug", alias = "slug")]
    pub slug: String,
    #[serde(rename = "URL", alias = "url")]
    pub url: String,
    /// The full manifest that was deployed.
    #[serde(
        rename = "Manifest",
        alias = "manifest",
        deserialize_with = "null_as_empty"
    )]
    pub manifest: Vec<DeployEntry>,
}

/// Decodes `null` as an empty list.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
