//! The transport seam used by the login and deploy flows.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use crate::error::ApiError;
use crate::response::Response;

/// Boxed future returned by every [`Transport`] method.
pub type ResponseFuture<'a> = Pin<Box<dyn Future<Output = Result<Response, ApiError>> + Send + 'a>>;

/// Authenticated access to the platform API.
///
/// Routes are relative to the API prefix (`account/me`, not `/api/account/me`).
/// [`Client`](crate::Client) is the real implementation; tests substitute
/// scripted doubles.
pub trait Transport: Send + Sync {
    /// Issues a GET request.
    fn get(&self, route: &str) -> ResponseFuture<'_>;

    /// Issues a POST request with a raw body (possibly empty).
    fn post(&self, route: &str, body: Vec<u8>) -> ResponseFuture<'_>;

    /// Issues a POST request with a JSON body.
    fn post_json(&self, route: &str, body: &serde_json::Value) -> ResponseFuture<'_>;

    /// Streams a file as the request body with an exact content length.
    fn post_file(&self, route: &str, path: &Path, content_length: u64) -> ResponseFuture<'_>;
}
