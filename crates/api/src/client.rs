//! Platform API client.
//!
//! Async HTTP client using `reqwest` with Bearer token authentication.

use std::path::Path;

use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue};
use tokio_util::io::ReaderStream;
use tracing::debug;
use url::Url;

use crate::constants::{API_PREFIX, CONTENT_TYPE_BYTES, CONTENT_TYPE_JSON};
use crate::error::ApiError;
use crate::response::Response;
use crate::transport::{ResponseFuture, Transport};

/// Platform API client bound to one server endpoint and one token.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    endpoint: Url,
}

impl Client {
    /// Creates a client for `server` that authenticates with `token`.
    pub fn new(server: &str, token: &str) -> Result<Self, ApiError> {
        let endpoint = Url::parse(server).map_err(|source| ApiError::InvalidUrl {
            url: server.to_string(),
            source,
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(ApiError::CannotBeBase(server.to_string()));
        }

        let mut bearer =
            HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| ApiError::InvalidToken)?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { http, endpoint })
    }

    /// The server endpoint this client talks to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Absolute URL for an API route: the endpoint path is replaced by
    /// `/api/<route>`, with every segment percent-encoded.
    pub fn url(&self, route: &str) -> String {
        let mut url = self.endpoint.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.clear();
            segments.push(API_PREFIX);
            for part in route.split('/').filter(|p| !p.is_empty()) {
                segments.push(part);
            }
        }
        url.into()
    }
}

impl Transport for Client {
    fn get(&self, route: &str) -> ResponseFuture<'_> {
        let url = self.url(route);
        Box::pin(async move {
            debug!(%url, "GET");
            let resp = self.http.get(&url).send().await?;
            Response::read(resp).await
        })
    }

    fn post(&self, route: &str, body: Vec<u8>) -> ResponseFuture<'_> {
        let url = self.url(route);
        Box::pin(async move {
            debug!(%url, bytes = body.len(), "POST");
            let resp = self.http.post(&url).body(body).send().await?;
            Response::read(resp).await
        })
    }

    fn post_json(&self, route: &str, body: &serde_json::Value) -> ResponseFuture<'_> {
        let url = self.url(route);
        let body = serde_json::to_vec(body);
        Box::pin(async move {
            let body = body?;
            debug!(%url, bytes = body.len(), "POST json");
            let resp = self
                .http
                .post(&url)
                .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
                .body(body)
                .send()
                .await?;
            Response::read(resp).await
        })
    }

    fn post_file(&self, route: &str, path: &Path, content_length: u64) -> ResponseFuture<'_> {
        let url = self.url(route);
        let path = path.to_path_buf();
        Box::pin(async move {
            let file = tokio::fs::File::open(&path).await?;
            debug!(%url, path = %path.display(), content_length, "POST file");
            let resp = self
                .http
                .post(&url)
                .header(CONTENT_TYPE, CONTENT_TYPE_BYTES)
                .header(CONTENT_LENGTH, content_length)
                .body(reqwest::Body::wrap_stream(ReaderStream::new(file)))
                .send()
                .await?;
            Response::read(resp).await
        })
    }
}
