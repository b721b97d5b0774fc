//! Authenticated HTTP transport for the Void Cloud platform API.
//!
//! Every request made through a [`Client`] carries the caller's bearer
//! token. The [`Transport`] trait is the seam the login and deploy flows
//! depend on, so they can be exercised against scripted doubles.

pub mod client;
pub mod constants;
pub mod error;
pub mod response;
pub mod route;
pub mod transport;

pub use client::Client;
pub use error::ApiError;
pub use response::Response;
pub use reqwest::StatusCode;
pub use route::route;
pub use transport::{ResponseFuture, Transport};
