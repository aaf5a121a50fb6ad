//! HTTP transport contract and target resolution.
//!
//! The composer only needs `GET target` with an `Accept` header and a response
//! exposing status, headers and body. [`ReqwestTransport`] is the production
//! implementation; tests plug in scripted transports.

pub mod client;
pub mod response;
pub mod template;

pub use client::ReqwestTransport;
pub use response::{HttpResponse, StatusClass};
pub use template::UriTemplate;

use crate::error::ComposerError;
use async_trait::async_trait;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues a GET request. Connection-level failures are returned as
    /// [`ComposerError::Transport`]; every HTTP status is a successful response here.
    async fn get(&self, target: &str, accept: &str) -> Result<HttpResponse, ComposerError>;
}
