use async_trait::async_trait;
use axum::body::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod http;

pub use http::HttpObjectStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectAcl {
    Private,
    PublicRead,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("object storage request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("object storage rejected '{path}' with status {status}")]
    Rejected { path: String, status: u16 },

    #[error("failed to sign url for '{path}': {reason}")]
    Signing { path: String, reason: String },
}

/// Binary object storage able to hand out long-lived public references.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn store(
        &self,
        path: &str,
        bytes: Bytes,
        content_type: &str,
        acl: ObjectAcl,
    ) -> Result<(), UploadError>;

    async fn mint_public_url(
        &self,
        path: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, UploadError>;
}
