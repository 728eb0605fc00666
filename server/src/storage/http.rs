use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::CONTENT_TYPE;
use sha2::Sha256;
use tracing::debug;

use crate::config::StorageConfig;
use crate::storage::{ObjectAcl, ObjectStorage, UploadError};

type HmacSha256 = Hmac<Sha256>;

const PUBLIC_READ_HEADER: &str = "x-amz-acl";

/// Client for an S3-style bucket endpoint. Objects are written with a plain
/// `PUT` and read back through HMAC-signed URLs.
pub struct HttpObjectStorage {
    client: reqwest::Client,
    endpoint: String,
    bucket: String,
    public_base_url: String,
    access_token: Option<String>,
    signing_secret: String,
}

impl HttpObjectStorage {
    pub fn new(config: &StorageConfig) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            signing_secret: config.signing_secret.clone(),
        })
    }

    fn object_key(&self, path: &str) -> String {
        let encoded: Vec<String> = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}", self.bucket, encoded.join("/"))
    }
}

fn sign_hmac_sha256(secret: &str, payload: &str) -> Result<String, String> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|err| err.to_string())?;
    mac.update(payload.as_bytes());
    let digest = mac.finalize().into_bytes();

    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    Ok(out)
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn store(
        &self,
        path: &str,
        bytes: Bytes,
        content_type: &str,
        acl: ObjectAcl,
    ) -> Result<(), UploadError> {
        let url = format!("{}/{}", self.endpoint, self.object_key(path));
        debug!(%url, size = bytes.len(), "uploading object");

        let mut request = self
            .client
            .put(&url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes);
        if acl == ObjectAcl::PublicRead {
            request = request.header(PUBLIC_READ_HEADER, "public-read");
        }
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Rejected {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    async fn mint_public_url(
        &self,
        path: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, UploadError> {
        let key = self.object_key(path);
        let expires = expires_at.timestamp();
        let signature = sign_hmac_sha256(&self.signing_secret, &format!("{key}\n{expires}"))
            .map_err(|reason| UploadError::Signing {
                path: path.to_string(),
                reason,
            })?;

        Ok(format!(
            "{}/{}?Expires={}&Signature={}",
            self.public_base_url, key, expires, signature
        ))
    }
}
