//! HS256 JSON Web Token verification.
//!
//! Tokens are issued by the account service; this module only checks the
//! signature and expiry and reads the organizer id from the `userId` claim
//! (or `sub` for tokens that follow the registered claim names).

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;
use tracing::warn;

use crate::auth::{IdentityProvider, OrganizerId};

type HmacSha256 = Hmac<Sha256>;

const SUPPORTED_ALGORITHM: &str = "HS256";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("token is malformed")]
    Malformed,
    #[error("unsupported algorithm '{0}'")]
    UnsupportedAlgorithm(String),
    #[error("signature mismatch")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("token has no subject")]
    MissingSubject,
}

#[derive(Deserialize)]
struct JwtHeader {
    alg: String,
}

#[derive(Deserialize)]
struct Claims {
    #[serde(rename = "userId")]
    user_id: Option<String>,
    sub: Option<String>,
    exp: Option<i64>,
}

pub struct JwtIdentityProvider {
    secret: Vec<u8>,
}

impl JwtIdentityProvider {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    pub fn verify(&self, token: &str) -> Result<OrganizerId, JwtError> {
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(JwtError::Malformed);
        };

        let jwt_header: JwtHeader = decode_segment(header)?;
        if jwt_header.alg != SUPPORTED_ALGORITHM {
            return Err(JwtError::UnsupportedAlgorithm(jwt_header.alg));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| JwtError::Malformed)?;
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| JwtError::BadSignature)?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| JwtError::BadSignature)?;

        let claims: Claims = decode_segment(payload)?;
        if let Some(exp) = claims.exp {
            if exp <= Utc::now().timestamp() {
                return Err(JwtError::Expired);
            }
        }

        claims
            .user_id
            .or(claims.sub)
            .filter(|id| !id.trim().is_empty())
            .ok_or(JwtError::MissingSubject)
    }
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, JwtError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| JwtError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| JwtError::Malformed)
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn resolve(&self, credential: &str) -> Option<OrganizerId> {
        match self.verify(credential) {
            Ok(organizer_id) => Some(organizer_id),
            Err(err) => {
                warn!(error = %err, "Rejected bearer credential");
                None
            }
        }
    }
}
