//! Test doubles and fixtures shared by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::{IdentityProvider, OrganizerId};
use crate::models::{Event, ImageUpload, Location, NewEvent, Session};
use crate::storage::{ObjectAcl, ObjectStorage, UploadError};

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub path: String,
    pub content_type: String,
    pub acl: ObjectAcl,
    pub size: usize,
}

/// Object storage that records every call and hands out predictable URLs.
#[derive(Default)]
pub struct RecordingStorage {
    fail_store: bool,
    fail_mint: bool,
    stored: Mutex<Vec<StoredObject>>,
    minted: Mutex<Vec<String>>,
}

impl RecordingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects every `store` call.
    pub fn failing() -> Self {
        Self {
            fail_store: true,
            ..Self::default()
        }
    }

    /// Accepts objects but fails to mint their public URLs.
    pub fn failing_mint() -> Self {
        Self {
            fail_mint: true,
            ..Self::default()
        }
    }

    pub fn store_calls(&self) -> usize {
        self.stored.lock().unwrap().len()
    }

    pub fn mint_calls(&self) -> usize {
        self.minted.lock().unwrap().len()
    }

    pub fn stored_objects(&self) -> Vec<StoredObject> {
        self.stored.lock().unwrap().clone()
    }

    pub fn minted_urls(&self) -> Vec<String> {
        self.minted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStorage for RecordingStorage {
    async fn store(
        &self,
        path: &str,
        bytes: Bytes,
        content_type: &str,
        acl: ObjectAcl,
    ) -> Result<(), UploadError> {
        self.stored.lock().unwrap().push(StoredObject {
            path: path.to_string(),
            content_type: content_type.to_string(),
            acl,
            size: bytes.len(),
        });
        if self.fail_store {
            return Err(UploadError::Rejected {
                path: path.to_string(),
                status: 503,
            });
        }
        Ok(())
    }

    async fn mint_public_url(
        &self,
        path: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, UploadError> {
        let mut minted = self.minted.lock().unwrap();
        if self.fail_mint {
            return Err(UploadError::Signing {
                path: path.to_string(),
                reason: "signing key unavailable".to_string(),
            });
        }
        let url = format!(
            "https://storage.test/{}?Expires={}&n={}",
            path,
            expires_at.timestamp(),
            minted.len()
        );
        minted.push(url.clone());
        Ok(url)
    }
}

/// Maps fixed tokens to organizer ids.
#[derive(Default)]
pub struct StaticIdentity {
    tokens: HashMap<String, OrganizerId>,
}

impl StaticIdentity {
    pub fn with_token(mut self, token: &str, organizer_id: &str) -> Self {
        self.tokens
            .insert(token.to_string(), organizer_id.to_string());
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn resolve(&self, credential: &str) -> Option<OrganizerId> {
        self.tokens.get(credential).cloned()
    }
}

pub fn sample_location() -> Location {
    Location {
        house_number: "12".to_string(),
        ward: "Ben Nghe".to_string(),
        district: "District 1".to_string(),
        province: "Ho Chi Minh City".to_string(),
    }
}

pub fn sample_input(title: &str, event_type: &str) -> NewEvent {
    NewEvent {
        title: title.to_string(),
        description: format!("{title} description"),
        location: sample_location(),
        event_type: event_type.to_string(),
    }
}

pub fn sample_event(organizer_id: &str, event_type: &str) -> Event {
    Event::new(sample_input("Sample", event_type), organizer_id, String::new())
}

pub fn sample_session(event_id: Uuid, name: &str) -> Session {
    Session {
        id: Uuid::new_v4(),
        event_id,
        name: name.to_string(),
        start_time: Utc::now(),
        end_time: None,
    }
}

pub fn png_upload() -> ImageUpload {
    ImageUpload {
        file_name: "cover.png".to_string(),
        content_type: "image/png".to_string(),
        bytes: Bytes::from_static(b"\x89PNG\r\n\x1a\n"),
    }
}
