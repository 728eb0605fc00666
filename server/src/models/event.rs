use axum::body::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::session::Session;
use crate::models::ticket::Ticket;

/// Status assigned to every newly created event.
pub const DEFAULT_EVENT_STATUS: &str = "pending";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase", default)]
pub struct Location {
    #[serde(alias = "house_number")]
    pub house_number: String,
    pub ward: String,
    pub district: String,
    pub province: String,
}

impl Location {
    /// Names of the sub-fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("houseNumber", &self.house_number),
            ("ward", &self.ward),
            ("district", &self.district),
            ("province", &self.province),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[sqlx(flatten)]
    pub location: Location,
    pub event_type: String,
    pub image: String,
    pub status: String,
    pub organizer_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Builds a fresh event owned by `organizer_id`. The image is the
    /// reference returned by object storage, or empty.
    pub fn new(input: NewEvent, organizer_id: &str, image: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            location: input.location,
            event_type: input.event_type,
            image,
            status: DEFAULT_EVENT_STATUS.to_string(),
            organizer_id: organizer_id.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Client-supplied fields for a new event. The organizer is never part of it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub location: Location,
    pub event_type: String,
}

impl NewEvent {
    pub fn validate(&self) -> Result<(), String> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title".to_string());
        }
        if self.event_type.trim().is_empty() {
            missing.push("event_type".to_string());
        }
        missing.extend(
            self.location
                .missing_fields()
                .into_iter()
                .map(|field| format!("location.{field}")),
        );

        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!("Missing required fields: {}", missing.join(", ")))
        }
    }
}

/// Partial update merged into a stored event. Unknown keys, including
/// `organizer_id`, are ignored on deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<Location>,
    pub event_type: Option<String>,
    pub image: Option<String>,
    pub status: Option<String>,
}

impl EventPatch {
    pub fn status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, event: &mut Event) {
        if let Some(title) = &self.title {
            event.title = title.clone();
        }
        if let Some(description) = &self.description {
            event.description = description.clone();
        }
        if let Some(location) = &self.location {
            event.location = location.clone();
        }
        if let Some(event_type) = &self.event_type {
            event.event_type = event_type.clone();
        }
        if let Some(image) = &self.image {
            event.image = image.clone();
        }
        if let Some(status) = &self.status {
            event.status = status.clone();
        }
        event.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub event_type: Option<String>,
    pub organizer_id: Option<String>,
}

impl EventFilter {
    pub fn by_event_type(event_type: Option<String>) -> Self {
        Self {
            event_type: event_type.filter(|value| !value.is_empty()),
            organizer_id: None,
        }
    }

    pub fn by_organizer(organizer_id: &str) -> Self {
        Self {
            event_type: None,
            organizer_id: Some(organizer_id.to_string()),
        }
    }

    pub fn matches(&self, event: &Event) -> bool {
        let type_matches = self
            .event_type
            .as_ref()
            .map_or(true, |event_type| &event.event_type == event_type);
        let organizer_matches = self
            .organizer_id
            .as_ref()
            .map_or(true, |organizer_id| &event.organizer_id == organizer_id);
        type_matches && organizer_matches
    }
}

/// An event with the sessions and tickets that belong to it.
#[derive(Debug, Clone, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub sessions: Vec<Session>,
    pub tickets: Vec<Ticket>,
}

/// Uploaded image held in memory for the duration of one request.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}
