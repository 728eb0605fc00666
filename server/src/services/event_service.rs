//! Event lifecycle: creation with optional cover image, partial updates,
//! status changes and the public and organizer-scoped queries.
//!
//! The caller identity is resolved at the HTTP boundary and handed to every
//! operation that needs it. Image upload always completes before the event
//! document is written, so a failed upload never leaves a half-set image.
//! There is no transaction across the two stores: a crash after the upload
//! leaves an unreferenced object behind.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::OrganizerId;
use crate::models::{Event, EventDetail, EventFilter, EventPatch, ImageUpload, NewEvent};
use crate::storage::{ObjectAcl, ObjectStorage};
use crate::store::EventStore;
use crate::utils::error::AppError;

/// Object path prefix for event cover images.
pub const EVENT_IMAGE_CATEGORY: &str = "event";

const IMAGE_MIME_PREFIX: &str = "image/";

#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn EventStore>,
    storage: Arc<dyn ObjectStorage>,
    image_url_expires_at: DateTime<Utc>,
}

impl EventService {
    pub fn new(
        store: Arc<dyn EventStore>,
        storage: Arc<dyn ObjectStorage>,
        image_url_expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            store,
            storage,
            image_url_expires_at,
        }
    }

    /// Stores the image under `category` and returns its public URL. Not
    /// idempotent: every call writes a new object.
    pub async fn attach_image(
        &self,
        upload: Option<ImageUpload>,
        category: &str,
    ) -> Result<Option<String>, AppError> {
        let Some(upload) = upload else {
            return Ok(None);
        };
        if !upload.content_type.starts_with(IMAGE_MIME_PREFIX) {
            return Err(AppError::ValidationError(
                "Only image files are allowed!".to_string(),
            ));
        }

        let path = image_object_path(
            category,
            Utc::now().timestamp_millis(),
            Uuid::new_v4(),
            &upload.file_name,
        );
        info!(%path, content_type = %upload.content_type, "Uploading image");

        self.storage
            .store(&path, upload.bytes, &upload.content_type, ObjectAcl::PublicRead)
            .await?;
        let url = self
            .storage
            .mint_public_url(&path, self.image_url_expires_at)
            .await?;

        info!(%path, "Image uploaded");
        Ok(Some(url))
    }

    /// Standalone upload; an empty URL means no file was attached.
    pub async fn upload_image(
        &self,
        caller: Option<&OrganizerId>,
        upload: Option<ImageUpload>,
    ) -> Result<String, AppError> {
        require_organizer(caller)?;
        let url = self.attach_image(upload, EVENT_IMAGE_CATEGORY).await?;
        Ok(url.unwrap_or_default())
    }

    pub async fn create_event(
        &self,
        caller: Option<&OrganizerId>,
        input: NewEvent,
        image: Option<ImageUpload>,
    ) -> Result<Event, AppError> {
        let organizer_id = require_organizer(caller)?;
        input.validate().map_err(AppError::ValidationError)?;

        let image_url = self
            .attach_image(image, EVENT_IMAGE_CATEGORY)
            .await?
            .unwrap_or_default();

        let event = self
            .store
            .create(Event::new(input, organizer_id, image_url))
            .await?;

        info!(event_id = %event.id, organizer_id = %event.organizer_id, "Event created");
        Ok(event)
    }

    /// Merges `patch` into the event. Ownership and location are not
    /// re-checked here.
    pub async fn update_event(
        &self,
        caller: Option<&OrganizerId>,
        id: &str,
        patch: EventPatch,
    ) -> Result<Event, AppError> {
        require_organizer(caller)?;
        let id = parse_event_id(id)?;

        let event = self.store.update_by_id(id, &patch).await?;
        info!(event_id = %event.id, "Event updated");
        Ok(event)
    }

    /// Any status may replace any other; the label is stored as given.
    pub async fn update_status(
        &self,
        caller: Option<&OrganizerId>,
        id: &str,
        status: String,
    ) -> Result<Event, AppError> {
        require_organizer(caller)?;
        let id = parse_event_id(id)?;

        let event = self
            .store
            .update_by_id(id, &EventPatch::status(status))
            .await?;
        info!(event_id = %event.id, status = %event.status, "Event status changed");
        Ok(event)
    }

    pub async fn list_events(&self, event_type: Option<String>) -> Result<Vec<Event>, AppError> {
        let filter = EventFilter::by_event_type(event_type);
        debug!(?filter, "Listing events");
        Ok(self.store.find(&filter).await?)
    }

    pub async fn my_events(&self, caller: Option<&OrganizerId>) -> Result<Vec<Event>, AppError> {
        let organizer_id = require_organizer(caller)?;
        Ok(self.store.find(&EventFilter::by_organizer(organizer_id)).await?)
    }

    /// The event with its sessions and tickets. Missing relations are empty
    /// collections, not an error.
    pub async fn event_detail(&self, id: &str) -> Result<EventDetail, AppError> {
        let id = parse_event_id(id)?;

        let event = self.store.find_by_id(id).await?;
        let (sessions, tickets) = tokio::try_join!(
            self.store.sessions_for_event(id),
            self.store.tickets_for_event(id)
        )?;

        Ok(EventDetail {
            event,
            sessions,
            tickets,
        })
    }
}

pub(crate) fn require_organizer(
    caller: Option<&OrganizerId>,
) -> Result<&OrganizerId, AppError> {
    caller
        .filter(|organizer_id| !organizer_id.trim().is_empty())
        .ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))
}

fn parse_event_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id)
        .map_err(|_| AppError::NotFound(format!("Event with id '{}' was not found", id)))
}

/// `{category}/{millis}-{upload id}-{file name}`, with separators in the file
/// name flattened so the object stays under the category prefix.
fn image_object_path(
    category: &str,
    timestamp_millis: i64,
    upload_id: Uuid,
    file_name: &str,
) -> String {
    let file_name = file_name.replace(['/', '\\'], "_");
    format!("{category}/{timestamp_millis}-{}-{file_name}", upload_id.simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Location, Ticket, DEFAULT_EVENT_STATUS};
    use crate::store::MemoryEventStore;
    use crate::testing::{png_upload, sample_input, sample_session, RecordingStorage};
    use rust_decimal::Decimal;

    struct Harness {
        service: EventService,
        store: Arc<MemoryEventStore>,
        storage: Arc<RecordingStorage>,
    }

    fn harness_with(storage: RecordingStorage) -> Harness {
        let store = Arc::new(MemoryEventStore::new());
        let storage = Arc::new(storage);
        let service = EventService::new(store.clone(), storage.clone(), Utc::now());
        Harness {
            service,
            store,
            storage,
        }
    }

    fn harness() -> Harness {
        harness_with(RecordingStorage::new())
    }

    fn org(id: &str) -> OrganizerId {
        id.to_string()
    }

    #[test]
    fn test_image_object_path() {
        let upload_id = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        assert_eq!(
            image_object_path("event", 1_700_000_000_000, upload_id, "cover.png"),
            "event/1700000000000-67e5504410b1426f9247bb680e5fe0c8-cover.png"
        );
        assert_eq!(
            image_object_path("event", 1, upload_id, "../etc\\passwd.png"),
            "event/1-67e5504410b1426f9247bb680e5fe0c8-.._etc_passwd.png"
        );
    }

    #[tokio::test]
    async fn test_create_without_identity_writes_nothing() {
        let h = harness();

        let err = h
            .service
            .create_event(None, sample_input("Launch Party", "music"), Some(png_upload()))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Unauthorized(_)));
        assert!(h.store.is_empty().await);
        assert_eq!(h.storage.store_calls(), 0);
        assert_eq!(h.storage.mint_calls(), 0);
    }

    #[tokio::test]
    async fn test_create_with_blank_identity_is_unauthorized() {
        let h = harness();
        let blank = org("  ");

        let err = h
            .service
            .create_event(Some(&blank), sample_input("Launch Party", "music"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Unauthorized(_)));
        assert!(h.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_non_image_mimetype_rejected_before_storage() {
        let h = harness();
        let mut upload = png_upload();
        upload.content_type = "application/pdf".to_string();

        let err = h
            .service
            .create_event(Some(&org("org-42")), sample_input("Launch Party", "music"), Some(upload))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(h.storage.store_calls(), 0);
        assert_eq!(h.storage.mint_calls(), 0);
        assert!(h.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_without_image() {
        let h = harness();

        let event = h
            .service
            .create_event(Some(&org("org-42")), sample_input("Launch Party", "music"), None)
            .await
            .unwrap();

        assert_eq!(event.title, "Launch Party");
        assert_eq!(event.image, "");
        assert_eq!(event.organizer_id, "org-42");
        assert_eq!(event.status, DEFAULT_EVENT_STATUS);
        assert_eq!(h.storage.store_calls(), 0);

        let stored = h.store.find_by_id(event.id).await.unwrap();
        assert_eq!(stored, event);
    }

    #[tokio::test]
    async fn test_create_with_image_uses_minted_url() {
        let h = harness();

        let event = h
            .service
            .create_event(
                Some(&org("org-42")),
                sample_input("Launch Party", "music"),
                Some(png_upload()),
            )
            .await
            .unwrap();

        let minted = h.storage.minted_urls();
        assert_eq!(minted.len(), 1);
        assert_eq!(event.image, minted[0]);

        let stored = h.storage.stored_objects();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].path.starts_with("event/"));
        assert!(stored[0].path.ends_with("-cover.png"));
        assert_eq!(stored[0].content_type, "image/png");
        assert_eq!(stored[0].acl, ObjectAcl::PublicRead);
        assert_eq!(stored[0].size, png_upload().bytes.len());
    }

    #[tokio::test]
    async fn test_failed_upload_does_not_create_event() {
        let h = harness_with(RecordingStorage::failing());

        let err = h
            .service
            .create_event(
                Some(&org("org-42")),
                sample_input("Launch Party", "music"),
                Some(png_upload()),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UploadFailure(_)));
        assert_eq!(h.storage.mint_calls(), 0);
        assert!(h.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_failed_url_mint_does_not_create_event() {
        let h = harness_with(RecordingStorage::failing_mint());

        let err = h
            .service
            .create_event(
                Some(&org("org-42")),
                sample_input("Launch Party", "music"),
                Some(png_upload()),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UploadFailure(_)));
        assert_eq!(h.storage.store_calls(), 1);
        assert_eq!(h.storage.mint_calls(), 0);
        assert!(h.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalid_input_rejected_before_upload() {
        let h = harness();
        let mut input = sample_input("Launch Party", "music");
        input.location = Location::default();

        let err = h
            .service
            .create_event(Some(&org("org-42")), input, Some(png_upload()))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ValidationError(ref msg) if msg.contains("location.ward")));
        assert_eq!(h.storage.store_calls(), 0);
    }

    #[tokio::test]
    async fn test_repeated_uploads_create_distinct_objects() {
        let h = harness();
        let organizer = org("org-42");

        h.service
            .upload_image(Some(&organizer), Some(png_upload()))
            .await
            .unwrap();
        h.service
            .upload_image(Some(&organizer), Some(png_upload()))
            .await
            .unwrap();

        let stored = h.storage.stored_objects();
        assert_eq!(stored.len(), 2);
        assert_ne!(stored[0].path, stored[1].path);
        let minted = h.storage.minted_urls();
        assert_eq!(minted.len(), 2);
        assert_ne!(minted[0], minted[1]);
    }

    #[tokio::test]
    async fn test_upload_image_without_file_returns_empty_url() {
        let h = harness();
        let url = h
            .service
            .upload_image(Some(&org("org-42")), None)
            .await
            .unwrap();
        assert_eq!(url, "");
        assert_eq!(h.storage.store_calls(), 0);
    }

    #[tokio::test]
    async fn test_upload_image_requires_identity() {
        let h = harness();
        let err = h.service.upload_image(None, Some(png_upload())).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert_eq!(h.storage.store_calls(), 0);
    }

    #[tokio::test]
    async fn test_status_transitions_are_unrestricted() {
        let h = harness();
        let organizer = org("org-42");
        let event = h
            .service
            .create_event(Some(&organizer), sample_input("Launch Party", "music"), None)
            .await
            .unwrap();
        let id = event.id.to_string();

        for status in ["published", "draft", "cancelled", "published", "whatever"] {
            let updated = h
                .service
                .update_status(Some(&organizer), &id, status.to_string())
                .await
                .unwrap();
            assert_eq!(updated.status, status);
            assert_eq!(h.store.find_by_id(event.id).await.unwrap().status, status);
        }
    }

    #[tokio::test]
    async fn test_status_update_unknown_id() {
        let h = harness();
        let organizer = org("org-42");

        let err = h
            .service
            .update_status(Some(&organizer), &Uuid::new_v4().to_string(), "published".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = h
            .service
            .update_status(Some(&organizer), "not-a-uuid", "published".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_merges_fields_and_keeps_organizer() {
        let h = harness();
        let event = h
            .service
            .create_event(Some(&org("org-42")), sample_input("Launch Party", "music"), None)
            .await
            .unwrap();

        let patch = EventPatch {
            title: Some("After Party".to_string()),
            ..EventPatch::default()
        };
        // Another organizer may update; ownership is not enforced on update.
        let updated = h
            .service
            .update_event(Some(&org("org-7")), &event.id.to_string(), patch)
            .await
            .unwrap();

        assert_eq!(updated.title, "After Party");
        assert_eq!(updated.description, event.description);
        assert_eq!(updated.organizer_id, "org-42");
    }

    #[tokio::test]
    async fn test_update_requires_identity_and_known_id() {
        let h = harness();
        let err = h
            .service
            .update_event(None, &Uuid::new_v4().to_string(), EventPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let err = h
            .service
            .update_event(Some(&org("org-42")), &Uuid::new_v4().to_string(), EventPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_filters_by_event_type() {
        let h = harness();
        let organizer = org("org-42");
        for (title, event_type) in [("A", "music"), ("B", "sport"), ("C", "music")] {
            h.service
                .create_event(Some(&organizer), sample_input(title, event_type), None)
                .await
                .unwrap();
        }

        let music = h.service.list_events(Some("music".to_string())).await.unwrap();
        assert_eq!(music.len(), 2);
        assert!(music.iter().all(|event| event.event_type == "music"));

        let all = h.service.list_events(None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(h.service.list_events(Some(String::new())).await.unwrap().len(), 3);
        assert!(h
            .service
            .list_events(Some("theatre".to_string()))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_my_events_scoped_to_caller() {
        let h = harness();
        for organizer in ["org-1", "org-2", "org-1"] {
            h.service
                .create_event(Some(&org(organizer)), sample_input("Show", "music"), None)
                .await
                .unwrap();
        }

        let mine = h.service.my_events(Some(&org("org-1"))).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|event| event.organizer_id == "org-1"));

        let err = h.service.my_events(None).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_detail_with_sessions_and_no_tickets() {
        let h = harness();
        let event = h
            .service
            .create_event(Some(&org("org-42")), sample_input("Launch Party", "music"), None)
            .await
            .unwrap();
        h.store.insert_session(sample_session(event.id, "Day 1")).await;
        h.store.insert_session(sample_session(event.id, "Day 2")).await;

        let detail = h.service.event_detail(&event.id.to_string()).await.unwrap();
        assert_eq!(detail.event.id, event.id);
        assert_eq!(detail.sessions.len(), 2);
        assert!(detail.tickets.is_empty());
    }

    #[tokio::test]
    async fn test_detail_includes_tickets() {
        let h = harness();
        let event = h
            .service
            .create_event(Some(&org("org-42")), sample_input("Launch Party", "music"), None)
            .await
            .unwrap();
        h.store
            .insert_ticket(Ticket {
                id: Uuid::new_v4(),
                event_id: event.id,
                session_id: None,
                name: "General".to_string(),
                price: Decimal::new(25000, 2),
                total_quantity: 100,
                available_quantity: 100,
            })
            .await;

        let detail = h.service.event_detail(&event.id.to_string()).await.unwrap();
        assert!(detail.sessions.is_empty());
        assert_eq!(detail.tickets.len(), 1);
        assert_eq!(detail.tickets[0].price, Decimal::new(25000, 2));
    }

    #[tokio::test]
    async fn test_detail_unknown_id_is_not_found() {
        let h = harness();
        let err = h
            .service
            .event_detail(&Uuid::new_v4().to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
