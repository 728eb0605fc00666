use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Event, EventFilter, EventPatch, Session, Ticket};
use crate::store::{EventStore, StoreError};

/// Process-local store that keeps documents in insertion order.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    events: RwLock<Vec<Event>>,
    sessions: RwLock<Vec<Session>>,
    tickets: RwLock<Vec<Ticket>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_session(&self, session: Session) {
        self.sessions.write().await.push(session);
    }

    pub async fn insert_ticket(&self, ticket: Ticket) {
        self.tickets.write().await.push(ticket);
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn create(&self, event: Event) -> Result<Event, StoreError> {
        self.events.write().await.push(event.clone());
        Ok(event)
    }

    async fn update_by_id(&self, id: Uuid, patch: &EventPatch) -> Result<Event, StoreError> {
        let mut events = self.events.write().await;
        let event = events
            .iter_mut()
            .find(|event| event.id == id)
            .ok_or(StoreError::NotFound(id))?;
        patch.apply_to(event);
        Ok(event.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Event, StoreError> {
        self.events
            .read()
            .await
            .iter()
            .find(|event| event.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn find(&self, filter: &EventFilter) -> Result<Vec<Event>, StoreError> {
        Ok(self
            .events
            .read()
            .await
            .iter()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect())
    }

    async fn sessions_for_event(&self, event_id: Uuid) -> Result<Vec<Session>, StoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .iter()
            .filter(|session| session.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn tickets_for_event(&self, event_id: Uuid) -> Result<Vec<Ticket>, StoreError> {
        Ok(self
            .tickets
            .read()
            .await
            .iter()
            .filter(|ticket| ticket.event_id == event_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_event, sample_session};

    #[tokio::test]
    async fn test_find_keeps_insertion_order() {
        let store = MemoryEventStore::new();
        let first = store.create(sample_event("org-1", "music")).await.unwrap();
        let second = store.create(sample_event("org-2", "sport")).await.unwrap();
        let third = store.create(sample_event("org-1", "music")).await.unwrap();

        let all = store.find(&EventFilter::default()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|event| event.id).collect();
        assert_eq!(ids, vec![first.id, second.id, third.id]);

        let mine = store.find(&EventFilter::by_organizer("org-1")).await.unwrap();
        assert_eq!(mine.len(), 2);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let store = MemoryEventStore::new();
        let id = Uuid::new_v4();
        let err = store
            .update_by_id(id, &EventPatch::status("published"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn test_update_merges_patch() {
        let store = MemoryEventStore::new();
        let event = store.create(sample_event("org-1", "music")).await.unwrap();

        let updated = store
            .update_by_id(event.id, &EventPatch::status("cancelled"))
            .await
            .unwrap();
        assert_eq!(updated.status, "cancelled");
        assert_eq!(updated.title, event.title);
        assert_eq!(store.find_by_id(event.id).await.unwrap().status, "cancelled");
    }

    #[tokio::test]
    async fn test_related_collections_are_scoped_to_event() {
        let store = MemoryEventStore::new();
        let event = store.create(sample_event("org-1", "music")).await.unwrap();
        store.insert_session(sample_session(event.id, "Day 1")).await;
        store.insert_session(sample_session(Uuid::new_v4(), "Other")).await;

        let sessions = store.sessions_for_event(event.id).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].name, "Day 1");
        assert!(store.tickets_for_event(event.id).await.unwrap().is_empty());
    }
}
