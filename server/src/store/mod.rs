//! Document-style persistence for events and the sessions and tickets that
//! hang off them.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Event, EventFilter, EventPatch, Session, Ticket};

pub mod memory;
pub mod postgres;

pub use memory::MemoryEventStore;
pub use postgres::PgEventStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("event '{0}' not found")]
    NotFound(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Each call is a single, document-atomic operation against the backing store.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn create(&self, event: Event) -> Result<Event, StoreError>;

    /// Merges `patch` into the stored event and returns the result.
    async fn update_by_id(&self, id: Uuid, patch: &EventPatch) -> Result<Event, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Event, StoreError>;

    /// Events matching every criterion of `filter`, in storage order.
    async fn find(&self, filter: &EventFilter) -> Result<Vec<Event>, StoreError>;

    async fn sessions_for_event(&self, event_id: Uuid) -> Result<Vec<Session>, StoreError>;

    async fn tickets_for_event(&self, event_id: Uuid) -> Result<Vec<Ticket>, StoreError>;
}
