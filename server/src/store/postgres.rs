use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::models::{Event, EventFilter, EventPatch, Session, Ticket};
use crate::store::{EventStore, StoreError};

const EVENT_COLUMNS: &str = "id, title, description, house_number, ward, district, province, \
     event_type, image, status, organizer_id, created_at, updated_at";

pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("Successfully connected to database");
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!().run(&self.pool).await?;

        info!("Migrations run successfully");
        Ok(())
    }
}

fn find_query(filter: &EventFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {EVENT_COLUMNS} FROM events"));
    let mut clause = " WHERE ";

    if let Some(event_type) = &filter.event_type {
        builder.push(clause).push("event_type = ").push_bind(event_type.clone());
        clause = " AND ";
    }
    if let Some(organizer_id) = &filter.organizer_id {
        builder.push(clause).push("organizer_id = ").push_bind(organizer_id.clone());
    }

    builder.push(" ORDER BY created_at, id");
    builder
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn create(&self, event: Event) -> Result<Event, StoreError> {
        let sql = format!(
            "INSERT INTO events ({EVENT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {EVENT_COLUMNS}"
        );

        let stored = sqlx::query_as::<_, Event>(&sql)
            .bind(event.id)
            .bind(&event.title)
            .bind(&event.description)
            .bind(&event.location.house_number)
            .bind(&event.location.ward)
            .bind(&event.location.district)
            .bind(&event.location.province)
            .bind(&event.event_type)
            .bind(&event.image)
            .bind(&event.status)
            .bind(&event.organizer_id)
            .bind(event.created_at)
            .bind(event.updated_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(stored)
    }

    async fn update_by_id(&self, id: Uuid, patch: &EventPatch) -> Result<Event, StoreError> {
        let sql = format!(
            "UPDATE events SET \
                 title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 house_number = COALESCE($4, house_number), \
                 ward = COALESCE($5, ward), \
                 district = COALESCE($6, district), \
                 province = COALESCE($7, province), \
                 event_type = COALESCE($8, event_type), \
                 image = COALESCE($9, image), \
                 status = COALESCE($10, status), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {EVENT_COLUMNS}"
        );
        let location = patch.location.as_ref();

        sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .bind(patch.title.as_deref())
            .bind(patch.description.as_deref())
            .bind(location.map(|location| location.house_number.as_str()))
            .bind(location.map(|location| location.ward.as_str()))
            .bind(location.map(|location| location.district.as_str()))
            .bind(location.map(|location| location.province.as_str()))
            .bind(patch.event_type.as_deref())
            .bind(patch.image.as_deref())
            .bind(patch.status.as_deref())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Event, StoreError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");

        sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    async fn find(&self, filter: &EventFilter) -> Result<Vec<Event>, StoreError> {
        let events = find_query(filter)
            .build_query_as::<Event>()
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }

    async fn sessions_for_event(&self, event_id: Uuid) -> Result<Vec<Session>, StoreError> {
        let sessions = sqlx::query_as::<_, Session>(
            "SELECT id, event_id, name, start_time, end_time \
             FROM event_sessions WHERE event_id = $1 ORDER BY start_time, id",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    async fn tickets_for_event(&self, event_id: Uuid) -> Result<Vec<Ticket>, StoreError> {
        let tickets = sqlx::query_as::<_, Ticket>(
            "SELECT id, event_id, session_id, name, price, total_quantity, available_quantity \
             FROM event_tickets WHERE event_id = $1 ORDER BY id",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tickets)
    }
}
