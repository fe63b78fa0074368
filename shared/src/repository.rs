//! Event persistence behind a repository trait.
//!
//! Handlers depend on the trait so tests can swap Postgres for the
//! in-memory implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Event, EventChanges, NewEvent};
use crate::{Error, Result};

const EVENT_COLUMNS: &str = "id, title, description, start_time, end_time, \
     all_day, color, location, recurrence, created_by, created_at, updated_at";

/// Storage operations for calendar events.
#[async_trait]
pub trait EventRepository: Send + Sync + 'static {
    /// Look up a single event.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>>;

    /// Events whose `[start, end)` interval intersects the given window.
    /// Both comparisons are strict, so an event that ends exactly when the
    /// window opens (or starts exactly when it closes) is excluded.
    async fn find_overlapping(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Event>>;

    /// All events, ordered by start time.
    async fn list_all(&self) -> Result<Vec<Event>>;

    /// Persist a new event and return it with its generated id and timestamps.
    async fn create(&self, new_event: NewEvent) -> Result<Event>;

    /// Apply the present fields of `changes`; `Error::NotFound` for unknown ids.
    async fn update(&self, id: Uuid, changes: EventChanges) -> Result<Event>;

    /// Remove an event; `Error::NotFound` for unknown ids.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// Postgres-backed repository.
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the events table and window index when missing.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id UUID PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                start_time TIMESTAMPTZ NOT NULL,
                end_time TIMESTAMPTZ NOT NULL,
                all_day BOOLEAN NOT NULL DEFAULT FALSE,
                color TEXT NOT NULL,
                location TEXT,
                recurrence TEXT,
                created_by UUID,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS events_window_idx ON events (start_time, end_time)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE id = $1",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    async fn find_overlapping(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE end_time > $1 AND start_time < $2 ORDER BY start_time, id",
            EVENT_COLUMNS
        ))
        .bind(window_start)
        .bind(window_end)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    async fn list_all(&self) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events ORDER BY start_time, id",
            EVENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    async fn create(&self, new_event: NewEvent) -> Result<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (
                id, title, description, start_time, end_time,
                all_day, color, location, recurrence, created_by
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&new_event.title)
        .bind(&new_event.description)
        .bind(new_event.start_time)
        .bind(new_event.end_time)
        .bind(new_event.all_day)
        .bind(&new_event.color)
        .bind(&new_event.location)
        .bind(&new_event.recurrence)
        .bind(new_event.created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    async fn update(&self, id: Uuid, changes: EventChanges) -> Result<Event> {
        // Build SET clauses dynamically based on which fields are present
        let mut updates = Vec::new();
        let mut param_num = 2;

        if changes.title.is_some() {
            updates.push(format!("title = ${}", param_num));
            param_num += 1;
        }
        if changes.description.is_some() {
            updates.push(format!("description = ${}", param_num));
            param_num += 1;
        }
        if changes.start_time.is_some() {
            updates.push(format!("start_time = ${}", param_num));
            param_num += 1;
        }
        if changes.end_time.is_some() {
            updates.push(format!("end_time = ${}", param_num));
            param_num += 1;
        }
        if changes.all_day.is_some() {
            updates.push(format!("all_day = ${}", param_num));
            param_num += 1;
        }
        if changes.color.is_some() {
            updates.push(format!("color = ${}", param_num));
            param_num += 1;
        }
        if changes.location.is_some() {
            updates.push(format!("location = ${}", param_num));
            param_num += 1;
        }
        if changes.recurrence.is_some() {
            updates.push(format!("recurrence = ${}", param_num));
        }

        updates.push("updated_at = NOW()".to_string());

        let query = format!(
            "UPDATE events SET {} WHERE id = $1 RETURNING {}",
            updates.join(", "),
            EVENT_COLUMNS
        );

        let mut query_builder = sqlx::query_as::<_, Event>(&query).bind(id);

        if let Some(ref title) = changes.title {
            query_builder = query_builder.bind(title);
        }
        if let Some(ref description) = changes.description {
            query_builder = query_builder.bind(description);
        }
        if let Some(start_time) = changes.start_time {
            query_builder = query_builder.bind(start_time);
        }
        if let Some(end_time) = changes.end_time {
            query_builder = query_builder.bind(end_time);
        }
        if let Some(all_day) = changes.all_day {
            query_builder = query_builder.bind(all_day);
        }
        if let Some(ref color) = changes.color {
            query_builder = query_builder.bind(color);
        }
        if let Some(ref location) = changes.location {
            query_builder = query_builder.bind(location);
        }
        if let Some(ref recurrence) = changes.recurrence {
            query_builder = query_builder.bind(recurrence);
        }

        query_builder
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("event {}", id)))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("event {}", id)));
        }

        Ok(())
    }
}

/// In-memory repository for tests and local runs without Postgres.
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    events: RwLock<HashMap<Uuid, Event>>,
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        Ok(self.events.read().await.get(&id).cloned())
    }

    async fn find_overlapping(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let events = self.events.read().await;
        let mut matching: Vec<Event> = events
            .values()
            .filter(|event| event.end_time > window_start && event.start_time < window_end)
            .cloned()
            .collect();
        matching.sort_by_key(|event| (event.start_time, event.id));
        Ok(matching)
    }

    async fn list_all(&self) -> Result<Vec<Event>> {
        let events = self.events.read().await;
        let mut all: Vec<Event> = events.values().cloned().collect();
        all.sort_by_key(|event| (event.start_time, event.id));
        Ok(all)
    }

    async fn create(&self, new_event: NewEvent) -> Result<Event> {
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            title: new_event.title,
            description: new_event.description,
            start_time: new_event.start_time,
            end_time: new_event.end_time,
            all_day: new_event.all_day,
            color: new_event.color,
            location: new_event.location,
            recurrence: new_event.recurrence,
            created_by: new_event.created_by,
            created_at: now,
            updated_at: now,
        };
        self.events.write().await.insert(event.id, event.clone());
        Ok(event)
    }

    async fn update(&self, id: Uuid, changes: EventChanges) -> Result<Event> {
        let mut events = self.events.write().await;
        let event = events
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("event {}", id)))?;

        if let Some(title) = changes.title {
            event.title = title;
        }
        if let Some(description) = changes.description {
            event.description = Some(description);
        }
        if let Some(start_time) = changes.start_time {
            event.start_time = start_time;
        }
        if let Some(end_time) = changes.end_time {
            event.end_time = end_time;
        }
        if let Some(all_day) = changes.all_day {
            event.all_day = all_day;
        }
        if let Some(color) = changes.color {
            event.color = color;
        }
        if let Some(location) = changes.location {
            event.location = Some(location);
        }
        if let Some(recurrence) = changes.recurrence {
            event.recurrence = Some(recurrence);
        }
        event.updated_at = Utc::now();

        Ok(event.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.events
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("event {}", id)))
    }
}
