// src/adapters/postgres.rs
use crate::transaction::check_ordering;
use crate::{
    AssetEvent, EventStore, OrderingContext, Party, RecordedEvent, TrailError, TransactionRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use sqlx::Row;
use uuid::Uuid;

fn storage_err(e: sqlx::Error) -> TrailError {
    TrailError::Storage(e.to_string())
}

pub struct PostgresAdapter {
    pool: PgPool,
}

impl PostgresAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str) -> Result<Self, TrailError> {
        let pool = PgPool::connect(url).await.map_err(storage_err)?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Initialize the schema for the trail store.
    pub async fn init_schema(&self) -> Result<(), TrailError> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        // Records table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trail_records (
                id UUID PRIMARY KEY,
                recorded_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?;

        // Events table; seq preserves append order within and across records
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trail_events (
                seq BIGSERIAL PRIMARY KEY,
                event_id TEXT NOT NULL,
                record_id UUID NOT NULL REFERENCES trail_records(id),
                kind TEXT NOT NULL,
                author TEXT NOT NULL,
                participants TEXT[] NOT NULL,
                payload JSONB NOT NULL,
                recorded_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?;

        // Creation kinds are unique by natural id; property assignments recur
        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_trail_events_unique_id
            ON trail_events(event_id)
            WHERE kind <> 'asset_instance_property_set'
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_trail_events_event_id
            ON trail_events(event_id)
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_trail_events_author
            ON trail_events(author)
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_trail_events_recorded_at
            ON trail_events(recorded_at)
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?;

        // Ordering assignments frozen into each record
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trail_ordering (
                record_id UUID NOT NULL REFERENCES trail_records(id),
                topic TEXT NOT NULL,
                author TEXT NOT NULL,
                nonce BIGINT NOT NULL
            )
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?;

        // Stream heads for nonce assignment
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trail_nonces (
                topic TEXT NOT NULL,
                author TEXT NOT NULL,
                nonce BIGINT NOT NULL,
                PRIMARY KEY (topic, author)
            )
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?;

        tx.commit().await.map_err(storage_err)?;
        Ok(())
    }

    fn recorded_event_from_row(row: &sqlx::postgres::PgRow) -> Result<RecordedEvent, TrailError> {
        let event_id: String = row.try_get("event_id").map_err(storage_err)?;
        let record_id: Uuid = row.try_get("record_id").map_err(storage_err)?;
        let payload: Json<AssetEvent> = row.try_get("payload").map_err(storage_err)?;
        let recorded_at: DateTime<Utc> = row.try_get("recorded_at").map_err(storage_err)?;

        Ok(RecordedEvent::from_parts(
            event_id,
            record_id,
            payload.0,
            recorded_at,
        ))
    }

    async fn select_events(
        &self,
        where_clause: &str,
        bind: &str,
    ) -> Result<Vec<RecordedEvent>, TrailError> {
        let sql = format!(
            "SELECT event_id, record_id, payload, recorded_at FROM trail_events WHERE {} ORDER BY seq",
            where_clause
        );

        let rows = sqlx::query(&sql)
            .bind(bind)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;

        rows.iter().map(Self::recorded_event_from_row).collect()
    }
}

#[async_trait]
impl EventStore for PostgresAdapter {
    async fn record(&self, record: &TransactionRecord) -> Result<(), TrailError> {
        check_ordering(record)?;

        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        sqlx::query(
            r#"
            INSERT INTO trail_records (id, recorded_at)
            VALUES ($1, $2)
            "#,
        )
        .bind(record.id())
        .bind(record.recorded_at())
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?;

        for event in record.events() {
            let participants: Vec<String> = event
                .participants()
                .iter()
                .map(|p| p.name().to_string())
                .collect();

            let result = sqlx::query(
                r#"
                INSERT INTO trail_events (event_id, record_id, kind, author, participants, payload, recorded_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(event.natural_id())
            .bind(record.id())
            .bind(event.kind().as_str())
            .bind(event.author().name())
            .bind(&participants)
            .bind(Json(event))
            .bind(record.recorded_at())
            .execute(&mut *tx)
            .await;

            if let Err(e) = result {
                let duplicate = e
                    .as_database_error()
                    .is_some_and(|db| db.is_unique_violation());
                return Err(if duplicate {
                    TrailError::DuplicateEvent(event.natural_id())
                } else {
                    storage_err(e)
                });
            }
        }

        for ctx in record.ordering() {
            sqlx::query(
                r#"
                INSERT INTO trail_ordering (record_id, topic, author, nonce)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(record.id())
            .bind(ctx.topic())
            .bind(ctx.author().name())
            .bind(ctx.nonce() as i64)
            .execute(&mut *tx)
            .await
            .map_err(storage_err)?;
        }

        tx.commit().await.map_err(storage_err)?;
        Ok(())
    }

    async fn get_event(&self, event_id: &str) -> Result<RecordedEvent, TrailError> {
        let row = sqlx::query(
            r#"
            SELECT event_id, record_id, payload, recorded_at
            FROM trail_events
            WHERE event_id = $1
            ORDER BY seq DESC
            LIMIT 1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        match row {
            Some(row) => Self::recorded_event_from_row(&row),
            None => Err(TrailError::EventNotFound(event_id.to_string())),
        }
    }

    async fn get_record(&self, record_id: Uuid) -> Result<TransactionRecord, TrailError> {
        let record_row = sqlx::query(
            r#"
            SELECT recorded_at FROM trail_records WHERE id = $1
            "#,
        )
        .bind(record_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?
        .ok_or(TrailError::RecordNotFound(record_id))?;

        let recorded_at: DateTime<Utc> = record_row.try_get("recorded_at").map_err(storage_err)?;

        let event_rows = sqlx::query(
            r#"
            SELECT payload FROM trail_events WHERE record_id = $1 ORDER BY seq
            "#,
        )
        .bind(record_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        let mut events = Vec::with_capacity(event_rows.len());
        for row in &event_rows {
            let payload: Json<AssetEvent> = row.try_get("payload").map_err(storage_err)?;
            events.push(payload.0);
        }

        let ordering_rows = sqlx::query(
            r#"
            SELECT topic, author, nonce FROM trail_ordering WHERE record_id = $1 ORDER BY nonce
            "#,
        )
        .bind(record_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        let mut ordering = Vec::with_capacity(ordering_rows.len());
        for row in &ordering_rows {
            let topic: String = row.try_get("topic").map_err(storage_err)?;
            let author: String = row.try_get("author").map_err(storage_err)?;
            let nonce: i64 = row.try_get("nonce").map_err(storage_err)?;
            ordering.push(OrderingContext::with_nonce(
                topic,
                Party::new(author),
                nonce as u64,
            ));
        }

        Ok(TransactionRecord::from_parts(
            record_id,
            events,
            ordering,
            recorded_at,
        ))
    }

    async fn events_for_author(&self, author: &Party) -> Result<Vec<RecordedEvent>, TrailError> {
        self.select_events("author = $1", author.name()).await
    }

    async fn events_for_participant(
        &self,
        party: &Party,
    ) -> Result<Vec<RecordedEvent>, TrailError> {
        self.select_events("$1 = ANY(participants)", party.name())
            .await
    }

    async fn events_between(
        &self,
        timespan: &[DateTime<Utc>; 2],
    ) -> Result<Vec<RecordedEvent>, TrailError> {
        let rows = sqlx::query(
            r#"
            SELECT event_id, record_id, payload, recorded_at
            FROM trail_events
            WHERE recorded_at >= $1 AND recorded_at <= $2
            ORDER BY seq
            "#,
        )
        .bind(timespan[0])
        .bind(timespan[1])
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        rows.iter().map(Self::recorded_event_from_row).collect()
    }

    async fn next_nonce(&self, topic: &str, author: &Party) -> Result<u64, TrailError> {
        let row = sqlx::query(
            r#"
            INSERT INTO trail_nonces (topic, author, nonce)
            VALUES ($1, $2, 0)
            ON CONFLICT (topic, author)
            DO UPDATE SET nonce = trail_nonces.nonce + 1
            RETURNING nonce
            "#,
        )
        .bind(topic)
        .bind(author.name())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_err)?;

        let nonce: i64 = row.try_get("nonce").map_err(storage_err)?;
        Ok(nonce as u64)
    }
}
