//! PostgreSQL event repository.

use crate::convert::{address_from_text, address_to_text};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use ticketmint_core::{CoreError, EventId, EventRecord, EventRepository, Result};
use uuid::Uuid;

/// PostgreSQL-backed [`EventRepository`].
#[derive(Clone)]
pub struct PostgresEventRepository {
    pool: PgPool,
}

impl PostgresEventRepository {
    /// Create a repository over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_event(row: &sqlx::postgres::PgRow) -> Result<EventRecord> {
    let event_id: Uuid = row
        .try_get("event_id")
        .map_err(|e| CoreError::Persistence(e.to_string()))?;
    let contract: Option<String> = row
        .try_get("nft_contract_address")
        .map_err(|e| CoreError::Persistence(e.to_string()))?;
    let wallet: Option<String> = row
        .try_get("admin_wallet")
        .map_err(|e| CoreError::Persistence(e.to_string()))?;

    Ok(EventRecord {
        event_id: EventId::from_uuid(event_id),
        name: row
            .try_get("name")
            .map_err(|e| CoreError::Persistence(e.to_string()))?,
        nft_contract_address: contract.as_deref().map(address_from_text).transpose()?,
        admin_wallet: wallet.as_deref().map(address_from_text).transpose()?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| CoreError::Persistence(e.to_string()))?,
    })
}

#[async_trait]
impl EventRepository for PostgresEventRepository {
    async fn get(&self, event_id: EventId) -> Result<EventRecord> {
        let row = sqlx::query(
            r"
            SELECT event_id, name, nft_contract_address, admin_wallet, created_at
            FROM events
            WHERE event_id = $1
            ",
        )
        .bind(event_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CoreError::Persistence(format!("failed to get event: {e}")))?
        .ok_or_else(|| CoreError::not_found("Event", event_id))?;

        row_to_event(&row)
    }

    async fn insert(&self, event: &EventRecord) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO events (event_id, name, nft_contract_address, admin_wallet, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(event.event_id.as_uuid())
        .bind(&event.name)
        .bind(event.nft_contract_address.map(address_to_text))
        .bind(event.admin_wallet.map(address_to_text))
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return CoreError::Conflict(format!("event {} already exists", event.event_id));
                }
            }
            CoreError::Persistence(format!("failed to insert event: {e}"))
        })?;

        Ok(())
    }
}
