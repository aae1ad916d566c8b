//! PostgreSQL ticket repository.
//!
//! Batch issuance runs in a single transaction so a request either creates
//! every ticket or none; the unique `(event_id, ticket_number)` constraint
//! turns an allocation race into a `Conflict` instead of a silent gap or
//! duplicate. Deletion guards are expressed inside the DELETE statements
//! themselves so a concurrent mint cannot slip between check and delete.

use crate::convert::{token_id_from_text, token_id_to_text};
use async_trait::async_trait;
use chrono::Utc;
use primitive_types::U256;
use sqlx::{PgPool, Row};
use ticketmint_core::{
    CoreError, EventId, MintStatus, NewTicket, Result, Ticket, TicketId, TicketRepository,
    TicketStatus, TicketStatusCounts,
};
use uuid::Uuid;

/// PostgreSQL-backed [`TicketRepository`].
#[derive(Clone)]
pub struct PostgresTicketRepository {
    pool: PgPool,
}

impl PostgresTicketRepository {
    /// Create a repository over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(context: &str, e: impl std::fmt::Display) -> CoreError {
    CoreError::Persistence(format!("{context}: {e}"))
}

fn row_to_ticket(row: &sqlx::postgres::PgRow) -> Result<Ticket> {
    let ticket_id: Uuid = row.try_get("ticket_id").map_err(|e| db_err("ticket row", e))?;
    let event_id: Uuid = row.try_get("event_id").map_err(|e| db_err("ticket row", e))?;
    let ticket_status: String = row
        .try_get("ticket_status")
        .map_err(|e| db_err("ticket row", e))?;
    let mint_status: String = row
        .try_get("nft_mint_status")
        .map_err(|e| db_err("ticket row", e))?;
    let token_id: Option<String> = row
        .try_get("nft_token_id")
        .map_err(|e| db_err("ticket row", e))?;
    let metadata: serde_json::Value = row
        .try_get("nft_metadata")
        .map_err(|e| db_err("ticket row", e))?;

    Ok(Ticket {
        ticket_id: TicketId::from_uuid(ticket_id),
        event_id: EventId::from_uuid(event_id),
        ticket_number: row
            .try_get("ticket_number")
            .map_err(|e| db_err("ticket row", e))?,
        total_tickets_in_group: row
            .try_get("total_tickets_in_group")
            .map_err(|e| db_err("ticket row", e))?,
        ticket_status: TicketStatus::parse(&ticket_status)?,
        nft_mint_status: MintStatus::parse(&mint_status)?,
        nft_token_id: token_id.as_deref().map(token_id_from_text).transpose()?,
        nft_metadata: serde_json::from_value(metadata)
            .map_err(|e| db_err("ticket metadata", e))?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| db_err("ticket row", e))?,
    })
}

const TICKET_COLUMNS: &str = r"ticket_id, event_id, ticket_number, total_tickets_in_group,
       ticket_status, nft_mint_status, nft_token_id, nft_metadata, created_at";

#[async_trait]
impl TicketRepository for PostgresTicketRepository {
    async fn get(&self, ticket_id: TicketId) -> Result<Ticket> {
        let row = sqlx::query(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE ticket_id = $1"
        ))
        .bind(ticket_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("failed to get ticket", e))?
        .ok_or_else(|| CoreError::not_found("Ticket", ticket_id))?;

        row_to_ticket(&row)
    }

    async fn max_ticket_number(&self, event_id: EventId) -> Result<i64> {
        let (max,): (i64,) = sqlx::query_as(
            r"
            SELECT COALESCE(MAX(ticket_number), 0)
            FROM tickets
            WHERE event_id = $1
            ",
        )
        .bind(event_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("failed to read max ticket number", e))?;

        Ok(max)
    }

    async fn insert_batch(&self, tickets: &[NewTicket]) -> Result<Vec<Ticket>> {
        if tickets.is_empty() {
            return Err(CoreError::Validation("empty ticket batch".to_string()));
        }

        let created_at = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_err("failed to open transaction", e))?;

        let mut created = Vec::with_capacity(tickets.len());
        for draft in tickets {
            let metadata = serde_json::to_value(&draft.nft_metadata)
                .map_err(|e| db_err("metadata encoding", e))?;

            sqlx::query(
                r"
                INSERT INTO tickets (
                    ticket_id, event_id, ticket_number, total_tickets_in_group,
                    ticket_status, nft_mint_status, nft_metadata, created_at
                ) VALUES ($1, $2, $3, $4, 'valid', 'pending', $5, $6)
                ",
            )
            .bind(draft.ticket_id.as_uuid())
            .bind(draft.event_id.as_uuid())
            .bind(draft.ticket_number)
            .bind(draft.total_tickets_in_group)
            .bind(&metadata)
            .bind(created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db) = &e {
                    if db.is_unique_violation() {
                        return CoreError::Conflict(format!(
                            "ticket number {} already allocated for event {}",
                            draft.ticket_number, draft.event_id
                        ));
                    }
                }
                db_err("batch insert failed", e)
            })?;

            created.push(Ticket {
                ticket_id: draft.ticket_id,
                event_id: draft.event_id,
                ticket_number: draft.ticket_number,
                total_tickets_in_group: draft.total_tickets_in_group,
                ticket_status: TicketStatus::Valid,
                nft_mint_status: MintStatus::Pending,
                nft_token_id: None,
                nft_metadata: draft.nft_metadata.clone(),
                created_at,
            });
        }

        tx.commit()
            .await
            .map_err(|e| db_err("failed to commit batch", e))?;

        tracing::info!(
            event_id = %tickets[0].event_id,
            count = created.len(),
            first_number = created[0].ticket_number,
            "Ticket batch persisted"
        );
        metrics::counter!("tickets.issued").increment(created.len() as u64);

        Ok(created)
    }

    async fn list_by_event(&self, event_id: EventId) -> Result<Vec<Ticket>> {
        let rows = sqlx::query(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE event_id = $1 ORDER BY ticket_number"
        ))
        .bind(event_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("failed to list tickets", e))?;

        rows.iter().map(row_to_ticket).collect()
    }

    async fn status_counts(&self, event_id: EventId) -> Result<TicketStatusCounts> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r"
            SELECT nft_mint_status, COUNT(*)
            FROM tickets
            WHERE event_id = $1
            GROUP BY nft_mint_status
            ",
        )
        .bind(event_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("failed to count tickets", e))?;

        let mut counts = TicketStatusCounts::default();
        for (status, count) in rows {
            let count = u64::try_from(count).unwrap_or(0);
            counts.total += count;
            match MintStatus::parse(&status)? {
                MintStatus::Minted | MintStatus::Transferred => counts.minted += count,
                MintStatus::Pending => counts.pending += count,
                MintStatus::Failed => counts.failed += count,
            }
        }

        Ok(counts)
    }

    async fn mark_minted(&self, outcomes: &[(TicketId, U256)]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_err("failed to open transaction", e))?;

        for (ticket_id, token_id) in outcomes {
            let result = sqlx::query(
                r"
                UPDATE tickets
                SET nft_mint_status = 'minted', nft_token_id = $2
                WHERE ticket_id = $1
                ",
            )
            .bind(ticket_id.as_uuid())
            .bind(token_id_to_text(*token_id))
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("failed to record mint", e))?;

            if result.rows_affected() == 0 {
                return Err(CoreError::not_found("Ticket", ticket_id));
            }
        }

        tx.commit()
            .await
            .map_err(|e| db_err("failed to commit mint outcome", e))?;

        metrics::counter!("tickets.minted").increment(outcomes.len() as u64);

        Ok(())
    }

    async fn mark_failed(&self, ticket_ids: &[TicketId]) -> Result<()> {
        let ids: Vec<Uuid> = ticket_ids.iter().map(|id| *id.as_uuid()).collect();

        // Minted tickets are immutable; the guard keeps a late failure
        // report from downgrading a confirmed token.
        sqlx::query(
            r"
            UPDATE tickets
            SET nft_mint_status = 'failed'
            WHERE ticket_id = ANY($1)
              AND nft_mint_status IN ('pending', 'failed')
            ",
        )
        .bind(&ids)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("failed to record mint failure", e))?;

        metrics::counter!("tickets.mint_failed").increment(ticket_ids.len() as u64);

        Ok(())
    }

    async fn delete(&self, ticket_id: TicketId) -> Result<()> {
        let result = sqlx::query(
            r"
            DELETE FROM tickets
            WHERE ticket_id = $1
              AND nft_mint_status IN ('pending', 'failed')
            ",
        )
        .bind(ticket_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("failed to delete ticket", e))?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        // Nothing deleted: distinguish a missing ticket from a minted one.
        let exists: Option<(String,)> =
            sqlx::query_as("SELECT nft_mint_status FROM tickets WHERE ticket_id = $1")
                .bind(ticket_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_err("failed to inspect ticket", e))?;

        match exists {
            Some((status,)) => Err(CoreError::Conflict(format!(
                "ticket {ticket_id} is {status} and cannot be deleted"
            ))),
            None => Err(CoreError::not_found("Ticket", ticket_id)),
        }
    }

    async fn delete_by_event(&self, event_id: EventId) -> Result<u64> {
        let result = sqlx::query(
            r"
            DELETE FROM tickets
            WHERE event_id = $1
              AND nft_mint_status IN ('pending', 'failed')
            ",
        )
        .bind(event_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("failed to delete tickets", e))?;

        Ok(result.rows_affected())
    }
}
