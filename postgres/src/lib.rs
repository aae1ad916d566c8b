//! # ticketmint-postgres
//!
//! PostgreSQL implementations of the ticketmint repository traits. Queries
//! are built at runtime with bound parameters so the crate compiles
//! without a live database; schema lives in `migrations/`.

mod convert;
pub mod events;
pub mod mint_queue;
pub mod tickets;

pub use events::PostgresEventRepository;
pub use mint_queue::PostgresMintQueue;
pub use tickets::PostgresTicketRepository;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use ticketmint_core::{CoreError, Result};

/// Bundle of all PostgreSQL-backed repositories sharing one pool.
#[derive(Clone)]
pub struct PostgresStores {
    /// Shared connection pool.
    pub pool: PgPool,
    /// Event read model.
    pub events: PostgresEventRepository,
    /// Ticket persistence.
    pub tickets: PostgresTicketRepository,
    /// Mint job queue.
    pub mint_queue: PostgresMintQueue,
}

impl PostgresStores {
    /// Connect to the database and build every repository.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the pool cannot be established.
    pub async fn connect(url: &str, max_connections: u32, connect_timeout: Duration) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(connect_timeout)
            .connect(url)
            .await
            .map_err(|e| CoreError::Persistence(format!("failed to connect: {e}")))?;

        Ok(Self::from_pool(pool))
    }

    /// Build the repositories over an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            events: PostgresEventRepository::new(pool.clone()),
            tickets: PostgresTicketRepository::new(pool.clone()),
            mint_queue: PostgresMintQueue::new(pool.clone()),
            pool,
        }
    }

    /// Run pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| CoreError::Persistence(format!("migration failed: {e}")))?;
        Ok(())
    }
}
