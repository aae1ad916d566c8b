//! Ticketmint server.
//!
//! Wires the PostgreSQL stores, chain clients, pipeline services, and the
//! queue worker, then serves the HTTP API until Ctrl+C.

use std::sync::Arc;
use std::time::Duration;
use ticketmint_chain::{ContractConfig, IpfsMetadataStore, JsonRpcClient, TicketNftContract};
use ticketmint_issuance::{
    BlockchainMinter, MinterConfig, MintWorker, RetryCoordinator, StatusAggregator, TicketIssuer,
    WorkerConfig,
};
use ticketmint_postgres::PostgresStores;
use ticketmint_web::{build_router, AppState, Config};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ticketmint=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(
        postgres = %config.postgres.url,
        rpc = %config.chain.rpc_url,
        ipfs = %config.ipfs.api_url,
        mode = ?config.mint_mode(),
        "Configuration loaded"
    );

    // Persistence
    let stores = PostgresStores::connect(
        &config.postgres.url,
        config.postgres.max_connections,
        Duration::from_secs(config.postgres.connect_timeout),
    )
    .await?;
    stores.migrate().await?;
    tracing::info!("Database ready");

    let events = Arc::new(stores.events.clone());
    let tickets = Arc::new(stores.tickets.clone());
    let queue = Arc::new(stores.mint_queue.clone());

    // Chain collaborators
    let rpc = JsonRpcClient::new(config.chain.rpc_url.clone());
    let contract = Arc::new(TicketNftContract::new(
        rpc,
        ContractConfig {
            confirmation_timeout: Duration::from_secs(config.chain.confirmation_timeout),
            poll_interval: Duration::from_secs(config.chain.poll_interval),
        },
    ));
    let storage = Arc::new(IpfsMetadataStore::new(config.ipfs.api_url.clone()));

    // Pipeline services
    let minter = Arc::new(BlockchainMinter::new(
        events.clone() as _,
        tickets.clone() as _,
        queue.clone() as _,
        contract as _,
        storage as _,
        MinterConfig::default(),
    ));
    let issuer = Arc::new(TicketIssuer::new(
        events.clone() as _,
        tickets.clone() as _,
        queue.clone() as _,
        Arc::clone(&minter),
        config.mint_mode(),
    ));
    let retry = Arc::new(RetryCoordinator::new(queue.clone() as _));
    let status = Arc::new(StatusAggregator::new(
        tickets.clone() as _,
        queue.clone() as _,
    ));

    // Queue worker
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = Arc::new(MintWorker::new(
        queue.clone() as _,
        tickets.clone() as _,
        Arc::clone(&minter),
        WorkerConfig {
            poll_interval: Duration::from_secs(config.worker.poll_interval),
            batch_size: config.worker.batch_size,
            concurrency: config.worker.concurrency,
            stale_after: chrono::Duration::seconds(
                i64::try_from(config.worker.stale_after).unwrap_or(600),
            ),
        },
    ));
    let worker_handle = tokio::spawn(worker.run(shutdown_rx));

    // HTTP server
    let state = AppState {
        events: events as _,
        tickets: tickets as _,
        issuer,
        retry,
        status,
    };
    let router = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Ticketmint server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    tracing::info!("Shutting down");
    let _ = shutdown_tx.send(true);
    let _ = worker_handle.await;

    Ok(())
}
