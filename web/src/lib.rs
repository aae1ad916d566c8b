//! # ticketmint-web
//!
//! Axum HTTP surface for the ticketmint platform: issuance, mint status,
//! retry, and guarded deletion endpoints over the pipeline services.
//!
//! Handlers hold no business logic: they parse requests, call the
//! injected services, and map domain errors to HTTP responses through
//! [`AppError`].

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::AppError;
pub use routes::build_router;
pub use state::AppState;
