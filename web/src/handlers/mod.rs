//! HTTP handlers for the ticketmint API.

pub mod health;
pub mod mint;
pub mod tickets;
