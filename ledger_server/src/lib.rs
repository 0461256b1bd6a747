//! # Cabinet ledger server
//! This crate hosts the HTTP server for the cabinet ledger. It is responsible for:
//! * Authenticating cabinets with access keys and keeping at most one session per cabinet.
//! * Exposing balances, orders, order requests, withdrawals and the merged history as JSON endpoints.
//! * Verifying Telegram logins and notifying the Telegram channel when a cabinet logs in from a new IP address.
//! * Sweeping idle sessions in the background.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/...`: Everything else. See [routes](routes/index.html).
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod middleware;
pub mod notifier;
pub mod routes;
pub mod server;
pub mod session_sweeper;

#[cfg(test)]
mod endpoint_tests;
