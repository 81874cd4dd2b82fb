//! Library crate for kob-tracker, exposing modules for binaries and tests.

/// Runtime configuration loaded from `config/app.json`.
pub mod config;
/// Persistence: storage errors, entities and game stores.
pub mod dao;
mod dto;
mod error;
pub mod kob;
/// HTTP routers.
pub mod routes;
/// Business logic behind the routes.
pub mod services;
/// Shared application state.
pub mod state;
