//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check (in main)
//! GET  /health/ready            - Readiness check (in main)
//!
//! POST /api/webhook/tilda       - Inbound order webhook from Tilda
//! POST /api/telegram/updates    - Inbound Telegram bot updates
//! ```

pub mod telegram;
pub mod webhook;

use axum::Router;

use crate::state::AppState;

/// Build the application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(webhook::router())
        .merge(telegram::router())
}
