//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::BridgeConfig;
use crate::telegram::TelegramClient;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; provides access to the configuration, the
/// database pool, and the Telegram client. The client is constructed here
/// once and injected everywhere it is needed - never a process-wide global.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: BridgeConfig,
    pool: PgPool,
    telegram: Option<TelegramClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Builds the Telegram client when the bot is configured.
    #[must_use]
    pub fn new(config: BridgeConfig, pool: PgPool) -> Self {
        let telegram = config
            .telegram()
            .map(|telegram| TelegramClient::new(telegram.bot_token.clone()));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                telegram,
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the Telegram client, if the bot is configured.
    #[must_use]
    pub fn telegram(&self) -> Option<&TelegramClient> {
        self.inner.telegram.as_ref()
    }
}
