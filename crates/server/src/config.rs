//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BRIDGE_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   the generic `DATABASE_URL`)
//!
//! ## Optional
//! - `BRIDGE_HOST` - Bind address (default: 0.0.0.0)
//! - `BRIDGE_PORT` - Listen port (default: 8000)
//! - `TILDA_SIGNING_SECRET` - HMAC secret for webhook signature checks;
//!   verification is skipped with a warning when unset
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sample rates
//!
//! ## Optional (Telegram - enables the bot webhook and notifications)
//! - `TELEGRAM_BOT_TOKEN` - Bot API token
//! - `TELEGRAM_BOT_USERNAME` - Bot username, used to build deep links
//! - `OPERATOR_CHAT_ID` - Chat id of the single operator
//! - `TELEGRAM_WEBHOOK_SECRET` - Secret token Telegram echoes on updates

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use tilda_bridge_core::ChatId;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Substrings that mark a secret as an unfilled placeholder.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "todo",
    "fixme",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Bridge application configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// `PostgreSQL` connection URL (contains password).
    pub database_url: SecretString,
    /// IP address to bind the server to.
    pub host: IpAddr,
    /// Port to listen on.
    pub port: u16,
    /// HMAC secret for Tilda webhook signatures, if verification is on.
    pub tilda_signing_secret: Option<SecretString>,
    /// Telegram configuration; `None` disables the bot and notifications.
    pub telegram: Option<TelegramConfig>,
    /// Sentry DSN for error tracking.
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "development", "production").
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0).
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0).
    pub sentry_traces_sample_rate: f32,
}

/// Telegram bot configuration.
///
/// Implements `Debug` manually to redact the token and webhook secret.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot API token.
    pub bot_token: SecretString,
    /// Bot username, used for `t.me` deep links.
    pub bot_username: String,
    /// Chat id of the single statically-configured operator.
    pub operator_chat_id: ChatId,
    /// Secret token Telegram sends back in the update webhook header.
    pub webhook_secret: Option<SecretString>,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .field("bot_username", &self.bot_username)
            .field("operator_chat_id", &self.operator_chat_id)
            .field("webhook_secret", &"[REDACTED]")
            .finish()
    }
}

impl TelegramConfig {
    /// Deep link that opens the bot chat with an order reference.
    #[must_use]
    pub fn deep_link(&self, external_order_id: &str) -> String {
        format!(
            "https://t.me/{}?start=order_{external_order_id}",
            self.bot_username
        )
    }

    /// Load Telegram configuration from environment.
    ///
    /// Returns `Ok(None)` when none of the Telegram variables are set,
    /// which disables the bot webhook and all notifications.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let bot_token = get_optional_env("TELEGRAM_BOT_TOKEN");
        let bot_username = get_optional_env("TELEGRAM_BOT_USERNAME");
        let operator_chat_id = get_optional_env("OPERATOR_CHAT_ID");

        let (token, username, operator) = match (bot_token, bot_username, operator_chat_id) {
            (Some(token), Some(username), Some(operator)) => (token, username, operator),
            (None, None, None) => return Ok(None),
            _ => {
                return Err(ConfigError::InvalidEnvVar(
                    "TELEGRAM_*".to_string(),
                    "TELEGRAM_BOT_TOKEN, TELEGRAM_BOT_USERNAME and OPERATOR_CHAT_ID \
                     must be set together"
                        .to_string(),
                ));
            }
        };

        let operator_chat_id = operator
            .parse::<i64>()
            .map(ChatId::new)
            .map_err(|e| ConfigError::InvalidEnvVar("OPERATOR_CHAT_ID".to_string(), e.to_string()))?;

        let webhook_secret = match get_optional_env("TELEGRAM_WEBHOOK_SECRET") {
            Some(secret) => {
                validate_secret_strength(&secret, "TELEGRAM_WEBHOOK_SECRET")?;
                Some(SecretString::from(secret))
            }
            None => None,
        };

        Ok(Some(Self {
            bot_token: SecretString::from(token),
            bot_username: username,
            operator_chat_id,
            webhook_secret,
        }))
    }
}

impl BridgeConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("BRIDGE_DATABASE_URL")?;
        let host = get_env_or_default("BRIDGE_HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("BRIDGE_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("BRIDGE_PORT", "8000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("BRIDGE_PORT".to_string(), e.to_string()))?;

        let tilda_signing_secret = match get_optional_env("TILDA_SIGNING_SECRET") {
            Some(secret) => {
                validate_secret_strength(&secret, "TILDA_SIGNING_SECRET")?;
                Some(SecretString::from(secret))
            }
            None => None,
        };

        let telegram = TelegramConfig::from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            database_url,
            host,
            port,
            tilda_signing_secret,
            telegram,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the Telegram configuration, if the bot is enabled.
    #[must_use]
    pub const fn telegram(&self) -> Option<&TelegramConfig> {
        self.telegram.as_ref()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get database URL with fallback to the generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // Secret length never exceeds f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= \
                 {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn entropy_of_repeated_char_is_zero() {
        assert!(shannon_entropy("aaaaaaaa").abs() < f64::EPSILON);
        assert!(shannon_entropy("").abs() < f64::EPSILON);
    }

    #[test]
    fn entropy_of_random_looking_secret_is_high() {
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#pQ7&") > MIN_ENTROPY_BITS_PER_CHAR);
    }

    #[test]
    fn placeholder_secrets_are_rejected() {
        assert!(validate_secret_strength("your-signing-key-here", "TEST").is_err());
        assert!(validate_secret_strength("changeme12345", "TEST").is_err());
    }

    #[test]
    fn low_entropy_secrets_are_rejected() {
        let err = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "TEST").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn strong_secrets_pass() {
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*", "TEST").is_ok());
    }

    #[test]
    fn deep_link_embeds_username_and_order() {
        let config = TelegramConfig {
            bot_token: SecretString::from("123:abc"),
            bot_username: "changcafe_bot".to_string(),
            operator_chat_id: ChatId::new(42),
            webhook_secret: None,
        };
        assert_eq!(
            config.deep_link("2067628905"),
            "https://t.me/changcafe_bot?start=order_2067628905"
        );
    }

    #[test]
    fn telegram_config_debug_redacts_token() {
        let config = TelegramConfig {
            bot_token: SecretString::from("123456:super-private-token"),
            bot_username: "changcafe_bot".to_string(),
            operator_chat_id: ChatId::new(42),
            webhook_secret: Some(SecretString::from("hush")),
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("changcafe_bot"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super-private-token"));
        assert!(!debug_output.contains("hush"));
    }

    #[test]
    fn socket_addr_combines_host_and_port() {
        let config = BridgeConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 8000,
            tilda_signing_secret: None,
            telegram: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        };
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8000);
    }
}
