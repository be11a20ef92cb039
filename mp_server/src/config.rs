//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use mental_poker::{
    crypto::http::DEFAULT_CRYPTO_URL,
    room::{RoomConfig, SettlementPolicy},
};
use std::net::SocketAddr;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Card-crypto service base URL
    pub crypto_url: String,
    /// Settlement ledger base URL; settlements are only logged when unset
    pub ledger_url: Option<String>,
    /// Configuration for rooms created on demand
    pub room_defaults: RoomConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `crypto_url_override` - Optional card-crypto URL override (from CLI args)
    /// * `ledger_url_override` - Optional ledger URL override (from CLI args)
    ///
    /// # Returns
    ///
    /// * `Result<ServerConfig, ConfigError>` - Loaded configuration or error
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        crypto_url_override: Option<String>,
        ledger_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => std::env::var("SERVER_BIND")
                .unwrap_or_else(|_| "127.0.0.1:6969".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid {
                    var: "SERVER_BIND".to_string(),
                    reason: "Must be an IP:PORT address".to_string(),
                })?,
        };

        let crypto_url = crypto_url_override
            .or_else(|| std::env::var("CRYPTO_URL").ok())
            .unwrap_or_else(|| DEFAULT_CRYPTO_URL.to_string());

        let ledger_url = ledger_url_override
            .or_else(|| std::env::var("LEDGER_URL").ok())
            .filter(|url| !url.trim().is_empty());

        let settlement = match std::env::var("ROOM_SETTLEMENT") {
            Ok(policy) => policy.parse().map_err(|reason| ConfigError::Invalid {
                var: "ROOM_SETTLEMENT".to_string(),
                reason,
            })?,
            Err(_) => SettlementPolicy::HeadsUp,
        };

        let defaults = RoomConfig::default();
        let room_defaults = RoomConfig {
            max_seats: parse_env_or("ROOM_MAX_SEATS", defaults.max_seats),
            small_blind: parse_env_or("ROOM_SMALL_BLIND", defaults.small_blind),
            big_blind: parse_env_or("ROOM_BIG_BLIND", defaults.big_blind),
            action_timeout_secs: parse_env_or(
                "ROOM_ACTION_TIMEOUT_SECS",
                defaults.action_timeout_secs,
            ),
            idle_interval_secs: parse_env_or(
                "ROOM_IDLE_INTERVAL_SECS",
                defaults.idle_interval_secs,
            ),
            auto_start_players: parse_env_or(
                "ROOM_AUTO_START_PLAYERS",
                defaults.auto_start_players,
            ),
            default_buy_in: parse_env_or("ROOM_DEFAULT_BUY_IN", defaults.default_buy_in),
            settlement,
        };

        Ok(ServerConfig {
            bind,
            crypto_url,
            ledger_url,
            room_defaults,
        })
    }

    /// Validate configuration after loading
    ///
    /// # Returns
    ///
    /// * `Result<(), ConfigError>` - Success or validation error
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.crypto_url.starts_with("http://") && !self.crypto_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                var: "CRYPTO_URL".to_string(),
                reason: "Must be an http(s) URL".to_string(),
            });
        }

        if let Some(url) = &self.ledger_url
            && !url.starts_with("http://")
            && !url.starts_with("https://")
        {
            return Err(ConfigError::Invalid {
                var: "LEDGER_URL".to_string(),
                reason: "Must be an http(s) URL".to_string(),
            });
        }

        self.room_defaults
            .validate()
            .map_err(|reason| ConfigError::Invalid {
                var: "ROOM_*".to_string(),
                reason,
            })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:8080".parse().unwrap(),
            crypto_url: "http://127.0.0.1:8000".to_string(),
            ledger_url: None,
            room_defaults: RoomConfig::default(),
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid {
            var: "CRYPTO_URL".to_string(),
            reason: "Must be an http(s) URL".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("CRYPTO_URL"));
        assert!(msg.contains("http(s)"));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_big_blind_too_small() {
        let mut config = config();
        config.room_defaults.small_blind = 20;
        config.room_defaults.big_blind = 10;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_config_validation_rejects_non_http_ledger() {
        let mut config = config();
        config.ledger_url = Some("ftp://ledger".to_string());

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("LEDGER_URL"));
    }

    #[test]
    fn test_parse_env_or_falls_back() {
        assert_eq!(parse_env_or("MP_SERVER_TEST_UNSET_VARIABLE", 42u64), 42);
    }
}
