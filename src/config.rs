//! Configuration module for podcastmg.

use serde::Deserialize;
use std::path::Path;

use crate::{PodcastMgError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins (empty = allow any origin without credentials).
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/podcastmg.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/podcastmg.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Feed fetching configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Maximum feed size in bytes.
    #[serde(default = "default_max_feed_size")]
    pub max_feed_size_bytes: u64,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,
    /// Maximum number of redirects.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Allow feeds served from loopback/private addresses.
    #[serde(default)]
    pub allow_private_hosts: bool,
}

fn default_max_feed_size() -> u64 {
    10 * 1024 * 1024 // 10MB, podcast feeds carry long back catalogues
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_total_timeout() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    5
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            max_feed_size_bytes: default_max_feed_size(),
            connect_timeout_secs: default_connect_timeout(),
            total_timeout_secs: default_total_timeout(),
            max_redirects: default_max_redirects(),
            allow_private_hosts: false,
        }
    }
}

/// Background podcast updater configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdaterConfig {
    /// Whether the updater runs.
    #[serde(default = "default_updater_enabled")]
    pub enabled: bool,
    /// Interval between update passes in seconds.
    #[serde(default = "default_update_interval")]
    pub interval_secs: u64,
    /// Number of feeds fetched concurrently.
    #[serde(default = "default_update_concurrency")]
    pub concurrency: usize,
}

fn default_updater_enabled() -> bool {
    true
}

fn default_update_interval() -> u64 {
    1800 // 30 minutes
}

fn default_update_concurrency() -> usize {
    4
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            enabled: default_updater_enabled(),
            interval_secs: default_update_interval(),
            concurrency: default_update_concurrency(),
        }
    }
}

/// Token signing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared secret used to sign HS256 tokens (must be set).
    #[serde(default)]
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    #[serde(default = "default_token_expiry")]
    pub token_expiry_secs: u64,
}

fn default_token_expiry() -> u64 {
    24 * 60 * 60 // 24 hours
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_expiry_secs: default_token_expiry(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Feed fetching configuration.
    #[serde(default)]
    pub feed: FeedConfig,
    /// Background updater configuration.
    #[serde(default)]
    pub updater: UpdaterConfig,
    /// Token configuration.
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(PodcastMgError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    ///
    /// A missing file yields the defaults. Any other read or parse error is
    /// returned.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = match Self::load(path) {
            Ok(config) => config,
            Err(PodcastMgError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| PodcastMgError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `PODCASTMG_JWT_SECRET`: token signing secret
    pub fn apply_env_overrides(&mut self) {
        if let Ok(jwt_secret) = std::env::var("PODCASTMG_JWT_SECRET") {
            if !jwt_secret.is_empty() {
                self.auth.jwt_secret = jwt_secret;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if the signing secret is empty or the token lifetime is zero.
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            return Err(PodcastMgError::Config(
                "jwt_secret is not set. \
                 Set it in config.toml, via --signing-secret or PODCASTMG_JWT_SECRET."
                    .to_string(),
            ));
        }
        if self.auth.token_expiry_secs == 0 {
            return Err(PodcastMgError::Config(
                "token_expiry_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert!(config.server.cors_origins.is_empty());

        assert_eq!(config.database.path, "data/podcastmg.db");
        assert_eq!(config.database.max_connections, 5);

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/podcastmg.log");

        assert_eq!(config.feed.max_feed_size_bytes, 10 * 1024 * 1024);
        assert_eq!(config.feed.connect_timeout_secs, 10);
        assert_eq!(config.feed.total_timeout_secs, 30);
        assert_eq!(config.feed.max_redirects, 5);
        assert!(!config.feed.allow_private_hosts);

        assert!(config.updater.enabled);
        assert_eq!(config.updater.interval_secs, 1800);
        assert_eq!(config.updater.concurrency, 4);

        assert!(config.auth.jwt_secret.is_empty());
        assert_eq!(config.auth.token_expiry_secs, 86400);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000
cors_origins = ["http://localhost:3000"]

[database]
path = "custom/podcasts.db"
max_connections = 2

[logging]
level = "debug"
file = "custom/logs/app.log"

[feed]
max_feed_size_bytes = 1048576
connect_timeout_secs = 5
total_timeout_secs = 15
max_redirects = 2
allow_private_hosts = true

[updater]
enabled = false
interval_secs = 600
concurrency = 8

[auth]
jwt_secret = "test-secret-key"
token_expiry_secs = 3600
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.cors_origins, vec!["http://localhost:3000"]);

        assert_eq!(config.database.path, "custom/podcasts.db");
        assert_eq!(config.database.max_connections, 2);

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, "custom/logs/app.log");

        assert_eq!(config.feed.max_feed_size_bytes, 1048576);
        assert_eq!(config.feed.connect_timeout_secs, 5);
        assert_eq!(config.feed.total_timeout_secs, 15);
        assert_eq!(config.feed.max_redirects, 2);
        assert!(config.feed.allow_private_hosts);

        assert!(!config.updater.enabled);
        assert_eq!(config.updater.interval_secs, 600);
        assert_eq!(config.updater.concurrency, 8);

        assert_eq!(config.auth.jwt_secret, "test-secret-key");
        assert_eq!(config.auth.token_expiry_secs, 3600);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[server]
port = 3000

[auth]
jwt_secret = "partial"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.jwt_secret, "partial");

        // Defaults
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.path, "data/podcastmg.db");
        assert_eq!(config.auth.token_expiry_secs, 86400);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.path, "data/podcastmg.db");
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("this is not valid toml [[[");

        match result {
            Err(PodcastMgError::Config(msg)) => assert!(msg.contains("config parse error")),
            other => panic!("Expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");
        assert!(matches!(result, Err(PodcastMgError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 4242\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.port, 4242);
    }

    #[test]
    fn test_load_with_env_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_with_env(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.port, ServerConfig::default().port);
        assert_eq!(config.database.path, DatabaseConfig::default().path);
    }

    #[test]
    fn test_load_with_env_rejects_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\nport = 4242\n").unwrap();

        match Config::load_with_env(&path) {
            Err(PodcastMgError::Config(msg)) => assert!(msg.contains("config parse error")),
            other => panic!("Expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_with_env_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 4242\n").unwrap();

        assert_eq!(Config::load_with_env(&path).unwrap().server.port, 4242);
    }

    #[test]
    fn test_apply_env_overrides() {
        let original = std::env::var("PODCASTMG_JWT_SECRET").ok();

        std::env::set_var("PODCASTMG_JWT_SECRET", "env-secret-key");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.auth.jwt_secret, "env-secret-key");

        // Empty value does not override
        std::env::set_var("PODCASTMG_JWT_SECRET", "");
        let mut config = Config::default();
        config.auth.jwt_secret = "original-secret".to_string();
        config.apply_env_overrides();
        assert_eq!(config.auth.jwt_secret, "original-secret");

        match original {
            Some(val) => std::env::set_var("PODCASTMG_JWT_SECRET", val),
            None => std::env::remove_var("PODCASTMG_JWT_SECRET"),
        }
    }

    #[test]
    fn test_validate_requires_secret() {
        let config = Config::default();
        match config.validate() {
            Err(PodcastMgError::Config(msg)) => assert!(msg.contains("jwt_secret")),
            other => panic!("Expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_zero_expiry() {
        let mut config = Config::default();
        config.auth.jwt_secret = "secret".to_string();
        config.auth.token_expiry_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ok() {
        let mut config = Config::default();
        config.auth.jwt_secret = "secret".to_string();
        assert!(config.validate().is_ok());
    }
}
