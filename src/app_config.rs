//! Application configuration from file and environment variables
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables (prefixed with COMPLAINTS_, sections split by `__`)
//! 2. Config file (config.toml)
//! 3. Default values
//!
//! Secrets like the database password and the token secret should be kept in
//! environment variables, not in the config file.

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::permission::CommentPolicy;
use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Global application configuration
pub static APP_CONFIG: Lazy<RwLock<AppConfig>> = Lazy::new(|| {
    RwLock::new(AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config file, using defaults: {}", e);
        AppConfig::default()
    }))
});

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL. Falls back to the DATABASE_URL environment variable.
    pub url: String,
    /// Create missing tables on startup
    pub bootstrap_schema: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            bootstrap_schema: true,
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 secret (should be in env var COMPLAINTS_AUTH__JWT_SECRET)
    pub jwt_secret: String,
    /// Bearer token lifetime in hours (default: 7 days)
    pub token_ttl_hours: i64,
    /// Honor the `role` field on self-registration. When false every new
    /// account is a resident.
    pub allow_role_selection: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_hours: 24 * 7,
            allow_role_selection: false,
        }
    }
}

/// Complaint listing and commenting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplaintsConfig {
    pub default_page_size: u64,
    pub max_page_size: u64,
    pub comment_policy: CommentPolicy,
}

impl Default for ComplaintsConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            comment_policy: CommentPolicy::AnyAuthenticated,
        }
    }
}

/// User directory listing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UsersConfig {
    pub default_page_size: u64,
    pub max_page_size: u64,
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub complaints: ComplaintsConfig,
    pub users: UsersConfig,
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        use config::FileFormat;

        let config = Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(File::new(path, FileFormat::Toml).required(false))
            // e.g., COMPLAINTS_SERVER__PORT, COMPLAINTS_AUTH__JWT_SECRET
            .add_source(
                Environment::with_prefix("COMPLAINTS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: AppConfig = config.try_deserialize()?;
        if app_config.database.url.is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                app_config.database.url = url;
            }
        }

        Ok(app_config)
    }
}

/// Initialize application configuration
///
/// This triggers the lazy loading of the config file and logs the result.
/// Should be called early in application startup.
pub fn init() {
    let config = get_config();
    log::info!(
        "Configuration loaded: listening on {}:{}, comment policy {:?}",
        config.server.host,
        config.server.port,
        config.complaints.comment_policy
    );
}

/// Get the current application configuration
pub fn get_config() -> AppConfig {
    APP_CONFIG.read().map(|c| c.clone()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.token_ttl_hours, 168);
        assert_eq!(config.complaints.default_page_size, 10);
        assert_eq!(config.complaints.max_page_size, 100);
    }

    #[test]
    fn test_comments_open_by_default() {
        let config = AppConfig::default();
        assert_eq!(
            config.complaints.comment_policy,
            CommentPolicy::AnyAuthenticated
        );
        assert!(!config.auth.allow_role_selection);
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut temp_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[server]
port = 9090

[database]
url = "sqlite://complaints.db?mode=rwc"

[auth]
token_ttl_hours = 12

[complaints]
max_page_size = 50
comment_policy = "match_read_scope"

[users]
default_page_size = 25
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(temp_file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.database.url, "sqlite://complaints.db?mode=rwc");
        assert_eq!(config.auth.token_ttl_hours, 12);
        assert_eq!(config.complaints.max_page_size, 50);
        assert_eq!(
            config.complaints.comment_policy,
            CommentPolicy::MatchReadScope
        );
        assert_eq!(config.users.default_page_size, 25);
        // Defaults should still apply for unspecified values
        assert_eq!(config.users.max_page_size, 100);
        assert_eq!(config.complaints.default_page_size, 10);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let config = AppConfig::load_from_path("/nonexistent/config.toml").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.complaints.default_page_size, 10);
    }
}
