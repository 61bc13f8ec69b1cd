use std::env;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub token: TokenConfig,
    #[serde(default)]
    pub password: PasswordConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

/// Credential store connection; without a URL the service runs unconfigured.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TokenConfig {
    pub secret: Option<String>,
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PasswordConfig {
    #[serde(default = "default_iterations")]
    pub iterations: u32,
}

/// Seed administrator created at startup when no admin exists.
#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,
    #[serde(default = "default_admin_email")]
    pub email: String,
    pub password: Option<String>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: None,
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            email: default_admin_email(),
            password: None,
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_ttl_seconds() -> i64 {
    auth::token::DEFAULT_TTL_SECONDS
}

fn default_iterations() -> u32 {
    auth::password::DEFAULT_ITERATIONS
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_email() -> String {
    "admin@vault.local".to_string()
}

impl TokenConfig {
    /// Configured signing secret, or the development fallback when unset or empty.
    pub fn secret_or_default(&self) -> &str {
        match self.secret.as_deref() {
            Some(secret) if !secret.is_empty() => secret,
            _ => auth::DEV_SECRET,
        }
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.secret_or_default() == auth::DEV_SECRET
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, TOKEN__SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .set_default("server.http_port", 8080)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: DATABASE__URL=postgres://... overrides database.url
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        configuration.try_deserialize()
    }
}
