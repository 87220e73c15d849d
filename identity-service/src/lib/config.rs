use std::env;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub encryption: EncryptionConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

/// Token signing settings.
#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    /// Base64 encoded HS256 secret, at least 32 bytes once decoded
    pub secret: String,
    #[serde(default = "default_token_validity_minutes")]
    pub token_validity_minutes: i64,
}

/// Transport envelope settings.
#[derive(Deserialize, Clone)]
pub struct EncryptionConfig {
    /// Base64 encoded AES-256 key, exactly 32 bytes once decoded
    pub secret: String,
}

/// Paths the authentication gate lets through untouched.
///
/// Entries are exact paths or prefixes ending in `/**`.
#[derive(Debug, Deserialize, Clone)]
pub struct SecurityConfig {
    pub public_paths: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            public_paths: vec!["/api/auth/login".to_string(), "/health".to_string()],
        }
    }
}

// Secrets stay out of debug output.
impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("token_validity_minutes", &self.token_validity_minutes)
            .finish()
    }
}

impl std::fmt::Debug for EncryptionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionConfig")
            .field("secret", &"<redacted>")
            .finish()
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_token_validity_minutes() -> i64 {
    60
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, JWT__SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: ENCRYPTION__SECRET=... overrides encryption.secret
            .add_source(Environment::default().separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        if config.jwt.token_validity_minutes <= 0 {
            return Err(ConfigError::Message(
                "jwt.token_validity_minutes must be positive".to_string(),
            ));
        }

        Ok(config)
    }
}
