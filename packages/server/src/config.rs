use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::moderation::DEFAULT_VISIBILITY_THRESHOLD;

/// Environment variable naming an alternative config file (without extension).
pub const CONFIG_PATH_ENV: &str = "VIDEOSTORE_CONFIG";

/// Longest accepted token lifetime: one year.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 366;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory of the filesystem object store.
    pub root: PathBuf,
    /// Largest accepted video payload, in bytes.
    pub max_blob_size: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModerationConfig {
    pub visibility_threshold: i32,
}

/// Account created (or promoted) on startup when both fields are set.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AdminConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub moderation: ModerationConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config/config".into());

        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("auth.token_ttl_hours", 24 * 7)?
            .set_default("storage.root", "./data/objects")?
            .set_default("storage.max_blob_size", 512 * 1024 * 1024_i64)?
            .set_default(
                "moderation.visibility_threshold",
                DEFAULT_VISIBILITY_THRESHOLD,
            )?
            .add_source(File::with_name(&file).required(false))
            // e.g. VIDEOSTORE__AUTH__JWT_SECRET
            .add_source(
                Environment::with_prefix("VIDEOSTORE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Message("auth.jwt_secret must not be empty".into()));
        }
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.auth.token_ttl_hours) {
            return Err(ConfigError::Message(format!(
                "auth.token_ttl_hours must be between 1 and {MAX_TOKEN_TTL_HOURS}"
            )));
        }
        if self.moderation.visibility_threshold < 0 {
            return Err(ConfigError::Message(
                "moderation.visibility_threshold must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Request body ceiling for uploads: payload limit plus form overhead.
    pub fn upload_body_limit(&self) -> usize {
        usize::try_from(self.storage.max_blob_size.saturating_add(1024 * 1024))
            .unwrap_or(usize::MAX)
    }
}
