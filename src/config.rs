use std::env;
use std::str::FromStr;

use dotenvy::dotenv;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("IDENTITY_API_URL and IDENTITY_API_KEY must be set together")]
    PartialIdentityConfig,
}

/// Where caller profiles come from.
#[derive(Clone, Debug, PartialEq)]
pub struct IdentityApiConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    /// Unset means the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub identity_api: Option<IdentityApiConfig>,

    // Rate limiting
    pub rate_protected_per_min: u32,
    pub rate_write_per_min: u32,

    pub api_prefix: String,
    /// Identity-provider user ids allowed to act through `X-Manager-Override`.
    pub manager_override_user_ids: Vec<String>,
    pub seed_demo_data: bool,

    pub log_dir: String,
    pub log_level: String,
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn optional(key: &'static str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

/// Split a comma list, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let identity_api = match (optional("IDENTITY_API_URL"), optional("IDENTITY_API_KEY")) {
            (Some(base_url), Some(api_key)) => Some(IdentityApiConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key,
            }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialIdentityConfig),
        };

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: optional("DATABASE_URL"),
            jwt_secret: required("JWT_SECRET")?,
            identity_api,

            rate_protected_per_min: parsed("RATE_PROTECTED_PER_MIN", 1000)?,
            rate_write_per_min: parsed("RATE_WRITE_PER_MIN", 120)?,

            api_prefix: optional("API_PREFIX").unwrap_or_else(|| "/api".to_string()),
            manager_override_user_ids: optional("MANAGER_OVERRIDE_USER_IDS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            seed_demo_data: parsed("SEED_DEMO_DATA", false)?,

            log_dir: optional("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            log_level: optional("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Minimal configuration for tests and embedded use.
    pub fn for_tests(jwt_secret: impl Into<String>) -> Self {
        Self {
            server_addr: "127.0.0.1:0".to_string(),
            database_url: None,
            jwt_secret: jwt_secret.into(),
            identity_api: None,
            rate_protected_per_min: 1000,
            rate_write_per_min: 1000,
            api_prefix: "/api".to_string(),
            manager_override_user_ids: Vec::new(),
            seed_demo_data: false,
            log_dir: "logs".to_string(),
            log_level: "debug".to_string(),
        }
    }

    pub fn may_override_manager(&self, user_id: &str) -> bool {
        self.manager_override_user_ids.iter().any(|id| id == user_id)
    }
}
