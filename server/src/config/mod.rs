use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_STORAGE_ENDPOINT: &str = "http://127.0.0.1:9000";
const DEFAULT_STORAGE_BUCKET: &str = "events";
const DEFAULT_STORAGE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub public_base_url: String,
    pub access_token: Option<String>,
    pub signing_secret: String,
    /// Expiry stamped on every minted image URL.
    pub url_expires_at: DateTime<Utc>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub max_upload_bytes: usize,
    pub cors_allowed_origins: Option<String>,
    pub production: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cors_allowed_origins: None,
            production: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub storage: StorageConfig,
    pub http: HttpConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source. Blank values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let endpoint =
            get("STORAGE_ENDPOINT").unwrap_or_else(|| DEFAULT_STORAGE_ENDPOINT.to_string());

        let storage = StorageConfig {
            public_base_url: get("STORAGE_PUBLIC_BASE_URL").unwrap_or_else(|| endpoint.clone()),
            endpoint,
            bucket: get("STORAGE_BUCKET").unwrap_or_else(|| DEFAULT_STORAGE_BUCKET.to_string()),
            access_token: get("STORAGE_ACCESS_TOKEN"),
            signing_secret: get("STORAGE_SIGNING_SECRET").unwrap_or_else(|| jwt_secret.clone()),
            url_expires_at: match get("IMAGE_URL_EXPIRES_AT") {
                Some(value) => DateTime::parse_from_rfc3339(&value)
                    .map(|value| value.with_timezone(&Utc))
                    .map_err(|err| ConfigError::Invalid {
                        name: "IMAGE_URL_EXPIRES_AT",
                        reason: err.to_string(),
                    })?,
                None => default_url_expiry()?,
            },
            timeout_secs: parse_or(
                "STORAGE_TIMEOUT_SECS",
                get("STORAGE_TIMEOUT_SECS"),
                DEFAULT_STORAGE_TIMEOUT_SECS,
            )?,
        };

        let http = HttpConfig {
            max_upload_bytes: parse_or(
                "MAX_UPLOAD_BYTES",
                get("MAX_UPLOAD_BYTES"),
                DEFAULT_MAX_UPLOAD_BYTES,
            )?,
            cors_allowed_origins: get("CORS_ALLOWED_ORIGINS"),
            production: get("RUST_ENV")
                .map(|value| value.to_lowercase() == "production")
                .unwrap_or(false),
        };

        Ok(Self {
            bind_addr: parse_value(
                "BIND_ADDR",
                &get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            )?,
            database_url: get("DATABASE_URL"),
            database_max_connections: parse_or(
                "DATABASE_MAX_CONNECTIONS",
                get("DATABASE_MAX_CONNECTIONS"),
                DEFAULT_MAX_CONNECTIONS,
            )?,
            jwt_secret,
            storage,
            http,
        })
    }
}

fn parse_or<T>(name: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => parse_value(name, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|err: T::Err| ConfigError::Invalid {
        name,
        reason: err.to_string(),
    })
}

fn default_url_expiry() -> Result<DateTime<Utc>, ConfigError> {
    Utc.with_ymd_and_hms(2030, 3, 1, 0, 0, 0)
        .single()
        .ok_or(ConfigError::Invalid {
            name: "IMAGE_URL_EXPIRES_AT",
            reason: "default expiry is not a valid instant".to_string(),
        })
}
