// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Secrets (the email hashing key) are injected as environment variables by
//! the deployment and read once at startup.

use std::env;
use std::time::Duration;

/// Deployment mode. Development mode attaches internal error detail to
/// 5xx responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

impl Environment {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            _ => Err(ConfigError::Invalid("APP_ENV", raw.to_string())),
        }
    }

    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}

/// Which `Store` implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Firestore,
    Memory,
}

impl StorageBackend {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("STORAGE_BACKEND", raw.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    pub environment: Environment,
    /// Frontend origin allowed by CORS
    pub frontend_url: String,
    pub storage_backend: StorageBackend,
    /// GCP project ID (Firestore backend)
    pub gcp_project_id: String,
    /// Identity provider domain; the token issuer is `https://{auth_domain}/`
    pub auth_domain: String,
    /// Expected `aud` claim of identity tokens
    pub auth_audience: String,
    /// Key for the keyed email digest (raw bytes)
    pub email_hash_key: Vec<u8>,
    /// How often the in-memory store purges expired entries
    pub expiry_sweep_interval: Duration,
    /// Buffered events per real-time channel
    pub relay_channel_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = match env::var("APP_ENV") {
            Ok(raw) => Environment::parse(&raw)?,
            Err(_) => Environment::Production,
        };
        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(raw) => StorageBackend::parse(&raw)?,
            Err(_) => StorageBackend::Firestore,
        };

        Ok(Self {
            port: parse_or("PORT", 8080)?,
            environment,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            storage_backend,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            auth_domain: required("AUTH_DOMAIN")?,
            auth_audience: required("AUTH_AUDIENCE")?,
            email_hash_key: required("EMAIL_HASH_KEY")?.into_bytes(),
            expiry_sweep_interval: Duration::from_secs(parse_or("EXPIRY_SWEEP_INTERVAL_SECS", 60)?),
            relay_channel_capacity: parse_or("RELAY_CHANNEL_CAPACITY", 100)?,
        })
    }

    /// Deterministic configuration for tests.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            environment: Environment::Development,
            frontend_url: "http://localhost:3000".to_string(),
            storage_backend: StorageBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            auth_domain: "campus-journal.test".to_string(),
            auth_audience: "https://api.campus-journal.test".to_string(),
            email_hash_key: b"test_email_hash_key_32_bytes_min!".to_vec(),
            expiry_sweep_interval: Duration::from_secs(60),
            relay_channel_capacity: 16,
        }
    }

    /// Token issuer derived from the identity provider domain.
    pub fn auth_issuer(&self) -> String {
        format!("https://{}/", self.auth_domain.trim_end_matches('/'))
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
