//! Application configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `HUBSPOT_ACCESS_TOKEN` - HubSpot private app token (only when `CRM_BACKEND=hubspot`)
//!
//! ## Optional
//! - `BOOKING_HOST` - Bind address (default: 127.0.0.1)
//! - `BOOKING_PORT` - Listen port (default: 3000)
//! - `CRM_BACKEND` - `hubspot` or `memory` (default: hubspot)
//! - `HUBSPOT_BASE_URL` - API base URL (default: https://api.hubapi.com)
//! - `SESSION_TIMEOUT_MINUTES` - Idle session lifetime (default: 30)
//! - `PAYMENT_SIMULATOR_OUTCOME` - Force every payment to `Pending`, `Paid` or `Failed`

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use chrono::Duration;
use secrecy::SecretString;
use thiserror::Error;

use crate::booking::PaymentStatus;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_HUBSPOT_BASE_URL: &str = "https://api.hubapi.com";
const DEFAULT_SESSION_TIMEOUT_MINUTES: i64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which contact store backs the service.
#[derive(Debug, Clone)]
pub enum CrmBackend {
    HubSpot(HubSpotConfig),
    Memory,
}

/// HubSpot API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct HubSpotConfig {
    pub access_token: SecretString,
    pub base_url: String,
}

impl std::fmt::Debug for HubSpotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubSpotConfig")
            .field("access_token", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Booking service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    pub crm: CrmBackend,
    pub session_timeout: Duration,
    pub payment_outcome: Option<PaymentStatus>,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = parse_or(get("BOOKING_HOST"), "BOOKING_HOST", || {
            IpAddr::from_str(DEFAULT_HOST).map_err(|e| e.to_string())
        })?;
        let port = parse_or(get("BOOKING_PORT"), "BOOKING_PORT", || Ok(DEFAULT_PORT))?;

        let crm = match get("CRM_BACKEND").as_deref().unwrap_or("hubspot") {
            "hubspot" => CrmBackend::HubSpot(HubSpotConfig {
                access_token: get("HUBSPOT_ACCESS_TOKEN")
                    .map(SecretString::from)
                    .ok_or_else(|| ConfigError::MissingEnvVar("HUBSPOT_ACCESS_TOKEN".into()))?,
                base_url: get("HUBSPOT_BASE_URL").unwrap_or_else(|| DEFAULT_HUBSPOT_BASE_URL.into()),
            }),
            "memory" => CrmBackend::Memory,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "CRM_BACKEND".into(),
                    format!("expected 'hubspot' or 'memory', got '{other}'"),
                ))
            }
        };

        let minutes: i64 = parse_or(get("SESSION_TIMEOUT_MINUTES"), "SESSION_TIMEOUT_MINUTES", || {
            Ok(DEFAULT_SESSION_TIMEOUT_MINUTES)
        })?;
        if minutes <= 0 {
            return Err(ConfigError::InvalidEnvVar(
                "SESSION_TIMEOUT_MINUTES".into(),
                "must be positive".into(),
            ));
        }

        let payment_outcome = get("PAYMENT_SIMULATOR_OUTCOME")
            .map(|raw| {
                PaymentStatus::from_str(raw.trim()).map_err(|e| {
                    ConfigError::InvalidEnvVar("PAYMENT_SIMULATOR_OUTCOME".into(), e.to_string())
                })
            })
            .transpose()?;

        Ok(Self {
            host,
            port,
            crm,
            session_timeout: Duration::minutes(minutes),
            payment_outcome,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or<T, D>(raw: Option<String>, key: &str, default: D) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    D: FnOnce() -> Result<T, String>,
{
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.into(), e.to_string())),
        None => default().map_err(|e| ConfigError::InvalidEnvVar(key.into(), e)),
    }
}
