//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SUPABASE_URL` - Identity/storage backend project URL. Its host is the
//!   only host the PDF proxy will fetch from.
//! - `SUPABASE_ANON_KEY` - Public API key sent with every backend call
//!
//! ## Optional
//! - `SITE_ORIGIN` - Public origin used for menu links and QR codes
//!   (default: derived from the request's `Host` header)
//! - `MENU_BUCKET` - Storage bucket holding menu PDFs (default: `menus`)
//! - `BIND_ADDR` - Listen address (default: `0.0.0.0:3000`)
//! - `UPSTREAM_TIMEOUT_SECS` - Upper bound on waiting for upstream response
//!   headers (default: 30)
//! - `MAX_UPLOAD_BYTES` - Request body cap for menu uploads (default: 10 MiB)

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::Url;
use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_BUCKET: &str = "menus";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(&'static str, String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// Backend project URL, e.g. `https://abc.supabase.co`
    pub backend_url: Url,
    pub backend_anon_key: SecretString,
    /// When unset, menu links are built from the incoming request.
    pub site_origin: Option<Url>,
    pub menu_bucket: String,
    pub upstream_timeout: Duration,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |name: &'static str| get(name).ok_or(ConfigError::MissingEnvVar(name));

        let backend_url = parse_origin("SUPABASE_URL", &require("SUPABASE_URL")?)?;
        let backend_anon_key = SecretString::from(require("SUPABASE_ANON_KEY")?);

        let site_origin = get("SITE_ORIGIN")
            .map(|raw| parse_origin("SITE_ORIGIN", &raw))
            .transpose()?;

        let menu_bucket = get("MENU_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string());
        if menu_bucket.contains('/') {
            return Err(ConfigError::InvalidEnvVar(
                "MENU_BUCKET",
                "bucket name must not contain '/'".to_string(),
            ));
        }

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("BIND_ADDR", e.to_string()))?;

        let upstream_timeout_secs = get("UPSTREAM_TIMEOUT_SECS")
            .map(|v| {
                v.parse::<u64>()
                    .map_err(|e| ConfigError::InvalidEnvVar("UPSTREAM_TIMEOUT_SECS", e.to_string()))
            })
            .transpose()?
            .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS);
        if upstream_timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "UPSTREAM_TIMEOUT_SECS",
                "must be greater than zero".to_string(),
            ));
        }

        let max_upload_bytes = get("MAX_UPLOAD_BYTES")
            .map(|v| {
                v.parse::<usize>()
                    .map_err(|e| ConfigError::InvalidEnvVar("MAX_UPLOAD_BYTES", e.to_string()))
            })
            .transpose()?
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        Ok(Self {
            bind_addr,
            backend_url,
            backend_anon_key,
            site_origin,
            menu_bucket,
            upstream_timeout: Duration::from_secs(upstream_timeout_secs),
            max_upload_bytes,
        })
    }

    /// Session cookies are only marked `Secure` when we know we're served over https.
    pub fn secure_cookies(&self) -> bool {
        self.site_origin
            .as_ref()
            .is_some_and(|origin| origin.scheme() == "https")
    }
}

fn parse_origin(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar(name, e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            name,
            "expected an http(s) URL with a host".to_string(),
        ));
    }
    Ok(url)
}
