//! Service configuration loaded from environment variables.
//!
//! | Variable            | Meaning                    | Default   |
//! |---------------------|----------------------------|-----------|
//! | `PAAPI_ACCESS_KEY`  | upstream access key        | required  |
//! | `PAAPI_SECRET_KEY`  | upstream secret key        | required  |
//! | `PAAPI_PARTNER_TAG` | associate / partner tag    | required  |
//! | `PAAPI_DOMAIN`      | regional domain code       | `JP`      |
//! | `PORT`              | listen port                | `8080`    |
//! | `CACHE_DIR`         | file cache directory       | unset     |
//! | `REDIS_URL`         | Redis connection URL       | unset     |
//!
//! Empty values are treated as unset.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::upstream::Region;

/// Configuration problems that prevent startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid PORT {value:?}: {source}")]
    InvalidPort {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("unknown PAAPI_DOMAIN {0:?}")]
    UnknownDomain(String),
}

/// Which cache backend to run with. Exactly one variant is active.
///
/// Redis wins over a directory when both are configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheSettings {
    Remote { url: String },
    File { dir: PathBuf },
    Disabled,
}

/// Credentials and region for the upstream catalog.
#[derive(Clone)]
pub struct UpstreamSettings {
    pub access_key: String,
    pub secret_key: String,
    pub partner_tag: String,
    pub region: Region,
}

// Keep the secret out of logs.
impl fmt::Debug for UpstreamSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamSettings")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("partner_tag", &self.partner_tag)
            .field("region", &self.region)
            .finish()
    }
}

/// Process-wide configuration, fixed at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on.
    pub port: u16,
    /// Upstream catalog credentials.
    pub upstream: UpstreamSettings,
    /// Selected cache backend.
    pub cache: CacheSettings,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| var(key).ok_or(ConfigError::Missing(key));

        let port = match var("PORT") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|source| ConfigError::InvalidPort { value, source })?,
            None => 8080,
        };

        let domain = var("PAAPI_DOMAIN").unwrap_or_else(|| "JP".into());
        let region = domain
            .parse::<Region>()
            .map_err(|_| ConfigError::UnknownDomain(domain.clone()))?;

        let upstream = UpstreamSettings {
            access_key: required("PAAPI_ACCESS_KEY")?,
            secret_key: required("PAAPI_SECRET_KEY")?,
            partner_tag: required("PAAPI_PARTNER_TAG")?,
            region,
        };

        let cache = match (var("REDIS_URL"), var("CACHE_DIR")) {
            (Some(url), _) => CacheSettings::Remote { url },
            (None, Some(dir)) => CacheSettings::File { dir: dir.into() },
            (None, None) => CacheSettings::Disabled,
        };

        Ok(Self {
            port,
            upstream,
            cache,
        })
    }

    /// Address the server binds to.
    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
