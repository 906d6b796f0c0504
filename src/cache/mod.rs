//! Cache backends for serialized lookup records.
//!
//! Exactly one backend is active per process. [`CacheMode`] is built once at
//! startup from [`CacheSettings`] and shared read-only with every request:
//!
//! ```text
//! CacheMode (enum)
//!   ├── Remote(RedisCache)   <- one connection per call, dropped on return
//!   ├── File(FileCache)      <- one file per key inside a directory
//!   └── Disabled             <- always miss, always accept writes
//! ```
//!
//! A missing key is `Ok(None)`, never an error. Errors are reserved for
//! genuine backend failures; callers log them and carry on as on a miss.

use thiserror::Error;

use crate::config::CacheSettings;

pub mod file;
pub mod remote;

pub use self::file::FileCache;
pub use self::remote::RedisCache;

/// Failures talking to a cache backend.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("key {key:?} cannot be used as a cache file name")]
    InvalidKey { key: String },
}

/// The process-wide cache backend selection.
#[derive(Debug, Clone)]
pub enum CacheMode {
    Remote(RedisCache),
    File(FileCache),
    Disabled,
}

impl CacheMode {
    /// Builds the backend chosen by configuration.
    ///
    /// # Errors
    ///
    /// [`CacheError::Redis`] if the Redis URL cannot be parsed,
    /// [`CacheError::Io`] if the cache directory cannot be created.
    pub async fn from_settings(settings: &CacheSettings) -> Result<Self, CacheError> {
        match settings {
            CacheSettings::Remote { url } => Ok(Self::Remote(RedisCache::open(url)?)),
            CacheSettings::File { dir } => Ok(Self::File(FileCache::create(dir).await?)),
            CacheSettings::Disabled => Ok(Self::Disabled),
        }
    }

    /// Short backend name for log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Remote(_) => "redis",
            Self::File(_) => "file",
            Self::Disabled => "disabled",
        }
    }

    /// Fetches the bytes stored under `key`; `Ok(None)` when absent.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match self {
            Self::Remote(cache) => cache.get(key).await,
            Self::File(cache) => cache.get(key).await,
            Self::Disabled => Ok(None),
        }
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub async fn put(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        match self {
            Self::Remote(cache) => cache.put(key, value).await,
            Self::File(cache) => cache.put(key, value).await,
            Self::Disabled => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_always_misses() {
        let cache = CacheMode::from_settings(&CacheSettings::Disabled)
            .await
            .unwrap();
        assert_eq!(cache.name(), "disabled");
        cache.put("B000X", b"{}").await.unwrap();
        assert!(cache.get("B000X").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_settings_create_the_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("cache");
        let cache = CacheMode::from_settings(&CacheSettings::File { dir: dir.clone() })
            .await
            .unwrap();
        assert_eq!(cache.name(), "file");
        assert!(dir.is_dir());

        cache.put("B000X", b"{\"ASIN\":\"B000X\"}").await.unwrap();
        assert_eq!(
            cache.get("B000X").await.unwrap().as_deref(),
            Some(&b"{\"ASIN\":\"B000X\"}"[..])
        );
    }

    #[tokio::test]
    async fn remote_settings_reject_bad_urls() {
        let err = CacheMode::from_settings(&CacheSettings::Remote {
            url: "not a redis url".into(),
        })
        .await
        .unwrap_err();
        assert!(matches!(err, CacheError::Redis(_)));
    }

    #[tokio::test]
    async fn remote_settings_accept_valid_urls() {
        let cache = CacheMode::from_settings(&CacheSettings::Remote {
            url: "redis://127.0.0.1:6379/0".into(),
        })
        .await
        .unwrap();
        assert_eq!(cache.name(), "redis");
    }
}
