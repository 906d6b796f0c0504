//! Redis-backed cache: one string key per record.

use redis::AsyncCommands;

use super::CacheError;

/// A Redis cache holding a parsed connection target, not a connection.
///
/// Every [`get`](Self::get) and [`put`](Self::put) opens its own connection
/// and drops it before returning, so one request's connection trouble never
/// leaks into another's.
#[derive(Debug, Clone)]
pub struct RedisCache {
    client: redis::Client,
}

impl RedisCache {
    /// Parses `url` (e.g. `redis://host:6379/0`). Does not connect.
    pub fn open(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        Ok(Self { client })
    }

    /// `GET key`; a nil reply is `Ok(None)`.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    /// `SET key value`.
    pub async fn put(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let () = conn.set(key, value).await?;
        tracing::debug!(key, size = value.len(), "cached record in redis");
        Ok(())
    }
}
