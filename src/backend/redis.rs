//! Redis cache backend implementation.

use super::{CacheBackend, Expiry, KeyType};
use crate::error::{Error, Result};
use deadpool_redis::{Config, Connection, Pool, Runtime};
use redis::AsyncCommands;
use std::collections::HashMap;
use std::time::Duration;

/// Default Redis connection pool size.
/// Override with REDIS_POOL_SIZE environment variable
const DEFAULT_POOL_SIZE: u32 = 16;

const DEFAULT_URL: &str = "redis://127.0.0.1:6379";

/// Configuration for the Redis backend.
#[derive(Clone, Debug)]
pub struct RedisConfig {
    pub url: String, // e.g., "redis://localhost:6379/0"
    pub connection_timeout: Duration,
    pub pool_size: u32,
}

impl Default for RedisConfig {
    fn default() -> Self {
        RedisConfig {
            url: DEFAULT_URL.to_string(),
            connection_timeout: Duration::from_secs(5),
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl RedisConfig {
    /// Defaults overridden by `REDIS_URL` and `REDIS_POOL_SIZE`.
    pub fn from_env() -> Self {
        let mut config = RedisConfig::default();
        if let Ok(url) = std::env::var("REDIS_URL") {
            config.url = url;
        }
        if let Some(size) = std::env::var("REDIS_POOL_SIZE")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
        {
            config.pool_size = size;
        }
        config
    }
}

/// Redis backend over a `deadpool-redis` connection pool.
///
/// # Example
///
/// ```no_run
/// # use field_cache::backend::{CacheBackend, RedisBackend, RedisConfig};
/// # use field_cache::error::Result;
/// # async fn example() -> Result<()> {
/// let backend = RedisBackend::new(RedisConfig::from_env()).await?;
/// backend.set("key", "value".to_string()).await?;
/// let value = backend.get("key").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisBackend {
    pool: Pool,
}

impl RedisBackend {
    /// Create new Redis backend from configuration.
    ///
    /// # Errors
    /// Returns `Err` if the URL is invalid or the pool cannot be built
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let pool = Config::from_url(config.url.clone())
            .builder()
            .map_err(|e| Error::ConfigError(format!("Invalid Redis configuration: {}", e)))?
            .max_size(config.pool_size as usize)
            .wait_timeout(Some(config.connection_timeout))
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to create connection pool: {}", e)))?;

        info!(
            "✓ Redis backend initialized for {} (pool size: {})",
            config.url, config.pool_size
        );

        Ok(RedisBackend { pool })
    }

    /// Create from a URL with the default pool settings.
    ///
    /// # Errors
    /// Returns `Err` if connection pool creation fails
    pub async fn from_url(url: impl Into<String>) -> Result<Self> {
        Self::new(RedisConfig {
            url: url.into(),
            ..RedisConfig::from_env()
        })
        .await
    }

    async fn conn(&self) -> Result<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| Error::BackendError(format!("Failed to get Redis connection: {}", e)))
    }
}

fn command_error(command: &str, key: &str, e: redis::RedisError) -> Error {
    Error::BackendError(format!("Redis {} failed for key {}: {}", command, key, e))
}

/// Milliseconds for `PEXPIRE`, rejecting durations Redis cannot represent.
fn ttl_millis(key: &str, ttl: Duration) -> Result<i64> {
    i64::try_from(ttl.as_millis()).map_err(|_| {
        Error::BackendError(format!("ERR invalid expire time {:?} for {}", ttl, key))
    })
}

impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn().await?;
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| command_error("GET", key, e))?;

        debug!(
            "✓ Redis GET {} -> {}",
            key,
            if value.is_some() { "HIT" } else { "MISS" }
        );
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: () = conn
            .set(key, value)
            .await
            .map_err(|e| command_error("SET", key, e))?;

        debug!("✓ Redis SET {}", key);
        Ok(())
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        let mut conn = self.conn().await?;
        let fields: HashMap<String, String> = conn
            .hgetall(key)
            .await
            .map_err(|e| command_error("HGETALL", key, e))?;

        debug!("✓ Redis HGETALL {} -> {} fields", key, fields.len());
        Ok(fields)
    }

    async fn hset_multiple(&self, key: &str, fields: &[(String, String)]) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: () = conn
            .hset_multiple(key, fields)
            .await
            .map_err(|e| command_error("HSET", key, e))?;

        debug!("✓ Redis HSET {} ({} fields)", key, fields.len());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn().await?;
        let removed: i64 = conn
            .del(key)
            .await
            .map_err(|e| command_error("DEL", key, e))?;

        debug!("✓ Redis DEL {} (removed: {})", key, removed);
        Ok(removed > 0)
    }

    async fn key_type(&self, key: &str) -> Result<KeyType> {
        let mut conn = self.conn().await?;
        let code: String = conn
            .key_type(key)
            .await
            .map_err(|e| command_error("TYPE", key, e))?;

        Ok(KeyType::from_code(&code))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: () = conn
            .rename(from, to)
            .await
            .map_err(|e| command_error("RENAME", from, e))?;

        debug!("✓ Redis RENAME {} -> {}", from, to);
        Ok(())
    }

    async fn rename_nx(&self, from: &str, to: &str) -> Result<bool> {
        let mut conn = self.conn().await?;
        let renamed: bool = conn
            .rename_nx(from, to)
            .await
            .map_err(|e| command_error("RENAMENX", from, e))?;

        debug!("✓ Redis RENAMENX {} -> {} (renamed: {})", from, to, renamed);
        Ok(renamed)
    }

    async fn random_key(&self) -> Result<Option<String>> {
        let mut conn = self.conn().await?;
        redis::cmd("RANDOMKEY")
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::BackendError(format!("Redis RANDOMKEY failed: {}", e)))
    }

    async fn ttl(&self, key: &str) -> Result<Expiry> {
        let mut conn = self.conn().await?;
        let ttl: i64 = conn
            .ttl(key)
            .await
            .map_err(|e| command_error("TTL", key, e))?;

        Ok(Expiry::from_ttl_secs(ttl))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let millis = ttl_millis(key, ttl)?;
        let mut conn = self.conn().await?;
        let applied: bool = conn
            .pexpire(key, millis)
            .await
            .map_err(|e| command_error("PEXPIRE", key, e))?;

        debug!("✓ Redis PEXPIRE {} ({} ms, applied: {})", key, millis, applied);
        Ok(applied)
    }

    async fn health_check(&self) -> Result<bool> {
        match self.pool.get().await {
            Ok(mut conn) => {
                let pong: redis::RedisResult<String> =
                    redis::cmd("PING").query_async(&mut conn).await;
                Ok(pong.is_ok())
            }
            Err(_) => Ok(false),
        }
    }
}
