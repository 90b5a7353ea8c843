//! Store backends.
//!
//! A backend exposes the handful of string and hash primitives the cache
//! layer relies on. Each method is one round trip; atomicity and expiry are
//! whatever the store provides.

use crate::error::Result;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::time::Duration;

#[cfg(feature = "inmemory")]
mod inmemory;
#[cfg(feature = "redis")]
mod redis;

#[cfg(feature = "inmemory")]
pub use self::inmemory::InMemoryBackend;
#[cfg(feature = "redis")]
pub use self::redis::{RedisBackend, RedisConfig};

/// Shape of the value held at a key, as reported by the store's `TYPE`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyType {
    None,
    String,
    Hash,
    List,
    Set,
    ZSet,
    /// Any code the cache layer does not know (streams, module types, ...).
    Other(String),
}

impl KeyType {
    /// Map a store type code (`"none"`, `"string"`, `"hash"`, ...).
    pub fn from_code(code: &str) -> Self {
        match code {
            "none" => KeyType::None,
            "string" => KeyType::String,
            "hash" => KeyType::Hash,
            "list" => KeyType::List,
            "set" => KeyType::Set,
            "zset" => KeyType::ZSet,
            other => KeyType::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            KeyType::None => "none",
            KeyType::String => "string",
            KeyType::Hash => "hash",
            KeyType::List => "list",
            KeyType::Set => "set",
            KeyType::ZSet => "zset",
            KeyType::Other(code) => code,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Remaining lifetime of a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expiry {
    /// The key does not exist.
    Missing,
    /// The key exists and never expires.
    Persistent,
    /// The key expires after the given duration.
    Remaining(Duration),
}

impl Expiry {
    /// Interpret a Redis-style `TTL` reply (`-2` missing, `-1` persistent).
    pub fn from_ttl_secs(ttl: i64) -> Self {
        match ttl {
            -2 => Expiry::Missing,
            t if t < 0 => Expiry::Persistent,
            t => Expiry::Remaining(Duration::from_secs(t as u64)),
        }
    }
}

/// Primitives a store must offer to back a `FieldCache`.
///
/// Keys passed in are already fully namespaced.
pub trait CacheBackend: Send + Sync + Clone {
    /// Read the plain string slot at `key`.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Write the plain string slot at `key`, replacing whatever was there.
    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<()>> + Send;

    /// Read every field of the hash at `key`. Missing key → empty map.
    fn hgetall(&self, key: &str) -> impl Future<Output = Result<HashMap<String, String>>> + Send;

    /// Set several hash fields at once, leaving other fields untouched.
    fn hset_multiple(
        &self,
        key: &str,
        fields: &[(String, String)],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Delete `key`. Returns whether something was removed.
    fn delete(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    fn key_type(&self, key: &str) -> impl Future<Output = Result<KeyType>> + Send;

    /// Rename `from` to `to`, overwriting `to`.
    fn rename(&self, from: &str, to: &str) -> impl Future<Output = Result<()>> + Send;

    /// Rename `from` to `to` only if `to` does not exist.
    fn rename_nx(&self, from: &str, to: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Any key from the store, or `None` when it is empty.
    fn random_key(&self) -> impl Future<Output = Result<Option<String>>> + Send;

    fn ttl(&self, key: &str) -> impl Future<Output = Result<Expiry>> + Send;

    /// Set a time-to-live on `key`. Returns false if the key does not exist.
    fn expire(&self, key: &str, ttl: Duration) -> impl Future<Output = Result<bool>> + Send;

    fn health_check(&self) -> impl Future<Output = Result<bool>> + Send;
}
