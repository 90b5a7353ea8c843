//! In-memory backend emulating the Redis string/hash type semantics.

use super::{CacheBackend, Expiry, KeyType};
use crate::error::{Error, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const WRONG_TYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

#[derive(Clone, Debug)]
enum Data {
    Text(String),
    Hash(HashMap<String, String>),
    List(VecDeque<String>),
    Set(HashSet<String>),
}

impl Data {
    fn key_type(&self) -> KeyType {
        match self {
            Data::Text(_) => KeyType::String,
            Data::Hash(_) => KeyType::Hash,
            Data::List(_) => KeyType::List,
            Data::Set(_) => KeyType::Set,
        }
    }
}

#[derive(Clone, Debug)]
struct Slot {
    data: Data,
    expires_at: Option<Instant>,
}

impl Slot {
    fn new(data: Data) -> Self {
        Slot {
            data,
            expires_at: None,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Process-local backend for tests and single-node use.
///
/// Cloning shares the underlying map. Expired keys are dropped lazily when
/// touched. Time follows `tokio::time`, so paused test clocks apply.
///
/// # Example
///
/// ```
/// # use field_cache::backend::{CacheBackend, InMemoryBackend};
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> field_cache::Result<()> {
/// let backend = InMemoryBackend::new();
/// backend.set("greeting", "hello".to_string()).await?;
/// assert_eq!(backend.get("greeting").await?.as_deref(), Some("hello"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    store: Arc<DashMap<String, Slot>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        InMemoryBackend {
            store: Arc::new(DashMap::new()),
        }
    }

    /// Number of live keys.
    pub async fn len(&self) -> usize {
        self.purge_all();
        self.store.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        self.store.clear();
        warn!("⚠ InMemory store cleared");
    }

    /// Append values to the list at `key`, creating it if needed.
    ///
    /// Returns the list length after the push.
    pub async fn rpush(&self, key: &str, values: &[&str]) -> Result<usize> {
        self.purge(key);
        let mut slot = self
            .store
            .entry(key.to_string())
            .or_insert_with(|| Slot::new(Data::List(VecDeque::new())));
        match &mut slot.data {
            Data::List(list) => {
                list.extend(values.iter().map(|v| v.to_string()));
                Ok(list.len())
            }
            _ => Err(Error::BackendError(WRONG_TYPE.to_string())),
        }
    }

    /// Add members to the set at `key`, creating it if needed.
    ///
    /// Returns how many members were new.
    pub async fn sadd(&self, key: &str, members: &[&str]) -> Result<usize> {
        self.purge(key);
        let mut slot = self
            .store
            .entry(key.to_string())
            .or_insert_with(|| Slot::new(Data::Set(HashSet::new())));
        match &mut slot.data {
            Data::Set(set) => Ok(members
                .iter()
                .filter(|m| set.insert(m.to_string()))
                .count()),
            _ => Err(Error::BackendError(WRONG_TYPE.to_string())),
        }
    }

    fn purge(&self, key: &str) {
        let now = Instant::now();
        if self
            .store
            .remove_if(key, |_, slot| slot.is_expired(now))
            .is_some()
        {
            debug!("InMemory key {} expired", key);
        }
    }

    fn purge_all(&self) {
        let now = Instant::now();
        self.store.retain(|_, slot| !slot.is_expired(now));
    }
}

impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.purge(key);
        match self.store.get(key) {
            Some(slot) => match &slot.data {
                Data::Text(value) => {
                    debug!("✓ InMemory GET {} -> HIT", key);
                    Ok(Some(value.clone()))
                }
                _ => Err(Error::BackendError(WRONG_TYPE.to_string())),
            },
            None => {
                debug!("✓ InMemory GET {} -> MISS", key);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.store
            .insert(key.to_string(), Slot::new(Data::Text(value)));
        debug!("✓ InMemory SET {}", key);
        Ok(())
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        self.purge(key);
        match self.store.get(key) {
            Some(slot) => match &slot.data {
                Data::Hash(fields) => {
                    debug!("✓ InMemory HGETALL {} -> {} fields", key, fields.len());
                    Ok(fields.clone())
                }
                _ => Err(Error::BackendError(WRONG_TYPE.to_string())),
            },
            None => {
                debug!("✓ InMemory HGETALL {} -> MISS", key);
                Ok(HashMap::new())
            }
        }
    }

    async fn hset_multiple(&self, key: &str, fields: &[(String, String)]) -> Result<()> {
        if fields.is_empty() {
            return Err(Error::BackendError(format!(
                "HSET on {} requires at least one field",
                key
            )));
        }

        self.purge(key);
        match self.store.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => match &mut occupied.get_mut().data {
                Data::Hash(existing) => existing.extend(fields.iter().cloned()),
                _ => return Err(Error::BackendError(WRONG_TYPE.to_string())),
            },
            Entry::Vacant(vacant) => {
                vacant.insert(Slot::new(Data::Hash(fields.iter().cloned().collect())));
            }
        }

        debug!("✓ InMemory HSET {} ({} fields)", key, fields.len());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.purge(key);
        let removed = self.store.remove(key).is_some();
        debug!("✓ InMemory DELETE {} (removed: {})", key, removed);
        Ok(removed)
    }

    async fn key_type(&self, key: &str) -> Result<KeyType> {
        self.purge(key);
        Ok(self
            .store
            .get(key)
            .map(|slot| slot.data.key_type())
            .unwrap_or(KeyType::None))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        self.purge(from);
        let (_, slot) = self
            .store
            .remove(from)
            .ok_or_else(|| Error::BackendError(format!("ERR no such key: {}", from)))?;
        self.store.insert(to.to_string(), slot);
        debug!("✓ InMemory RENAME {} -> {}", from, to);
        Ok(())
    }

    async fn rename_nx(&self, from: &str, to: &str) -> Result<bool> {
        self.purge(from);
        if from == to {
            return if self.store.contains_key(from) {
                Ok(false)
            } else {
                Err(Error::BackendError(format!("ERR no such key: {}", from)))
            };
        }

        // Take the source out first: holding the target's entry lock while
        // touching another key can deadlock when both share a shard.
        let (_, slot) = self
            .store
            .remove(from)
            .ok_or_else(|| Error::BackendError(format!("ERR no such key: {}", from)))?;

        let now = Instant::now();
        let slot = match self.store.entry(to.to_string()) {
            Entry::Occupied(mut occupied) if occupied.get().is_expired(now) => {
                occupied.insert(slot);
                None
            }
            Entry::Occupied(_) => Some(slot),
            Entry::Vacant(vacant) => {
                vacant.insert(slot);
                None
            }
        };

        match slot {
            Some(slot) => {
                // a write to the source made while it was out wins
                self.store.entry(from.to_string()).or_insert(slot);
                debug!("InMemory RENAMENX {} -> {} skipped, target exists", from, to);
                Ok(false)
            }
            None => {
                debug!("✓ InMemory RENAMENX {} -> {}", from, to);
                Ok(true)
            }
        }
    }

    async fn random_key(&self) -> Result<Option<String>> {
        self.purge_all();
        Ok(self.store.iter().next().map(|entry| entry.key().clone()))
    }

    async fn ttl(&self, key: &str) -> Result<Expiry> {
        self.purge(key);
        let Some(slot) = self.store.get(key) else {
            return Ok(Expiry::Missing);
        };
        Ok(match slot.expires_at {
            None => Expiry::Persistent,
            Some(at) => {
                let remaining = at.saturating_duration_since(Instant::now());
                // Whole seconds, rounded the way Redis rounds TTL replies.
                Expiry::Remaining(Duration::from_secs(
                    (remaining.as_millis() as u64 + 500) / 1000,
                ))
            }
        })
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.purge(key);
        let expires_at = Instant::now().checked_add(ttl).ok_or_else(|| {
            Error::BackendError(format!("ERR invalid expire time {:?} for {}", ttl, key))
        })?;
        match self.store.get_mut(key) {
            Some(mut slot) => {
                slot.expires_at = Some(expires_at);
                debug!("✓ InMemory EXPIRE {} ({:?})", key, ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
