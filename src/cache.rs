//! Field cache - main entry point for cache operations.

use crate::backend::{CacheBackend, Expiry, KeyType};
use crate::entity::HashEntity;
use crate::error::{Error, Result};
use crate::field::FieldValue;
use crate::key::CacheKeyBuilder;
use crate::marshal::FieldMarshaler;
use crate::value::{CacheValue, Scalar, StoredValue};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Namespaced string/hash cache over a `CacheBackend`.
///
/// Every operation addresses `"{category}:{cache_name}:{key}"` and is a
/// single round trip to the backend.
///
/// # Example
///
/// ```
/// use field_cache::{FieldCache, backend::InMemoryBackend};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> field_cache::Result<()> {
/// let cache = FieldCache::new(InMemoryBackend::new());
/// cache.set_scalar("stats", "visits", 12i64).await?;
/// assert_eq!(cache.get_scalar::<i64>("stats", "visits").await?, Some(12));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FieldCache<B: CacheBackend> {
    backend: B,
    keys: CacheKeyBuilder,
    marshaler: FieldMarshaler,
}

impl<B: CacheBackend> FieldCache<B> {
    /// Create a cache with the default category and reserved prefix.
    pub fn new(backend: B) -> Self {
        FieldCache {
            backend,
            keys: CacheKeyBuilder::default(),
            marshaler: FieldMarshaler::default(),
        }
    }

    pub(crate) fn from_parts(
        backend: B,
        keys: CacheKeyBuilder,
        marshaler: FieldMarshaler,
    ) -> Self {
        FieldCache {
            backend,
            keys,
            marshaler,
        }
    }

    pub fn category(&self) -> &str {
        self.keys.category()
    }

    pub fn marshaler(&self) -> &FieldMarshaler {
        &self.marshaler
    }

    /// Full store key for `key` in the `cache_name` namespace.
    pub fn full_key(&self, cache_name: &str, key: &str) -> String {
        self.keys.build(cache_name, key)
    }

    // ------------------------------------------------------------------
    // Scalar path
    // ------------------------------------------------------------------

    pub async fn set_string(&self, cache_name: &str, key: &str, value: &str) -> Result<()> {
        let full_key = self.full_key(cache_name, key);
        self.backend.set(&full_key, value.to_string()).await
    }

    /// Store a primitive in its string form.
    pub async fn set_scalar<V: Scalar>(&self, cache_name: &str, key: &str, value: V) -> Result<()> {
        let full_key = self.full_key(cache_name, key);
        self.backend.set(&full_key, value.to_string()).await
    }

    pub async fn get_string(&self, cache_name: &str, key: &str) -> Result<Option<String>> {
        let full_key = self.full_key(cache_name, key);
        self.backend.get(&full_key).await
    }

    /// Read and parse a primitive.
    ///
    /// # Errors
    ///
    /// - `Error::ParseError`: the stored string is not well-formed for `V`
    /// - `Error::BackendError`: store failure, or the key holds a hash
    pub async fn get_scalar<V: Scalar>(&self, cache_name: &str, key: &str) -> Result<Option<V>> {
        match self.get_string(cache_name, key).await? {
            Some(raw) => V::parse_stored(&raw).map(Some),
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Hash path
    // ------------------------------------------------------------------

    /// Store a mapping as hash fields, merging into any existing hash.
    ///
    /// Reserved names and `FieldValue::Null` values are skipped. When no
    /// field survives, nothing is sent to the store.
    pub async fn set_map<I, K, V>(&self, cache_name: &str, key: &str, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        let encoded = self
            .marshaler
            .encode(fields.into_iter().map(|(name, value)| (name, value.into())));
        self.write_fields(cache_name, key, encoded).await
    }

    /// Read every stored field as strings. `Ok(None)` when the hash is
    /// missing or empty.
    pub async fn get_map(
        &self,
        cache_name: &str,
        key: &str,
    ) -> Result<Option<HashMap<String, String>>> {
        let full_key = self.full_key(cache_name, key);
        let fields = self.backend.hgetall(&full_key).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        Ok(Some(fields))
    }

    /// Store an entity's fields as a hash, merging into any existing hash.
    pub async fn set_entity<T: HashEntity>(
        &self,
        cache_name: &str,
        key: &str,
        entity: &T,
    ) -> Result<()> {
        let encoded = self.marshaler.encode_entity(entity);
        self.write_fields(cache_name, key, encoded).await
    }

    /// Rebuild an entity from its stored hash.
    ///
    /// Returns `Ok(None)` when nothing is stored. A hash that cannot be
    /// turned into a `T` is an error, never an absence.
    ///
    /// # Errors
    ///
    /// - `Error::FieldError`: a stored field does not parse as its declared
    ///   kind or is rejected by the entity
    /// - `Error::BackendError`: store failure, or the key is not a hash
    pub async fn get_entity<T: HashEntity>(&self, cache_name: &str, key: &str) -> Result<Option<T>> {
        let full_key = self.full_key(cache_name, key);
        let fields = self.backend.hgetall(&full_key).await?;
        if fields.is_empty() {
            debug!("No hash stored at {}", full_key);
            return Ok(None);
        }

        match self.marshaler.decode_entity::<T>(fields) {
            Ok(entity) => Ok(Some(entity)),
            Err(e) => {
                error!(
                    "Failed to build {} from {}: {}",
                    std::any::type_name::<T>(),
                    full_key,
                    e
                );
                Err(e)
            }
        }
    }

    async fn write_fields(
        &self,
        cache_name: &str,
        key: &str,
        fields: Vec<(String, String)>,
    ) -> Result<()> {
        let full_key = self.full_key(cache_name, key);
        if fields.is_empty() {
            debug!("No storable fields for {}, skipping write", full_key);
            return Ok(());
        }
        self.backend.hset_multiple(&full_key, &fields).await
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    /// Write a value through the path matching its shape.
    pub async fn set_value(&self, cache_name: &str, key: &str, value: CacheValue) -> Result<()> {
        match value {
            CacheValue::Fields(fields) => self.set_map(cache_name, key, fields).await,
            scalar => match scalar.scalar_string() {
                Some(raw) => {
                    let full_key = self.full_key(cache_name, key);
                    self.backend.set(&full_key, raw).await
                }
                None => Ok(()),
            },
        }
    }

    /// Write arbitrary JSON: strings and numbers to the scalar slot, objects
    /// to a hash. `null` is ignored.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedValue` for arrays and booleans. The check
    /// happens before any store command, so nothing is written.
    pub async fn set_json(&self, cache_name: &str, key: &str, value: &Value) -> Result<()> {
        if value.is_null() {
            debug!("Ignoring null value for {}:{}", cache_name, key);
            return Ok(());
        }

        let value = CacheValue::try_from(value).map_err(|e| {
            error!("Cannot store value at {}:{}: {}", cache_name, key, e);
            e
        })?;
        self.set_value(cache_name, key, value).await
    }

    /// Read whatever is stored at the key.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnhandledType` when the key holds a list, set, sorted
    /// set or any other shape besides a string or hash.
    pub async fn get_value(&self, cache_name: &str, key: &str) -> Result<Option<StoredValue>> {
        match self.key_type(cache_name, key).await? {
            KeyType::None => Ok(None),
            KeyType::String => Ok(self
                .get_string(cache_name, key)
                .await?
                .map(StoredValue::Text)),
            KeyType::Hash => Ok(self.get_map(cache_name, key).await?.map(StoredValue::Hash)),
            other => {
                error!("Unhandled type {} at {}:{}", other, cache_name, key);
                Err(Error::UnhandledType(other))
            }
        }
    }

    // ------------------------------------------------------------------
    // Key administration
    // ------------------------------------------------------------------

    /// Delete the key. Returns whether it existed.
    pub async fn delete(&self, cache_name: &str, key: &str) -> Result<bool> {
        let full_key = self.full_key(cache_name, key);
        self.backend.delete(&full_key).await
    }

    pub async fn key_type(&self, cache_name: &str, key: &str) -> Result<KeyType> {
        let full_key = self.full_key(cache_name, key);
        self.backend.key_type(&full_key).await
    }

    /// Rename within the namespace, overwriting `new_key`.
    pub async fn rename(&self, cache_name: &str, old_key: &str, new_key: &str) -> Result<()> {
        let from = self.full_key(cache_name, old_key);
        let to = self.full_key(cache_name, new_key);
        self.backend.rename(&from, &to).await
    }

    /// Rename within the namespace only if `new_key` does not exist.
    pub async fn rename_if_absent(
        &self,
        cache_name: &str,
        old_key: &str,
        new_key: &str,
    ) -> Result<bool> {
        let from = self.full_key(cache_name, old_key);
        let to = self.full_key(cache_name, new_key);
        self.backend.rename_nx(&from, &to).await
    }

    /// A random raw key from the whole store (not limited to the category).
    pub async fn random_key(&self) -> Result<Option<String>> {
        self.backend.random_key().await
    }

    /// Remaining time to live of the key.
    pub async fn expiry(&self, cache_name: &str, key: &str) -> Result<Expiry> {
        let full_key = self.full_key(cache_name, key);
        self.backend.ttl(&full_key).await
    }

    /// Set a time to live on the key. Returns false if it does not exist.
    pub async fn expire(&self, cache_name: &str, key: &str, ttl: Duration) -> Result<bool> {
        let full_key = self.full_key(cache_name, key);
        self.backend.expire(&full_key, ttl).await
    }

    pub async fn health_check(&self) -> Result<bool> {
        self.backend.health_check().await
    }

    /// Get backend reference (for advanced use).
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::entity::FieldDef;
    use crate::field::FieldKind;
    use serde_json::json;

    #[derive(Default, Debug, PartialEq)]
    struct User {
        name: String,
        age: i64,
        joined: i64,
        internal: Option<String>,
    }

    impl HashEntity for User {
        fn schema() -> &'static [FieldDef] {
            const FIELDS: &[FieldDef] = &[
                FieldDef::new("name", FieldKind::Text),
                FieldDef::new("age", FieldKind::Integer),
                FieldDef::new("joined", FieldKind::Timestamp),
            ];
            FIELDS
        }

        fn to_fields(&self) -> Vec<(&'static str, FieldValue)> {
            vec![
                ("name", self.name.as_str().into()),
                ("age", self.age.into()),
                ("joined", FieldValue::Timestamp(self.joined)),
                ("_internal", self.internal.clone().into()),
            ]
        }

        fn apply_field(&mut self, name: &str, value: FieldValue) -> Result<()> {
            match name {
                "name" => self.name = value.into_text().unwrap_or_default(),
                "age" => self.age = value.as_i64().unwrap_or_default(),
                "joined" => self.joined = value.as_i64().unwrap_or_default(),
                _ => {}
            }
            Ok(())
        }
    }

    fn alice() -> User {
        User {
            name: "Alice".to_string(),
            age: 30,
            joined: 1_700_000_000_000,
            internal: Some("secret".to_string()),
        }
    }

    #[tokio::test]
    async fn test_entity_round_trip() {
        let backend = InMemoryBackend::new();
        let cache = FieldCache::new(backend.clone());

        cache
            .set_entity("users", "alice", &alice())
            .await
            .expect("Failed to set");

        let loaded: User = cache
            .get_entity("users", "alice")
            .await
            .expect("Failed to get")
            .expect("User not found");

        assert_eq!(loaded.name, "Alice");
        assert_eq!(loaded.age, 30);
        assert_eq!(loaded.joined, 1_700_000_000_000);
        assert_eq!(loaded.internal, None);

        let raw = backend
            .hgetall("aurora:cache:users:alice")
            .await
            .expect("Failed to read raw hash");
        assert_eq!(raw["joined"], "1700000000000");
        assert!(!raw.contains_key("_internal"));
    }

    #[tokio::test]
    async fn test_get_entity_missing_is_none() {
        let cache = FieldCache::new(InMemoryBackend::new());
        let loaded = cache
            .get_entity::<User>("users", "nobody")
            .await
            .expect("Missing hash must not be an error");
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_get_entity_malformed_is_error() {
        let cache = FieldCache::new(InMemoryBackend::new());
        cache
            .set_map("users", "broken", vec![("age", "not a number")])
            .await
            .expect("Failed to set");

        let result = cache.get_entity::<User>("users", "broken").await;
        assert!(matches!(result, Err(Error::FieldError { .. })));
    }

    #[tokio::test]
    async fn test_map_write_merges_and_reads_back() {
        let cache = FieldCache::new(InMemoryBackend::new());
        cache
            .set_map("test", "wang", vec![("name", "wangziming")])
            .await
            .expect("Failed to set");
        cache
            .set_map(
                "test",
                "wang",
                vec![("name", FieldValue::from("wzm")), ("age", FieldValue::from(25i64))],
            )
            .await
            .expect("Failed to set");

        let map = cache
            .get_map("test", "wang")
            .await
            .expect("Failed to get")
            .expect("Map not found");
        assert_eq!(map.len(), 2);
        assert_eq!(map["name"], "wzm");
        assert_eq!(map["age"], "25");
    }

    #[tokio::test]
    async fn test_all_fields_filtered_writes_nothing() {
        let backend = InMemoryBackend::new();
        let cache = FieldCache::new(backend.clone());
        cache
            .set_map(
                "test",
                "empty",
                vec![("_hidden", FieldValue::from(1i64)), ("gone", FieldValue::Null)],
            )
            .await
            .expect("Filtered write must succeed");

        assert!(backend.is_empty().await);
        assert_eq!(cache.get_map("test", "empty").await.expect("get"), None);
    }

    #[tokio::test]
    async fn test_scalar_round_trip() {
        let cache = FieldCache::new(InMemoryBackend::new());
        cache.set_scalar("test", "age", 12i64).await.expect("set");
        cache.set_scalar("test", "ratio", 0.75f64).await.expect("set");
        cache.set_string("test", "name", "王子明").await.expect("set");

        assert_eq!(cache.get_scalar::<i64>("test", "age").await.expect("get"), Some(12));
        assert_eq!(
            cache.get_scalar::<f64>("test", "ratio").await.expect("get"),
            Some(0.75)
        );
        assert_eq!(
            cache.get_string("test", "name").await.expect("get").as_deref(),
            Some("王子明")
        );
        assert_eq!(cache.get_scalar::<i32>("test", "missing").await.expect("get"), None);
    }

    #[tokio::test]
    async fn test_scalar_parse_error_propagates() {
        let cache = FieldCache::new(InMemoryBackend::new());
        cache.set_string("test", "age", "twelve").await.expect("set");

        let result = cache.get_scalar::<i64>("test", "age").await;
        assert!(matches!(result, Err(Error::ParseError(_))));
    }

    #[tokio::test]
    async fn test_set_value_dispatch() {
        let cache = FieldCache::new(InMemoryBackend::new());
        cache
            .set_value("test", "n", CacheValue::from(7i64))
            .await
            .expect("set");
        cache
            .set_value("test", "u", CacheValue::from_entity(&alice()))
            .await
            .expect("set");

        assert_eq!(cache.key_type("test", "n").await.expect("type"), KeyType::String);
        assert_eq!(cache.key_type("test", "u").await.expect("type"), KeyType::Hash);
    }

    #[tokio::test]
    async fn test_set_json_rejects_array_without_writing() {
        let backend = InMemoryBackend::new();
        let cache = FieldCache::new(backend.clone());

        let result = cache.set_json("test", "list", &json!(["a", "b"])).await;
        assert!(matches!(result, Err(Error::UnsupportedValue(_))));
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_set_json_large_integer_keeps_exact_text() {
        let cache = FieldCache::new(InMemoryBackend::new());

        cache.set_json("test", "n", &json!(u64::MAX)).await.expect("set");
        assert_eq!(
            cache.get_string("test", "n").await.expect("get").as_deref(),
            Some("18446744073709551615")
        );
        assert_eq!(
            cache.get_scalar::<u64>("test", "n").await.expect("get"),
            Some(u64::MAX)
        );

        cache
            .set_json("test", "h", &json!({"id": u64::MAX}))
            .await
            .expect("set");
        let stored = cache.get_map("test", "h").await.expect("get").expect("hash");
        assert_eq!(stored["id"], "18446744073709551615");
    }

    #[tokio::test]
    async fn test_set_json_null_is_noop() {
        let backend = InMemoryBackend::new();
        let cache = FieldCache::new(backend.clone());
        cache.set_json("test", "nothing", &Value::Null).await.expect("set");
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_get_value_by_shape() {
        let backend = InMemoryBackend::new();
        let cache = FieldCache::new(backend.clone());

        cache.set_json("test", "s", &json!("text")).await.expect("set");
        cache
            .set_json("test", "h", &json!({"a": 1, "b": null}))
            .await
            .expect("set");
        backend
            .rpush("aurora:cache:test:l", &["x"])
            .await
            .expect("rpush");

        assert_eq!(cache.get_value("test", "none").await.expect("get"), None);
        assert_eq!(
            cache.get_value("test", "s").await.expect("get"),
            Some(StoredValue::Text("text".to_string()))
        );

        let hash = cache
            .get_value("test", "h")
            .await
            .expect("get")
            .expect("hash present");
        let fields = hash.as_hash().expect("hash");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["a"], "1");

        let err = cache.get_value("test", "l").await.expect_err("list must fail");
        assert_eq!(err, Error::UnhandledType(KeyType::List));
        assert!(err.to_string().contains("unhandled type"));
    }

    #[tokio::test]
    async fn test_rename_and_delete() {
        let cache = FieldCache::new(InMemoryBackend::new());
        cache.set_string("test", "a", "1").await.expect("set");
        cache.set_string("test", "b", "2").await.expect("set");

        assert!(!cache.rename_if_absent("test", "a", "b").await.expect("renamenx"));
        assert!(cache.rename_if_absent("test", "a", "c").await.expect("renamenx"));
        cache.rename("test", "c", "b").await.expect("rename");

        assert_eq!(cache.get_string("test", "b").await.expect("get").as_deref(), Some("1"));
        assert!(cache.delete("test", "b").await.expect("delete"));
        assert!(!cache.delete("test", "b").await.expect("delete"));
        assert_eq!(cache.random_key().await.expect("randomkey"), None);
    }

    #[tokio::test]
    async fn test_expire_unrepresentable_ttl_is_error() {
        let cache = FieldCache::new(InMemoryBackend::new());
        cache.set_string("test", "k", "v").await.expect("set");

        let result = cache.expire("test", "k", Duration::MAX).await;
        assert!(matches!(result, Err(Error::BackendError(_))));
        assert_eq!(cache.expiry("test", "k").await.expect("ttl"), Expiry::Persistent);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry() {
        let cache = FieldCache::new(InMemoryBackend::new());
        assert_eq!(cache.expiry("test", "k").await.expect("ttl"), Expiry::Missing);

        cache.set_string("test", "k", "v").await.expect("set");
        assert_eq!(cache.expiry("test", "k").await.expect("ttl"), Expiry::Persistent);

        assert!(cache
            .expire("test", "k", Duration::from_secs(30))
            .await
            .expect("expire"));
        assert_eq!(
            cache.expiry("test", "k").await.expect("ttl"),
            Expiry::Remaining(Duration::from_secs(30))
        );
    }

    #[tokio::test]
    async fn test_full_key_and_health() {
        let cache = FieldCache::new(InMemoryBackend::new());
        assert_eq!(cache.full_key("users", "1"), "aurora:cache:users:1");
        assert_eq!(cache.category(), "aurora:cache");
        assert!(cache.health_check().await.expect("health"));
    }
}
