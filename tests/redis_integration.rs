//! Integration tests against a live Redis server.
//!
//! Run with `REDIS_URL=redis://127.0.0.1:6379 cargo test --features redis -- --ignored`.
#![cfg(feature = "redis")]

use field_cache::backend::{RedisBackend, RedisConfig};
use field_cache::{
    Error, Expiry, FieldCache, FieldCacheBuilder, FieldValue, KeyType, StoredValue,
};
use serde_json::json;
use std::time::Duration;

async fn cache(category: &str) -> FieldCache<RedisBackend> {
    let _ = env_logger::builder().is_test(true).try_init();
    let backend = RedisBackend::new(RedisConfig::from_env())
        .await
        .expect("Failed to create Redis backend");
    FieldCacheBuilder::new()
        .category(category)
        .build(backend)
        .expect("Failed to build cache")
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn test_redis_health_check() {
    let cache = cache("field-cache-test:health").await;
    assert!(cache.health_check().await.expect("health"));
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn test_redis_scalar_and_hash() {
    let cache = cache("field-cache-test:paths").await;
    cache.delete("t", "n").await.expect("delete");
    cache.delete("t", "h").await.expect("delete");

    cache.set_scalar("t", "n", 42i64).await.expect("set");
    assert_eq!(cache.get_scalar::<i64>("t", "n").await.expect("get"), Some(42));

    cache
        .set_map(
            "t",
            "h",
            vec![
                ("name", FieldValue::from("Alice")),
                ("_internal", FieldValue::from("x")),
                ("nickname", FieldValue::Null),
            ],
        )
        .await
        .expect("set");
    let stored = cache.get_map("t", "h").await.expect("get").expect("hash");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored["name"], "Alice");

    assert_eq!(cache.key_type("t", "h").await.expect("type"), KeyType::Hash);
    assert!(matches!(
        cache.get_value("t", "n").await.expect("value"),
        Some(StoredValue::Text(_))
    ));
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn test_redis_unsupported_and_unhandled() {
    let cache = cache("field-cache-test:types").await;
    cache.delete("t", "arr").await.expect("delete");

    let result = cache.set_json("t", "arr", &json!([1, 2])).await;
    assert!(matches!(result, Err(Error::UnsupportedValue(_))));
    assert_eq!(cache.key_type("t", "arr").await.expect("type"), KeyType::None);
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn test_redis_rename_and_expiry() {
    let cache = cache("field-cache-test:admin").await;
    cache.delete("t", "a").await.expect("delete");
    cache.delete("t", "b").await.expect("delete");

    cache.set_string("t", "a", "1").await.expect("set");
    assert!(cache.rename_if_absent("t", "a", "b").await.expect("renamenx"));
    assert_eq!(cache.expiry("t", "b").await.expect("ttl"), Expiry::Persistent);

    assert!(cache
        .expire("t", "b", Duration::from_secs(120))
        .await
        .expect("expire"));
    assert!(matches!(
        cache.expiry("t", "b").await.expect("ttl"),
        Expiry::Remaining(_)
    ));
    assert!(cache.random_key().await.expect("randomkey").is_some());
    assert!(cache.delete("t", "b").await.expect("delete"));
}
