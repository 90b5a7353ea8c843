//! Configuration and builder for `FieldCache`.

use crate::backend::CacheBackend;
use crate::error::{Error, Result};
use crate::key::{CacheKeyBuilder, DEFAULT_CATEGORY};
use crate::marshal::{FieldMarshaler, RESERVED_PREFIX};
use crate::FieldCache;
use serde::Deserialize;

/// Settings shared by every operation of a cache handle.
///
/// Deserializable so it can sit inside an application's own config file:
///
/// ```
/// use field_cache::builder::CacheConfig;
///
/// let config: CacheConfig = serde_json::from_str(r#"{"category": "shop"}"#).unwrap();
/// assert_eq!(config.category, "shop");
/// assert_eq!(config.reserved_prefix, '_');
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Leading key segment, e.g. `"aurora:cache"`.
    pub category: String,
    /// Field names starting with this character are never written.
    pub reserved_prefix: char,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            category: DEFAULT_CATEGORY.to_string(),
            reserved_prefix: RESERVED_PREFIX,
        }
    }
}

impl CacheConfig {
    /// Defaults overridden by `CACHE_CATEGORY` and `CACHE_RESERVED_PREFIX`.
    ///
    /// Only the first character of `CACHE_RESERVED_PREFIX` is used.
    pub fn from_env() -> Self {
        let mut config = CacheConfig::default();
        if let Ok(category) = std::env::var("CACHE_CATEGORY") {
            config.category = category;
        }
        if let Some(prefix) = std::env::var("CACHE_RESERVED_PREFIX")
            .ok()
            .and_then(|s| s.chars().next())
        {
            config.reserved_prefix = prefix;
        }
        config
    }

    /// # Errors
    ///
    /// Returns `Error::ConfigError` for an empty category.
    pub fn validate(&self) -> Result<()> {
        if self.category.is_empty() {
            return Err(Error::ConfigError("category must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Fluent builder for a configured `FieldCache`.
///
/// # Example
///
/// ```
/// use field_cache::{FieldCacheBuilder, backend::InMemoryBackend};
///
/// let cache = FieldCacheBuilder::new()
///     .category("shop")
///     .reserved_prefix('$')
///     .build(InMemoryBackend::new())
///     .unwrap();
///
/// assert_eq!(cache.full_key("cart", "7"), "shop:cart:7");
/// ```
#[derive(Clone, Debug, Default)]
pub struct FieldCacheBuilder {
    config: CacheConfig,
}

impl FieldCacheBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn with_config(config: CacheConfig) -> Self {
        FieldCacheBuilder { config }
    }

    /// Start from `CacheConfig::from_env`.
    pub fn from_env() -> Self {
        Self::with_config(CacheConfig::from_env())
    }

    /// Set the key category.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.config.category = category.into();
        self
    }

    /// Set the reserved field prefix.
    pub fn reserved_prefix(mut self, prefix: char) -> Self {
        self.config.reserved_prefix = prefix;
        self
    }

    /// Build the cache over `backend`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the configuration is invalid.
    pub fn build<B: CacheBackend>(self, backend: B) -> Result<FieldCache<B>> {
        self.config.validate()?;
        debug!(
            "Building field cache (category: {}, reserved prefix: {:?})",
            self.config.category, self.config.reserved_prefix
        );
        Ok(FieldCache::from_parts(
            backend,
            CacheKeyBuilder::new(self.config.category),
            FieldMarshaler::new(self.config.reserved_prefix),
        ))
    }
}
