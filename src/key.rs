//! Namespaced key construction.

/// Category used when none is configured.
pub const DEFAULT_CATEGORY: &str = "aurora:cache";

/// Builds full store keys of the form `"{category}:{cache_name}:{key}"`.
///
/// The category is fixed at construction; every cache handle carries its own
/// builder instead of consulting shared state.
///
/// # Example
///
/// ```
/// use field_cache::key::CacheKeyBuilder;
///
/// let keys = CacheKeyBuilder::new("shop");
/// assert_eq!(keys.build("user", "42"), "shop:user:42");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheKeyBuilder {
    category: String,
}

impl CacheKeyBuilder {
    pub fn new(category: impl Into<String>) -> Self {
        CacheKeyBuilder {
            category: category.into(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Build the full key for `key` inside the `cache_name` namespace.
    pub fn build(&self, cache_name: &str, key: &str) -> String {
        let mut full =
            String::with_capacity(self.category.len() + cache_name.len() + key.len() + 2);
        full.push_str(&self.category);
        full.push(':');
        full.push_str(cache_name);
        full.push(':');
        full.push_str(key);
        full
    }
}

impl Default for CacheKeyBuilder {
    fn default() -> Self {
        CacheKeyBuilder::new(DEFAULT_CATEGORY)
    }
}
