//! # field-cache
//!
//! Maps application values onto a key-value store's string and hash
//! primitives under a `category:namespace:key` naming convention.
//!
//! ## Features
//!
//! - **Scalar path:** numbers and strings live in a key's plain string slot
//! - **Hash path:** mappings and entities become one hash field per member
//! - **Explicit field adapters:** entities implement [`HashEntity`], no
//!   reflection, no runtime markers
//! - **Typed parsing:** stored strings go through a parser table keyed by
//!   [`FieldKind`]; timestamps stay epoch-millisecond integers
//! - **Backend Agnostic:** in-memory and Redis backends, or your own
//!   [`CacheBackend`]
//!
//! ## Quick Start
//!
//! ```
//! use field_cache::{FieldCache, FieldDef, FieldKind, FieldValue, HashEntity, Result};
//! use field_cache::backend::InMemoryBackend;
//!
//! // 1. Define your entity
//! #[derive(Default)]
//! struct User {
//!     name: String,
//!     age: i64,
//!     joined: i64,
//! }
//!
//! // 2. Implement HashEntity
//! impl HashEntity for User {
//!     fn schema() -> &'static [FieldDef] {
//!         const FIELDS: &[FieldDef] = &[
//!             FieldDef::new("name", FieldKind::Text),
//!             FieldDef::new("age", FieldKind::Integer),
//!             FieldDef::new("joined", FieldKind::Timestamp),
//!         ];
//!         FIELDS
//!     }
//!
//!     fn to_fields(&self) -> Vec<(&'static str, FieldValue)> {
//!         vec![
//!             ("name", self.name.as_str().into()),
//!             ("age", self.age.into()),
//!             ("joined", FieldValue::Timestamp(self.joined)),
//!         ]
//!     }
//!
//!     fn apply_field(&mut self, name: &str, value: FieldValue) -> Result<()> {
//!         match name {
//!             "name" => self.name = value.into_text().unwrap_or_default(),
//!             "age" => self.age = value.as_i64().unwrap_or_default(),
//!             "joined" => self.joined = value.as_i64().unwrap_or_default(),
//!             _ => {}
//!         }
//!         Ok(())
//!     }
//! }
//!
//! // 3. Use it
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<()> {
//! let cache = FieldCache::new(InMemoryBackend::new());
//! let user = User { name: "Alice".into(), age: 30, joined: 1_700_000_000_000 };
//! cache.set_entity("user", "alice", &user).await?;
//!
//! let loaded: User = cache.get_entity("user", "alice").await?.unwrap();
//! assert_eq!(loaded.joined, 1_700_000_000_000);
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate log;

pub mod backend;
pub mod builder;
pub mod cache;
pub mod entity;
pub mod error;
pub mod field;
pub mod key;
pub mod marshal;
pub mod value;

// Re-exports for convenience
pub use backend::{CacheBackend, Expiry, KeyType};
pub use builder::{CacheConfig, FieldCacheBuilder};
pub use cache::FieldCache;
pub use entity::{FieldDef, HashEntity};
pub use error::{Error, Result};
pub use field::{FieldKind, FieldValue};
pub use marshal::FieldMarshaler;
pub use value::{CacheValue, Scalar, StoredValue};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
