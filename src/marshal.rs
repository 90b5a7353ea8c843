//! Field marshaling between entities/mappings and flat hash fields.
//!
//! Write rules, applied to every field:
//!
//! 1. names starting with the reserved prefix are dropped
//! 2. `FieldValue::Null` values are dropped
//! 3. timestamps are written as epoch milliseconds
//! 4. everything else is written in its string form
//!
//! Read rules for entities: each stored field is matched against the
//! entity's schema by name, unknown names are skipped, and the stored string
//! goes through the parser for the declared `FieldKind`.

use crate::entity::HashEntity;
use crate::error::Result;
use crate::field::FieldValue;
use std::collections::HashMap;

/// Prefix marking internal fields that are never persisted.
pub const RESERVED_PREFIX: char = '_';

/// Stateless converter between structured values and hash fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldMarshaler {
    reserved_prefix: char,
}

impl FieldMarshaler {
    pub fn new(reserved_prefix: char) -> Self {
        FieldMarshaler { reserved_prefix }
    }

    pub fn reserved_prefix(&self) -> char {
        self.reserved_prefix
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        name.starts_with(self.reserved_prefix)
    }

    /// Encode `(name, value)` pairs into the field/string pairs to store.
    pub fn encode<I, K>(&self, fields: I) -> Vec<(String, String)>
    where
        I: IntoIterator<Item = (K, FieldValue)>,
        K: AsRef<str>,
    {
        fields
            .into_iter()
            .filter_map(|(name, value)| {
                let name = name.as_ref();
                if self.is_reserved(name) {
                    trace!("Skipping reserved field {}", name);
                    return None;
                }
                value.encode().map(|encoded| (name.to_string(), encoded))
            })
            .collect()
    }

    /// Encode every readable field of an entity.
    pub fn encode_entity<T: HashEntity>(&self, entity: &T) -> Vec<(String, String)> {
        self.encode(entity.to_fields())
    }

    /// Build an entity from stored hash fields.
    ///
    /// Starts from `T::default()`. Fields missing from `T::schema()` are
    /// skipped so stored hashes may carry fields the type no longer has.
    ///
    /// # Errors
    ///
    /// Returns `Error::FieldError` when a stored value does not parse as its
    /// declared kind or when the entity rejects it in `apply_field` or
    /// `validate`.
    pub fn decode_entity<T: HashEntity>(&self, fields: HashMap<String, String>) -> Result<T> {
        let mut entity = T::default();

        for (name, raw) in fields {
            let Some(kind) = T::field_kind(&name) else {
                trace!("No field {} on target entity, skipping", name);
                continue;
            };

            let value = kind.parse(&name, &raw)?;
            if value.is_null() {
                continue;
            }
            entity.apply_field(&name, value)?;
        }

        entity.validate()?;
        Ok(entity)
    }
}

impl Default for FieldMarshaler {
    fn default() -> Self {
        FieldMarshaler::new(RESERVED_PREFIX)
    }
}
