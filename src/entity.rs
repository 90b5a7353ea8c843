//! Core entity trait that all hash-cached entities must implement.

use crate::error::Result;
use crate::field::{FieldKind, FieldValue};

/// Declared field of a `HashEntity`: its hash field name and storage kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldDef {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        FieldDef { name, kind }
    }
}

/// Trait that every type stored on the hash path must implement.
///
/// Implementing it is what makes a type cache-eligible. The trait replaces
/// property introspection with an explicit adapter: `schema` lists the
/// writable fields, `to_fields` extracts the readable ones and `apply_field`
/// assigns one parsed value.
///
/// # Example
///
/// ```
/// use field_cache::{FieldDef, FieldKind, FieldValue, HashEntity};
/// use field_cache::error::Result;
///
/// #[derive(Default)]
/// pub struct User {
///     pub name: String,
///     pub age: i64,
/// }
///
/// impl HashEntity for User {
///     fn schema() -> &'static [FieldDef] {
///         const FIELDS: &[FieldDef] = &[
///             FieldDef::new("name", FieldKind::Text),
///             FieldDef::new("age", FieldKind::Integer),
///         ];
///         FIELDS
///     }
///
///     fn to_fields(&self) -> Vec<(&'static str, FieldValue)> {
///         vec![("name", self.name.as_str().into()), ("age", self.age.into())]
///     }
///
///     fn apply_field(&mut self, name: &str, value: FieldValue) -> Result<()> {
///         match name {
///             "name" => self.name = value.into_text().unwrap_or_default(),
///             "age" => self.age = value.as_i64().unwrap_or_default(),
///             _ => {}
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait HashEntity: Default + Send + Sync {
    /// Fields that can be assigned when the entity is read back.
    ///
    /// Stored hash fields with no entry here are ignored.
    fn schema() -> &'static [FieldDef];

    /// All readable fields with their current values.
    ///
    /// Reserved names and `FieldValue::Null` values are filtered by the
    /// marshaler, so implementations can report every field as-is.
    fn to_fields(&self) -> Vec<(&'static str, FieldValue)>;

    /// Assign one parsed field.
    ///
    /// `value` has already been run through the parser for the field's
    /// declared kind; timestamps arrive as `FieldValue::Timestamp` epoch
    /// milliseconds.
    fn apply_field(&mut self, name: &str, value: FieldValue) -> Result<()>;

    /// Look up the declared kind of a field.
    fn field_kind(name: &str) -> Option<FieldKind> {
        Self::schema()
            .iter()
            .find(|def| def.name == name)
            .map(|def| def.kind)
    }

    /// Optional: validate the entity after all fields were applied.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}
