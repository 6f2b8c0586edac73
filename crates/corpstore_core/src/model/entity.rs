//! Entity capability trait, static descriptors and column records.
//!
//! # Responsibility
//! - Describe persistable types (name, table, identity, fields) statically.
//! - Map entities to and from session-neutral `Record` values.
//!
//! # Invariants
//! - A descriptor's identity field is one of its declared fields.
//! - Field names map one-to-one to column names.

use crate::db::{DbError, DbResult};
use crate::model::value::FieldValue;
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Identity value type for every entity.
pub type EntityId = i64;

/// Storage kind of one field. Only text fields sort case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Real,
    Text,
}

/// Static description of one persistable field.
#[derive(Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name used by callers (`lastName`).
    pub name: &'static str,
    /// Backing column name (`last_name`).
    pub column: &'static str,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    /// Returns whether `value` may be compared against this field.
    ///
    /// Null is always accepted. Real fields also take integers.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        matches!(
            (self.kind, value),
            (_, FieldValue::Null)
                | (FieldKind::Integer, FieldValue::Integer(_))
                | (FieldKind::Real, FieldValue::Integer(_) | FieldValue::Real(_))
                | (FieldKind::Text, FieldValue::Text(_))
        )
    }
}

/// Static description of one persistable entity type.
#[derive(Debug, PartialEq, Eq)]
pub struct EntityDescriptor {
    /// Entity name used in query strings and registry lookups.
    pub name: &'static str,
    /// Backing table name.
    pub table: &'static str,
    /// Name of the identity field.
    pub id_field: &'static str,
    /// All fields, identity included, in column order.
    pub fields: &'static [FieldDescriptor],
}

impl EntityDescriptor {
    /// Looks up one field by its caller-facing name.
    pub fn field(&self, name: &str) -> Option<&'static FieldDescriptor> {
        let fields: &'static [FieldDescriptor] = self.fields;
        fields.iter().find(|field| field.name == name)
    }

    /// Returns the identity field descriptor.
    pub fn id_descriptor(&self) -> Option<&'static FieldDescriptor> {
        self.field(self.id_field)
    }

    /// Returns backing column names in field order.
    pub fn columns(&self) -> impl Iterator<Item = &'static str> {
        let fields: &'static [FieldDescriptor] = self.fields;
        fields.iter().map(|field| field.column)
    }
}

static NULL_VALUE: FieldValue = FieldValue::Null;

/// Column values of one row keyed by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: BTreeMap<&'static str, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &'static str, value: impl Into<FieldValue>) -> Self {
        self.values.insert(field, value.into());
        self
    }

    pub fn insert(&mut self, field: &'static str, value: FieldValue) {
        self.values.insert(field, value);
    }

    /// Returns the stored value, treating missing fields as null.
    pub fn get(&self, field: &str) -> &FieldValue {
        self.values.get(field).unwrap_or(&NULL_VALUE)
    }

    pub fn text(&self, field: &str) -> DbResult<String> {
        self.optional_text(field)?
            .ok_or_else(|| DbError::InvalidData(format!("field `{field}` must not be null")))
    }

    pub fn optional_text(&self, field: &str) -> DbResult<Option<String>> {
        match self.get(field) {
            FieldValue::Null => Ok(None),
            FieldValue::Text(value) => Ok(Some(value.clone())),
            other => Err(type_mismatch(field, "text", other)),
        }
    }

    pub fn optional_integer(&self, field: &str) -> DbResult<Option<i64>> {
        match self.get(field) {
            FieldValue::Null => Ok(None),
            FieldValue::Integer(value) => Ok(Some(*value)),
            other => Err(type_mismatch(field, "integer", other)),
        }
    }

    pub fn optional_real(&self, field: &str) -> DbResult<Option<f64>> {
        match self.get(field) {
            FieldValue::Null => Ok(None),
            FieldValue::Integer(value) => Ok(Some(*value as f64)),
            FieldValue::Real(value) => Ok(Some(*value)),
            other => Err(type_mismatch(field, "real", other)),
        }
    }
}

fn type_mismatch(field: &str, expected: &str, actual: &FieldValue) -> DbError {
    DbError::InvalidData(format!(
        "field `{field}` expected {expected} value, got {actual}"
    ))
}

/// Capability implemented by every persistable type.
///
/// # Invariants
/// - `descriptor()` always returns the same static descriptor.
/// - `from_record(&entity.to_record())` reproduces `entity`.
pub trait Entity: Clone + Debug + Sized {
    fn descriptor() -> &'static EntityDescriptor;

    /// Identity value, `None` while the entity has never been persisted.
    fn id(&self) -> Option<EntityId>;

    /// Stores a session-assigned identity.
    fn set_id(&mut self, id: EntityId);

    fn to_record(&self) -> Record;

    fn from_record(record: &Record) -> DbResult<Self>;
}
