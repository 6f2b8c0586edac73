//! Registry of persistable entity types.
//!
//! # Responsibility
//! - Hold the static descriptors a session is allowed to query.
//! - Reject malformed descriptors at registration time.
//!
//! # Invariants
//! - Entity names are unique within one registry.
//! - Entity and field names are identifiers without `__`, which keeps
//!   generated parameter names collision-free.

use crate::model::entity::{Entity, EntityDescriptor};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    InvalidEntityName(String),
    InvalidFieldName {
        entity: &'static str,
        field: String,
    },
    MissingIdentityField(&'static str),
    DuplicateEntity(&'static str),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEntityName(name) => write!(f, "entity name is invalid: `{name}`"),
            Self::InvalidFieldName { entity, field } => {
                write!(f, "field name is invalid on {entity}: `{field}`")
            }
            Self::MissingIdentityField(entity) => {
                write!(f, "identity field is not declared on {entity}")
            }
            Self::DuplicateEntity(entity) => write!(f, "entity already registered: {entity}"),
        }
    }
}

impl Error for RegistryError {}

/// Mapping from entity name to its static descriptor.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entries: BTreeMap<&'static str, &'static EntityDescriptor>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the descriptor of `T`.
    pub fn register<T: Entity>(&mut self) -> Result<(), RegistryError> {
        self.register_descriptor(T::descriptor())
    }

    /// Registers one descriptor after validating its names.
    pub fn register_descriptor(
        &mut self,
        descriptor: &'static EntityDescriptor,
    ) -> Result<(), RegistryError> {
        if !is_valid_name(descriptor.name) || !is_valid_name(descriptor.table) {
            return Err(RegistryError::InvalidEntityName(
                descriptor.name.to_string(),
            ));
        }
        if let Some(field) = descriptor
            .fields
            .iter()
            .find(|field| !is_valid_name(field.name) || !is_valid_name(field.column))
        {
            return Err(RegistryError::InvalidFieldName {
                entity: descriptor.name,
                field: field.name.to_string(),
            });
        }
        if descriptor.id_descriptor().is_none() {
            return Err(RegistryError::MissingIdentityField(descriptor.name));
        }
        if self.entries.contains_key(descriptor.name) {
            return Err(RegistryError::DuplicateEntity(descriptor.name));
        }

        self.entries.insert(descriptor.name, descriptor);
        Ok(())
    }

    /// Returns whether exactly this descriptor is registered under its name.
    pub fn contains(&self, descriptor: &EntityDescriptor) -> bool {
        self.entries
            .get(descriptor.name)
            .is_some_and(|registered| *registered == descriptor)
    }

    pub fn get(&self, name: &str) -> Option<&'static EntityDescriptor> {
        self.entries.get(name).copied()
    }

    /// Returns registered entity names in sorted order.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_valid_name(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_alphabetic()
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        && !value.contains("__")
}

#[cfg(test)]
mod tests {
    use super::{EntityRegistry, RegistryError};
    use crate::model::entity::{EntityDescriptor, FieldDescriptor, FieldKind};

    static GOOD: EntityDescriptor = EntityDescriptor {
        name: "Good",
        table: "goods",
        id_field: "id",
        fields: &[FieldDescriptor {
            name: "id",
            column: "id",
            kind: FieldKind::Integer,
        }],
    };

    static GOOD_SHADOW: EntityDescriptor = EntityDescriptor {
        name: "Good",
        table: "other_goods",
        id_field: "id",
        fields: &[FieldDescriptor {
            name: "id",
            column: "id",
            kind: FieldKind::Integer,
        }],
    };

    static NO_IDENTITY: EntityDescriptor = EntityDescriptor {
        name: "NoIdentity",
        table: "no_identity",
        id_field: "id",
        fields: &[],
    };

    static BAD_FIELD: EntityDescriptor = EntityDescriptor {
        name: "BadField",
        table: "bad_fields",
        id_field: "id",
        fields: &[
            FieldDescriptor {
                name: "id",
                column: "id",
                kind: FieldKind::Integer,
            },
            FieldDescriptor {
                name: "name__like",
                column: "name",
                kind: FieldKind::Text,
            },
        ],
    };

    #[test]
    fn register_and_lookup() {
        let mut registry = EntityRegistry::new();
        registry.register_descriptor(&GOOD).unwrap();

        assert!(registry.contains(&GOOD));
        assert_eq!(registry.names(), vec!["Good"]);
        assert_eq!(registry.get("Good").map(|d| d.table), Some("goods"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn same_name_with_different_shape_is_not_registered() {
        let mut registry = EntityRegistry::new();
        registry.register_descriptor(&GOOD).unwrap();

        assert!(!registry.contains(&GOOD_SHADOW));
        assert_eq!(
            registry.register_descriptor(&GOOD_SHADOW),
            Err(RegistryError::DuplicateEntity("Good"))
        );
    }

    #[test]
    fn malformed_descriptors_are_rejected() {
        let mut registry = EntityRegistry::new();

        assert_eq!(
            registry.register_descriptor(&NO_IDENTITY),
            Err(RegistryError::MissingIdentityField("NoIdentity"))
        );
        assert!(matches!(
            registry.register_descriptor(&BAD_FIELD),
            Err(RegistryError::InvalidFieldName { entity: "BadField", .. })
        ));
        assert!(registry.is_empty());
    }
}
