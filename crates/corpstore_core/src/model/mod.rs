//! Persistable entity model and type registry.
//!
//! # Responsibility
//! - Define the `Entity` capability and static entity descriptors.
//! - Provide the registry that replaces runtime type introspection.
//!
//! # Invariants
//! - Every persistable type is described by exactly one static descriptor.
//! - Sessions only accept types present in their registry.

pub mod department;
pub mod employee;
pub mod entity;
pub mod registry;
pub mod value;

use department::Department;
use employee::Employee;
use registry::{EntityRegistry, RegistryError};

/// Returns a registry containing every entity shipped with this crate.
pub fn default_registry() -> Result<EntityRegistry, RegistryError> {
    let mut registry = EntityRegistry::new();
    registry.register::<Department>()?;
    registry.register::<Employee>()?;
    Ok(registry)
}
