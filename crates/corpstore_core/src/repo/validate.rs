//! Argument checks shared by the repository and the query builder.
//!
//! Callers run them in a fixed order: entity, then field/pattern, then
//! pagination, so the first applicable error is the one reported.

use crate::model::entity::{Entity, EntityDescriptor, FieldDescriptor};
use crate::model::value::FieldValue;
use crate::repo::{RepoError, RepoResult};
use crate::session::PersistenceSession;

/// Fails with `InvalidEntity` unless the session knows `T`.
pub(crate) fn ensure_registered<S, T>(session: &S) -> RepoResult<&'static EntityDescriptor>
where
    S: PersistenceSession,
    T: Entity,
{
    let descriptor = T::descriptor();
    if !session.is_registered_type(descriptor) {
        return Err(RepoError::InvalidEntity(format!(
            "{} is not a registered entity",
            descriptor.name
        )));
    }
    Ok(descriptor)
}

/// Resolves a caller-supplied field name, trimmed, against `descriptor`.
pub(crate) fn resolve_field(
    descriptor: &'static EntityDescriptor,
    field: &str,
) -> RepoResult<&'static FieldDescriptor> {
    let name = field.trim();
    if name.is_empty() {
        return Err(RepoError::InvalidField(
            "field name cannot be empty".to_string(),
        ));
    }
    descriptor.field(name).ok_or_else(|| {
        RepoError::InvalidField(format!("{} has no field `{name}`", descriptor.name))
    })
}

/// Fails with `InvalidField` when a non-null `value` does not fit the
/// field's kind.
pub(crate) fn ensure_value_kind(
    field: &FieldDescriptor,
    value: FieldValue,
) -> RepoResult<FieldValue> {
    if !field.accepts(&value) {
        return Err(RepoError::InvalidField(format!(
            "`{}` holds {:?} values, got {value:?}",
            field.name, field.kind
        )));
    }
    Ok(value)
}

/// Fails with `InvalidId` for a null identifier or one of the wrong kind.
pub(crate) fn ensure_id(descriptor: &EntityDescriptor, id: FieldValue) -> RepoResult<FieldValue> {
    if id.is_null() {
        return Err(RepoError::InvalidId(format!(
            "id cannot be null for {}",
            descriptor.name
        )));
    }
    if let Some(id_field) = descriptor.id_descriptor() {
        if !id_field.accepts(&id) {
            return Err(RepoError::InvalidId(format!(
                "{} ids are {:?}, got {id:?}",
                descriptor.name, id_field.kind
            )));
        }
    }
    Ok(id)
}
