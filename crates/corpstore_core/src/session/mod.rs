//! Persistence session contract and implementations.
//!
//! # Responsibility
//! - Define the narrow capability set repositories and builders call into.
//! - Provide a SQLite-backed session and an in-memory reference session.
//!
//! # Invariants
//! - Sessions never validate caller arguments; repositories do that first.
//! - Every implementation orders text case-insensitively, breaks ties by
//!   identity in the sort direction, and applies windows after ordering.

mod memory;
mod sqlite;

pub use memory::InMemorySession;
pub use sqlite::SqliteSession;

use crate::db::DbResult;
use crate::model::entity::{Entity, EntityDescriptor};
use crate::model::value::FieldValue;
use crate::query::plan::{Filter, QueryPlan};

/// Storage-facing operations consumed by the repository layer.
///
/// All calls are synchronous and complete one storage round trip.
pub trait PersistenceSession {
    /// Registry lookup used before any other call.
    fn is_registered_type(&self, descriptor: &EntityDescriptor) -> bool;

    fn find_by_identity<T: Entity>(&self, id: &FieldValue) -> DbResult<Option<T>>;

    fn execute_query<T: Entity>(&self, plan: &QueryPlan) -> DbResult<Vec<T>>;

    fn execute_scalar_count(
        &self,
        entity: &'static EntityDescriptor,
        filter: Option<&Filter>,
    ) -> DbResult<u64>;

    /// Insert-or-update; returns the canonical stored instance.
    fn merge<T: Entity>(&self, entity: &T) -> DbResult<T>;

    fn remove<T: Entity>(&self, entity: &T) -> DbResult<()>;

    /// Whether `entity` matches the stored state of its row exactly.
    fn is_managed<T: Entity>(&self, entity: &T) -> DbResult<bool>;
}
