//! Generic repository over any registered entity type.
//!
//! # Responsibility
//! - Provide CRUD and simple-query operations for every `T: Entity`.
//! - Validate arguments before any session call.
//!
//! # Invariants
//! - Validation order is entity, then field/pattern, then pagination, then
//!   id; the first failing check is the one reported.
//! - The repository holds no entity state; each call builds its own plan.
//! - Session errors pass through untranslated as `RepoError::Db`.

use crate::model::entity::{Entity, EntityDescriptor};
use crate::model::value::FieldValue;
use crate::query::plan::{Filter, OrderSpec, PageSpec, QueryPlan, Window};
use crate::query::QueryBuilder;
use crate::repo::validate::{ensure_id, ensure_registered, ensure_value_kind, resolve_field};
use crate::repo::{RepoError, RepoResult};
use crate::session::PersistenceSession;
use log::debug;

/// Data access operations available for every registered entity type.
pub trait GenericRepository {
    type Session: PersistenceSession;

    /// Loads one entity; fails with `EntityNotFound` when absent.
    fn find_by_id<T: Entity>(&self, id: impl Into<FieldValue>) -> RepoResult<T>;

    /// Loads every row in identity order.
    fn find_all<T: Entity>(&self) -> RepoResult<Vec<T>>;

    /// Loads every row sorted by the case-insensitive value of `sort_field`.
    fn find_all_sorted<T: Entity>(&self, sort_field: &str, ascending: bool)
        -> RepoResult<Vec<T>>;

    /// Loads one 1-based page of rows in identity order.
    fn find_all_paged<T: Entity>(&self, page: i64, page_size: i64) -> RepoResult<Vec<T>>;

    fn find_by<T: Entity>(&self, field: &str, value: impl Into<FieldValue>)
        -> RepoResult<Vec<T>>;

    fn find_by_like<T: Entity>(&self, field: &str, pattern: &str) -> RepoResult<Vec<T>>;

    /// Loads the single row where `field` equals `value`.
    ///
    /// Fails with `EntityNotFound` for zero matches and `NonUniqueResult` for
    /// more than one.
    fn find_one_by<T: Entity>(&self, field: &str, value: impl Into<FieldValue>) -> RepoResult<T>;

    /// Inserts or updates `entity` and returns the stored instance.
    fn save<T: Entity>(&self, entity: &T) -> RepoResult<T>;

    /// Removes the row backing `entity`.
    fn delete<T: Entity>(&self, entity: &T) -> RepoResult<()>;

    fn delete_by_id<T: Entity>(&self, id: impl Into<FieldValue>) -> RepoResult<()>;

    fn count<T: Entity>(&self) -> RepoResult<u64>;

    fn exists_by_id<T: Entity>(&self, id: impl Into<FieldValue>) -> RepoResult<bool>;

    /// Returns a fresh builder bound to this repository's session.
    fn query_builder_for<T: Entity>(&self) -> RepoResult<QueryBuilder<'_, Self::Session, T>>;
}

/// Repository backed by one borrowed persistence session.
pub struct SessionRepository<'s, S: PersistenceSession> {
    session: &'s S,
}

impl<'s, S: PersistenceSession> SessionRepository<'s, S> {
    pub fn new(session: &'s S) -> Self {
        Self { session }
    }

    fn query<T: Entity>(&self, plan: &QueryPlan) -> RepoResult<Vec<T>> {
        Ok(self.session.execute_query::<T>(plan)?)
    }

    fn equality_plan(
        descriptor: &'static EntityDescriptor,
        field: &str,
        value: FieldValue,
    ) -> RepoResult<QueryPlan> {
        let field = resolve_field(descriptor, field)?;
        let value = ensure_value_kind(field, value)?;
        let mut filter = Filter::new();
        filter.push_equals(field, value);
        Ok(QueryPlan::select_all(descriptor).with_filter(filter))
    }
}

fn not_found(descriptor: &EntityDescriptor, detail: String) -> RepoError {
    RepoError::EntityNotFound {
        entity: descriptor.name,
        detail,
    }
}

impl<S: PersistenceSession> GenericRepository for SessionRepository<'_, S> {
    type Session = S;

    fn find_by_id<T: Entity>(&self, id: impl Into<FieldValue>) -> RepoResult<T> {
        let descriptor = ensure_registered::<S, T>(self.session)?;
        let id = ensure_id(descriptor, id.into())?;
        self.session
            .find_by_identity::<T>(&id)?
            .ok_or_else(|| not_found(descriptor, format!("id={id}")))
    }

    fn find_all<T: Entity>(&self) -> RepoResult<Vec<T>> {
        let descriptor = ensure_registered::<S, T>(self.session)?;
        self.query(&QueryPlan::select_all(descriptor))
    }

    fn find_all_sorted<T: Entity>(
        &self,
        sort_field: &str,
        ascending: bool,
    ) -> RepoResult<Vec<T>> {
        let descriptor = ensure_registered::<S, T>(self.session)?;
        let field = resolve_field(descriptor, sort_field)?;
        let plan =
            QueryPlan::select_all(descriptor).with_order(Some(OrderSpec { field, ascending }));
        self.query(&plan)
    }

    fn find_all_paged<T: Entity>(&self, page: i64, page_size: i64) -> RepoResult<Vec<T>> {
        let descriptor = ensure_registered::<S, T>(self.session)?;
        let page = PageSpec::new(page, page_size)?;
        self.query(&QueryPlan::select_all(descriptor).with_window(Some(page.window())))
    }

    fn find_by<T: Entity>(
        &self,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> RepoResult<Vec<T>> {
        let descriptor = ensure_registered::<S, T>(self.session)?;
        let plan = Self::equality_plan(descriptor, field, value.into())?;
        self.query(&plan)
    }

    fn find_by_like<T: Entity>(&self, field: &str, pattern: &str) -> RepoResult<Vec<T>> {
        let descriptor = ensure_registered::<S, T>(self.session)?;
        let field = resolve_field(descriptor, field)?;
        let mut filter = Filter::new();
        filter.push_like(field, pattern);
        self.query(&QueryPlan::select_all(descriptor).with_filter(filter))
    }

    fn find_one_by<T: Entity>(&self, field: &str, value: impl Into<FieldValue>) -> RepoResult<T> {
        let descriptor = ensure_registered::<S, T>(self.session)?;
        let value = value.into();
        let plan = Self::equality_plan(descriptor, field, value.clone())?
            .with_window(Some(Window { offset: 0, limit: 2 }));

        let mut rows = self.query::<T>(&plan)?;
        if rows.len() > 1 {
            return Err(RepoError::NonUniqueResult {
                entity: descriptor.name,
                field: field.trim().to_string(),
            });
        }
        rows.pop()
            .ok_or_else(|| not_found(descriptor, format!("{}={value}", field.trim())))
    }

    fn save<T: Entity>(&self, entity: &T) -> RepoResult<T> {
        let descriptor = ensure_registered::<S, T>(self.session)?;
        let saved = self.session.merge(entity)?;
        debug!(
            "event=repo_save module=repo status=ok entity={} id={:?}",
            descriptor.name,
            saved.id()
        );
        Ok(saved)
    }

    fn delete<T: Entity>(&self, entity: &T) -> RepoResult<()> {
        let descriptor = ensure_registered::<S, T>(self.session)?;

        if !self.session.is_managed(entity)? {
            let Some(id) = entity.id() else {
                return Err(not_found(descriptor, "entity has no identity".to_string()));
            };
            let id = FieldValue::Integer(id);
            if self.session.find_by_identity::<T>(&id)?.is_none() {
                return Err(not_found(descriptor, format!("id={id}")));
            }
            let attached = self.session.merge(entity)?;
            self.session.remove(&attached)?;
        } else {
            self.session.remove(entity)?;
        }

        debug!(
            "event=repo_delete module=repo status=ok entity={} id={:?}",
            descriptor.name,
            entity.id()
        );
        Ok(())
    }

    fn delete_by_id<T: Entity>(&self, id: impl Into<FieldValue>) -> RepoResult<()> {
        let descriptor = ensure_registered::<S, T>(self.session)?;
        let id = ensure_id(descriptor, id.into())?;
        let entity = self
            .session
            .find_by_identity::<T>(&id)?
            .ok_or_else(|| not_found(descriptor, format!("id={id}")))?;
        self.session.remove(&entity)?;
        debug!(
            "event=repo_delete module=repo status=ok entity={} id={id}",
            descriptor.name
        );
        Ok(())
    }

    fn count<T: Entity>(&self) -> RepoResult<u64> {
        let descriptor = ensure_registered::<S, T>(self.session)?;
        Ok(self.session.execute_scalar_count(descriptor, None)?)
    }

    fn exists_by_id<T: Entity>(&self, id: impl Into<FieldValue>) -> RepoResult<bool> {
        let descriptor = ensure_registered::<S, T>(self.session)?;
        let id = ensure_id(descriptor, id.into())?;
        Ok(self.session.find_by_identity::<T>(&id)?.is_some())
    }

    fn query_builder_for<T: Entity>(&self) -> RepoResult<QueryBuilder<'_, S, T>> {
        QueryBuilder::for_entity(self.session)
    }
}
