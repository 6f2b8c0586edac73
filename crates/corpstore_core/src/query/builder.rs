//! Fluent query builder over one entity type.
//!
//! # Responsibility
//! - Accumulate equality, pattern, sort and page criteria for `T`.
//! - Compile a fresh `QueryPlan` on every `execute`/`count` call.
//!
//! # Invariants
//! - Conditions are keyed by field name; re-adding a field overwrites its
//!   value in place and keeps its original position.
//! - Equality predicates precede pattern predicates in the compiled plan.
//! - Criteria persist across executions until overwritten.

use crate::model::entity::{Entity, EntityDescriptor, FieldDescriptor};
use crate::model::value::FieldValue;
use crate::query::plan::{Filter, OrderSpec, PageSpec, QueryPlan};
use crate::repo::validate::{ensure_registered, ensure_value_kind, resolve_field};
use crate::repo::RepoResult;
use crate::session::PersistenceSession;
use log::debug;
use std::marker::PhantomData;
use std::time::Instant;

/// Single-owner builder bound to one session and one entity type.
pub struct QueryBuilder<'s, S: PersistenceSession, T: Entity> {
    session: &'s S,
    entity: &'static EntityDescriptor,
    equals: Vec<(&'static FieldDescriptor, FieldValue)>,
    likes: Vec<(&'static FieldDescriptor, String)>,
    order: Option<OrderSpec>,
    page: Option<PageSpec>,
    _entity: PhantomData<fn() -> T>,
}

impl<'s, S: PersistenceSession, T: Entity> QueryBuilder<'s, S, T> {
    /// Creates an empty builder; fails with `InvalidEntity` for an
    /// unregistered `T`.
    pub fn for_entity(session: &'s S) -> RepoResult<Self> {
        let entity = ensure_registered::<S, T>(session)?;
        Ok(Self {
            session,
            entity,
            equals: Vec::new(),
            likes: Vec::new(),
            order: None,
            page: None,
            _entity: PhantomData,
        })
    }

    /// Adds or overwrites an equality condition. A null value matches rows
    /// whose field is null; any other value must fit the field's kind.
    pub fn where_equals(
        &mut self,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> RepoResult<&mut Self> {
        let field = resolve_field(self.entity, field)?;
        let value = ensure_value_kind(field, value.into())?;
        upsert(&mut self.equals, field, value);
        Ok(self)
    }

    /// Adds or overwrites a `LIKE` condition (`%` any run, `_` one char).
    pub fn where_like(&mut self, field: &str, pattern: &str) -> RepoResult<&mut Self> {
        let field = resolve_field(self.entity, field)?;
        upsert(&mut self.likes, field, pattern.to_string());
        Ok(self)
    }

    /// Sets the single sort key, replacing any earlier one.
    pub fn order_by(&mut self, field: &str, ascending: bool) -> RepoResult<&mut Self> {
        let field = resolve_field(self.entity, field)?;
        self.order = Some(OrderSpec { field, ascending });
        Ok(self)
    }

    /// Sets the 1-based page window, replacing any earlier one.
    pub fn paginate(&mut self, page_number: i64, page_size: i64) -> RepoResult<&mut Self> {
        self.page = Some(PageSpec::new(page_number, page_size)?);
        Ok(self)
    }

    /// Compiles the current criteria into a new plan.
    pub fn compile(&self) -> QueryPlan {
        QueryPlan::select_all(self.entity)
            .with_filter(self.filter())
            .with_order(self.order)
            .with_window(self.page.map(|page| page.window()))
    }

    /// Runs the compiled plan and returns matching entities in plan order.
    pub fn execute(&self) -> RepoResult<Vec<T>> {
        ensure_registered::<S, T>(self.session)?;
        let plan = self.compile();
        let started_at = Instant::now();
        let rows = self.session.execute_query::<T>(&plan)?;
        debug!(
            "event=query_execute module=query status=ok entity={} rows={} duration_ms={} query=\"{}\"",
            self.entity.name,
            rows.len(),
            started_at.elapsed().as_millis(),
            plan.to_query_string()
        );
        Ok(rows)
    }

    /// Counts rows matching the accumulated conditions. Sort and page
    /// criteria are ignored.
    pub fn count(&self) -> RepoResult<u64> {
        ensure_registered::<S, T>(self.session)?;
        let filter = self.filter();
        Ok(self
            .session
            .execute_scalar_count(self.entity, Some(&filter))?)
    }

    fn filter(&self) -> Filter {
        let mut filter = Filter::new();
        for (field, value) in &self.equals {
            filter.push_equals(*field, value.clone());
        }
        for (field, pattern) in &self.likes {
            filter.push_like(*field, pattern);
        }
        filter
    }
}

fn upsert<V>(
    conditions: &mut Vec<(&'static FieldDescriptor, V)>,
    field: &'static FieldDescriptor,
    value: V,
) {
    match conditions
        .iter_mut()
        .find(|(existing, _)| existing.name == field.name)
    {
        Some(slot) => slot.1 = value,
        None => conditions.push((field, value)),
    }
}
