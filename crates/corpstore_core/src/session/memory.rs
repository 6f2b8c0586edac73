//! In-memory persistence session.
//!
//! Keeps one ordered row list per registered entity and evaluates query plans
//! with the same comparison rules the SQLite session compiles to SQL. Foreign
//! keys are not enforced. `LIKE` is case-sensitive, matching the
//! `case_sensitive_like` pragma set on every SQLite connection.

use crate::db::{DbError, DbResult};
use crate::model::entity::{Entity, EntityDescriptor, EntityId, Record};
use crate::model::registry::EntityRegistry;
use crate::model::value::FieldValue;
use crate::query::plan::{Comparison, Filter, OrderSpec, QueryPlan};
use crate::session::PersistenceSession;
use log::debug;
use regex::Regex;
use std::cell::RefCell;
use std::collections::BTreeMap;

#[derive(Debug)]
struct Table {
    next_id: EntityId,
    rows: Vec<Record>,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: Vec::new(),
        }
    }
}

impl Table {
    fn position(&self, id_field: &str, id: &FieldValue) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| row.get(id_field).matches(id))
    }
}

/// Session holding rows in process memory; useful for tests and demos.
#[derive(Debug)]
pub struct InMemorySession {
    registry: EntityRegistry,
    tables: RefCell<BTreeMap<&'static str, Table>>,
}

impl InMemorySession {
    pub fn new(registry: EntityRegistry) -> Self {
        Self {
            registry,
            tables: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    fn rows_matching(&self, entity: &EntityDescriptor, filter: &Filter) -> DbResult<Vec<Record>> {
        let matcher = RowMatcher::compile(filter)?;
        let tables = self.tables.borrow();
        let Some(table) = tables.get(entity.name) else {
            return Ok(Vec::new());
        };
        Ok(table
            .rows
            .iter()
            .filter(|row| matcher.matches(row))
            .cloned()
            .collect())
    }

    fn stored_record(&self, entity: &EntityDescriptor, id: &FieldValue) -> Option<Record> {
        let tables = self.tables.borrow();
        let table = tables.get(entity.name)?;
        let position = table.position(entity.id_field, id)?;
        table.rows.get(position).cloned()
    }
}

impl PersistenceSession for InMemorySession {
    fn is_registered_type(&self, descriptor: &EntityDescriptor) -> bool {
        self.registry.contains(descriptor)
    }

    fn find_by_identity<T: Entity>(&self, id: &FieldValue) -> DbResult<Option<T>> {
        self.stored_record(T::descriptor(), id)
            .map(|record| T::from_record(&record))
            .transpose()
    }

    fn execute_query<T: Entity>(&self, plan: &QueryPlan) -> DbResult<Vec<T>> {
        let mut rows = self.rows_matching(plan.entity, &plan.filter)?;
        sort_rows(&mut rows, plan.entity.id_field, plan.order.as_ref());

        let rows = match &plan.window {
            Some(window) => rows
                .into_iter()
                .skip(usize::try_from(window.offset).unwrap_or(usize::MAX))
                .take(usize::try_from(window.limit).unwrap_or(usize::MAX))
                .collect(),
            None => rows,
        };
        debug!(
            "event=memory_select module=session status=ok entity={} rows={}",
            plan.entity.name,
            rows.len()
        );
        rows.iter().map(T::from_record).collect()
    }

    fn execute_scalar_count(
        &self,
        entity: &'static EntityDescriptor,
        filter: Option<&Filter>,
    ) -> DbResult<u64> {
        let count = match filter {
            Some(filter) => self.rows_matching(entity, filter)?.len(),
            None => self
                .tables
                .borrow()
                .get(entity.name)
                .map_or(0, |table| table.rows.len()),
        };
        Ok(count as u64)
    }

    fn merge<T: Entity>(&self, entity: &T) -> DbResult<T> {
        let descriptor = T::descriptor();
        let mut record = entity.to_record();

        let stored = {
            let mut tables = self.tables.borrow_mut();
            let table = tables.entry(descriptor.name).or_default();
            let id = match entity.id() {
                Some(id) => id,
                None => table.next_id,
            };
            record.insert(descriptor.id_field, FieldValue::Integer(id));

            match table.position(descriptor.id_field, &FieldValue::Integer(id)) {
                Some(position) => table.rows[position] = record.clone(),
                None => table.rows.push(record.clone()),
            }
            table.next_id = table.next_id.max(id.saturating_add(1));
            record
        };

        debug!(
            "event=memory_merge module=session status=ok entity={}",
            descriptor.name
        );
        T::from_record(&stored)
    }

    fn remove<T: Entity>(&self, entity: &T) -> DbResult<()> {
        let descriptor = T::descriptor();
        let id = entity.id().ok_or_else(|| {
            DbError::InvalidData(format!("cannot remove transient {}", descriptor.name))
        })?;

        let mut tables = self.tables.borrow_mut();
        if let Some(table) = tables.get_mut(descriptor.name) {
            table
                .rows
                .retain(|row| !row.get(descriptor.id_field).matches(&FieldValue::Integer(id)));
        }
        Ok(())
    }

    fn is_managed<T: Entity>(&self, entity: &T) -> DbResult<bool> {
        let Some(id) = entity.id() else {
            return Ok(false);
        };
        let stored = self.stored_record(T::descriptor(), &FieldValue::Integer(id));
        Ok(stored.is_some_and(|stored| stored == entity.to_record()))
    }
}

/// Filter predicates with their patterns compiled once per query.
struct RowMatcher<'f> {
    conditions: Vec<Condition<'f>>,
}

enum Condition<'f> {
    Equals {
        field: &'static str,
        value: &'f FieldValue,
    },
    Like {
        field: &'static str,
        pattern: Regex,
    },
}

impl<'f> RowMatcher<'f> {
    fn compile(filter: &'f Filter) -> DbResult<Self> {
        static NULL: FieldValue = FieldValue::Null;

        let mut conditions = Vec::with_capacity(filter.predicates().len());
        for predicate in filter.predicates() {
            let field = predicate.field.name;
            let value = filter.binding(&predicate.param).unwrap_or(&NULL);
            let condition = match predicate.comparison {
                Comparison::Equals => Condition::Equals { field, value },
                Comparison::Like => {
                    let pattern = value.to_match_text().unwrap_or_default();
                    Condition::Like {
                        field,
                        pattern: like_regex(&pattern)?,
                    }
                }
            };
            conditions.push(condition);
        }
        Ok(Self { conditions })
    }

    fn matches(&self, row: &Record) -> bool {
        self.conditions.iter().all(|condition| match condition {
            Condition::Equals { field, value } => row.get(field).matches(value),
            Condition::Like { field, pattern } => row
                .get(field)
                .to_match_text()
                .is_some_and(|text| pattern.is_match(&text)),
        })
    }
}

/// Translates a `LIKE` pattern into an anchored regex: `%` matches any run,
/// `_` matches one character, everything else is literal.
fn like_regex(pattern: &str) -> DbResult<Regex> {
    let mut source = String::from("(?s)^");
    for ch in pattern.chars() {
        match ch {
            '%' => source.push_str(".*"),
            '_' => source.push('.'),
            other => source.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    source.push('$');
    Regex::new(&source)
        .map_err(|err| DbError::InvalidData(format!("invalid like pattern `{pattern}`: {err}")))
}

fn sort_rows(rows: &mut [Record], id_field: &str, order: Option<&OrderSpec>) {
    let by_id = |left: &Record, right: &Record| left.get(id_field).compare(right.get(id_field));
    let Some(order) = order else {
        rows.sort_by(by_id);
        return;
    };

    let field = order.field.name;
    let case_insensitive = order.is_case_insensitive();
    rows.sort_by(|left, right| {
        let ordering = sort_key(left.get(field), case_insensitive)
            .compare(&sort_key(right.get(field), case_insensitive))
            .then_with(|| by_id(left, right));
        if order.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}

fn sort_key(value: &FieldValue, case_insensitive: bool) -> FieldValue {
    match value {
        FieldValue::Text(text) if case_insensitive => FieldValue::Text(text.to_lowercase()),
        other => other.clone(),
    }
}
