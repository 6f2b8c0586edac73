//! SQLite-backed persistence session.
//!
//! # Responsibility
//! - Compile query plans into parameterized SQL with named parameters.
//! - Map rows to and from entity records through static descriptors.
//!
//! # Invariants
//! - Identifiers in SQL text come only from registered descriptors; every
//!   caller-supplied value is bound as a parameter.
//! - Text ordering uses `unicode_lower(column)`; ties break on the identity column in
//!   the same direction, so descending output is the exact reverse.
//! - Null equality renders as `IS NULL`.

use crate::db::{DbError, DbResult, UNICODE_LOWER_FN};
use crate::model::entity::{Entity, EntityDescriptor, EntityId, FieldDescriptor, Record};
use crate::model::registry::EntityRegistry;
use crate::model::value::FieldValue;
use crate::query::plan::{Comparison, Filter, QueryPlan};
use crate::session::PersistenceSession;
use log::debug;
use rusqlite::types::{ToSql, Value};
use rusqlite::{Connection, Row};
use std::time::Instant;

const LIMIT_PARAM: &str = ":__limit";
const OFFSET_PARAM: &str = ":__offset";

/// SQL text plus named parameter values.
#[derive(Debug)]
struct Statement {
    sql: String,
    params: Vec<(String, Value)>,
}

impl Statement {
    fn new(sql: String) -> Self {
        Self {
            sql,
            params: Vec::new(),
        }
    }

    fn bind(&mut self, name: &str, value: Value) {
        self.params.push((format!(":{name}"), value));
    }

    fn bound(&self) -> Vec<(&str, &dyn ToSql)> {
        self.params
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect()
    }
}

/// Session over one borrowed, migrated connection.
pub struct SqliteSession<'conn> {
    conn: &'conn Connection,
    registry: EntityRegistry,
}

impl<'conn> SqliteSession<'conn> {
    pub fn new(conn: &'conn Connection, registry: EntityRegistry) -> Self {
        Self { conn, registry }
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    fn query_records(
        &self,
        descriptor: &'static EntityDescriptor,
        statement: &Statement,
    ) -> DbResult<Vec<Record>> {
        let mut stmt = self.conn.prepare(&statement.sql)?;
        let bound = statement.bound();
        let mut rows = stmt.query(bound.as_slice())?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(read_record(descriptor, row)?);
        }
        Ok(records)
    }

    fn execute(&self, statement: &Statement) -> DbResult<usize> {
        let bound = statement.bound();
        Ok(self.conn.execute(&statement.sql, bound.as_slice())?)
    }

    fn find_record(
        &self,
        descriptor: &'static EntityDescriptor,
        id: &FieldValue,
    ) -> DbResult<Option<Record>> {
        let id_field = identity_field(descriptor)?;
        let mut filter = Filter::new();
        filter.push_equals(id_field, id.clone());
        let plan = QueryPlan::select_all(descriptor).with_filter(filter);

        let records = self.query_records(descriptor, &render_select(&plan))?;
        Ok(records.into_iter().next())
    }
}

impl PersistenceSession for SqliteSession<'_> {
    fn is_registered_type(&self, descriptor: &EntityDescriptor) -> bool {
        self.registry.contains(descriptor)
    }

    fn find_by_identity<T: Entity>(&self, id: &FieldValue) -> DbResult<Option<T>> {
        self.find_record(T::descriptor(), id)?
            .map(|record| T::from_record(&record))
            .transpose()
    }

    fn execute_query<T: Entity>(&self, plan: &QueryPlan) -> DbResult<Vec<T>> {
        let started_at = Instant::now();
        let statement = render_select(plan);
        let records = self.query_records(plan.entity, &statement)?;
        debug!(
            "event=sql_select module=session status=ok table={} rows={} duration_ms={} sql=\"{}\"",
            plan.entity.table,
            records.len(),
            started_at.elapsed().as_millis(),
            statement.sql
        );
        records.iter().map(T::from_record).collect()
    }

    fn execute_scalar_count(
        &self,
        entity: &'static EntityDescriptor,
        filter: Option<&Filter>,
    ) -> DbResult<u64> {
        let mut statement = Statement::new(format!("SELECT COUNT(*) FROM {}", entity.table));
        if let Some(filter) = filter {
            push_where(filter, &mut statement);
        }

        let bound = statement.bound();
        let count = self
            .conn
            .query_row(&statement.sql, bound.as_slice(), |row| row.get::<_, i64>(0))?;
        u64::try_from(count)
            .map_err(|_| DbError::InvalidData(format!("negative row count {count}")))
    }

    fn merge<T: Entity>(&self, entity: &T) -> DbResult<T> {
        let descriptor = T::descriptor();
        let record = entity.to_record();

        let id = match entity.id() {
            Some(id) => {
                let exists = self
                    .find_record(descriptor, &FieldValue::Integer(id))?
                    .is_some();
                if exists {
                    self.execute(&render_update(descriptor, &record)?)?;
                } else {
                    self.execute(&render_insert(descriptor, &record, true))?;
                }
                id
            }
            None => {
                self.execute(&render_insert(descriptor, &record, false))?;
                self.conn.last_insert_rowid()
            }
        };

        let stored = self
            .find_record(descriptor, &FieldValue::Integer(id))?
            .ok_or_else(|| {
                DbError::InvalidData(format!("{} {id} missing after merge", descriptor.name))
            })?;
        debug!(
            "event=sql_merge module=session status=ok table={} id={id}",
            descriptor.table
        );
        T::from_record(&stored)
    }

    fn remove<T: Entity>(&self, entity: &T) -> DbResult<()> {
        let descriptor = T::descriptor();
        let id = transient_guard(descriptor, entity.id())?;
        let id_field = identity_field(descriptor)?;

        let mut statement = Statement::new(format!(
            "DELETE FROM {} WHERE {} = :{}",
            descriptor.table, id_field.column, id_field.name
        ));
        statement.bind(id_field.name, Value::Integer(id));
        self.execute(&statement)?;
        Ok(())
    }

    fn is_managed<T: Entity>(&self, entity: &T) -> DbResult<bool> {
        let Some(id) = entity.id() else {
            return Ok(false);
        };
        let stored = self.find_record(T::descriptor(), &FieldValue::Integer(id))?;
        Ok(stored.is_some_and(|stored| stored == entity.to_record()))
    }
}

fn identity_field(descriptor: &'static EntityDescriptor) -> DbResult<&'static FieldDescriptor> {
    descriptor.id_descriptor().ok_or_else(|| {
        DbError::InvalidData(format!("{} declares no identity field", descriptor.name))
    })
}

fn transient_guard(descriptor: &EntityDescriptor, id: Option<EntityId>) -> DbResult<EntityId> {
    id.ok_or_else(|| {
        DbError::InvalidData(format!("cannot remove transient {}", descriptor.name))
    })
}

fn render_select(plan: &QueryPlan) -> Statement {
    let descriptor = plan.entity;
    let columns = descriptor.columns().collect::<Vec<_>>().join(", ");
    let mut statement = Statement::new(format!("SELECT {columns} FROM {}", descriptor.table));

    push_where(&plan.filter, &mut statement);

    let id_column = descriptor.id_descriptor().map_or("rowid", |field| field.column);
    match &plan.order {
        Some(order) => {
            let direction = if order.ascending { "ASC" } else { "DESC" };
            let key = if order.is_case_insensitive() {
                format!("{UNICODE_LOWER_FN}({})", order.field.column)
            } else {
                order.field.column.to_string()
            };
            statement
                .sql
                .push_str(&format!(" ORDER BY {key} {direction}, {id_column} {direction}"));
        }
        None => statement.sql.push_str(&format!(" ORDER BY {id_column} ASC")),
    }

    if let Some(window) = &plan.window {
        statement
            .sql
            .push_str(&format!(" LIMIT {LIMIT_PARAM} OFFSET {OFFSET_PARAM}"));
        statement.params.push((
            LIMIT_PARAM.to_string(),
            Value::Integer(i64::try_from(window.limit).unwrap_or(i64::MAX)),
        ));
        statement.params.push((
            OFFSET_PARAM.to_string(),
            Value::Integer(i64::try_from(window.offset).unwrap_or(i64::MAX)),
        ));
    }

    statement
}

fn push_where(filter: &Filter, statement: &mut Statement) {
    if filter.is_empty() {
        return;
    }

    let mut conditions = Vec::with_capacity(filter.predicates().len());
    for predicate in filter.predicates() {
        let column = predicate.field.column;
        let param = predicate.param.as_str();
        match (predicate.comparison, filter.binding(param)) {
            (Comparison::Equals, None | Some(FieldValue::Null)) => {
                conditions.push(format!("{column} IS NULL"));
            }
            (Comparison::Equals, Some(value)) => {
                conditions.push(format!("{column} = :{param}"));
                statement.bind(param, Value::from(value));
            }
            (Comparison::Like, value) => {
                conditions.push(format!("{column} LIKE :{param}"));
                statement.bind(param, value.map_or(Value::Null, Value::from));
            }
        }
    }

    statement.sql.push_str(" WHERE ");
    statement.sql.push_str(&conditions.join(" AND "));
}

fn render_insert(descriptor: &'static EntityDescriptor, record: &Record, with_id: bool) -> Statement {
    let fields = descriptor
        .fields
        .iter()
        .filter(|field| with_id || field.name != descriptor.id_field)
        .collect::<Vec<_>>();
    let columns = fields
        .iter()
        .map(|field| field.column)
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = fields
        .iter()
        .map(|field| format!(":{}", field.name))
        .collect::<Vec<_>>()
        .join(", ");

    let mut statement = Statement::new(format!(
        "INSERT INTO {} ({columns}) VALUES ({placeholders})",
        descriptor.table
    ));
    for field in fields {
        statement.bind(field.name, Value::from(record.get(field.name)));
    }
    statement
}

fn render_update(descriptor: &'static EntityDescriptor, record: &Record) -> DbResult<Statement> {
    let id_field = identity_field(descriptor)?;
    let fields = descriptor
        .fields
        .iter()
        .filter(|field| field.name != id_field.name)
        .collect::<Vec<_>>();
    let assignments = fields
        .iter()
        .map(|field| format!("{} = :{}", field.column, field.name))
        .collect::<Vec<_>>()
        .join(", ");

    let mut statement = Statement::new(format!(
        "UPDATE {} SET {assignments} WHERE {} = :{}",
        descriptor.table, id_field.column, id_field.name
    ));
    for field in fields {
        statement.bind(field.name, Value::from(record.get(field.name)));
    }
    statement.bind(id_field.name, Value::from(record.get(id_field.name)));
    Ok(statement)
}

fn read_record(descriptor: &'static EntityDescriptor, row: &Row<'_>) -> DbResult<Record> {
    let mut record = Record::new();
    for (index, field) in descriptor.fields.iter().enumerate() {
        let value = match row.get::<_, Value>(index)? {
            Value::Null => FieldValue::Null,
            Value::Integer(value) => FieldValue::Integer(value),
            Value::Real(value) => FieldValue::Real(value),
            Value::Text(value) => FieldValue::Text(value),
            Value::Blob(_) => {
                return Err(DbError::InvalidData(format!(
                    "unexpected blob in {}.{}",
                    descriptor.table, field.column
                )));
            }
        };
        record.insert(field.name, value);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::{render_insert, render_select, render_update};
    use crate::model::employee::{Employee, EMPLOYEE_DESCRIPTOR};
    use crate::model::entity::Entity;
    use crate::model::value::FieldValue;
    use crate::query::plan::{Filter, OrderSpec, PageSpec, QueryPlan};
    use rusqlite::types::Value;

    #[test]
    fn select_without_filter_orders_by_identity() {
        let statement = render_select(&QueryPlan::select_all(&EMPLOYEE_DESCRIPTOR));
        assert_eq!(
            statement.sql,
            "SELECT id, first_name, last_name, email, salary, department_id \
             FROM employees ORDER BY id ASC"
        );
        assert!(statement.params.is_empty());
    }

    #[test]
    fn select_binds_named_parameters_and_skips_null_equality() {
        let mut filter = Filter::new();
        filter.push_equals(
            EMPLOYEE_DESCRIPTOR.field("lastName").unwrap(),
            FieldValue::from("Kara"),
        );
        filter.push_equals(
            EMPLOYEE_DESCRIPTOR.field("email").unwrap(),
            FieldValue::Null,
        );
        filter.push_like(EMPLOYEE_DESCRIPTOR.field("firstName").unwrap(), "A%");
        let plan = QueryPlan::select_all(&EMPLOYEE_DESCRIPTOR)
            .with_filter(filter)
            .with_order(Some(OrderSpec {
                field: EMPLOYEE_DESCRIPTOR.field("firstName").unwrap(),
                ascending: false,
            }))
            .with_window(Some(PageSpec::new(2, 5).unwrap().window()));

        let statement = render_select(&plan);
        assert!(statement.sql.ends_with(
            "WHERE last_name = :lastName AND email IS NULL AND first_name LIKE :firstName__like \
             ORDER BY unicode_lower(first_name) DESC, id DESC LIMIT :__limit OFFSET :__offset"
        ));
        let names = statement
            .params
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![":lastName", ":firstName__like", ":__limit", ":__offset"]
        );
        assert_eq!(statement.params[3].1, Value::Integer(5));
    }

    #[test]
    fn insert_and_update_use_column_names_and_field_parameters() {
        let mut employee = Employee::new("Ali", "Yılmaz", None, Some(4500.0));
        let insert = render_insert(&EMPLOYEE_DESCRIPTOR, &employee.to_record(), false);
        assert_eq!(
            insert.sql,
            "INSERT INTO employees (first_name, last_name, email, salary, department_id) \
             VALUES (:firstName, :lastName, :email, :salary, :departmentId)"
        );

        employee.set_id(4);
        let update = render_update(&EMPLOYEE_DESCRIPTOR, &employee.to_record()).unwrap();
        assert!(update.sql.starts_with("UPDATE employees SET first_name = :firstName"));
        assert!(update.sql.ends_with("WHERE id = :id"));
        assert_eq!(
            update.params.last(),
            Some(&(":id".to_string(), Value::Integer(4)))
        );
    }
}
