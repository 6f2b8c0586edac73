//! Structured query plans.
//!
//! # Responsibility
//! - Represent filters, ordering and paging as data, never as raw strings.
//! - Render a readable query expression for logs and inspection.
//!
//! # Invariants
//! - Every predicate references a binding present in its filter.
//! - Equality bindings are named after the field, pattern bindings after the
//!   field with a `__like` suffix; registry rules keep both collision-free.
//! - A `PageSpec` always has page number and size >= 1 and a representable
//!   offset.

use crate::model::entity::{EntityDescriptor, FieldDescriptor, FieldKind};
use crate::model::value::FieldValue;
use crate::repo::{RepoError, RepoResult};

const LIKE_PARAM_SUFFIX: &str = "__like";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equals,
    Like,
}

/// One condition on one field, bound to a named parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: &'static FieldDescriptor,
    pub comparison: Comparison,
    pub param: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    pub value: FieldValue,
}

/// Conjunction of predicates plus their parameter bindings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<Predicate>,
    bindings: Vec<Binding>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_equals(&mut self, field: &'static FieldDescriptor, value: FieldValue) {
        self.push(field, Comparison::Equals, field.name.to_string(), value);
    }

    pub fn push_like(&mut self, field: &'static FieldDescriptor, pattern: &str) {
        let param = format!("{}{LIKE_PARAM_SUFFIX}", field.name);
        self.push(field, Comparison::Like, param, FieldValue::from(pattern));
    }

    fn push(
        &mut self,
        field: &'static FieldDescriptor,
        comparison: Comparison,
        param: String,
        value: FieldValue,
    ) {
        self.bindings.push(Binding {
            name: param.clone(),
            value,
        });
        self.predicates.push(Predicate {
            field,
            comparison,
            param,
        });
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Returns the value bound to `name`.
    pub fn binding(&self, name: &str) -> Option<&FieldValue> {
        self.bindings
            .iter()
            .find(|binding| binding.name == name)
            .map(|binding| &binding.value)
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

/// Single sort key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderSpec {
    pub field: &'static FieldDescriptor,
    pub ascending: bool,
}

impl OrderSpec {
    /// Text fields compare on their lower-cased value.
    /// Integer and real fields sort by numeric value, never as text.
    pub fn is_case_insensitive(&self) -> bool {
        self.field.kind == FieldKind::Text
    }
}

/// Validated 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    page_number: u64,
    page_size: u64,
    offset: u64,
}

impl PageSpec {
    /// Fails with `InvalidPagination` when either argument is <= 0 or the
    /// offset `(page_number - 1) * page_size` overflows.
    pub fn new(page_number: i64, page_size: i64) -> RepoResult<Self> {
        if page_number <= 0 || page_size <= 0 {
            return Err(RepoError::InvalidPagination(format!(
                "page and page size must be greater than 0 (page={page_number}, size={page_size})"
            )));
        }
        let offset = (page_number - 1).checked_mul(page_size).ok_or_else(|| {
            RepoError::InvalidPagination(format!(
                "offset overflows for page={page_number}, size={page_size}"
            ))
        })?;

        Ok(Self {
            page_number: page_number.unsigned_abs(),
            page_size: page_size.unsigned_abs(),
            offset: offset.unsigned_abs(),
        })
    }

    pub fn page_number(&self) -> u64 {
        self.page_number
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn window(&self) -> Window {
        Window {
            offset: self.offset,
            limit: self.page_size,
        }
    }
}

/// Row window applied after filtering and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

/// Compiled, parameter-bound query for one entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub entity: &'static EntityDescriptor,
    pub filter: Filter,
    pub order: Option<OrderSpec>,
    pub window: Option<Window>,
}

impl QueryPlan {
    /// Plan selecting every row of `entity`.
    pub fn select_all(entity: &'static EntityDescriptor) -> Self {
        Self {
            entity,
            filter: Filter::new(),
            order: None,
            window: None,
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_order(mut self, order: Option<OrderSpec>) -> Self {
        self.order = order;
        self
    }

    pub fn with_window(mut self, window: Option<Window>) -> Self {
        self.window = window;
        self
    }

    /// Renders the plan as a query expression over field names, e.g.
    /// `from Employee e where e.lastName = :lastName order by lower(e.firstName) asc`.
    pub fn to_query_string(&self) -> String {
        let mut query = format!("from {} e", self.entity.name);

        let conditions = self
            .filter
            .predicates()
            .iter()
            .map(|predicate| self.render_predicate(predicate))
            .collect::<Vec<_>>();
        if !conditions.is_empty() {
            query.push_str(" where ");
            query.push_str(&conditions.join(" and "));
        }

        if let Some(order) = &self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            if order.is_case_insensitive() {
                query.push_str(&format!(" order by lower(e.{}) {direction}", order.field.name));
            } else {
                query.push_str(&format!(" order by e.{} {direction}", order.field.name));
            }
        }

        if let Some(window) = &self.window {
            query.push_str(&format!(" limit {} offset {}", window.limit, window.offset));
        }

        query
    }

    fn render_predicate(&self, predicate: &Predicate) -> String {
        let field = predicate.field.name;
        match predicate.comparison {
            Comparison::Equals => match self.filter.binding(&predicate.param) {
                Some(FieldValue::Null) | None => format!("e.{field} is null"),
                Some(_) => format!("e.{field} = :{}", predicate.param),
            },
            Comparison::Like => format!("e.{field} like :{}", predicate.param),
        }
    }
}
