//! Query plans and the fluent query builder.

pub mod builder;
pub mod plan;

pub use builder::QueryBuilder;
pub use plan::{Comparison, Filter, OrderSpec, PageSpec, Predicate, QueryPlan, Window};
