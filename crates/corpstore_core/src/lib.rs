//! Core data access layer for corpstore.
//! Generic repositories and query builders over registered entity types.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod seed;
pub mod session;

pub use config::{load_config, ConfigError, DatabaseLocation, LogConfig, PersistenceConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult, PersistenceUnit};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::department::Department;
pub use model::employee::Employee;
pub use model::entity::{Entity, EntityDescriptor, EntityId, FieldDescriptor, FieldKind, Record};
pub use model::registry::{EntityRegistry, RegistryError};
pub use model::value::FieldValue;
pub use model::default_registry;
pub use query::{QueryBuilder, QueryPlan};
pub use repo::{GenericRepository, RepoError, RepoResult, SessionRepository};
pub use seed::RandomDataGenerator;
pub use session::{InMemorySession, PersistenceSession, SqliteSession};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
