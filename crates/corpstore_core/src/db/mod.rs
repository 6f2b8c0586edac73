//! SQLite storage bootstrap, schema migrations and the persistence unit.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the entity tables.
//! - Apply schema migrations in deterministic order.
//! - Bind a configuration to an entity registry (`PersistenceUnit`).
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No session reads or writes entity rows before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;
mod unit;

pub use open::{
    open_db, open_db_in_memory, open_db_with_timeout, DEFAULT_BUSY_TIMEOUT, UNICODE_LOWER_FN,
};
pub use unit::PersistenceUnit;

pub type DbResult<T> = Result<T, DbError>;

/// Persistence-layer error, passed through repositories untranslated.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Stored row cannot be mapped onto its entity.
    InvalidData(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
