//! Repository and query builder error taxonomy.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Validation and lookup failures, plus untranslated persistence errors.
#[derive(Debug)]
pub enum RepoError {
    /// Type is not registered with the session.
    InvalidEntity(String),
    /// Empty or unknown field name.
    InvalidField(String),
    /// Null identifier supplied to an id-based operation.
    InvalidId(String),
    /// Page number or size <= 0.
    InvalidPagination(String),
    /// Required single-row lookup found nothing.
    EntityNotFound {
        entity: &'static str,
        detail: String,
    },
    /// Single-row lookup found more than one row.
    NonUniqueResult {
        entity: &'static str,
        field: String,
    },
    /// Persistence-layer failure, passed through as-is.
    Db(DbError),
}

impl RepoError {
    /// Returns whether this error was raised before touching storage.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidEntity(_)
                | Self::InvalidField(_)
                | Self::InvalidId(_)
                | Self::InvalidPagination(_)
        )
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEntity(message) => write!(f, "invalid entity: {message}"),
            Self::InvalidField(message) => write!(f, "invalid field: {message}"),
            Self::InvalidId(message) => write!(f, "invalid id: {message}"),
            Self::InvalidPagination(message) => write!(f, "invalid pagination: {message}"),
            Self::EntityNotFound { entity, detail } => {
                write!(f, "{entity} not found: {detail}")
            }
            Self::NonUniqueResult { entity, field } => {
                write!(f, "more than one {entity} found for field `{field}`")
            }
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}
