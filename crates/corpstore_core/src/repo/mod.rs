//! Repository layer over persistence sessions.
//!
//! # Responsibility
//! - Define the generic data access contract for registered entity types.
//! - Share argument validation with the query builder.
//!
//! # Invariants
//! - Every operation checks registration before touching the session.
//! - Validation failures never reach storage; storage failures are passed
//!   through unchanged.

mod error;
pub mod generic_repo;
pub(crate) mod validate;

pub use error::{RepoError, RepoResult};
pub use generic_repo::{GenericRepository, SessionRepository};
