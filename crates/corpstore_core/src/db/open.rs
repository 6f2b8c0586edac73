//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas the sessions depend on.
//! - Trigger schema migrations before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON` and `case_sensitive_like=ON`.
//! - Returned connections provide `unicode_lower(text)`, a full Unicode
//!   lower-case used as the text sort key.
//! - Returned connections have migrations fully applied.

use super::migrations::apply_migrations;
use super::DbResult;
use log::{error, info};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::{Value, ValueRef};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// SQL name of the Unicode lower-case function registered on every connection.
pub const UNICODE_LOWER_FN: &str = "unicode_lower";

/// Busy timeout applied when the caller does not configure one.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

enum Target<'a> {
    File(&'a Path),
    Memory,
}

impl Target<'_> {
    fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }
}

/// Opens a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_target(Target::File(path.as_ref()), DEFAULT_BUSY_TIMEOUT)
}

/// Opens an in-memory SQLite database and applies all pending migrations.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_target(Target::Memory, DEFAULT_BUSY_TIMEOUT)
}

/// Opens a file database (or memory when `path` is `None`) with a custom
/// busy timeout.
pub fn open_db_with_timeout(path: Option<&Path>, busy_timeout: Duration) -> DbResult<Connection> {
    match path {
        Some(path) => open_target(Target::File(path), busy_timeout),
        None => open_target(Target::Memory, busy_timeout),
    }
}

fn open_target(target: Target<'_>, busy_timeout: Duration) -> DbResult<Connection> {
    let started_at = Instant::now();
    let mode = target.mode();
    info!("event=db_open module=db status=start mode={mode}");

    let opened = match target {
        Target::File(path) => Connection::open(path),
        Target::Memory => Connection::open_in_memory(),
    };
    let mut conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={err}",
                started_at.elapsed().as_millis()
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn, busy_timeout) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={err}",
                started_at.elapsed().as_millis()
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection, busy_timeout: Duration) -> DbResult<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA case_sensitive_like = ON;",
    )?;
    conn.busy_timeout(busy_timeout)?;
    register_functions(conn)?;
    apply_migrations(conn)?;
    Ok(())
}

fn register_functions(conn: &Connection) -> DbResult<()> {
    // Built-in LOWER() folds ASCII only.
    conn.create_scalar_function(
        UNICODE_LOWER_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            Ok(match ctx.get_raw(0) {
                ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).to_lowercase()),
                other => Value::from(other),
            })
        },
    )?;
    Ok(())
}
