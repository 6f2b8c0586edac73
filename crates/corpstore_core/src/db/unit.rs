//! Persistence unit: one configuration bound to one entity registry.

use super::open::open_db_with_timeout;
use super::DbResult;
use crate::config::{DatabaseLocation, PersistenceConfig};
use crate::model::registry::EntityRegistry;
use log::info;
use rusqlite::Connection;

/// Factory for migrated connections of one configured unit.
///
/// Connections are handed to the caller; the unit keeps no open handle, so
/// dropping it releases nothing beyond its configuration.
#[derive(Debug, Clone)]
pub struct PersistenceUnit {
    config: PersistenceConfig,
    registry: EntityRegistry,
}

impl PersistenceUnit {
    pub fn new(config: PersistenceConfig, registry: EntityRegistry) -> Self {
        info!(
            "event=unit_init module=db status=ok unit={} entities={}",
            config.unit_name,
            registry.len()
        );
        Self { config, registry }
    }

    pub fn name(&self) -> &str {
        &self.config.unit_name
    }

    pub fn config(&self) -> &PersistenceConfig {
        &self.config
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Opens a migrated connection for the configured location.
    ///
    /// Memory locations yield a fresh, empty database per call.
    pub fn open_connection(&self) -> DbResult<Connection> {
        let path = match &self.config.database {
            DatabaseLocation::Memory => None,
            DatabaseLocation::File { path } => Some(path.as_path()),
        };
        open_db_with_timeout(path, self.config.busy_timeout())
    }
}
