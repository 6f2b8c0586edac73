//! Department entity.
//!
//! # Invariants
//! - `name` is unique across departments.
//! - Removing a department removes its employees (storage cascade).

use crate::db::DbResult;
use crate::model::employee::Employee;
use crate::model::entity::{
    Entity, EntityDescriptor, EntityId, FieldDescriptor, FieldKind, Record,
};
use serde::{Deserialize, Serialize};

pub static DEPARTMENT_DESCRIPTOR: EntityDescriptor = EntityDescriptor {
    name: "Department",
    table: "departments",
    id_field: "id",
    fields: &[
        FieldDescriptor {
            name: "id",
            column: "id",
            kind: FieldKind::Integer,
        },
        FieldDescriptor {
            name: "name",
            column: "name",
            kind: FieldKind::Text,
        },
    ],
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: Option<EntityId>,
    pub name: String,
}

impl Department {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    /// Points `employee` at this department.
    ///
    /// Returns `false` when this department has no identity yet.
    pub fn enroll(&self, employee: &mut Employee) -> bool {
        match self.id {
            Some(id) => {
                employee.department_id = Some(id);
                true
            }
            None => false,
        }
    }
}

impl Entity for Department {
    fn descriptor() -> &'static EntityDescriptor {
        &DEPARTMENT_DESCRIPTOR
    }

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("id", self.id)
            .with("name", self.name.as_str())
    }

    fn from_record(record: &Record) -> DbResult<Self> {
        Ok(Self {
            id: record.optional_integer("id")?,
            name: record.text("name")?,
        })
    }
}
