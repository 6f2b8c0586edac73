//! Employee entity.
//!
//! # Invariants
//! - `first_name` and `last_name` are always present.
//! - `department_id`, when set, references an existing department row.

use crate::db::DbResult;
use crate::model::entity::{
    Entity, EntityDescriptor, EntityId, FieldDescriptor, FieldKind, Record,
};
use serde::{Deserialize, Serialize};

pub static EMPLOYEE_DESCRIPTOR: EntityDescriptor = EntityDescriptor {
    name: "Employee",
    table: "employees",
    id_field: "id",
    fields: &[
        FieldDescriptor {
            name: "id",
            column: "id",
            kind: FieldKind::Integer,
        },
        FieldDescriptor {
            name: "firstName",
            column: "first_name",
            kind: FieldKind::Text,
        },
        FieldDescriptor {
            name: "lastName",
            column: "last_name",
            kind: FieldKind::Text,
        },
        FieldDescriptor {
            name: "email",
            column: "email",
            kind: FieldKind::Text,
        },
        FieldDescriptor {
            name: "salary",
            column: "salary",
            kind: FieldKind::Real,
        },
        FieldDescriptor {
            name: "departmentId",
            column: "department_id",
            kind: FieldKind::Integer,
        },
    ],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Option<EntityId>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub salary: Option<f64>,
    pub department_id: Option<EntityId>,
}

impl Employee {
    /// Creates a transient employee without identity or department.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: Option<String>,
        salary: Option<f64>,
    ) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email,
            salary,
            department_id: None,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Entity for Employee {
    fn descriptor() -> &'static EntityDescriptor {
        &EMPLOYEE_DESCRIPTOR
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
            .with("firstName", self.first_name.as_str())
            .with("lastName", self.last_name.as_str())
            .with("email", self.email.as_deref())
            .with("salary", self.salary)
            .with("departmentId", self.department_id)
    }

    fn from_record(record: &Record) -> DbResult<Self> {
        Ok(Self {
            id: record.optional_integer("id")?,
            first_name: record.text("firstName")?,
            last_name: record.text("lastName")?,
            email: record.optional_text("email")?,
            salary: record.optional_real("salary")?,
            department_id: record.optional_integer("departmentId")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Employee;
    use crate::model::department::Department;
    use serde_json::json;

    #[test]
    fn json_uses_camel_case_field_names() {
        let mut department = Department::new("IT");
        department.id = Some(3);
        let mut employee = Employee::new("Ali", "Kara", None, Some(4500.0));
        employee.id = Some(7);
        assert!(department.enroll(&mut employee));

        let value = serde_json::to_value(&employee).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "firstName": "Ali",
                "lastName": "Kara",
                "email": null,
                "salary": 4500.0,
                "departmentId": 3,
            })
        );
        assert_eq!(serde_json::from_value::<Employee>(value).unwrap(), employee);
        assert_eq!(
            serde_json::to_value(&department).unwrap(),
            json!({ "id": 3, "name": "IT" })
        );
    }
}
