use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::authz::PolicyResource;

/// HR records carry no ownership; access depends on role alone.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl PolicyResource for Department {
    fn resource_id(&self) -> Uuid {
        self.id
    }

    fn principal_field(&self, _field: &str) -> Option<Option<Uuid>> {
        None
    }
}

#[derive(Debug, Deserialize)]
pub struct DepartmentRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub id: Uuid,
    pub department_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub employee_code: String,
    pub email: String,
    pub phone_number: String,
    pub designation: String,
    pub hire_date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PolicyResource for Employee {
    fn resource_id(&self) -> Uuid {
        self.id
    }

    fn principal_field(&self, _field: &str) -> Option<Option<Uuid>> {
        None
    }
}

#[derive(Debug, Deserialize)]
pub struct EmployeeCreateRequest {
    pub department_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub employee_code: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    pub designation: String,
    pub hire_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct EmployeeUpdateRequest {
    pub department_id: Option<Uuid>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub designation: Option<String>,
    pub is_active: Option<bool>,
}
