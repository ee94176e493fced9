use axum::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{guard_collection, guard_instance};
use crate::app::AppState;
use crate::authz::resources::{DEPARTMENT, EMPLOYEE};
use crate::authz::{Action, ResourceLookup};
use crate::errors::{AppError, AppResult};
use crate::jwt::Identity;
use crate::models::hr::{Department, DepartmentRequest, Employee, EmployeeCreateRequest, EmployeeUpdateRequest};
use crate::utils::{required, utc_now};

const EMPLOYEE_COLUMNS: &str = "id, department_id, first_name, last_name, employee_code, email, phone_number, designation, hire_date, is_active, created_at, updated_at";

#[async_trait]
impl ResourceLookup<Department> for SqlitePool {
    type Error = sqlx::Error;

    async fn fetch(&self, id: Uuid) -> Result<Option<Department>, sqlx::Error> {
        sqlx::query_as::<_, Department>("SELECT id, name, description, created_at FROM departments WHERE id = ?")
            .bind(id)
            .fetch_optional(self)
            .await
    }
}

#[async_trait]
impl ResourceLookup<Employee> for SqlitePool {
    type Error = sqlx::Error;

    async fn fetch(&self, id: Uuid) -> Result<Option<Employee>, sqlx::Error> {
        sqlx::query_as::<_, Employee>(&format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?"))
            .bind(id)
            .fetch_optional(self)
            .await
    }
}

async fn ensure_department(state: &AppState, department_id: Uuid) -> AppResult<()> {
    let department = ResourceLookup::<Department>::fetch(&state.pool, department_id).await?;
    if department.is_none() {
        return Err(AppError::bad_request("department does not exist"));
    }
    Ok(())
}

pub async fn list_departments(
    State(state): State<AppState>,
    Identity(identity): Identity,
) -> AppResult<Json<Vec<Department>>> {
    guard_collection(&state, &identity, Action::List, DEPARTMENT)?;

    let departments =
        sqlx::query_as::<_, Department>("SELECT id, name, description, created_at FROM departments ORDER BY name ASC")
            .fetch_all(&state.pool)
            .await?;

    Ok(Json(departments))
}

pub async fn create_department(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Json(payload): Json<DepartmentRequest>,
) -> AppResult<(StatusCode, Json<Department>)> {
    guard_collection(&state, &identity, Action::Create, DEPARTMENT)?;

    let department = Department {
        id: Uuid::new_v4(),
        name: required("name", &payload.name)?,
        description: payload.description.trim().to_string(),
        created_at: utc_now(),
    };

    sqlx::query("INSERT INTO departments (id, name, description, created_at) VALUES (?, ?, ?, ?)")
        .bind(department.id)
        .bind(&department.name)
        .bind(&department.description)
        .bind(department.created_at)
        .execute(&state.pool)
        .await
        .map_err(|err| AppError::unique_violation(err, "department name already in use"))?;

    Ok((StatusCode::CREATED, Json(department)))
}

pub async fn get_department(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Department>> {
    let department: Department = guard_instance(&state, &identity, Action::Retrieve, DEPARTMENT, id).await?;
    Ok(Json(department))
}

pub async fn update_department(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<DepartmentRequest>,
) -> AppResult<Json<Department>> {
    let mut department: Department = guard_instance(&state, &identity, Action::Update, DEPARTMENT, id).await?;

    department.name = required("name", &payload.name)?;
    department.description = payload.description.trim().to_string();

    sqlx::query("UPDATE departments SET name = ?, description = ? WHERE id = ?")
        .bind(&department.name)
        .bind(&department.description)
        .bind(department.id)
        .execute(&state.pool)
        .await
        .map_err(|err| AppError::unique_violation(err, "department name already in use"))?;

    Ok(Json(department))
}

pub async fn delete_department(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let department: Department = guard_instance(&state, &identity, Action::Delete, DEPARTMENT, id).await?;

    sqlx::query("DELETE FROM departments WHERE id = ?")
        .bind(department.id)
        .execute(&state.pool)
        .await?;

    tracing::info!(department_id = %department.id, "department deleted with its employees");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_employees(
    State(state): State<AppState>,
    Identity(identity): Identity,
) -> AppResult<Json<Vec<Employee>>> {
    guard_collection(&state, &identity, Action::List, EMPLOYEE)?;

    let employees = sqlx::query_as::<_, Employee>(&format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY last_name ASC, first_name ASC"
    ))
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(employees))
}

pub async fn create_employee(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Json(payload): Json<EmployeeCreateRequest>,
) -> AppResult<(StatusCode, Json<Employee>)> {
    guard_collection(&state, &identity, Action::Create, EMPLOYEE)?;
    ensure_department(&state, payload.department_id).await?;

    let now = utc_now();
    let employee = Employee {
        id: Uuid::new_v4(),
        department_id: payload.department_id,
        first_name: required("first_name", &payload.first_name)?,
        last_name: required("last_name", &payload.last_name)?,
        employee_code: required("employee_code", &payload.employee_code)?,
        email: required("email", &payload.email)?,
        phone_number: payload.phone_number.trim().to_string(),
        designation: required("designation", &payload.designation)?,
        hire_date: payload.hire_date,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(&format!(
        "INSERT INTO employees ({EMPLOYEE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(employee.id)
    .bind(employee.department_id)
    .bind(&employee.first_name)
    .bind(&employee.last_name)
    .bind(&employee.employee_code)
    .bind(&employee.email)
    .bind(&employee.phone_number)
    .bind(&employee.designation)
    .bind(employee.hire_date)
    .bind(employee.is_active)
    .bind(employee.created_at)
    .bind(employee.updated_at)
    .execute(&state.pool)
    .await
    .map_err(|err| AppError::unique_violation(err, "employee code or email already in use"))?;

    Ok((StatusCode::CREATED, Json(employee)))
}

pub async fn get_employee(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Employee>> {
    let employee: Employee = guard_instance(&state, &identity, Action::Retrieve, EMPLOYEE, id).await?;
    Ok(Json(employee))
}

pub async fn update_employee(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<EmployeeUpdateRequest>,
) -> AppResult<Json<Employee>> {
    let mut employee: Employee = guard_instance(&state, &identity, Action::Update, EMPLOYEE, id).await?;

    if let Some(department_id) = payload.department_id {
        ensure_department(&state, department_id).await?;
        employee.department_id = department_id;
    }
    if let Some(first_name) = payload.first_name.as_deref() {
        employee.first_name = required("first_name", first_name)?;
    }
    if let Some(last_name) = payload.last_name.as_deref() {
        employee.last_name = required("last_name", last_name)?;
    }
    if let Some(email) = payload.email.as_deref() {
        employee.email = required("email", email)?;
    }
    if let Some(phone_number) = payload.phone_number {
        employee.phone_number = phone_number.trim().to_string();
    }
    if let Some(designation) = payload.designation.as_deref() {
        employee.designation = required("designation", designation)?;
    }
    if let Some(is_active) = payload.is_active {
        employee.is_active = is_active;
    }
    employee.updated_at = utc_now();

    sqlx::query(
        r#"
        UPDATE employees
        SET department_id = ?, first_name = ?, last_name = ?, email = ?, phone_number = ?,
            designation = ?, is_active = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(employee.department_id)
    .bind(&employee.first_name)
    .bind(&employee.last_name)
    .bind(&employee.email)
    .bind(&employee.phone_number)
    .bind(&employee.designation)
    .bind(employee.is_active)
    .bind(employee.updated_at)
    .bind(employee.id)
    .execute(&state.pool)
    .await
    .map_err(|err| AppError::unique_violation(err, "employee email already in use"))?;

    Ok(Json(employee))
}

pub async fn delete_employee(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let employee: Employee = guard_instance(&state, &identity, Action::Delete, EMPLOYEE, id).await?;

    sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(employee.id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
