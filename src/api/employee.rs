use crate::{error::ErrorBody, model::Employee, service::AppState};
use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub employees: Vec<Employee>,
}

/// Employee directory, ordered by name.
#[utoipa::path(
    get,
    path = "/api/employees",
    responses(
        (status = 200, description = "All employees", body = EmployeeListResponse),
        (status = 500, description = "Internal error", body = ErrorBody)
    ),
    tag = "Employee"
)]
pub async fn list_employees(state: web::Data<AppState>) -> actix_web::Result<impl Responder> {
    let employees = state.stores.employees.list_employees().await?;
    debug!(count = employees.len(), "Listed employees");
    Ok(HttpResponse::Ok().json(EmployeeListResponse { employees }))
}
