use crate::api::calendar::{CalendarQuery, CalendarResponse};
use crate::api::employee::EmployeeListResponse;
use crate::api::health::HealthResponse;
use crate::api::requests::{
    ApprovalListResponse, CreateRequestPayload, RequestEnvelope, RequestListResponse,
    UpdateStatusPayload,
};
use crate::api::users::SyncResponse;
use crate::error::ErrorBody;
use crate::model::{
    Decision, Employee, EmployeeSummary, RequestStatus, RequestView, StatusLabel, TimeOffApproval,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Time-off API",
        version = "1.0.0",
        description = r#"
## Time-off requests and approvals

Employees submit time-off requests; managers approve or deny them. Every
decision is recorded in an append-only audit trail.

### Security
Write endpoints need a **JWT Bearer** session token. Only callers whose role
metadata names a manager, director, admin or people-ops position may approve
or deny requests.

### Response format
Failures use `{ "ok": false, "error": "..." }`.
"#,
    ),
    paths(
        crate::api::requests::list_requests,
        crate::api::requests::get_request,
        crate::api::requests::create_request,
        crate::api::requests::update_status,
        crate::api::requests::list_approvals,

        crate::api::calendar::calendar,

        crate::api::users::sync_user,

        crate::api::employee::list_employees,

        crate::api::health::health
    ),
    components(
        schemas(
            RequestView,
            EmployeeSummary,
            RequestStatus,
            StatusLabel,
            Decision,
            TimeOffApproval,
            Employee,
            ErrorBody,
            CreateRequestPayload,
            UpdateStatusPayload,
            RequestEnvelope,
            RequestListResponse,
            ApprovalListResponse,
            CalendarQuery,
            CalendarResponse,
            SyncResponse,
            EmployeeListResponse,
            HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Requests", description = "Time-off request APIs"),
        (name = "Calendar", description = "Team calendar APIs"),
        (name = "Users", description = "Identity sync APIs"),
        (name = "Employee", description = "Employee directory APIs"),
        (name = "Health", description = "Liveness probe"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
