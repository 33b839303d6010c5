use crate::{
    auth::AuthContext,
    error::{AppError, ErrorBody},
    model::{RequestDraft, RequestView, TimeOffApproval},
    service::{AppState, requests, transition},
};
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

pub const INVALID_PAYLOAD: &str = "Invalid request payload.";
pub const STATUS_REQUIRED: &str = "Status is required.";

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestPayload {
    #[serde(rename = "type", default)]
    #[schema(example = "PTO")]
    pub request_type: String,
    #[serde(default)]
    #[schema(example = "2025-11-11", format = "date", value_type = String)]
    pub start_date: String,
    #[schema(example = "2025-11-12", format = "date", value_type = String)]
    pub end_date: Option<String>,
    #[schema(example = 8)]
    pub hours: Option<f64>,
    #[schema(example = "Family trip")]
    pub note: Option<String>,
}

impl CreateRequestPayload {
    fn draft(&self) -> RequestDraft<'_> {
        RequestDraft {
            request_type: &self.request_type,
            start_date: &self.start_date,
            end_date: self.end_date.as_deref(),
            hours: self.hours,
            note: self.note.as_deref(),
        }
    }
}

/// Body of `PATCH /requests/{id}`.
#[derive(Deserialize, ToSchema)]
pub struct UpdateStatusPayload {
    #[schema(example = "Approved")]
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct RequestListResponse {
    pub requests: Vec<RequestView>,
}

#[derive(Serialize, ToSchema)]
pub struct RequestEnvelope {
    #[schema(example = true)]
    pub ok: bool,
    pub request: RequestView,
}

#[derive(Serialize, ToSchema)]
pub struct ApprovalListResponse {
    pub approvals: Vec<TimeOffApproval>,
}

/// Pull `status` out of a raw JSON body.
fn status_from_body(body: &[u8]) -> Result<String, AppError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|_| AppError::Validation(INVALID_PAYLOAD.into()))?;
    value
        .get("status")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation(STATUS_REQUIRED.into()))
}

/// All time-off requests, newest first.
#[utoipa::path(
    get,
    path = "/api/requests",
    responses(
        (status = 200, description = "Every request with its employee", body = RequestListResponse),
        (status = 500, description = "Internal error", body = ErrorBody)
    ),
    tag = "Requests"
)]
pub async fn list_requests(state: web::Data<AppState>) -> actix_web::Result<impl Responder> {
    let views = requests::list_requests(&state).await?;
    Ok(HttpResponse::Ok().json(RequestListResponse {
        requests: views.as_ref().clone(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/requests/{id}",
    params(("id" = String, Path, description = "Request id")),
    responses(
        (status = 200, description = "Request found", body = RequestView),
        (status = 404, description = "Request not found", body = ErrorBody)
    ),
    tag = "Requests"
)]
pub async fn get_request(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let view = requests::get_request(&state, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// Submit a time-off request for the signed-in caller.
#[utoipa::path(
    post,
    path = "/api/requests",
    request_body(content = CreateRequestPayload, content_type = "application/json"),
    responses(
        (status = 201, description = "Request submitted", body = RequestEnvelope),
        (status = 400, description = "Invalid submission", body = ErrorBody),
        (status = 401, description = "Not signed in", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Requests"
)]
pub async fn create_request(
    state: web::Data<AppState>,
    caller: Option<AuthContext>,
    payload: web::Json<CreateRequestPayload>,
) -> actix_web::Result<impl Responder> {
    let view = requests::create_request(&state, caller.as_ref(), payload.draft()).await?;
    Ok(HttpResponse::Created().json(RequestEnvelope {
        ok: true,
        request: view,
    }))
}

/// Approve or deny a request.
#[utoipa::path(
    patch,
    path = "/api/requests/{id}",
    params(("id" = String, Path, description = "Request id")),
    request_body(content = UpdateStatusPayload, content_type = "application/json"),
    responses(
        (status = 200, description = "Status applied", body = RequestEnvelope),
        (status = 400, description = "Malformed body or unsupported status", body = ErrorBody),
        (status = 401, description = "Not signed in", body = ErrorBody),
        (status = 403, description = "Caller may not review requests", body = ErrorBody),
        (status = 404, description = "Request not found", body = ErrorBody),
        (status = 409, description = "Request already resolved", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Requests"
)]
pub async fn update_status(
    state: web::Data<AppState>,
    caller: Option<AuthContext>,
    path: web::Path<String>,
    body: web::Bytes,
) -> actix_web::Result<impl Responder> {
    let caller =
        caller.ok_or_else(|| AppError::Authentication("Authentication required.".into()))?;
    let target = status_from_body(&body)?;

    let view =
        transition::transition_request(&state, Some(&caller), &path.into_inner(), &target).await?;
    Ok(HttpResponse::Ok().json(RequestEnvelope {
        ok: true,
        request: view,
    }))
}

/// Audit trail of manager decisions, oldest first.
#[utoipa::path(
    get,
    path = "/api/requests/{id}/approvals",
    params(("id" = String, Path, description = "Request id")),
    responses(
        (status = 200, description = "Audit entries", body = ApprovalListResponse),
        (status = 404, description = "Request not found", body = ErrorBody)
    ),
    tag = "Requests"
)]
pub async fn list_approvals(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let approvals = requests::list_approvals(&state, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApprovalListResponse { approvals }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_errors_are_distinguished() {
        assert_eq!(status_from_body(b"{not json").unwrap_err().to_string(), INVALID_PAYLOAD);
        assert_eq!(status_from_body(b"{}").unwrap_err().to_string(), STATUS_REQUIRED);
        assert_eq!(
            status_from_body(br#"{"status": 3}"#).unwrap_err().to_string(),
            STATUS_REQUIRED
        );
        assert_eq!(status_from_body(br#"{"status":"Denied"}"#).unwrap(), "Denied");
    }
}
