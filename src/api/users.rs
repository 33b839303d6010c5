use crate::{
    auth::AuthContext,
    error::AppError,
    model::Employee,
    service::{AppState, users},
};
use actix_web::{HttpResponse, Responder, http::StatusCode, web};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

/// Outcome of a profile sync, tagged by `status`.
#[derive(Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SyncResponse {
    Success { employee: Employee },
    Error { message: String },
}

fn sync_failure(e: AppError) -> HttpResponse {
    let (code, message) = match e {
        AppError::Authentication(message) => (StatusCode::UNAUTHORIZED, message),
        AppError::NotFound(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        other => {
            error!(error = %other, "Failed to sync user");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to sync user.".to_string(),
            )
        }
    };
    HttpResponse::build(code).json(SyncResponse::Error { message })
}

/// Create or refresh the caller's employee row from the identity provider.
#[utoipa::path(
    post,
    path = "/api/users/sync",
    responses(
        (status = 200, description = "Employee row synced", body = SyncResponse,
         example = json!({"status": "success", "employee": {"externalId": "user_2abc", "fullName": "Jordan Lee"}})),
        (status = 401, description = "Not signed in", body = SyncResponse,
         example = json!({"status": "error", "message": "Not authenticated."})),
        (status = 500, description = "Provider or storage failure", body = SyncResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn sync_user(
    state: web::Data<AppState>,
    caller: Option<AuthContext>,
) -> actix_web::Result<impl Responder> {
    Ok(match users::sync_user(&state, caller.as_ref()).await {
        Ok(employee) => HttpResponse::Ok().json(SyncResponse::Success { employee }),
        Err(e) => sync_failure(e),
    })
}
