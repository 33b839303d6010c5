use crate::auth::context::AuthContext;
use crate::auth::jwt::verify_token;
use crate::error::AppError;
use crate::service::AppState;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use tracing::{debug, warn};

pub const MANAGER_OVERRIDE_HEADER: &str = "x-manager-override";

fn reject(req: ServiceRequest, message: &str) -> ServiceResponse<BoxBody> {
    let resp = AppError::Authentication(message.to_string()).error_response();
    req.into_response(resp)
}

/// Decode the bearer token once and attach an [`AuthContext`].
///
/// Requests without an `Authorization` header pass through anonymously;
/// handlers that need a caller reject them. A present but unusable header is
/// rejected here.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let state = req
        .app_data::<Data<AppState>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App state missing"))?;
    let config = &state.config;

    let header = req
        .headers()
        .get("Authorization")
        .map(|h| h.to_str().map(str::to_string));
    let header_value = match header {
        Some(Ok(v)) => v,
        Some(Err(_)) => return Ok(reject(req, "Invalid Authorization header encoding")),
        None => return next.call(req).await,
    };

    let token = match header_value.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return Ok(reject(req, "Authorization header must start with Bearer")),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            debug!(error = %e, "Rejected session token");
            return Ok(reject(req, "Invalid or expired session."));
        }
    };

    let mut context = AuthContext {
        user_id: claims.sub,
        session_id: claims.sid,
        manager_override: false,
    };

    if req.headers().contains_key(MANAGER_OVERRIDE_HEADER) {
        if config.may_override_manager(&context.user_id) {
            warn!(user_id = %context.user_id, path = %req.path(), "Manager override requested");
            context = context.with_manager_override();
        } else {
            warn!(
                user_id = %context.user_id,
                "Ignoring manager override from caller outside the allowlist"
            );
        }
    }

    req.extensions_mut().insert(context);

    next.call(req).await
}
