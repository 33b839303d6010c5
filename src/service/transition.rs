//! Manager decisions on pending requests.
//!
//! Order of checks: caller present, target valid, caller privileged, then
//! the atomic status change. A request is never looked up for a caller who
//! fails an earlier check.

use std::str::FromStr;

use tracing::{info, warn};

use crate::auth::{AuthContext, IdentityProfile};
use crate::error::{AppError, AppResult};
use crate::model::role::is_manager;
use crate::model::{Decision, Employee, NewApproval, RequestView, TransitionOutcome};
use crate::service::AppState;
use crate::service::requests::{REQUEST_NOT_FOUND, get_request};
use crate::service::users::MAX_IDENTITY_CHARS;
use crate::utils::format::clip_chars;

pub const INVALID_TARGET: &str = "Status must be Approved or Denied.";
pub const FORBIDDEN: &str = "You do not have permission to modify this request.";
pub const OVERRIDE_COMMENT: &str = "Decision made through manager override.";

/// Everything known about the caller once the role gate has passed.
struct Reviewer {
    profile: Option<IdentityProfile>,
    employee: Option<Employee>,
}

impl Reviewer {
    /// Profile name, then employee row name, then the raw user id, clipped
    /// to the audit column.
    fn display_name(&self, user_id: &str) -> String {
        let name = self
            .profile
            .as_ref()
            .map(|p| p.display_name.as_str())
            .or(self.employee.as_ref().map(|e| e.full_name.as_str()))
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(user_id);
        clip_chars(name, MAX_IDENTITY_CHARS)
    }
}

async fn authorize(state: &AppState, caller: &AuthContext) -> AppResult<Reviewer> {
    let profile = match state.identity.fetch_user(&caller.user_id).await {
        Ok(profile) => profile,
        Err(e) => {
            warn!(error = %e, user_id = %caller.user_id, "Identity lookup failed, using employee role");
            None
        }
    };
    let employee = state
        .stores
        .employees
        .find_by_external_id(&caller.user_id)
        .await?;

    let provider_grants = profile.as_ref().is_some_and(|p| is_manager(p.role.as_deref()));
    let employee_grants = employee.as_ref().is_some_and(|e| is_manager(e.role.as_str()));

    if provider_grants || employee_grants || caller.manager_override {
        Ok(Reviewer { profile, employee })
    } else {
        Err(AppError::Authorization(FORBIDDEN.into()))
    }
}

/// Approve or deny a pending request.
///
/// Re-applying the status a request already has succeeds without writing an
/// audit row. Changing a resolved request is a conflict.
#[tracing::instrument(name = "transition_request", skip(state, caller), fields(user_id))]
pub async fn transition_request(
    state: &AppState,
    caller: Option<&AuthContext>,
    request_id: &str,
    target: &str,
) -> AppResult<RequestView> {
    let caller =
        caller.ok_or_else(|| AppError::Authentication("Authentication required.".into()))?;
    tracing::Span::current().record("user_id", caller.user_id.as_str());

    let decision =
        Decision::from_str(target).map_err(|_| AppError::Validation(INVALID_TARGET.into()))?;

    let reviewer = authorize(state, caller).await?;

    let comment = caller.manager_override.then(|| {
        warn!(user_id = %caller.user_id, request_id, "Decision made through manager override");
        OVERRIDE_COMMENT.to_string()
    });
    let approval = NewApproval {
        request_id: request_id.to_string(),
        actioned_by_external_id: caller.user_id.clone(),
        actioned_by_name: reviewer.display_name(&caller.user_id),
        action: decision.status(),
        comment,
    };

    match state
        .stores
        .requests
        .apply_transition(request_id, decision.status(), approval)
        .await?
    {
        TransitionOutcome::Applied(audit) => {
            info!(request_id, %decision, audit_id = %audit.id, "Request status changed");
        }
        TransitionOutcome::Unchanged => {
            info!(request_id, %decision, "Request already has this status");
        }
        TransitionOutcome::Rejected { current } => {
            info!(request_id, %decision, %current, "Refused to change a resolved request");
            return Err(AppError::InvalidTransition { current });
        }
        TransitionOutcome::NotFound => {
            info!(request_id, "Transition target does not exist");
            return Err(AppError::NotFound(REQUEST_NOT_FOUND.into()));
        }
    }

    state.views.invalidate_request_views().await;
    get_request(state, request_id).await
}
