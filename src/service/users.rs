use tracing::{info, warn};

use crate::auth::{AuthContext, IdentityProfile};
use crate::error::{AppError, AppResult};
use crate::model::{Employee, EmployeeUpsert};
use crate::service::AppState;
use crate::utils::format::clip_chars;

/// Width of the name, email and external id columns.
pub const MAX_IDENTITY_CHARS: usize = 191;
/// Width of the role and team columns.
pub const MAX_LABEL_CHARS: usize = 100;

impl From<IdentityProfile> for EmployeeUpsert {
    /// Provider values are clipped to the employee columns.
    fn from(profile: IdentityProfile) -> Self {
        let label = |value: Option<String>| value.map(|v| clip_chars(&v, MAX_LABEL_CHARS));
        EmployeeUpsert {
            external_id: profile.user_id,
            full_name: clip_chars(&profile.display_name, MAX_IDENTITY_CHARS),
            email: clip_chars(&profile.email, MAX_IDENTITY_CHARS),
            photo_url: profile.photo_url,
            role: label(profile.role),
            team: label(profile.team),
            metadata: profile.metadata,
        }
    }
}

/// Insert or refresh the employee row from the identity provider.
///
/// `Ok(None)` when the provider does not know the user.
pub async fn upsert_from_provider(state: &AppState, user_id: &str) -> AppResult<Option<Employee>> {
    let Some(profile) = state.identity.fetch_user(user_id).await? else {
        warn!(user_id, "Identity provider has no such user");
        return Ok(None);
    };
    let employee = state.stores.employees.upsert_employee(profile.into()).await?;
    // request lists embed employee names and roles
    state.views.invalidate_request_views().await;
    Ok(Some(employee))
}

/// Existing employee row for `user_id`, created from the provider profile
/// on first sight.
pub async fn get_or_create_employee(
    state: &AppState,
    user_id: &str,
) -> AppResult<Option<Employee>> {
    if let Some(existing) = state.stores.employees.find_by_external_id(user_id).await? {
        return Ok(Some(existing));
    }
    upsert_from_provider(state, user_id).await
}

/// Refresh the caller's employee row.
#[tracing::instrument(name = "sync_user", skip(state, caller), fields(user_id))]
pub async fn sync_user(state: &AppState, caller: Option<&AuthContext>) -> AppResult<Employee> {
    let caller =
        caller.ok_or_else(|| AppError::Authentication("Not authenticated.".into()))?;
    tracing::Span::current().record("user_id", caller.user_id.as_str());

    match upsert_from_provider(state, &caller.user_id).await? {
        Some(employee) => {
            info!(employee_id = %employee.id, "Employee synced from identity provider");
            Ok(employee)
        }
        None => Err(AppError::NotFound("Unable to sync user.".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticIdentityProvider;
    use crate::config::Config;
    use crate::db::memory::DEMO_EMPLOYEE_USER_ID;
    use crate::db::{MemoryStore, Stores};
    use crate::service::requests::list_requests;
    use std::sync::Arc;

    fn state() -> AppState {
        let identity = StaticIdentityProvider::new().with_member(
            "user_alex",
            "Alex Wilson",
            Some("Product Designer"),
        );
        AppState::new(
            Stores::memory(MemoryStore::new()),
            Arc::new(identity),
            Config::for_tests("secret"),
        )
    }

    #[actix_web::test]
    async fn sync_requires_a_caller() {
        let err = sync_user(&state(), None).await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[actix_web::test]
    async fn sync_creates_then_reuses_the_row() {
        let state = state();
        let caller = AuthContext::new("user_alex");
        let first = sync_user(&state, Some(&caller)).await.unwrap();
        assert_eq!(first.full_name, "Alex Wilson");
        assert_eq!(first.role, "Product Designer");

        let found = get_or_create_employee(&state, "user_alex").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[actix_web::test]
    async fn sync_refreshes_names_in_cached_request_lists() {
        let identity = StaticIdentityProvider::new().with_member(
            DEMO_EMPLOYEE_USER_ID,
            "Kayley Renamed",
            Some("Employee"),
        );
        let state = AppState::new(
            Stores::memory(MemoryStore::with_demo_data()),
            Arc::new(identity),
            Config::for_tests("secret"),
        );

        let before = list_requests(&state).await.unwrap();
        assert_eq!(before[0].employee.name, "Kayley Manfredi");

        sync_user(&state, Some(&AuthContext::new(DEMO_EMPLOYEE_USER_ID)))
            .await
            .unwrap();

        let after = list_requests(&state).await.unwrap();
        assert_eq!(after[0].employee.name, "Kayley Renamed");
    }

    #[test]
    fn oversized_provider_fields_are_clipped() {
        let upsert = EmployeeUpsert::from(IdentityProfile {
            user_id: "user_long".into(),
            display_name: "N".repeat(400),
            email: format!("{}@example.com", "e".repeat(300)),
            role: Some("R".repeat(150)),
            team: Some("Platform".into()),
            ..IdentityProfile::default()
        });
        assert_eq!(upsert.full_name.chars().count(), MAX_IDENTITY_CHARS);
        assert_eq!(upsert.email.chars().count(), MAX_IDENTITY_CHARS);
        assert_eq!(upsert.role.unwrap().chars().count(), MAX_LABEL_CHARS);
        assert_eq!(upsert.team.as_deref(), Some("Platform"));
    }

    #[actix_web::test]
    async fn unknown_users_are_not_created() {
        let state = state();
        assert!(get_or_create_employee(&state, "user_ghost").await.unwrap().is_none());
        let err = sync_user(&state, Some(&AuthContext::new("user_ghost")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
