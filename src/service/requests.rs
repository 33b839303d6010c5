use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::auth::AuthContext;
use crate::error::{AppError, AppResult};
use crate::model::{
    NewTimeOffRequest, RequestDraft, RequestView, StatusLabel, TimeOffApproval,
};
use crate::service::AppState;
use crate::service::users::get_or_create_employee;
use crate::utils::calendar::{DateSpan, build_day_index, build_day_index_between, year_bounds};
use crate::utils::view_cache::{CALENDAR_VIEW, OVERVIEW_VIEW};

pub const REQUEST_NOT_FOUND: &str = "Request not found.";

async fn load_views(state: &AppState) -> AppResult<Vec<RequestView>> {
    let rows = state.stores.requests.list_requests().await?;
    Ok(rows.iter().map(RequestView::from).collect())
}

async fn cached_views(state: &AppState, page: &str) -> AppResult<Arc<Vec<RequestView>>> {
    if let Some(hit) = state.views.get(page).await {
        debug!(page, "Serving cached request list");
        return Ok(hit);
    }
    let generation = state.views.generation();
    let views = Arc::new(load_views(state).await?);
    state.views.put_if_current(page, views.clone(), generation).await;
    Ok(views)
}

/// All requests, newest submission first.
pub async fn list_requests(state: &AppState) -> AppResult<Arc<Vec<RequestView>>> {
    cached_views(state, OVERVIEW_VIEW).await
}

pub async fn get_request(state: &AppState, id: &str) -> AppResult<RequestView> {
    state
        .stores
        .requests
        .get_request(id)
        .await?
        .map(|row| RequestView::from(&row))
        .ok_or_else(|| AppError::NotFound(REQUEST_NOT_FOUND.into()))
}

pub async fn list_approvals(state: &AppState, id: &str) -> AppResult<Vec<TimeOffApproval>> {
    if state.stores.requests.get_request(id).await?.is_none() {
        return Err(AppError::NotFound(REQUEST_NOT_FOUND.into()));
    }
    state.stores.requests.list_approvals(id).await
}

/// Optional calendar filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalendarFilter {
    pub year: Option<i32>,
    pub status: Option<StatusLabel>,
}

/// Requests grouped per covered day.
pub async fn calendar(
    state: &AppState,
    filter: CalendarFilter,
) -> AppResult<BTreeMap<NaiveDate, Vec<RequestView>>> {
    let views = cached_views(state, CALENDAR_VIEW).await?;
    let selected: Vec<RequestView> = views
        .iter()
        .filter(|v| filter.status.is_none_or(|s| v.status == s))
        .filter(|v| filter.year.is_none_or(|y| v.touches_year(y)))
        .cloned()
        .collect();

    let days = match filter.year {
        Some(year) => match year_bounds(year) {
            Some((from, to)) => build_day_index_between(&selected, from, to),
            None => BTreeMap::new(),
        },
        None => build_day_index(&selected),
    };
    Ok(days)
}

/// Submit a new pending request on behalf of the caller.
#[tracing::instrument(name = "create_request", skip(state, caller, draft))]
pub async fn create_request(
    state: &AppState,
    caller: Option<&AuthContext>,
    draft: RequestDraft<'_>,
) -> AppResult<RequestView> {
    let caller = caller
        .ok_or_else(|| AppError::Authentication("Authentication required.".into()))?;
    let validated = draft.validate()?;

    let employee = get_or_create_employee(state, &caller.user_id)
        .await?
        .ok_or_else(|| {
            warn!(user_id = %caller.user_id, "No employee profile for caller");
            AppError::Authentication("Unable to determine the current user.".into())
        })?;

    let created = state
        .stores
        .requests
        .create_request(NewTimeOffRequest::from_draft(
            Some(employee.id.clone()),
            caller.user_id.clone(),
            validated,
        ))
        .await?;
    state.views.invalidate_request_views().await;

    info!(
        request_id = %created.id,
        user_id = %caller.user_id,
        request_type = %created.request_type,
        "Time-off request submitted"
    );
    get_request(state, &created.id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticIdentityProvider;
    use crate::config::Config;
    use crate::db::memory::DEMO_REQUEST_ID;
    use crate::db::{MemoryStore, Stores};

    use crate::db::RequestRepository;
    use crate::model::{
        NewApproval, RequestStatus, RequestWithEmployee, TimeOffApproval, TimeOffRequest,
        TransitionOutcome, ValidatedDraft,
    };
    use crate::service::transition::transition_request;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::{Notify, oneshot};

    fn identity() -> StaticIdentityProvider {
        StaticIdentityProvider::new()
            .with_member("user_alex", "Alex Wilson", None)
            .with_member("user_jordan", "Jordan Lee", Some("Engineering Manager"))
    }

    fn state() -> AppState {
        AppState::new(
            Stores::memory(MemoryStore::with_demo_data()),
            Arc::new(identity()),
            Config::for_tests("secret"),
        )
    }

    fn state_with(requests: Arc<dyn RequestRepository>, store: Arc<MemoryStore>) -> AppState {
        AppState::new(
            Stores {
                requests,
                employees: store,
            },
            Arc::new(identity()),
            Config::for_tests("secret"),
        )
    }

    /// Holds the first list read open, after its rows were read, until
    /// released.
    struct GatedStore {
        inner: Arc<MemoryStore>,
        entered: Notify,
        release: Mutex<Option<oneshot::Receiver<()>>>,
    }

    #[async_trait]
    impl RequestRepository for GatedStore {
        async fn list_requests(&self) -> AppResult<Vec<RequestWithEmployee>> {
            let rows = self.inner.list_requests().await?;
            let gate = self.release.lock().unwrap().take();
            if let Some(gate) = gate {
                self.entered.notify_one();
                let _ = gate.await;
            }
            Ok(rows)
        }

        async fn get_request(&self, id: &str) -> AppResult<Option<RequestWithEmployee>> {
            self.inner.get_request(id).await
        }

        async fn create_request(&self, new: NewTimeOffRequest) -> AppResult<TimeOffRequest> {
            self.inner.create_request(new).await
        }

        async fn update_status(
            &self,
            id: &str,
            status: RequestStatus,
        ) -> AppResult<Option<TimeOffRequest>> {
            self.inner.update_status(id, status).await
        }

        async fn record_approval(&self, approval: NewApproval) -> AppResult<TimeOffApproval> {
            self.inner.record_approval(approval).await
        }

        async fn apply_transition(
            &self,
            id: &str,
            target: RequestStatus,
            approval: NewApproval,
        ) -> AppResult<TransitionOutcome> {
            self.inner.apply_transition(id, target, approval).await
        }

        async fn list_approvals(&self, request_id: &str) -> AppResult<Vec<TimeOffApproval>> {
            self.inner.list_approvals(request_id).await
        }
    }

    fn draft() -> RequestDraft<'static> {
        RequestDraft {
            request_type: "Sick",
            start_date: "2025-12-30",
            end_date: Some("2026-01-02"),
            hours: Some(16.0),
            note: None,
        }
    }

    #[actix_web::test]
    async fn create_requires_caller_and_valid_draft() {
        let state = state();
        let err = create_request(&state, None, draft()).await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));

        let caller = AuthContext::new("user_alex");
        let bad = RequestDraft {
            start_date: "",
            ..draft()
        };
        let err = create_request(&state, Some(&caller), bad).await.unwrap_err();
        assert_eq!(err.to_string(), "Start date is required.");
    }

    #[actix_web::test]
    async fn created_request_shows_up_in_fresh_list() {
        let state = state();
        assert_eq!(list_requests(&state).await.unwrap().len(), 1);

        let caller = AuthContext::new("user_alex");
        let view = create_request(&state, Some(&caller), draft()).await.unwrap();
        assert_eq!(view.status, StatusLabel::Pending);
        assert_eq!(view.employee.name, "Alex Wilson");
        assert_eq!(view.employee.role, "employee");

        let listed = list_requests(&state).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, view.id);
    }

    #[actix_web::test]
    async fn calendar_filters_by_year_and_status() {
        let state = state();
        let caller = AuthContext::new("user_alex");
        create_request(&state, Some(&caller), draft()).await.unwrap();

        let all = calendar(&state, CalendarFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2 + 4);

        let next_year = calendar(
            &state,
            CalendarFilter {
                year: Some(2026),
                status: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(next_year.len(), 2);

        let approved = calendar(
            &state,
            CalendarFilter {
                year: None,
                status: Some(StatusLabel::Approved),
            },
        )
        .await
        .unwrap();
        assert!(approved.is_empty());
    }

    #[actix_web::test]
    async fn list_read_during_a_decision_is_not_cached() {
        let store = Arc::new(MemoryStore::with_demo_data());
        let (release, gate) = oneshot::channel();
        let gated = Arc::new(GatedStore {
            inner: store.clone(),
            entered: Notify::new(),
            release: Mutex::new(Some(gate)),
        });
        let state = state_with(gated.clone(), store);

        let reader = actix_web::rt::spawn({
            let state = state.clone();
            async move { list_requests(&state).await }
        });
        gated.entered.notified().await;

        let manager = AuthContext::new("user_jordan");
        transition_request(&state, Some(&manager), DEMO_REQUEST_ID, "Approved")
            .await
            .unwrap();
        release.send(()).unwrap();

        let stale = reader.await.unwrap().unwrap();
        assert_eq!(stale[0].status, StatusLabel::Pending);

        let fresh = list_requests(&state).await.unwrap();
        assert_eq!(fresh[0].status, StatusLabel::Approved);
    }

    #[actix_web::test]
    async fn year_view_includes_spans_crossing_the_whole_year() {
        let store = Arc::new(MemoryStore::with_demo_data());
        let sabbatical = ValidatedDraft {
            request_type: "Sabbatical".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            hours: None,
            note: None,
        };
        store
            .create_request(NewTimeOffRequest::from_draft(None, "user_alex", sabbatical))
            .await
            .unwrap();
        let state = state_with(store.clone(), store);

        let year = calendar(
            &state,
            CalendarFilter {
                year: Some(2025),
                status: Some(StatusLabel::Pending),
            },
        )
        .await
        .unwrap();
        assert_eq!(year.len(), 365);
        assert!(year[&NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()]
            .iter()
            .any(|v| v.request_type == "Sabbatical"));
    }

    #[actix_web::test]
    async fn missing_request_is_not_found() {
        let state = state();
        assert!(get_request(&state, DEMO_REQUEST_ID).await.is_ok());
        let err = get_request(&state, "req-missing").await.unwrap_err();
        assert_eq!(err.to_string(), REQUEST_NOT_FOUND);
        assert!(list_approvals(&state, "req-missing").await.is_err());
    }
}
