use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::db::{EmployeeRepository, RequestRepository};
use crate::error::{AppError, AppResult};
use crate::model::{
    Employee, EmployeeUpsert, NewApproval, NewTimeOffRequest, RequestStatus, RequestWithEmployee,
    TimeOffApproval, TimeOffRequest, TransitionOutcome,
};

pub const DEMO_REQUEST_ID: &str = "req-kayley";
pub const DEMO_EMPLOYEE_USER_ID: &str = "user_kayley";
pub const DEMO_MANAGER_USER_ID: &str = "user_chris";

#[derive(Debug, Default)]
struct State {
    employees: Vec<Employee>,
    requests: Vec<TimeOffRequest>,
    approvals: Vec<TimeOffApproval>,
}

impl State {
    fn joined(&self, request: &TimeOffRequest) -> RequestWithEmployee {
        let employee = request
            .employee_id
            .as_deref()
            .and_then(|id| self.employees.iter().find(|e| e.id == id));
        RequestWithEmployee {
            request: request.clone(),
            employee_name: employee.map(|e| e.full_name.clone()),
            employee_role: employee.map(|e| e.role.clone()),
        }
    }

    fn set_status(&mut self, id: &str, status: RequestStatus) -> Option<TimeOffRequest> {
        let request = self.requests.iter_mut().find(|r| r.id == id)?;
        request.status = status;
        request.last_updated_at = Utc::now();
        Some(request.clone())
    }

    fn push_approval(&mut self, approval: NewApproval) -> TimeOffApproval {
        let row = approval.into_approval(Uuid::new_v4().to_string(), Utc::now());
        self.approvals.push(row.clone());
        row
    }
}

/// Process-local store for development and tests.
///
/// One lock guards all three tables, so a transition and its audit row are
/// observed together or not at all.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

fn poisoned() -> AppError {
    AppError::Persistence("memory store lock poisoned".into())
}

fn demo_instant(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 9, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

fn demo_date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding the dashboard's demo employees and the pending
    /// `req-kayley` request.
    pub fn with_demo_data() -> Self {
        let joined = demo_instant(2025, 10, 1);
        let employee = |id: &str, external_id: &str, name: &str, role: &str| Employee {
            id: id.to_string(),
            external_id: external_id.to_string(),
            full_name: name.to_string(),
            email: format!("{external_id}@example.com"),
            role: role.to_string(),
            photo_url: None,
            team: None,
            metadata: None,
            created_at: joined,
            updated_at: joined,
        };

        let submitted = demo_instant(2025, 10, 23);
        let state = State {
            employees: vec![
                employee("emp-kayley", DEMO_EMPLOYEE_USER_ID, "Kayley Manfredi", "Employee"),
                employee("emp-chris", DEMO_MANAGER_USER_ID, "Chris Manfredi", "Time Off Manager"),
            ],
            requests: vec![TimeOffRequest {
                id: DEMO_REQUEST_ID.to_string(),
                employee_id: Some("emp-kayley".to_string()),
                external_user_id: DEMO_EMPLOYEE_USER_ID.to_string(),
                status: RequestStatus::Pending,
                request_type: "PTO".to_string(),
                start_date: demo_date(2025, 11, 11),
                end_date: demo_date(2025, 11, 12),
                hours: Some(8),
                note: None,
                submitted_at: submitted,
                last_updated_at: submitted,
                metadata: None,
            }],
            approvals: Vec::new(),
        };

        Self {
            state: RwLock::new(state),
        }
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|_| poisoned())
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|_| poisoned())
    }

    /// Drop an employee row, leaving its requests orphaned.
    pub fn remove_employee(&self, external_id: &str) -> AppResult<bool> {
        let mut state = self.write()?;
        let Some(pos) = state.employees.iter().position(|e| e.external_id == external_id) else {
            return Ok(false);
        };
        let removed = state.employees.remove(pos);
        for request in state.requests.iter_mut() {
            if request.employee_id.as_deref() == Some(removed.id.as_str()) {
                request.employee_id = None;
            }
        }
        Ok(true)
    }

    pub fn approval_count(&self) -> AppResult<usize> {
        Ok(self.read()?.approvals.len())
    }
}

#[async_trait]
impl RequestRepository for MemoryStore {
    async fn list_requests(&self) -> AppResult<Vec<RequestWithEmployee>> {
        let state = self.read()?;
        let mut rows: Vec<_> = state.requests.iter().map(|r| state.joined(r)).collect();
        rows.sort_by(|a, b| b.request.submitted_at.cmp(&a.request.submitted_at));
        Ok(rows)
    }

    async fn get_request(&self, id: &str) -> AppResult<Option<RequestWithEmployee>> {
        let state = self.read()?;
        Ok(state
            .requests
            .iter()
            .find(|r| r.id == id)
            .map(|r| state.joined(r)))
    }

    async fn create_request(&self, new: NewTimeOffRequest) -> AppResult<TimeOffRequest> {
        let request = new.into_request(Uuid::new_v4().to_string(), Utc::now());
        self.write()?.requests.push(request.clone());
        Ok(request)
    }

    async fn update_status(
        &self,
        id: &str,
        status: RequestStatus,
    ) -> AppResult<Option<TimeOffRequest>> {
        Ok(self.write()?.set_status(id, status))
    }

    async fn record_approval(&self, approval: NewApproval) -> AppResult<TimeOffApproval> {
        Ok(self.write()?.push_approval(approval))
    }

    async fn apply_transition(
        &self,
        id: &str,
        target: RequestStatus,
        approval: NewApproval,
    ) -> AppResult<TransitionOutcome> {
        let mut state = self.write()?;
        let Some(current) = state.requests.iter().find(|r| r.id == id).map(|r| r.status) else {
            return Ok(TransitionOutcome::NotFound);
        };
        if current == target {
            return Ok(TransitionOutcome::Unchanged);
        }
        if !current.is_pending() {
            return Ok(TransitionOutcome::Rejected { current });
        }

        state.set_status(id, target);
        Ok(TransitionOutcome::Applied(state.push_approval(approval)))
    }

    async fn list_approvals(&self, request_id: &str) -> AppResult<Vec<TimeOffApproval>> {
        let state = self.read()?;
        Ok(state
            .approvals
            .iter()
            .filter(|a| a.request_id == request_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EmployeeRepository for MemoryStore {
    async fn find_by_external_id(&self, external_id: &str) -> AppResult<Option<Employee>> {
        Ok(self
            .read()?
            .employees
            .iter()
            .find(|e| e.external_id == external_id)
            .cloned())
    }

    async fn upsert_employee(&self, upsert: EmployeeUpsert) -> AppResult<Employee> {
        let now = Utc::now();
        let mut state = self.write()?;
        if let Some(existing) = state
            .employees
            .iter_mut()
            .find(|e| e.external_id == upsert.external_id)
        {
            upsert.apply_to(existing, now);
            return Ok(existing.clone());
        }

        let employee = Employee {
            id: Uuid::new_v4().to_string(),
            external_id: upsert.external_id.clone(),
            full_name: upsert.full_name.clone(),
            email: upsert.email.clone(),
            role: upsert.role_for_insert().to_string(),
            photo_url: upsert.photo_url.clone(),
            team: upsert.team.clone(),
            metadata: upsert.metadata.clone(),
            created_at: now,
            updated_at: now,
        };
        state.employees.push(employee.clone());
        Ok(employee)
    }

    async fn list_employees(&self) -> AppResult<Vec<Employee>> {
        let mut employees = self.read()?.employees.clone();
        employees.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(employees)
    }
}
