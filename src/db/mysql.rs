use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, MySqlPool};
use std::str::FromStr;
use uuid::Uuid;

use crate::db::{EmployeeRepository, RequestRepository};
use crate::error::{AppError, AppResult};
use crate::model::{
    Employee, EmployeeUpsert, NewApproval, NewTimeOffRequest, RequestStatus, RequestWithEmployee,
    TimeOffApproval, TimeOffRequest, TransitionOutcome,
};

const REQUEST_COLUMNS: &str = r#"
    r.id,
    r.employee_id,
    r.external_user_id,
    r.status,
    r.request_type,
    r.start_date,
    r.end_date,
    r.hours,
    r.note,
    r.submitted_at,
    r.last_updated_at,
    r.metadata,
    e.full_name AS employee_name,
    e.role AS employee_role
"#;

const EMPLOYEE_COLUMNS: &str = r#"
    id, external_id, full_name, email, role, photo_url, team, metadata, created_at, updated_at
"#;

#[derive(FromRow)]
struct RequestRow {
    id: String,
    employee_id: Option<String>,
    external_user_id: String,
    status: String,
    request_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    hours: Option<i32>,
    note: Option<String>,
    submitted_at: DateTime<Utc>,
    last_updated_at: DateTime<Utc>,
    metadata: Option<Json<Value>>,
    employee_name: Option<String>,
    employee_role: Option<String>,
}

fn parse_status(raw: &str) -> AppResult<RequestStatus> {
    RequestStatus::from_str(raw)
        .map_err(|_| AppError::Persistence(format!("unknown request status '{raw}'")))
}

impl TryFrom<RequestRow> for RequestWithEmployee {
    type Error = AppError;

    fn try_from(row: RequestRow) -> AppResult<Self> {
        Ok(RequestWithEmployee {
            request: TimeOffRequest {
                status: parse_status(&row.status)?,
                id: row.id,
                employee_id: row.employee_id,
                external_user_id: row.external_user_id,
                request_type: row.request_type,
                start_date: row.start_date,
                end_date: row.end_date,
                hours: row.hours,
                note: row.note,
                submitted_at: row.submitted_at,
                last_updated_at: row.last_updated_at,
                metadata: row.metadata.map(|Json(v)| v),
            },
            employee_name: row.employee_name,
            employee_role: row.employee_role,
        })
    }
}

#[derive(FromRow)]
struct EmployeeRow {
    id: String,
    external_id: String,
    full_name: String,
    email: String,
    role: String,
    photo_url: Option<String>,
    team: Option<String>,
    metadata: Option<Json<Value>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Employee {
            id: row.id,
            external_id: row.external_id,
            full_name: row.full_name,
            email: row.email,
            role: row.role,
            photo_url: row.photo_url,
            team: row.team,
            metadata: row.metadata.map(|Json(v)| v),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct ApprovalRow {
    id: String,
    request_id: String,
    actioned_by_external_id: String,
    actioned_by_name: String,
    action: String,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ApprovalRow> for TimeOffApproval {
    type Error = AppError;

    fn try_from(row: ApprovalRow) -> AppResult<Self> {
        Ok(TimeOffApproval {
            action: parse_status(&row.action)?,
            id: row.id,
            request_id: row.request_id,
            actioned_by_external_id: row.actioned_by_external_id,
            actioned_by_name: row.actioned_by_name,
            comment: row.comment,
            created_at: row.created_at,
        })
    }
}

/// MySQL adapter for both repositories.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_request(&self, id: &str) -> AppResult<Option<RequestWithEmployee>> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM time_off_requests r \
             LEFT JOIN employees e ON e.id = r.employee_id WHERE r.id = ?"
        );
        let row = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, request_id = id, "Failed to fetch time-off request");
                AppError::from(e)
            })?;
        row.map(RequestWithEmployee::try_from).transpose()
    }

    async fn insert_approval<'c, E>(executor: E, approval: NewApproval) -> AppResult<TimeOffApproval>
    where
        E: sqlx::Executor<'c, Database = sqlx::MySql>,
    {
        let row = approval.into_approval(Uuid::new_v4().to_string(), Utc::now());
        sqlx::query(
            r#"
            INSERT INTO time_off_approvals
                (id, request_id, actioned_by_external_id, actioned_by_name, action, comment, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.request_id)
        .bind(&row.actioned_by_external_id)
        .bind(&row.actioned_by_name)
        .bind(row.action.as_ref())
        .bind(&row.comment)
        .bind(row.created_at)
        .execute(executor)
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl RequestRepository for MySqlStore {
    async fn list_requests(&self) -> AppResult<Vec<RequestWithEmployee>> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM time_off_requests r \
             LEFT JOIN employees e ON e.id = r.employee_id \
             ORDER BY r.submitted_at DESC"
        );
        let rows = sqlx::query_as::<_, RequestRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to list time-off requests");
                AppError::from(e)
            })?;
        rows.into_iter().map(RequestWithEmployee::try_from).collect()
    }

    async fn get_request(&self, id: &str) -> AppResult<Option<RequestWithEmployee>> {
        self.fetch_request(id).await
    }

    async fn create_request(&self, new: NewTimeOffRequest) -> AppResult<TimeOffRequest> {
        let request = new.into_request(Uuid::new_v4().to_string(), Utc::now());
        sqlx::query(
            r#"
            INSERT INTO time_off_requests
                (id, employee_id, external_user_id, status, request_type,
                 start_date, end_date, hours, note, submitted_at, last_updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&request.id)
        .bind(&request.employee_id)
        .bind(&request.external_user_id)
        .bind(request.status.as_ref())
        .bind(&request.request_type)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.hours)
        .bind(&request.note)
        .bind(request.submitted_at)
        .bind(request.last_updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %request.external_user_id, "Failed to create time-off request");
            AppError::from(e)
        })?;
        Ok(request)
    }

    async fn update_status(
        &self,
        id: &str,
        status: RequestStatus,
    ) -> AppResult<Option<TimeOffRequest>> {
        let result = sqlx::query(
            r#"
            UPDATE time_off_requests
            SET status = ?, last_updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_ref())
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(self.fetch_request(id).await?.map(|row| row.request))
    }

    async fn record_approval(&self, approval: NewApproval) -> AppResult<TimeOffApproval> {
        Self::insert_approval(&self.pool, approval).await
    }

    async fn apply_transition(
        &self,
        id: &str,
        target: RequestStatus,
        approval: NewApproval,
    ) -> AppResult<TransitionOutcome> {
        let mut tx = self.pool.begin().await?;

        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM time_off_requests WHERE id = ? FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(current) = current else {
            tx.rollback().await?;
            return Ok(TransitionOutcome::NotFound);
        };
        let current = parse_status(&current)?;
        if current == target {
            tx.rollback().await?;
            return Ok(TransitionOutcome::Unchanged);
        }
        if !current.is_pending() {
            tx.rollback().await?;
            return Ok(TransitionOutcome::Rejected { current });
        }

        sqlx::query("UPDATE time_off_requests SET status = ?, last_updated_at = ? WHERE id = ?")
            .bind(target.as_ref())
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let audit = Self::insert_approval(&mut *tx, approval).await?;

        tx.commit().await.map_err(|e| {
            tracing::error!(error = %e, request_id = id, "Transition commit failed");
            AppError::from(e)
        })?;
        Ok(TransitionOutcome::Applied(audit))
    }

    async fn list_approvals(&self, request_id: &str) -> AppResult<Vec<TimeOffApproval>> {
        let rows = sqlx::query_as::<_, ApprovalRow>(
            r#"
            SELECT id, request_id, actioned_by_external_id, actioned_by_name, action, comment, created_at
            FROM time_off_approvals
            WHERE request_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TimeOffApproval::try_from).collect()
    }
}

#[async_trait]
impl EmployeeRepository for MySqlStore {
    async fn find_by_external_id(&self, external_id: &str) -> AppResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE external_id = ?");
        let row = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Employee::from))
    }

    async fn upsert_employee(&self, upsert: EmployeeUpsert) -> AppResult<Employee> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO employees
                (id, external_id, full_name, email, role, photo_url, team, metadata, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                full_name = VALUES(full_name),
                email = VALUES(email),
                photo_url = VALUES(photo_url),
                role = COALESCE(?, role),
                team = COALESCE(?, team),
                metadata = COALESCE(?, metadata),
                updated_at = VALUES(updated_at)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&upsert.external_id)
        .bind(&upsert.full_name)
        .bind(&upsert.email)
        .bind(upsert.role_for_insert())
        .bind(&upsert.photo_url)
        .bind(&upsert.team)
        .bind(upsert.metadata.clone().map(Json))
        .bind(now)
        .bind(now)
        .bind(&upsert.role)
        .bind(&upsert.team)
        .bind(upsert.metadata.clone().map(Json))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, external_id = %upsert.external_id, "Employee upsert failed");
            AppError::from(e)
        })?;

        self.find_by_external_id(&upsert.external_id)
            .await?
            .ok_or_else(|| AppError::Persistence("employee row vanished after upsert".into()))
    }

    async fn list_employees(&self) -> AppResult<Vec<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY full_name ASC");
        let rows = sqlx::query_as::<_, EmployeeRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Employee::from).collect())
    }
}
