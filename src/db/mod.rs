//! Persistence ports and their adapters.
//!
//! Handlers and services only see the traits; `init_db` picks MySQL when a
//! database URL is configured and the in-memory store otherwise.

use async_trait::async_trait;
use sqlx::MySqlPool;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::model::{
    Employee, EmployeeUpsert, NewApproval, NewTimeOffRequest, RequestStatus, RequestWithEmployee,
    TimeOffApproval, TimeOffRequest, TransitionOutcome,
};

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

#[async_trait]
pub trait RequestRepository: Send + Sync {
    /// Newest submission first, joined with the owning employee when present.
    async fn list_requests(&self) -> AppResult<Vec<RequestWithEmployee>>;

    async fn get_request(&self, id: &str) -> AppResult<Option<RequestWithEmployee>>;

    /// Always created pending, stamped with the current instant.
    async fn create_request(&self, new: NewTimeOffRequest) -> AppResult<TimeOffRequest>;

    /// `None` when no such request exists.
    async fn update_status(
        &self,
        id: &str,
        status: RequestStatus,
    ) -> AppResult<Option<TimeOffRequest>>;

    /// Append-only; identical repeated actions produce separate rows.
    async fn record_approval(&self, approval: NewApproval) -> AppResult<TimeOffApproval>;

    /// Status change and its audit row, all or nothing.
    async fn apply_transition(
        &self,
        id: &str,
        target: RequestStatus,
        approval: NewApproval,
    ) -> AppResult<TransitionOutcome>;

    /// Oldest first.
    async fn list_approvals(&self, request_id: &str) -> AppResult<Vec<TimeOffApproval>>;
}

#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn find_by_external_id(&self, external_id: &str) -> AppResult<Option<Employee>>;

    /// Insert, or refresh the row keyed by `external_id`.
    async fn upsert_employee(&self, upsert: EmployeeUpsert) -> AppResult<Employee>;

    async fn list_employees(&self) -> AppResult<Vec<Employee>>;
}

/// Both repositories, backed by the same store.
#[derive(Clone)]
pub struct Stores {
    pub requests: Arc<dyn RequestRepository>,
    pub employees: Arc<dyn EmployeeRepository>,
}

impl Stores {
    pub fn memory(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            requests: store.clone(),
            employees: store,
        }
    }

    pub fn mysql(pool: MySqlPool) -> Self {
        let store = Arc::new(MySqlStore::new(pool));
        Self {
            requests: store.clone(),
            employees: store,
        }
    }
}

pub async fn init_db(config: &Config) -> AppResult<Stores> {
    match &config.database_url {
        Some(url) => {
            let pool = MySqlPool::connect(url).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Connected to MySQL and applied migrations");
            Ok(Stores::mysql(pool))
        }
        None => {
            warn!("DATABASE_URL not set, using the in-memory store");
            let store = if config.seed_demo_data {
                MemoryStore::with_demo_data()
            } else {
                MemoryStore::new()
            };
            Ok(Stores::memory(store))
        }
    }
}
