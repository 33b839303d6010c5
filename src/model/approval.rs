use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::status::RequestStatus;

/// Append-only audit entry for a manager decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeOffApproval {
    pub id: String,
    pub request_id: String,
    pub actioned_by_external_id: String,
    pub actioned_by_name: String,
    pub action: RequestStatus,
    pub comment: Option<String>,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewApproval {
    pub request_id: String,
    pub actioned_by_external_id: String,
    pub actioned_by_name: String,
    pub action: RequestStatus,
    pub comment: Option<String>,
}

impl NewApproval {
    pub fn into_approval(self, id: String, now: DateTime<Utc>) -> TimeOffApproval {
        TimeOffApproval {
            id,
            request_id: self.request_id,
            actioned_by_external_id: self.actioned_by_external_id,
            actioned_by_name: self.actioned_by_name,
            action: self.action,
            comment: self.comment,
            created_at: now,
        }
    }
}

/// What an atomic status change actually did.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// Status changed and one audit row was written.
    Applied(TimeOffApproval),
    /// The request already had the target status; nothing was written.
    Unchanged,
    /// The request is resolved to a different status.
    Rejected { current: RequestStatus },
    NotFound,
}
