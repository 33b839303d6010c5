use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Stored lifecycle state of a time-off request (also reused as the audit action).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Denied,
    Cancelled,
}

impl RequestStatus {
    /// Human label shown to users. Cancelled requests read as denied.
    pub fn label(self) -> StatusLabel {
        match self {
            RequestStatus::Pending => StatusLabel::Pending,
            RequestStatus::Approved => StatusLabel::Approved,
            RequestStatus::Denied | RequestStatus::Cancelled => StatusLabel::Denied,
        }
    }

    pub fn is_pending(self) -> bool {
        self == RequestStatus::Pending
    }
}

/// The three states a user ever sees.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum StatusLabel {
    Pending,
    Approved,
    Denied,
}

/// Target of a manager decision. Parsing is case-sensitive on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
pub enum Decision {
    Approved,
    Denied,
}

impl Decision {
    pub fn status(self) -> RequestStatus {
        match self {
            Decision::Approved => RequestStatus::Approved,
            Decision::Denied => RequestStatus::Denied,
        }
    }

    pub fn label(self) -> StatusLabel {
        self.status().label()
    }
}
