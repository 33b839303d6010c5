//! Client-side state for the two dashboard views.
//!
//! The list view ([`list_view::RequestBoard`]) and the calendar view
//! ([`calendar_view::CalendarBoard`]) are rendered independently. They share
//! approved requests through a versioned [`snapshot_store::SnapshotStore`]
//! instead of a shared global.

use chrono::NaiveDate;
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

use crate::model::role::is_manager;
use crate::model::{RequestView, StatusLabel};
use crate::model::time_off_request::DEFAULT_ROLE_LABEL;
use crate::utils::calendar::DateSpan;
use crate::utils::format::short_range_label;

pub mod calendar_view;
pub mod client;
pub mod list_view;
pub mod snapshot_store;

/// Identifier of a dashboard entry or activity line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One request as a dashboard view shows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardEntry {
    pub id: EntryId,
    pub employee: String,
    pub role: String,
    #[serde(rename = "type")]
    pub request_type: String,
    pub status: StatusLabel,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Short submission label such as "Oct 23".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dates_label: Option<String>,
}

impl DashboardEntry {
    /// Label for the covered range, computed when none was stored.
    pub fn dates(&self) -> String {
        self.dates_label
            .clone()
            .unwrap_or_else(|| short_range_label(self.start_date, Some(self.end_date)))
    }
}

impl DateSpan for DashboardEntry {
    fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    fn end_date(&self) -> NaiveDate {
        self.end_date
    }
}

impl From<&RequestView> for DashboardEntry {
    fn from(view: &RequestView) -> Self {
        DashboardEntry {
            id: EntryId::from(view.id.as_str()),
            employee: view.employee.name.clone(),
            role: view.employee.role.clone(),
            request_type: view.request_type.clone(),
            status: view.status,
            start_date: view.start_date,
            end_date: view.end_date,
            hours: view.hours.map(f64::from),
            notes: view.note.clone(),
            submitted: None,
            dates_label: Some(short_range_label(view.start_date, Some(view.end_date))),
        }
    }
}

/// The signed-in user looking at a dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewer {
    pub name: String,
    pub role: Option<String>,
}

impl Viewer {
    pub fn new(name: impl Into<String>, role: Option<&str>) -> Self {
        Self {
            name: name.into(),
            role: role.map(str::to_string),
        }
    }

    pub fn role_label(&self) -> String {
        self.role
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_ROLE_LABEL)
            .to_string()
    }

    pub fn can_review(&self) -> bool {
        is_manager(self.role.as_deref())
    }
}
