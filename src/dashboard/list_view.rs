use chrono::{NaiveDate, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::dashboard::client::RequestsApi;
use crate::dashboard::snapshot_store::{SnapshotError, SnapshotStore};
use crate::dashboard::{DashboardEntry, EntryId, Viewer};
use crate::model::time_off_request::parse_iso_date;
use crate::model::{Decision, StatusLabel};
use crate::utils::format::{short_date, short_range_label};

/// The activity feed never grows beyond this.
pub const ACTIVITY_LIMIT: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    pub id: EntryId,
    pub title: String,
    pub detail: String,
    pub meta: String,
}

impl ActivityEntry {
    fn just_now(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            id: EntryId::generate(),
            title: title.into(),
            detail: detail.into(),
            meta: "Just now".to_string(),
        }
    }
}

/// Raw fields of the "new request" form.
#[derive(Debug, Clone, Default)]
pub struct NewRequestForm {
    pub request_type: String,
    pub start_date: String,
    pub end_date: String,
    pub hours: String,
    pub note: String,
}

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("You must be signed in to submit a request.")]
    SignInToSubmit,
    #[error("Sign in as a manager to take action on requests.")]
    SignInToReview,
    #[error("You do not have permission to modify requests.")]
    ManagerRequired,
    #[error("{0}")]
    Invalid(&'static str),
    /// Message from the server, or the generic fallback.
    #[error("{0}")]
    Update(String),
}

/// Result of a confirmed manager decision.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewOutcome {
    pub entry: DashboardEntry,
    pub message: String,
}

/// List view: requests, activity feed, manager actions.
pub struct RequestBoard {
    viewer: Option<Viewer>,
    entries: Vec<DashboardEntry>,
    activity: Vec<ActivityEntry>,
    api: Arc<dyn RequestsApi>,
    snapshots: Arc<dyn SnapshotStore>,
}

fn seeded_entries() -> Vec<DashboardEntry> {
    let day = |m, d| NaiveDate::from_ymd_opt(2025, m, d).unwrap_or_default();
    vec![DashboardEntry {
        id: EntryId::from("req-kayley"),
        employee: "Kayley Manfredi".into(),
        role: "Employee".into(),
        request_type: "PTO".into(),
        status: StatusLabel::Pending,
        start_date: day(11, 11),
        end_date: day(11, 12),
        hours: Some(8.0),
        notes: None,
        submitted: Some("Oct 23".into()),
        dates_label: Some("Nov 11 – Nov 12".into()),
    }]
}

fn seeded_activity() -> Vec<ActivityEntry> {
    vec![ActivityEntry {
        id: EntryId::from("act-approved"),
        title: "Approved".into(),
        detail: "Chris Manfredi approved 8 hrs WFH".into(),
        meta: "2h ago".into(),
    }]
}

impl RequestBoard {
    pub fn new(
        viewer: Option<Viewer>,
        api: Arc<dyn RequestsApi>,
        snapshots: Arc<dyn SnapshotStore>,
    ) -> Self {
        Self {
            viewer,
            entries: seeded_entries(),
            activity: seeded_activity(),
            api,
            snapshots,
        }
    }

    pub fn entries(&self) -> &[DashboardEntry] {
        &self.entries
    }

    /// Newest first.
    pub fn activity(&self) -> &[ActivityEntry] {
        &self.activity
    }

    pub fn pending_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == StatusLabel::Pending)
            .count()
    }

    fn push_activity(&mut self, entry: ActivityEntry) {
        self.activity.insert(0, entry);
        self.activity.truncate(ACTIVITY_LIMIT);
    }

    /// Add a pending request for the signed-in viewer.
    pub fn submit(&mut self, form: &NewRequestForm) -> Result<DashboardEntry, BoardError> {
        let viewer = self.viewer.clone().ok_or(BoardError::SignInToSubmit)?;

        let start = parse_iso_date(form.start_date.trim())
            .ok_or(BoardError::Invalid("Select a start date for your request."))?;
        let end = match form.end_date.trim() {
            "" => start,
            raw => parse_iso_date(raw)
                .ok_or(BoardError::Invalid("End date cannot be before the start date."))?,
        };
        if end < start {
            return Err(BoardError::Invalid("End date cannot be before the start date."));
        }
        let hours = form
            .hours
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|h| h.is_finite() && *h > 0.0)
            .ok_or(BoardError::Invalid("Hours must be greater than zero."))?;

        let dates = short_range_label(start, Some(end));
        let note = form.note.trim();
        let entry = DashboardEntry {
            id: EntryId::generate(),
            employee: viewer.name.clone(),
            role: viewer.role_label(),
            request_type: form.request_type.clone(),
            status: StatusLabel::Pending,
            start_date: start,
            end_date: end,
            hours: Some(hours),
            notes: (!note.is_empty()).then(|| note.to_string()),
            submitted: Some(short_date(Utc::now().date_naive())),
            dates_label: Some(dates.clone()),
        };

        self.entries.insert(0, entry.clone());
        self.push_activity(ActivityEntry::just_now(
            "Request submitted",
            format!(
                "{} submitted {} time off ({})",
                viewer.name, entry.request_type, dates
            ),
        ));
        Ok(entry)
    }

    /// Send a decision to the server; local state changes only once it
    /// confirms.
    pub async fn review(
        &mut self,
        id: &str,
        decision: Decision,
    ) -> Result<ReviewOutcome, BoardError> {
        let viewer = self.viewer.clone().ok_or(BoardError::SignInToReview)?;
        if !viewer.can_review() {
            return Err(BoardError::ManagerRequired);
        }

        let confirmed = self
            .api
            .update_status(id, decision)
            .await
            .map_err(|e| BoardError::Update(e.user_message()))?;

        let label = decision.label();
        // the server is authoritative: adopt requests this board never listed
        let (entry, changed) = match self.entries.iter_mut().find(|e| e.id.as_str() == id) {
            Some(entry) => {
                let changed = entry.status != label;
                entry.status = label;
                (entry.clone(), changed)
            }
            None => {
                let mut entry = DashboardEntry::from(&confirmed);
                entry.status = label;
                self.entries.insert(0, entry.clone());
                (entry, true)
            }
        };

        if changed {
            let verb = match decision {
                Decision::Approved => "approved",
                Decision::Denied => "denied",
            };
            self.push_activity(ActivityEntry::just_now(
                label.to_string(),
                format!(
                    "{} {} {} ({})",
                    entry.employee,
                    verb,
                    entry.request_type,
                    entry.dates()
                ),
            ));
        }

        if let Err(e) = self.publish() {
            warn!(error = %e, "Failed to publish approved requests");
        }

        info!(request_id = id, %decision, reviewer = %viewer.name, "Decision applied on board");
        Ok(ReviewOutcome {
            message: format!(
                "{} marked as {} by {}.",
                entry.employee,
                label.to_string().to_lowercase(),
                viewer.name
            ),
            entry,
        })
    }

    /// Merge this board's approved entries into the shared snapshot set.
    ///
    /// The board decides for every id it knows; other ids are kept. A
    /// version conflict triggers one re-merge against the fresh set.
    pub fn publish(&self) -> Result<u64, SnapshotError> {
        match self.try_publish() {
            Err(SnapshotError::Conflict { .. }) => self.try_publish(),
            other => other,
        }
    }

    fn try_publish(&self) -> Result<u64, SnapshotError> {
        let current = self.snapshots.load()?;
        let known: HashSet<&EntryId> = self.entries.iter().map(|e| &e.id).collect();

        let mut merged: Vec<DashboardEntry> = current
            .snapshots
            .into_iter()
            .filter(|s| !known.contains(&s.id))
            .collect();
        merged.extend(
            self.entries
                .iter()
                .filter(|e| e.status == StatusLabel::Approved)
                .cloned(),
        );
        self.snapshots.replace(current.version, merged)
    }
}
